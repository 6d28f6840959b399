use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use bilateral_core::{
    solve, solve_batch, write_cover, CoverSolution, ProblemInstance, SolverConfig,
};
use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "bilateral")]
#[command(about = "Minimum vertex cover of a bipartite graph, favoring a designated friend")]
struct Cmd {
    /// JSON configuration file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Friend identity, or `none`
    #[arg(long)]
    friend: Option<String>,

    /// Max-flow engine: edmonds_karp or push_relabel
    #[arg(long)]
    algorithm: Option<String>,

    /// Extra configuration as KEY=VALUE (repeatable)
    #[arg(long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Input files; stdin when none are given
    inputs: Vec<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cmd = Cmd::parse();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(&cmd, io::stdin().lock(), &mut out)?;
    out.flush()?;
    Ok(())
}

fn build_config(cmd: &Cmd) -> Result<SolverConfig> {
    let mut config = match &cmd.config {
        Some(path) => SolverConfig::from_path(path)?,
        None => SolverConfig::default(),
    };
    if let Some(friend) = &cmd.friend {
        config.set_parameter("friend", friend)?;
    }
    if let Some(algorithm) = &cmd.algorithm {
        config.set_parameter("algorithm", algorithm)?;
    }
    for assignment in &cmd.params {
        config.apply_override(assignment)?;
    }
    config.validate()?;
    log::debug!("Effective configuration: {:?}", config);
    Ok(config)
}

fn run<R: Read, W: Write>(cmd: &Cmd, mut stdin: R, out: &mut W) -> Result<()> {
    let config = build_config(cmd)?;

    let solutions: Vec<CoverSolution> = if cmd.inputs.is_empty() {
        let mut text = String::new();
        stdin.read_to_string(&mut text).context("reading stdin")?;
        let instance = ProblemInstance::parse(&text, &config.ranges).context("parsing stdin")?;
        vec![solve(&instance, &config)?]
    } else {
        let mut instances = Vec::with_capacity(cmd.inputs.len());
        for path in &cmd.inputs {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let instance = ProblemInstance::parse(&text, &config.ranges)
                .with_context(|| format!("parsing {}", path.display()))?;
            instances.push(instance);
        }
        let mut solutions = Vec::with_capacity(instances.len());
        for (path, result) in cmd.inputs.iter().zip(solve_batch(&instances, &config)) {
            solutions.push(result.with_context(|| format!("solving {}", path.display()))?);
        }
        solutions
    };

    match cmd.format {
        Format::Text => {
            for solution in &solutions {
                write_cover(out, &solution.cover)?;
            }
        }
        Format::Json if solutions.len() == 1 => {
            serde_json::to_writer_pretty(&mut *out, &solutions[0])?;
            writeln!(out)?;
        }
        Format::Json => {
            serde_json::to_writer_pretty(&mut *out, &solutions)?;
            writeln!(out)?;
        }
    }
    Ok(())
}
