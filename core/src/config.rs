//! Solver configuration
//!
//! `SolverConfig` carries the identity ranges that classify input vertices,
//! the designated friend, and the engine switches. It deserializes from JSON
//! with every field optional and accepts the same keys as string parameters,
//! so a command line can layer `key=value` overrides on top of a file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::algorithm::graph::max_flow::MaxFlowAlgorithm;
use crate::algorithm::graph::push_relabel::DEFAULT_GLOBAL_RELABEL_FREQUENCY;
use crate::algorithm::traits::{Side, VertexId};

/// Friend identity used when none is configured
pub const DEFAULT_FRIEND: VertexId = VertexId(1009);

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Empty {side} range [{min}, {max}]")]
    EmptyRange { side: Side, min: u32, max: u32 },

    #[error("Left range [{left_min}, {left_max}] overlaps right range [{right_min}, {right_max}]")]
    OverlappingRanges {
        left_min: u32,
        left_max: u32,
        right_min: u32,
        right_max: u32,
    },

    #[error("Range bound {0} collides with a reserved terminal identity")]
    ReservedIdentity(VertexId),

    #[error("Friend {0} lies outside both identity ranges")]
    FriendOutOfRange(VertexId),

    #[error("Unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error("Invalid value '{value}' for parameter '{name}'")]
    InvalidValue { name: String, value: String },
}

/// Inclusive identity ranges for the two sides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdRanges {
    pub left_min: u32,
    pub left_max: u32,
    pub right_min: u32,
    pub right_max: u32,
}

impl Default for IdRanges {
    fn default() -> Self {
        Self {
            left_min: 1000,
            left_max: 1999,
            right_min: 2000,
            right_max: 2999,
        }
    }
}

impl IdRanges {
    /// Side whose range holds `id`
    pub fn classify(&self, id: VertexId) -> Option<Side> {
        if (self.left_min..=self.left_max).contains(&id.0) {
            Some(Side::Left)
        } else if (self.right_min..=self.right_max).contains(&id.0) {
            Some(Side::Right)
        } else {
            None
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (side, min, max) in [
            (Side::Left, self.left_min, self.left_max),
            (Side::Right, self.right_min, self.right_max),
        ] {
            if min > max {
                return Err(ConfigError::EmptyRange { side, min, max });
            }
            if VertexId(max).is_terminal() {
                return Err(ConfigError::ReservedIdentity(VertexId(max)));
            }
        }
        if self.left_min <= self.right_max && self.right_min <= self.left_max {
            return Err(ConfigError::OverlappingRanges {
                left_min: self.left_min,
                left_max: self.left_max,
                right_min: self.right_min,
                right_max: self.right_max,
            });
        }
        Ok(())
    }
}

/// Full solver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Vertex the cover selection favors; `None` disables the preference
    pub friend: Option<VertexId>,
    #[serde(flatten)]
    pub ranges: IdRanges,
    pub algorithm: MaxFlowAlgorithm,
    pub greedy_seed: bool,
    pub friend_bias: bool,
    pub global_relabel_frequency: usize,
    /// Check the cover against the input before returning it
    pub verify: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            friend: Some(DEFAULT_FRIEND),
            ranges: IdRanges::default(),
            algorithm: MaxFlowAlgorithm::default(),
            greedy_seed: true,
            friend_bias: true,
            global_relabel_frequency: DEFAULT_GLOBAL_RELABEL_FREQUENCY,
            verify: true,
        }
    }
}

impl SolverConfig {
    /// Parameter names accepted by `set_parameter`
    pub const PARAMETERS: [&'static str; 10] = [
        "friend",
        "left_min",
        "left_max",
        "right_min",
        "right_max",
        "algorithm",
        "greedy_seed",
        "friend_bias",
        "global_relabel_frequency",
        "verify",
    ];

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: SolverConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ranges.validate()?;
        if let Some(friend) = self.friend {
            if self.ranges.classify(friend).is_none() {
                return Err(ConfigError::FriendOutOfRange(friend));
            }
        }
        Ok(())
    }

    /// Sets one field from its string form
    ///
    /// `friend` also accepts `none`. Range consistency is not rechecked
    /// here; call `validate` once all overrides are applied.
    pub fn set_parameter(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
        };
        let trimmed = value.trim();

        match name {
            "friend" => {
                self.friend = match trimmed.to_ascii_lowercase().as_str() {
                    "none" | "" => None,
                    other => Some(VertexId(other.parse().map_err(|_| invalid())?)),
                };
            }
            "left_min" => self.ranges.left_min = trimmed.parse().map_err(|_| invalid())?,
            "left_max" => self.ranges.left_max = trimmed.parse().map_err(|_| invalid())?,
            "right_min" => self.ranges.right_min = trimmed.parse().map_err(|_| invalid())?,
            "right_max" => self.ranges.right_max = trimmed.parse().map_err(|_| invalid())?,
            "algorithm" => {
                self.algorithm = MaxFlowAlgorithm::from_name(trimmed).ok_or_else(invalid)?;
            }
            "greedy_seed" => self.greedy_seed = parse_flag(trimmed).ok_or_else(invalid)?,
            "friend_bias" => self.friend_bias = parse_flag(trimmed).ok_or_else(invalid)?,
            "global_relabel_frequency" => {
                self.global_relabel_frequency = trimmed.parse().map_err(|_| invalid())?;
            }
            "verify" => self.verify = parse_flag(trimmed).ok_or_else(invalid)?,
            _ => return Err(ConfigError::UnknownParameter(name.to_string())),
        }
        Ok(())
    }

    /// Applies a `key=value` override
    pub fn apply_override(&mut self, assignment: &str) -> Result<(), ConfigError> {
        let (name, value) = assignment
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidValue {
                name: assignment.to_string(),
                value: String::new(),
            })?;
        self.set_parameter(name.trim(), value)
    }

    pub fn get_parameter(&self, name: &str) -> Option<String> {
        let value = match name {
            "friend" => self
                .friend
                .map_or_else(|| "none".to_string(), |f| f.to_string()),
            "left_min" => self.ranges.left_min.to_string(),
            "left_max" => self.ranges.left_max.to_string(),
            "right_min" => self.ranges.right_min.to_string(),
            "right_max" => self.ranges.right_max.to_string(),
            "algorithm" => self.algorithm.to_string(),
            "greedy_seed" => self.greedy_seed.to_string(),
            "friend_bias" => self.friend_bias.to_string(),
            "global_relabel_frequency" => self.global_relabel_frequency.to_string(),
            "verify" => self.verify.to_string(),
            _ => return None,
        };
        Some(value)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SolverConfig::default();
        assert_eq!(config.friend, Some(VertexId(1009)));
        assert_eq!(config.ranges.classify(VertexId(1999)), Some(Side::Left));
        assert_eq!(config.ranges.classify(VertexId(2000)), Some(Side::Right));
        assert_eq!(config.ranges.classify(VertexId(3000)), None);
        assert_eq!(config.algorithm, MaxFlowAlgorithm::EdmondsKarp);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_partial_fields() {
        let config = SolverConfig::from_json(
            r#"{ "friend": null, "algorithm": "push_relabel", "left_max": 1500 }"#,
        )
        .unwrap();
        assert_eq!(config.friend, None);
        assert_eq!(config.algorithm, MaxFlowAlgorithm::PushRelabel);
        assert_eq!(config.ranges.left_max, 1500);
        assert_eq!(config.ranges.right_min, 2000);
        assert!(config.verify);

        let back = SolverConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_validation_errors() {
        assert!(matches!(
            SolverConfig::from_json(r#"{ "left_min": 2500 }"#),
            Err(ConfigError::EmptyRange { side: Side::Left, .. })
        ));
        assert!(matches!(
            SolverConfig::from_json(r#"{ "left_max": 2100 }"#),
            Err(ConfigError::OverlappingRanges { .. })
        ));
        assert!(matches!(
            SolverConfig::from_json(r#"{ "friend": 42 }"#),
            Err(ConfigError::FriendOutOfRange(VertexId(42)))
        ));
        assert!(matches!(
            SolverConfig::from_json("{ not json"),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            SolverConfig::from_path("/nonexistent/bilateral.json"),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_string_parameters() {
        let mut config = SolverConfig::default();
        config.set_parameter("friend", "none").unwrap();
        config.apply_override("algorithm=push-relabel").unwrap();
        config.apply_override("verify = off").unwrap();
        config.set_parameter("global_relabel_frequency", "0").unwrap();

        assert_eq!(config.friend, None);
        assert_eq!(config.get_parameter("friend").as_deref(), Some("none"));
        assert_eq!(config.get_parameter("algorithm").as_deref(), Some("push_relabel"));
        assert!(!config.verify);
        assert_eq!(config.global_relabel_frequency, 0);

        assert!(matches!(
            config.set_parameter("colour", "red"),
            Err(ConfigError::UnknownParameter(_))
        ));
        assert!(matches!(
            config.set_parameter("greedy_seed", "perhaps"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(config.apply_override("verify").is_err());

        for name in SolverConfig::PARAMETERS {
            assert!(config.get_parameter(name).is_some(), "{}", name);
        }
    }
}
