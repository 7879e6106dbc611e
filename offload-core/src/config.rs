//! Session configuration.

use chrono::Utc;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding the participant identifier.
pub const ENV_PARTICIPANT_ID: &str = "OFFLOAD_PARTICIPANT_ID";
/// Environment variable holding a fixed RNG seed.
pub const ENV_SEED: &str = "OFFLOAD_SEED";
/// Environment variable for the directory result documents are written to.
pub const ENV_EXPORT_DIR: &str = "OFFLOAD_EXPORT_DIR";

/// Errors from reading configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid seed {0:?}: expected an unsigned integer")]
    InvalidSeed(String),

    #[error("participant id must not be empty")]
    EmptyParticipantId,
}

/// Timer durations used by the phase controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Minimum time a statement stays on screen before advancing is allowed.
    pub exposure: Duration,
    /// Length of the math distractor phase, in countdown ticks.
    pub distractor_ticks: u32,
    /// Interval between countdown ticks.
    pub tick: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            exposure: Duration::from_millis(3000),
            distractor_ticks: 120,
            tick: Duration::from_secs(1),
        }
    }
}

/// Configuration for a new experiment session.
#[derive(Debug, Clone)]
pub struct ExperimentConfig {
    /// Identifier written into the result document and its file name.
    pub participant_id: String,

    /// Fixed seed for stimulus generation. `None` draws from OS entropy.
    pub seed: Option<u64>,

    /// Timer durations.
    pub timing: Timing,

    /// Where result documents are exported.
    pub export_dir: PathBuf,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ExperimentConfig {
    /// Create a config with a `P<epoch-millis>` participant id.
    pub fn new() -> Self {
        Self {
            participant_id: format!("P{}", Utc::now().timestamp_millis()),
            seed: None,
            timing: Timing::default(),
            export_dir: PathBuf::from("."),
        }
    }

    /// Build a config from `OFFLOAD_*` environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::new();

        if let Ok(id) = std::env::var(ENV_PARTICIPANT_ID) {
            config = config.with_participant_id(id)?;
        }
        if let Ok(seed) = std::env::var(ENV_SEED) {
            config.seed = Some(parse_seed(&seed)?);
        }
        if let Ok(dir) = std::env::var(ENV_EXPORT_DIR) {
            config.export_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    /// Set the participant identifier.
    pub fn with_participant_id(mut self, id: impl Into<String>) -> Result<Self, ConfigError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ConfigError::EmptyParticipantId);
        }
        self.participant_id = id.trim().to_string();
        Ok(self)
    }

    /// Fix the RNG seed so stimulus sets are reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Override timer durations.
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Set the export directory.
    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }
}

/// Parse a seed value as given on the command line or in the environment.
pub fn parse_seed(value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidSeed(value.to_string()))
}
