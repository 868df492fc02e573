use serde::{Deserialize, Serialize};
use crate::core::error::{QueueError, Result};

/// Maximum number of queues a registry can hand out
pub const MAX_QUEUES: usize = 100;

/// Diagnostic trace level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Only structural errors are reported
    Quiet,
    /// Every push/pop/search/free logs the queue state
    Verbose,
}

impl Verbosity {
    /// Level selected at compile time through the `verbose` feature
    pub const COMPILED: Verbosity = if cfg!(feature = "verbose") {
        Verbosity::Verbose
    } else {
        Verbosity::Quiet
    };

    pub fn is_verbose(self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::COMPILED
    }
}

/// Registry settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub capacity: usize,    // number of slots, at most MAX_QUEUES
    pub verbosity: Verbosity,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { capacity: MAX_QUEUES, verbosity: Verbosity::default() }
    }
}

impl RegistryConfig {
    /// Parse a config from JSON, filling absent fields with defaults
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: RegistryConfig =
            serde_json::from_str(raw).map_err(|e| QueueError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Check that the capacity fits in `1..=MAX_QUEUES`
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 || self.capacity > MAX_QUEUES {
            return Err(QueueError::InvalidConfig(format!(
                "capacity must be between 1 and {}, got {}",
                MAX_QUEUES, self.capacity
            )));
        }
        Ok(())
    }
}
