//! Forgery engine configuration

use crate::forge::{ForgeError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Byte distribution of the random prefix and suffix around the payload
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alphabet {
    /// Uniform random bytes
    #[default]
    Binary,
    /// `[A-Za-z0-9]`, keeps the forged message printable
    Alphanumeric,
}

/// Search parameters
///
/// Loaded from JSON with every field optional:
///
/// ```json
/// { "workers": 8, "alphabet": "alphanumeric", "deadline_ms": 60000 }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    /// Worker threads; `None` means one per logical CPU
    pub workers: Option<usize>,
    /// Random bytes before the payload
    pub prefix_len: usize,
    /// Random bytes after the payload
    pub suffix_len: usize,
    pub alphabet: Alphabet,
    /// Abort the search after this long; `None` searches until a winner is found
    pub deadline_ms: Option<u64>,
    /// How often the coordinator checks for cancellation while waiting
    pub poll_interval_ms: u64,
    /// Attempts between reseeding a worker's CSPRNG from the OS
    pub reseed_interval: u64,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            workers: None,
            prefix_len: 27,
            suffix_len: 29,
            alphabet: Alphabet::Binary,
            deadline_ms: None,
            poll_interval_ms: 20,
            reseed_interval: 1 << 20,
        }
    }
}

impl ForgeConfig {
    /// Read a JSON config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path.as_ref())
            .map_err(|e| ForgeError::InvalidConfig(format!("{}: {}", path.as_ref().display(), e)))?;
        let config: ForgeConfig = serde_json::from_slice(&data)
            .map_err(|e| ForgeError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline_ms = Some(deadline.as_millis() as u64);
        self
    }

    pub fn with_alphabet(mut self, alphabet: Alphabet) -> Self {
        self.alphabet = alphabet;
        self
    }

    /// Effective worker count
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == Some(0) {
            return Err(ForgeError::InvalidConfig("workers must be at least 1".into()));
        }
        if self.reseed_interval == 0 {
            return Err(ForgeError::InvalidConfig("reseed_interval must be at least 1".into()));
        }
        Ok(())
    }
}
