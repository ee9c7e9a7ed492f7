//! Recorder configuration types
//!
//! Only the data the pipeline needs: where logs go, how large a file may grow
//! and the per-variable change-detection settings. Reading these from a file
//! is left to the application layer.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Name of the active log file
pub const ACTIVE_LOG_FILE: &str = "Log.txt";

/// Configuration for the recorder's log sink
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecorderConfig {
    /// Directory holding `Log.txt` and the rotated `Log<N>.txt` files
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// Line count at which the active file is rotated
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,
}

fn default_directory() -> PathBuf {
    PathBuf::from("logs")
}

fn default_max_lines() -> usize {
    10_000
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            max_lines: default_max_lines(),
        }
    }
}

impl RecorderConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the log directory
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    /// Builder method: set the rotation bound
    pub fn with_max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = max_lines;
        self
    }

    /// Path of the active log file
    pub fn active_log_path(&self) -> PathBuf {
        self.directory.join(ACTIVE_LOG_FILE)
    }
}

/// Change-detection settings for one variable
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariableConfig {
    /// Symbol path, matched case-insensitively against notifications
    pub path: String,

    /// Fractional digits kept for floating values (truncated, not rounded)
    #[serde(default)]
    pub decimals: Option<u32>,

    /// Minimum absolute change, relative to the last logged value, worth recording
    #[serde(default)]
    pub threshold: Option<f64>,
}

impl VariableConfig {
    /// Create a variable configuration with no precision or threshold
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            decimals: None,
            threshold: None,
        }
    }

    /// Builder method: set decimal places
    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = Some(decimals);
        self
    }

    /// Builder method: set the minimum change threshold
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Threshold with negative or NaN values discarded
    pub fn effective_threshold(&self) -> Option<f64> {
        match self.threshold {
            Some(t) if t >= 0.0 => Some(t),
            Some(t) => {
                log::warn!(
                    "Ignoring invalid threshold {} for '{}'",
                    t,
                    self.path
                );
                None
            }
            None => None,
        }
    }
}
