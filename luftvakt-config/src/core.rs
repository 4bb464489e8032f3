//! Core system configuration parameters.
//!
//! Manages the intake queue and the analysis worker's polling behaviour.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

/// Core system configuration parameters.
#[derive(Default, Debug, Serialize, Deserialize, Validate, Clone)]
pub struct CoreConfig {
    /// Intake queue between capture and analysis.
    #[validate(nested)]
    #[serde(default)]
    pub queue: QueueConfig,

    /// Analysis worker poll loop.
    #[validate(nested)]
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Intake queue configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct QueueConfig {
    /// Maximum number of frames waiting for analysis.
    #[serde(default = "default_capacity")]
    #[validate(range(min = 128, max = 1048576))]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    4096
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

/// Analysis worker configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct AnalysisConfig {
    /// Maximum frames taken from the queue per pass.
    #[serde(default = "default_drain_batch")]
    #[validate(range(min = 1, max = 1048576))]
    pub drain_batch: usize,

    /// Sleep when the queue is empty (microseconds).
    #[serde(default = "default_idle_backoff")]
    #[validate(range(min = 1, max = 1000000))]
    pub idle_backoff_us: u64,

    /// Pause after each full pass (microseconds).
    #[serde(default = "default_pass_pause")]
    #[validate(range(max = 1000000))]
    pub pass_pause_us: u64,

    /// Log every FCS mismatch at debug level instead of only counting it.
    #[serde(default)]
    pub log_fcs_mismatch: bool,
}

fn default_drain_batch() -> usize {
    1048576
}

fn default_idle_backoff() -> u64 {
    500
}

fn default_pass_pause() -> u64 {
    10
}

impl AnalysisConfig {
    pub fn idle_backoff(&self) -> Duration {
        Duration::from_micros(self.idle_backoff_us)
    }

    pub fn pass_pause(&self) -> Duration {
        Duration::from_micros(self.pass_pause_us)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            drain_batch: default_drain_batch(),
            idle_backoff_us: default_idle_backoff(),
            pass_pause_us: default_pass_pause(),
            log_fcs_mismatch: false,
        }
    }
}
