//! Built-in detector configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

#[derive(Default, Debug, Serialize, Deserialize, Validate, Clone)]
pub struct PluginsConfig {
    #[validate(nested)]
    #[serde(default)]
    pub deauth_flood: DeauthFloodConfig,

    #[validate(nested)]
    #[serde(default)]
    pub ssid_signature: SsidSignatureConfig,
}

/// Deauthentication flood detector.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct DeauthFloodConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Deauthentications needed within the window.
    #[validate(range(min = 1, max = 100000))]
    #[serde(default = "default_frames")]
    pub frames: usize,

    /// Window length (milliseconds).
    #[validate(range(min = 1, max = 60000))]
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_frames() -> usize {
    10
}

fn default_window_ms() -> u64 {
    1000
}

impl DeauthFloodConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl Default for DeauthFloodConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            frames: default_frames(),
            window_ms: default_window_ms(),
        }
    }
}

/// Rogue SSID detector.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct SsidSignatureConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// SSID substrings of known rogue networks, matched case-insensitively.
    #[validate(custom(function = validation::validate_patterns))]
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl Default for SsidSignatureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            patterns: Vec::new(),
        }
    }
}
