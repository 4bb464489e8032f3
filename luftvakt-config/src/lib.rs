//! # Luftvakt Configuration System
//!
//! Hierarchical configuration for the wireless intrusion prevention engine.
//!
//! ## Features
//! - **Unified Configuration**: Single source of truth across all components
//! - **Validation**: Runtime validation of every section before use
//! - **Environment Awareness**: Per-environment overrides and `LUFTVAKT_*` variables

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod capture;
mod core;
mod error;
mod network;
mod plugins;
mod telemetry;
mod validation;

pub use capture::CaptureConfig;
pub use core::{AnalysisConfig, CoreConfig, QueueConfig};
pub use error::ConfigError;
pub use network::NetworkConfig;
pub use plugins::{DeauthFloodConfig, PluginsConfig, SsidSignatureConfig};
pub use telemetry::TelemetryConfig;

const BASE_FILE: &str = "config/luftvakt.yaml";
const ENV_PREFIX: &str = "LUFTVAKT_";

/// Top-level configuration container for all Luftvakt components.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone)]
pub struct LuftvaktConfig {
    /// Intake queue and analysis worker.
    #[validate(nested)]
    #[serde(default)]
    pub core: CoreConfig,

    /// Live capture parameters.
    #[validate(nested)]
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Our own infrastructure.
    #[validate(nested)]
    #[serde(default)]
    pub network: NetworkConfig,

    /// Built-in detectors.
    #[validate(nested)]
    #[serde(default)]
    pub plugins: PluginsConfig,

    #[validate(nested)]
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl LuftvaktConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default Values
    /// 2. `config/luftvakt.yaml` - Base settings. If missing, defaults are used.
    /// 3. `config/<LUFTVAKT_ENV>.yaml` - Environment-specific overrides.
    /// 4. `LUFTVAKT_*` environment variables, `__` separating nested keys.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(LuftvaktConfig::default()));

        if Path::new(BASE_FILE).exists() {
            figment = figment.merge(Yaml::file(BASE_FILE));
        }

        let env = std::env::var("LUFTVAKT_ENV").unwrap_or_else(|_| "production".into());
        let env_file = format!("config/{}.yaml", env);
        if Path::new(&env_file).exists() {
            figment = figment.merge(Yaml::file(env_file));
        }

        Self::finish(figment)
    }

    /// Load configuration from a specific file on top of the defaults.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let figment = Figment::from(Serialized::defaults(LuftvaktConfig::default()))
            .merge(Yaml::file(path));
        Self::finish(figment)
    }

    fn finish(figment: Figment) -> Result<Self, ConfigError> {
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn yaml_file(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn full_config_validation() {
        let config = LuftvaktConfig::default();
        config.validate().expect("Default config should validate");
    }

    #[test]
    fn loads_file_over_defaults() {
        let file = yaml_file(
            r#"
core:
  queue:
    capacity: 1024
capture:
  interface: wlan1mon
  buffer_size: 4MiB
network:
  own_macs:
    - "00:11:22:33:44:55"
plugins:
  deauth_flood:
    frames: 5
    window_ms: 200
  ssid_signature:
    patterns: ["pineapple", "free wifi"]
"#,
        );

        let config = LuftvaktConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.core.queue.capacity, 1024);
        assert_eq!(config.core.analysis.idle_backoff_us, 500);
        assert_eq!(config.capture.interface, "wlan1mon");
        assert_eq!(config.capture.buffer_size, 4 * 1024 * 1024);
        assert_eq!(config.network.own_macs, ["00:11:22:33:44:55"]);
        assert_eq!(config.plugins.deauth_flood.frames, 5);
        assert_eq!(config.plugins.deauth_flood.window_ms, 200);
        assert!(config.plugins.ssid_signature.enabled);
        assert_eq!(config.plugins.ssid_signature.patterns.len(), 2);
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn missing_file_is_reported() {
        assert!(matches!(
            LuftvaktConfig::load_from_path("does/not/exist.yaml"),
            Err(ConfigError::FileNotFound(_))
        ));
    }

    #[test]
    fn invalid_mac_fails_validation() {
        let file = yaml_file("network:\n  own_macs: [\"00:11:22\"]\n");
        let err = LuftvaktConfig::load_from_path(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("network.own_macs"));
    }

    #[test]
    fn malformed_yaml_is_a_parsing_error() {
        let file = yaml_file("core: [unclosed\n");
        assert!(matches!(
            LuftvaktConfig::load_from_path(file.path()),
            Err(ConfigError::Parsing(_))
        ));
    }

    #[test]
    fn environment_override() {
        std::env::set_var("LUFTVAKT_CORE__ANALYSIS__PASS_PAUSE_US", "250");
        let config = LuftvaktConfig::load().unwrap();
        std::env::remove_var("LUFTVAKT_CORE__ANALYSIS__PASS_PAUSE_US");
        assert_eq!(config.core.analysis.pass_pause_us, 250);
    }
}
