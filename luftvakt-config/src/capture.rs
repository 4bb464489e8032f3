//! Radio capture configuration for live monitoring.

use serde::{Deserialize, Deserializer, Serialize};
use validator::{self, Validate};

use crate::validation;

/// Frame capture configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct CaptureConfig {
    /// Monitor-mode interface for live capture.
    #[validate(custom(function = validation::validate_interface))]
    #[serde(default = "default_interface")]
    pub interface: String,

    /// Run in promiscuous mode?
    #[serde(default = "default_promiscuous")]
    pub promiscuous: bool,

    /// Capture buffer size in bytes.
    #[validate(range(min = 4096, max = 1073741824))]
    #[serde(default = "default_buffer_size", deserialize_with = "deserialize_size")]
    pub buffer_size: usize,

    /// Read timeout of the capture handle (milliseconds).
    #[validate(range(min = 1, max = 5000))]
    #[serde(default = "default_timeout")]
    pub timeout_ms: u32,
}

fn default_interface() -> String {
    "wlan0mon".into()
}

fn default_promiscuous() -> bool {
    true
}

fn default_buffer_size() -> usize {
    2 * 1024 * 1024
}

fn default_timeout() -> u32 {
    100
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SizeValue {
    Num(usize),
    Str(String),
}

/// Accepts human-friendly sizes (e.g. "2MiB") or plain numbers.
fn deserialize_size<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    match SizeValue::deserialize(deserializer)? {
        SizeValue::Num(n) => Ok(n),
        SizeValue::Str(s) => parse_size(&s).map_err(serde::de::Error::custom),
    }
}

fn parse_size(s: &str) -> Result<usize, String> {
    let s = s.trim();
    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (num_part, unit_part) = s.split_at(split);
    let number: f64 = num_part
        .parse()
        .map_err(|e| format!("Invalid size '{s}': {e}"))?;
    let multiplier = match unit_part.trim().to_lowercase().as_str() {
        "kb" | "kib" => 1024.0,
        "mb" | "mib" => 1024.0 * 1024.0,
        "gb" | "gib" => 1024.0 * 1024.0 * 1024.0,
        "" | "b" => 1.0,
        unit => return Err(format!("Unknown size unit '{unit}'")),
    };
    Ok((number * multiplier) as usize)
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            promiscuous: default_promiscuous(),
            buffer_size: default_buffer_size(),
            timeout_ms: default_timeout(),
        }
    }
}
