//! Custom validation functions for configuration.
//!
//! Provides shared validation logic used across multiple configuration modules.

use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

static MAC_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new("^([0-9A-Fa-f]{2}[:-]){5}[0-9A-Fa-f]{2}$").ok());

static LOG_LEVEL_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new("^(?i)(trace|debug|info|warn|error|off)$").ok());

/// Validate that an interface name follows Linux naming conventions.
pub fn validate_interface(name: &str) -> Result<(), ValidationError> {
    let valid = !name.is_empty()
        && name.len() <= 15
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.');

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_interface"))
    }
}

/// Validate that every entry is a colon or dash separated hardware address.
pub fn validate_mac_list(macs: &[String]) -> Result<(), ValidationError> {
    let re = MAC_RE
        .as_ref()
        .ok_or_else(|| ValidationError::new("invalid_regex"))?;
    if macs.iter().all(|mac| re.is_match(mac.trim())) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_mac_address"))
    }
}

/// Validate that signature patterns are non-empty.
pub fn validate_patterns(patterns: &[String]) -> Result<(), ValidationError> {
    if patterns.iter().any(|p| p.is_empty()) {
        return Err(ValidationError::new("empty_pattern"));
    }
    Ok(())
}

/// Validate a tracing level name.
pub fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let re = LOG_LEVEL_RE
        .as_ref()
        .ok_or_else(|| ValidationError::new("invalid_regex"))?;
    if re.is_match(level) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_log_level"))
    }
}
