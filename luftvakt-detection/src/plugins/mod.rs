//! Built-in detectors.

pub mod deauth_flood;
pub mod ssid_signature;

pub use deauth_flood::{DeauthFloodPlugin, DeauthFloodSettings};
pub use ssid_signature::SsidSignaturePlugin;
