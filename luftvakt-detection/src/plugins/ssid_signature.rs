//! Rogue access point detection by advertised SSID.

use std::sync::Arc;

use luftvakt_protocols::ieee80211::{subtype, FrameType};
use luftvakt_protocols::management;

use crate::frame::Frame;
use crate::plugin::{FramePlugin, PluginSettings};
use crate::signatures::SignatureEngine;
use crate::state::EvidenceBuffer;

pub const NAME: &str = "SSID signature";

/// Matches the SSID of every beacon and probe response against known rogue
/// network names.
pub struct SsidSignaturePlugin {
    engine: Arc<SignatureEngine>,
    details: Option<String>,
}

impl SsidSignaturePlugin {
    pub fn new(engine: Arc<SignatureEngine>) -> Self {
        Self {
            engine,
            details: None,
        }
    }

    pub fn engine(&self) -> &Arc<SignatureEngine> {
        &self.engine
    }
}

impl FramePlugin for SsidSignaturePlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn settings(&self) -> PluginSettings {
        PluginSettings {
            frame_type: Some(FrameType::Management),
            frame_subtype: None,
            need_all_frames: true,
            require_raw_frame: true,
        }
    }

    fn can_use_frame(&self, frame: &Frame) -> bool {
        matches!(
            frame.subtype(),
            subtype::BEACON | subtype::PROBE_RESPONSE
        )
    }

    fn is_attacked(&mut self, evidence: &EvidenceBuffer) -> bool {
        for frame in evidence.iter() {
            let Some(ssid) = frame.body().and_then(management::ssid) else {
                continue;
            };
            let Some(&index) = self.engine.buffer_scan(ssid).first() else {
                continue;
            };

            let pattern = self.engine.pattern(index).unwrap_or_default();
            let source = frame
                .header
                .addr2()
                .map_or_else(|| "unknown".to_string(), |mac| mac.to_string());
            self.details = Some(format!(
                "Rogue access point {} advertising SSID \"{}\" (signature \"{}\")",
                source,
                String::from_utf8_lossy(ssid),
                pattern
            ));
            return true;
        }
        false
    }

    fn attack_details(&self) -> Option<String> {
        self.details.clone()
    }

    fn clear_attack(&mut self) {
        self.details = None;
    }
}
