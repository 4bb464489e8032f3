//! Deauthentication flood detection against our own infrastructure.
//!
//! An attack is suspected from the first deauthentication frame and stays
//! suspected while consecutive frames arrive within the window. Confirmation
//! requires `frames` deauthentications within `window`.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::time::Duration;

use luftvakt_core::mac::MacAddr;
use luftvakt_protocols::ieee80211::{subtype, FrameType};
use luftvakt_protocols::management;

use crate::frame::Frame;
use crate::plugin::{FramePlugin, PluginSettings, StatefulPlugin};
use crate::state::EvidenceBuffer;

pub const NAME: &str = "Deauthentication flood";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeauthFloodSettings {
    pub frames: NonZeroUsize,
    pub window: Duration,
}

impl Default for DeauthFloodSettings {
    fn default() -> Self {
        Self {
            frames: NonZeroUsize::new(10).unwrap_or(NonZeroUsize::MIN),
            window: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Default)]
pub struct DeauthFloodPlugin {
    settings: DeauthFloodSettings,
    last_seen: Option<u64>,
    last_reason: Option<u16>,
    details: Option<String>,
}

impl DeauthFloodPlugin {
    pub fn new(settings: DeauthFloodSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }
}

impl FramePlugin for DeauthFloodPlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn settings(&self) -> PluginSettings {
        PluginSettings {
            frame_type: Some(FrameType::Management),
            frame_subtype: Some(subtype::DEAUTHENTICATION),
            need_all_frames: false,
            require_raw_frame: false,
        }
    }

    fn can_use_frame(&self, frame: &Frame) -> bool {
        frame.header.addr2().is_some()
    }

    fn is_attacked(&mut self, evidence: &EvidenceBuffer) -> bool {
        // (count, first position) per BSSID; ties go to the earliest seen
        let mut per_bssid: HashMap<MacAddr, (usize, usize)> = HashMap::new();
        for (position, frame) in evidence.iter().enumerate() {
            if let Some(bssid) = frame.header.bssid() {
                per_bssid.entry(bssid).or_insert((0, position)).0 += 1;
            }
        }
        let Some((bssid, _)) = per_bssid
            .into_iter()
            .max_by_key(|&(_, (count, first))| (count, Reverse(first)))
        else {
            return false;
        };

        let now = evidence.newest().map_or(0, |f| f.timestamp);
        let mut details = format!(
            "Deauthentication flood: {} frames in {} ms targeting BSSID {}",
            evidence.len(),
            evidence.span_ms(now),
            bssid
        );
        if let Some(reason) = self.last_reason {
            details.push_str(&format!(" (reason {reason})"));
        }
        self.details = Some(details);
        true
    }

    fn attack_details(&self) -> Option<String> {
        self.details.clone()
    }

    fn clear_attack(&mut self) {
        self.details = None;
        self.last_seen = None;
        self.last_reason = None;
    }
}

impl StatefulPlugin for DeauthFloodPlugin {
    fn analyze(&mut self, frame: &Frame) -> bool {
        let now = frame.timestamp();
        let window_ns = u64::try_from(self.settings.window.as_nanos()).unwrap_or(u64::MAX);
        let in_progress = self
            .last_seen
            .map_or(true, |last| now.saturating_sub(last) <= window_ns);
        self.last_seen = Some(now);
        self.last_reason = management::reason_code(frame.body());
        in_progress
    }

    fn frames_before_analysis(&self) -> Option<NonZeroUsize> {
        Some(self.settings.frames)
    }

    fn time_before_analysis(&self) -> Option<Duration> {
        Some(self.settings.window)
    }
}
