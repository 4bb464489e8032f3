//! ## luftvakt-detection::plugin
//! **Capability interface implemented by every detector**
//!
//! Single-frame detectors judge each admitted frame on its own. Stateful
//! detectors additionally report whether an attack is developing, and the
//! count and time windows their evidence must satisfy before a check.

use std::num::NonZeroUsize;
use std::time::Duration;

use luftvakt_protocols::ieee80211::FrameType;

use crate::frame::Frame;
use crate::state::EvidenceBuffer;

/// Static admission rules. `None` matches any value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PluginSettings {
    pub frame_type: Option<FrameType>,
    pub frame_subtype: Option<u8>,
    /// Inspect frames regardless of whether they involve our own addresses.
    pub need_all_frames: bool,
    /// Keep the raw capture in evidence copies, not only the parsed header.
    pub require_raw_frame: bool,
}

impl PluginSettings {
    /// Type and subtype admission.
    pub fn admits(&self, frame_type: FrameType, subtype: u8) -> bool {
        self.frame_type.map_or(true, |t| t == frame_type)
            && self.frame_subtype.map_or(true, |s| s == subtype)
    }
}

pub trait FramePlugin: Send {
    fn name(&self) -> &str;

    fn settings(&self) -> PluginSettings;

    /// Dynamic admission, evaluated after the static rules.
    fn can_use_frame(&self, frame: &Frame) -> bool;

    /// Judges the buffered evidence.
    fn is_attacked(&mut self, evidence: &EvidenceBuffer) -> bool;

    /// Human readable description of the last positive check.
    fn attack_details(&self) -> Option<String>;

    /// Resets plugin-private state after a resolved check.
    fn clear_attack(&mut self);
}

pub trait StatefulPlugin: FramePlugin {
    /// Whether an attack is still, or now, in progress.
    fn analyze(&mut self, frame: &Frame) -> bool;

    /// Count window queried when an attack becomes suspected.
    fn frames_before_analysis(&self) -> Option<NonZeroUsize> {
        None
    }

    /// Time window queried when an attack becomes suspected.
    fn time_before_analysis(&self) -> Option<Duration> {
        None
    }
}

/// A registered detector and its detection mode.
pub enum Detector {
    SingleFrame(Box<dyn FramePlugin>),
    Stateful(Box<dyn StatefulPlugin>),
}

impl Detector {
    pub fn single_frame(plugin: impl FramePlugin + 'static) -> Self {
        Detector::SingleFrame(Box::new(plugin))
    }

    pub fn stateful(plugin: impl StatefulPlugin + 'static) -> Self {
        Detector::Stateful(Box::new(plugin))
    }

    pub fn name(&self) -> &str {
        match self {
            Detector::SingleFrame(plugin) => plugin.name(),
            Detector::Stateful(plugin) => plugin.name(),
        }
    }

    pub fn settings(&self) -> PluginSettings {
        match self {
            Detector::SingleFrame(plugin) => plugin.settings(),
            Detector::Stateful(plugin) => plugin.settings(),
        }
    }

    pub fn is_single_frame(&self) -> bool {
        matches!(self, Detector::SingleFrame(_))
    }
}

impl std::fmt::Debug for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = if self.is_single_frame() {
            "SingleFrame"
        } else {
            "Stateful"
        };
        f.debug_tuple(mode).field(&self.name()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcards_admit_everything() {
        let settings = PluginSettings::default();
        assert!(settings.admits(FrameType::Management, 12));
        assert!(settings.admits(FrameType::Data, 0));
    }

    #[test]
    fn type_and_subtype_must_both_match() {
        let settings = PluginSettings {
            frame_type: Some(FrameType::Management),
            frame_subtype: Some(12),
            ..Default::default()
        };
        assert!(settings.admits(FrameType::Management, 12));
        assert!(!settings.admits(FrameType::Management, 10));
        assert!(!settings.admits(FrameType::Control, 12));
    }

    #[test]
    fn subtype_wildcard_with_fixed_type() {
        let settings = PluginSettings {
            frame_type: Some(FrameType::Control),
            ..Default::default()
        };
        assert!(settings.admits(FrameType::Control, 11));
        assert!(!settings.admits(FrameType::Data, 11));
    }
}
