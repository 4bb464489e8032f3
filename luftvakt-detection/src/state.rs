//! ## luftvakt-detection::state
//! **Per-plugin attack state machine**
//!
//! A stateful detector is `Idle` until its `analyze` hook reports a
//! developing attack. The slot then captures the detector's count and time
//! windows and becomes `Suspected`, buffering a copy of every admitted frame.
//! Each frame evicts evidence outside the active window and decides whether
//! the confirmation check runs. A positive check raises an [`Alert`] and
//! returns the slot to `Idle`; `analyze` reporting the attack is over aborts
//! the episode without an alert.
//!
//! Single-frame detectors have no state: every admitted frame is buffered,
//! checked and cleared.

use std::collections::VecDeque;
use std::fmt;
use std::num::NonZeroUsize;
use std::time::Duration;

use crate::frame::{EvidenceFrame, Frame};
use crate::plugin::{Detector, FramePlugin, PluginSettings};

const NANOS_PER_MILLI: u64 = 1_000_000;

/// Windows captured when an episode starts. `None` means inactive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnalysisWindow {
    pub frames: Option<NonZeroUsize>,
    pub time: Option<Duration>,
}

impl AnalysisWindow {
    pub fn new(frames: Option<NonZeroUsize>, time: Option<Duration>) -> Self {
        Self {
            frames,
            time: time.filter(|t| !t.is_zero()),
        }
    }

    /// The time window, when active, takes precedence over the count window.
    ///
    /// Time eviction keeps frames at most `time` whole milliseconds old, so a
    /// time-only window confirms only when a frame lands exactly `time` ms
    /// after the oldest one kept. Sparse evidence never reaches the check;
    /// detectors expecting it should also set a count window.
    pub fn evict(&self, evidence: &mut EvidenceBuffer, now: u64) {
        if let Some(time) = self.time {
            evidence.evict_older_than(now, time);
        } else if let Some(frames) = self.frames {
            evidence.retain_last(frames.get());
        }
    }

    /// Whether the confirmation check runs for the frame captured at `now`.
    pub fn is_due(&self, evidence: &EvidenceBuffer, now: u64) -> bool {
        match (self.frames, self.time) {
            (None, None) => true,
            (Some(frames), Some(time)) => {
                evidence.len() >= frames.get() && evidence.span_ms(now) <= millis(time)
            }
            (Some(frames), None) => evidence.len() >= frames.get(),
            (None, Some(time)) => evidence.span_ms(now) >= millis(time),
        }
    }
}

#[inline]
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AttackState {
    #[default]
    Idle,
    Suspected(AnalysisWindow),
}

/// Insertion-ordered evidence, oldest first.
#[derive(Clone, Debug, Default)]
pub struct EvidenceBuffer {
    frames: VecDeque<EvidenceFrame>,
}

impl EvidenceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: EvidenceFrame) {
        self.frames.push_back(frame);
    }

    /// Drops frames whose age relative to `now`, in whole milliseconds, is
    /// greater than `window`.
    pub fn evict_older_than(&mut self, now: u64, window: Duration) {
        let window = millis(window);
        while let Some(oldest) = self.frames.front() {
            if now.saturating_sub(oldest.timestamp) / NANOS_PER_MILLI > window {
                self.frames.pop_front();
            } else {
                break;
            }
        }
    }

    /// Keeps only the `count` most recent frames.
    pub fn retain_last(&mut self, count: usize) {
        let excess = self.frames.len().saturating_sub(count);
        self.frames.drain(..excess);
    }

    /// Whole milliseconds between the oldest buffered frame and `now`.
    pub fn span_ms(&self, now: u64) -> u64 {
        self.frames
            .front()
            .map_or(0, |oldest| now.saturating_sub(oldest.timestamp) / NANOS_PER_MILLI)
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn oldest(&self) -> Option<&EvidenceFrame> {
        self.frames.front()
    }

    pub fn newest(&self) -> Option<&EvidenceFrame> {
        self.frames.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EvidenceFrame> {
        self.frames.iter()
    }
}

/// Security alert raised by a positive confirmation check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alert {
    pub plugin: String,
    pub details: Option<String>,
    /// Evidence frames the check ran over
    pub evidence_len: usize,
    /// Capture timestamp of the frame that triggered the check
    pub timestamp: u64,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            Some(details) => write!(f, "{} - {}", self.plugin, details),
            None => write!(
                f,
                "{} - Currently attacked. Plugin did not provide details.",
                self.plugin
            ),
        }
    }
}

/// Result of feeding one frame to a slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// `can_use_frame` declined the frame.
    Skipped,
    /// Stateful detector saw nothing suspicious.
    Idle,
    /// A suspected attack stopped developing; evidence discarded.
    Aborted,
    /// Evidence buffered, confirmation check not due.
    Accumulating,
    /// Confirmation check ran and found no attack.
    Checked,
    Detected(Alert),
}

/// A registered detector with its state and evidence.
#[derive(Debug)]
pub struct PluginSlot {
    detector: Detector,
    settings: PluginSettings,
    state: AttackState,
    evidence: EvidenceBuffer,
}

impl PluginSlot {
    pub fn new(detector: Detector) -> Self {
        let settings = detector.settings();
        Self {
            detector,
            settings,
            state: AttackState::Idle,
            evidence: EvidenceBuffer::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.detector.name()
    }

    pub fn settings(&self) -> &PluginSettings {
        &self.settings
    }

    pub fn state(&self) -> AttackState {
        self.state
    }

    pub fn evidence(&self) -> &EvidenceBuffer {
        &self.evidence
    }

    /// Runs dynamic admission and one state machine transition for `frame`.
    pub fn step(&mut self, frame: &Frame) -> StepOutcome {
        let keep_raw = self.settings.require_raw_frame;
        let now = frame.timestamp();

        match &mut self.detector {
            Detector::SingleFrame(plugin) => {
                if !plugin.can_use_frame(frame) {
                    return StepOutcome::Skipped;
                }
                self.evidence.push(frame.evidence(keep_raw));
                let outcome = resolve(plugin.as_mut(), &self.evidence, now);
                plugin.clear_attack();
                self.evidence.clear();
                outcome
            }
            Detector::Stateful(plugin) => {
                if !plugin.can_use_frame(frame) {
                    return StepOutcome::Skipped;
                }

                let in_progress = plugin.analyze(frame);
                let window = match (self.state, in_progress) {
                    (AttackState::Idle, false) => return StepOutcome::Idle,
                    (AttackState::Suspected(_), false) => {
                        self.state = AttackState::Idle;
                        self.evidence.clear();
                        return StepOutcome::Aborted;
                    }
                    (AttackState::Idle, true) => {
                        let window = AnalysisWindow::new(
                            plugin.frames_before_analysis(),
                            plugin.time_before_analysis(),
                        );
                        self.state = AttackState::Suspected(window);
                        window
                    }
                    (AttackState::Suspected(window), true) => window,
                };

                self.evidence.push(frame.evidence(keep_raw));
                window.evict(&mut self.evidence, now);
                if !window.is_due(&self.evidence, now) {
                    return StepOutcome::Accumulating;
                }

                let outcome = resolve(plugin.as_mut(), &self.evidence, now);
                if matches!(outcome, StepOutcome::Detected(_)) {
                    plugin.clear_attack();
                    self.evidence.clear();
                    self.state = AttackState::Idle;
                }
                outcome
            }
        }
    }
}

fn resolve<P: FramePlugin + ?Sized>(
    plugin: &mut P,
    evidence: &EvidenceBuffer,
    now: u64,
) -> StepOutcome {
    if !plugin.is_attacked(evidence) {
        return StepOutcome::Checked;
    }
    StepOutcome::Detected(Alert {
        plugin: plugin.name().to_string(),
        details: plugin.attack_details().filter(|d| !d.is_empty()),
        evidence_len: evidence.len(),
        timestamp: now,
    })
}
