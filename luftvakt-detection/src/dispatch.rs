//! ## luftvakt-detection::dispatch
//! **Registration-ordered routing of validated frames to detectors**
//!
//! Admission runs in three stages per detector: the static type and subtype
//! rules, the ownership rule and the detector's own `can_use_frame`. The
//! ownership lookup happens at most once per frame and only when a detector
//! that has passed the static rules asks for it.

use tracing::{trace, warn};

use crate::frame::Frame;
use crate::ownership::OwnershipFilter;
use crate::plugin::Detector;
use crate::state::{Alert, PluginSlot, StepOutcome};

/// What happened to one frame during dispatch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Detectors whose static and ownership rules admitted the frame
    pub admitted: usize,
    /// Detectors that ran a confirmation check
    pub checked: usize,
    /// Alerts in registration order
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Default)]
pub struct Dispatcher {
    slots: Vec<PluginSlot>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a detector; dispatch order is registration order.
    pub fn register(&mut self, detector: Detector) {
        self.slots.push(PluginSlot::new(detector));
    }

    pub fn slots(&self) -> &[PluginSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn dispatch<O>(&mut self, frame: &Frame, own_macs: &O) -> DispatchReport
    where
        O: OwnershipFilter + ?Sized,
    {
        let mut report = DispatchReport::default();
        let mut is_own = None;

        for slot in &mut self.slots {
            let settings = *slot.settings();
            if !settings.admits(frame.frame_type(), frame.subtype()) {
                continue;
            }
            if !settings.need_all_frames
                && !*is_own.get_or_insert_with(|| own_macs.any_own(frame.addresses()))
            {
                continue;
            }
            report.admitted += 1;

            match slot.step(frame) {
                StepOutcome::Detected(alert) => {
                    report.checked += 1;
                    warn!(plugin = %alert.plugin, "{alert}");
                    report.alerts.push(alert);
                }
                StepOutcome::Checked => report.checked += 1,
                outcome => trace!(plugin = slot.name(), ?outcome, "Frame step"),
            }
        }

        report
    }
}

impl FromIterator<Detector> for Dispatcher {
    fn from_iter<T: IntoIterator<Item = Detector>>(iter: T) -> Self {
        Self {
            slots: iter.into_iter().map(PluginSlot::new).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ownership::OwnMacSet;
    use crate::plugin::{FramePlugin, PluginSettings};
    use crate::state::EvidenceBuffer;
    use std::cell::Cell;
    use luftvakt_core::mac::MacAddr;
    use luftvakt_protocols::builder::FrameBuilder;
    use luftvakt_protocols::ieee80211::{subtype, FrameType};
    use luftvakt_protocols::{HeaderParser, Ieee80211Parser};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tracing_test::traced_test;

    const AP: MacAddr = MacAddr([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    const STA: MacAddr = MacAddr([0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb]);
    const STRANGER: MacAddr = MacAddr([0x02, 0xde, 0xad, 0xbe, 0xef, 0x01]);

    type Log = Arc<Mutex<Vec<String>>>;

    /// Single-frame detector that records every hook call.
    struct Recorder {
        name: &'static str,
        settings: PluginSettings,
        accept: bool,
        attacked: bool,
        log: Log,
    }

    impl Recorder {
        fn new(name: &'static str, settings: PluginSettings, log: &Log) -> Self {
            Self {
                name,
                settings,
                accept: true,
                attacked: false,
                log: log.clone(),
            }
        }
    }

    impl FramePlugin for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn settings(&self) -> PluginSettings {
            self.settings
        }

        fn can_use_frame(&self, _frame: &Frame) -> bool {
            self.log.lock().push(format!("{}:can_use", self.name));
            self.accept
        }

        fn is_attacked(&mut self, evidence: &EvidenceBuffer) -> bool {
            self.log
                .lock()
                .push(format!("{}:check({})", self.name, evidence.len()));
            self.attacked
        }

        fn attack_details(&self) -> Option<String> {
            Some(format!("{} details", self.name))
        }

        fn clear_attack(&mut self) {
            self.log.lock().push(format!("{}:clear", self.name));
        }
    }

    fn beacon(from: MacAddr) -> Frame {
        let captured = FrameBuilder::management(subtype::BEACON)
            .addr1(MacAddr::BROADCAST)
            .addr2(from)
            .addr3(from)
            .body(vec![0u8; 12])
            .build(0);
        let header = Ieee80211Parser.parse(&captured).unwrap();
        Frame::new(captured, header)
    }

    /// Own-MAC set that counts how often dispatch consults it.
    #[derive(Default)]
    struct CountingFilter {
        own: OwnMacSet,
        lookups: Cell<usize>,
    }

    impl OwnershipFilter for CountingFilter {
        fn is_own(&self, mac: &MacAddr) -> bool {
            self.own.is_own(mac)
        }

        fn any_own(&self, addresses: &[Option<MacAddr>; 4]) -> bool {
            self.lookups.set(self.lookups.get() + 1);
            self.own.any_own(addresses)
        }
    }

    fn counting() -> CountingFilter {
        CountingFilter {
            own: own(),
            ..Default::default()
        }
    }

    fn own() -> OwnMacSet {
        [AP].into_iter().collect()
    }

    fn all_frames() -> PluginSettings {
        PluginSettings {
            need_all_frames: true,
            ..Default::default()
        }
    }

    #[test]
    fn static_rules_skip_mismatched_plugins() {
        let log = Log::default();
        let mut dispatcher: Dispatcher = [
            Detector::single_frame(Recorder::new(
                "control",
                PluginSettings {
                    frame_type: Some(FrameType::Control),
                    ..all_frames()
                },
                &log,
            )),
            Detector::single_frame(Recorder::new(
                "probe_request",
                PluginSettings {
                    frame_type: Some(FrameType::Management),
                    frame_subtype: Some(subtype::PROBE_REQUEST),
                    ..all_frames()
                },
                &log,
            )),
            Detector::single_frame(Recorder::new(
                "beacon",
                PluginSettings {
                    frame_type: Some(FrameType::Management),
                    frame_subtype: Some(subtype::BEACON),
                    ..all_frames()
                },
                &log,
            )),
        ]
        .into_iter()
        .collect();

        let report = dispatcher.dispatch(&beacon(STRANGER), &own());
        assert_eq!(report.admitted, 1);
        assert_eq!(
            *log.lock(),
            ["beacon:can_use", "beacon:check(1)", "beacon:clear"]
        );
    }

    #[test]
    fn ownership_rule_filters_foreign_frames() {
        let log = Log::default();
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(Detector::single_frame(Recorder::new(
            "ours",
            PluginSettings::default(),
            &log,
        )));
        dispatcher.register(Detector::single_frame(Recorder::new(
            "all",
            all_frames(),
            &log,
        )));

        let report = dispatcher.dispatch(&beacon(STRANGER), &own());
        assert_eq!(report.admitted, 1);
        assert!(log.lock().iter().all(|line| line.starts_with("all:")));

        log.lock().clear();
        let report = dispatcher.dispatch(&beacon(AP), &own());
        assert_eq!(report.admitted, 2);
        assert_eq!(log.lock()[0], "ours:can_use");
    }

    #[test]
    fn any_address_field_counts_as_ours() {
        let log = Log::default();
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(Detector::single_frame(Recorder::new(
            "ours",
            PluginSettings::default(),
            &log,
        )));
        let captured = FrameBuilder::data(subtype::DATA)
            .flags(0x03)
            .addr1(STRANGER)
            .addr2(STA)
            .addr3(STRANGER)
            .addr4(AP)
            .build(0);
        let header = Ieee80211Parser.parse(&captured).unwrap();
        let report = dispatcher.dispatch(&Frame::new(captured, header), &own());
        assert_eq!(report.admitted, 1);
    }

    #[test]
    fn declined_frame_is_not_checked() {
        let log = Log::default();
        let mut recorder = Recorder::new("picky", all_frames(), &log);
        recorder.accept = false;
        let mut dispatcher: Dispatcher = [Detector::single_frame(recorder)].into_iter().collect();

        let report = dispatcher.dispatch(&beacon(AP), &own());
        assert_eq!(report.admitted, 1);
        assert_eq!(report.checked, 0);
        assert_eq!(*log.lock(), ["picky:can_use"]);
        assert!(dispatcher.slots()[0].evidence().is_empty());
    }

    #[test]
    fn single_frame_plugin_checks_and_clears_every_frame() {
        let log = Log::default();
        let mut dispatcher: Dispatcher = [Detector::single_frame(Recorder::new(
            "single",
            all_frames(),
            &log,
        ))]
        .into_iter()
        .collect();

        for _ in 0..3 {
            let report = dispatcher.dispatch(&beacon(STRANGER), &own());
            assert_eq!(report.checked, 1);
            assert!(report.alerts.is_empty());
            assert!(dispatcher.slots()[0].evidence().is_empty());
        }
        let log = log.lock();
        assert_eq!(log.iter().filter(|l| l.ends_with(":check(1)")).count(), 3);
        assert_eq!(log.iter().filter(|l| l.ends_with(":clear")).count(), 3);
    }

    #[traced_test]
    #[test]
    fn alerts_follow_registration_order() {
        let log = Log::default();
        let mut dispatcher = Dispatcher::new();
        for name in ["first", "second", "third"] {
            let mut recorder = Recorder::new(name, all_frames(), &log);
            recorder.attacked = name != "second";
            dispatcher.register(Detector::single_frame(recorder));
        }

        let report = dispatcher.dispatch(&beacon(STRANGER), &own());
        let lines: Vec<String> = report.alerts.iter().map(ToString::to_string).collect();
        assert_eq!(lines, ["first - first details", "third - third details"]);
        assert!(logs_contain("first - first details"));
        assert!(logs_contain("third - third details"));
        assert!(!logs_contain("second - second details"));

        let order: Vec<String> = log
            .lock()
            .iter()
            .filter(|l| l.ends_with(":can_use"))
            .cloned()
            .collect();
        assert_eq!(order, ["first:can_use", "second:can_use", "third:can_use"]);
    }

    #[test]
    fn ownership_lookup_runs_once_per_frame() {
        let log = Log::default();
        let mut dispatcher: Dispatcher = ["a", "b", "c"]
            .into_iter()
            .map(|name| Detector::single_frame(Recorder::new(name, PluginSettings::default(), &log)))
            .collect();

        let filter = counting();
        let report = dispatcher.dispatch(&beacon(AP), &filter);
        assert_eq!(report.admitted, 3);
        assert_eq!(filter.lookups.get(), 1);

        let report = dispatcher.dispatch(&beacon(STRANGER), &filter);
        assert_eq!(report.admitted, 0);
        assert_eq!(filter.lookups.get(), 2);
    }

    #[test]
    fn ownership_lookup_skipped_when_every_plugin_needs_all_frames() {
        let log = Log::default();
        let mut dispatcher: Dispatcher = ["a", "b"]
            .into_iter()
            .map(|name| Detector::single_frame(Recorder::new(name, all_frames(), &log)))
            .collect();

        let filter = counting();
        let report = dispatcher.dispatch(&beacon(AP), &filter);
        assert_eq!(report.admitted, 2);
        assert_eq!(filter.lookups.get(), 0);
    }

    #[test]
    fn ownership_lookup_skipped_when_static_rules_reject() {
        let log = Log::default();
        let control_only = PluginSettings {
            frame_type: Some(FrameType::Control),
            ..Default::default()
        };
        let deauth_only = PluginSettings {
            frame_type: Some(FrameType::Management),
            frame_subtype: Some(subtype::DEAUTHENTICATION),
            ..Default::default()
        };
        let mut dispatcher: Dispatcher = [
            Detector::single_frame(Recorder::new("control", control_only, &log)),
            Detector::single_frame(Recorder::new("deauth", deauth_only, &log)),
        ]
        .into_iter()
        .collect();

        let filter = counting();
        let report = dispatcher.dispatch(&beacon(AP), &filter);
        assert_eq!(report.admitted, 0);
        assert_eq!(filter.lookups.get(), 0);
        assert!(log.lock().is_empty());
    }
}
