//! ## luftvakt-engine::analysis
//! **Frame analysis worker**
//!
//! One blocking worker owns the validator, the dispatcher and every plugin's
//! evidence. It sweeps the intake queue, validates each frame and dispatches
//! it fully before looking at the next one. Stop requests are honoured
//! between passes only.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::{spawn_blocking, JoinHandle};
use tracing::{debug, info, trace, warn};

use luftvakt_config::AnalysisConfig;
use luftvakt_core::frame::CapturedFrame;
use luftvakt_core::queue::FrameQueue;
use luftvakt_detection::{Alert, DispatchReport, Dispatcher, OwnMacSet};
use luftvakt_telemetry::MetricsRecorder;

use crate::error::EngineError;
use crate::intake::{FrameRejection, FrameValidator};

/// Process-wide shutdown flag.
#[derive(Clone, Debug, Default)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// The raw flag, for capture loops that poll an `AtomicBool`.
    pub fn flag(&self) -> &AtomicBool {
        &self.0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnalysisStats {
    pub frames_received: u64,
    pub frames_dropped: u64,
    pub frames_dispatched: u64,
    pub alerts: u64,
    pub passes: u64,
}

/// Validation and dispatch state owned by the analysis worker.
pub struct FrameAnalyzer {
    validator: FrameValidator,
    own_macs: OwnMacSet,
    dispatcher: Dispatcher,
    metrics: Arc<MetricsRecorder>,
    log_fcs_mismatch: bool,
    stats: AnalysisStats,
}

impl FrameAnalyzer {
    pub fn new(own_macs: OwnMacSet, dispatcher: Dispatcher, metrics: Arc<MetricsRecorder>) -> Self {
        Self {
            validator: FrameValidator::new(),
            own_macs,
            dispatcher,
            metrics,
            log_fcs_mismatch: false,
            stats: AnalysisStats::default(),
        }
    }

    /// Log FCS mismatches instead of dropping them silently.
    pub fn log_fcs_mismatch(mut self, enabled: bool) -> Self {
        self.log_fcs_mismatch = enabled;
        self
    }

    pub fn stats(&self) -> AnalysisStats {
        self.stats
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Processes one working list in capture order.
    pub fn process_pass(&mut self, frames: Vec<CapturedFrame>) -> Vec<Alert> {
        self.stats.passes += 1;
        let mut alerts = Vec::new();
        for frame in frames {
            if let Some(report) = self.process_frame(frame) {
                alerts.extend(report.alerts);
            }
        }
        alerts
    }

    /// Validates and dispatches one frame. Returns `None` when it was dropped.
    pub fn process_frame(&mut self, captured: CapturedFrame) -> Option<DispatchReport> {
        self.stats.frames_received += 1;
        self.metrics.inc_frames_received();

        let frame = match self.validator.validate(captured) {
            Ok(frame) => frame,
            Err(rejection) => {
                self.reject(&rejection);
                return None;
            }
        };

        let started = Instant::now();
        let report = self.dispatcher.dispatch(&frame, &self.own_macs);
        self.metrics
            .observe_dispatch_latency(u64::try_from(started.elapsed().as_nanos()).unwrap_or(u64::MAX));

        self.stats.frames_dispatched += 1;
        for alert in &report.alerts {
            self.stats.alerts += 1;
            self.metrics.inc_alerts(&alert.plugin);
        }
        trace!(admitted = report.admitted, checked = report.checked, "Frame dispatched");
        Some(report)
    }

    fn reject(&mut self, rejection: &FrameRejection) {
        self.stats.frames_dropped += 1;
        self.metrics.inc_frames_dropped(rejection.reason());
        match rejection {
            FrameRejection::TooShort { .. } | FrameRejection::InvalidProtocolVersion { .. } => {
                warn!("{rejection}")
            }
            FrameRejection::FcsMismatch(_) if self.log_fcs_mismatch => debug!("{rejection}"),
            FrameRejection::FcsMismatch(_) => {}
            FrameRejection::Malformed(_) => debug!("{rejection}"),
        }
    }
}

/// Poll loop timing.
#[derive(Clone, Copy, Debug)]
pub struct PollSettings {
    pub drain_batch: usize,
    pub idle_backoff: Duration,
    pub pass_pause: Duration,
}

impl From<&AnalysisConfig> for PollSettings {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            drain_batch: config.drain_batch,
            idle_backoff: config.idle_backoff(),
            pass_pause: config.pass_pause(),
        }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self::from(&AnalysisConfig::default())
    }
}

pub struct AnalysisTask;

impl AnalysisTask {
    /// Starts the worker on the blocking pool. Must be called from within a
    /// Tokio runtime.
    pub fn spawn(
        analyzer: FrameAnalyzer,
        queue: Arc<FrameQueue>,
        shutdown: ShutdownSignal,
        settings: PollSettings,
    ) -> AnalysisHandle {
        let stop = Arc::new(AtomicBool::new(false));
        let started = Arc::new(AtomicBool::new(false));
        let (stopped_tx, stopped_rx) = watch::channel(false);

        let join = spawn_blocking({
            let stop = stop.clone();
            let started = started.clone();
            // Owned by the closure so a worker dropped unrun still reports stopped.
            let stopped = StoppedGuard(stopped_tx);
            move || {
                let _stopped = stopped;
                started.store(true, Ordering::SeqCst);
                run_loop(analyzer, &queue, &stop, &shutdown, settings)
            }
        });

        AnalysisHandle {
            stop,
            started,
            stopped: stopped_rx,
            join,
        }
    }
}

/// Marks the task stopped when the worker exits, unwinding included, or when
/// the runtime drops the worker before it ran.
struct StoppedGuard(watch::Sender<bool>);

impl Drop for StoppedGuard {
    fn drop(&mut self) {
        self.0.send_replace(true);
    }
}

fn run_loop(
    mut analyzer: FrameAnalyzer,
    queue: &FrameQueue,
    stop: &AtomicBool,
    shutdown: &ShutdownSignal,
    settings: PollSettings,
) -> FrameAnalyzer {
    info!(plugins = analyzer.dispatcher.len(), "Frame analysis started");

    while !stop.load(Ordering::SeqCst) && !shutdown.is_triggered() {
        if queue.is_empty() {
            std::thread::sleep(settings.idle_backoff);
            continue;
        }

        let frames = queue.drain(settings.drain_batch);
        if frames.is_empty() {
            std::thread::sleep(settings.idle_backoff);
            continue;
        }

        analyzer.process_pass(frames);
        std::thread::sleep(settings.pass_pause);
    }

    info!(stats = ?analyzer.stats, "Frame analysis stopped");
    analyzer
}

/// Control handle of a running analysis task.
pub struct AnalysisHandle {
    stop: Arc<AtomicBool>,
    started: Arc<AtomicBool>,
    stopped: watch::Receiver<bool>,
    join: JoinHandle<FrameAnalyzer>,
}

impl AnalysisHandle {
    /// Requests a stop; the current pass completes first.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        *self.stopped.borrow()
    }

    /// Resolves once the worker has exited or was discarded unrun.
    pub async fn stopped(&self) {
        let mut stopped = self.stopped.clone();
        // The guard always publishes `true` before the sender goes away.
        let _ = stopped.wait_for(|stopped| *stopped).await;
    }

    /// Waits for the worker and hands back its analyzer.
    pub async fn join(self) -> Result<FrameAnalyzer, EngineError> {
        Ok(self.join.await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use luftvakt_core::mac::MacAddr;
    use luftvakt_detection::state::EvidenceBuffer;
    use luftvakt_detection::{Detector, Frame, FramePlugin, PluginSettings};
    use luftvakt_protocols::builder::FrameBuilder;
    use luftvakt_protocols::ieee80211::subtype;
    use std::sync::atomic::AtomicUsize;
    use tracing_test::traced_test;

    const AP: MacAddr = MacAddr([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);

    /// Single-frame detector flagging every frame it can use.
    struct Tripwire {
        can_use_calls: Arc<AtomicUsize>,
    }

    impl FramePlugin for Tripwire {
        fn name(&self) -> &str {
            "tripwire"
        }

        fn settings(&self) -> PluginSettings {
            PluginSettings {
                need_all_frames: true,
                ..Default::default()
            }
        }

        fn can_use_frame(&self, _frame: &Frame) -> bool {
            self.can_use_calls.fetch_add(1, Ordering::SeqCst);
            true
        }

        fn is_attacked(&mut self, _evidence: &EvidenceBuffer) -> bool {
            true
        }

        fn attack_details(&self) -> Option<String> {
            Some("tripped".into())
        }

        fn clear_attack(&mut self) {}
    }

    /// Single-frame detector whose confirmation check panics.
    struct Faulty;

    impl FramePlugin for Faulty {
        fn name(&self) -> &str {
            "faulty"
        }

        fn settings(&self) -> PluginSettings {
            PluginSettings {
                need_all_frames: true,
                ..Default::default()
            }
        }

        fn can_use_frame(&self, _frame: &Frame) -> bool {
            true
        }

        fn is_attacked(&mut self, _evidence: &EvidenceBuffer) -> bool {
            panic!("detector fault")
        }

        fn attack_details(&self) -> Option<String> {
            None
        }

        fn clear_attack(&mut self) {}
    }

    fn analyzer() -> (FrameAnalyzer, Arc<AtomicUsize>, Arc<MetricsRecorder>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let metrics = Arc::new(MetricsRecorder::new().unwrap());
        let dispatcher: Dispatcher = [Detector::single_frame(Tripwire {
            can_use_calls: calls.clone(),
        })]
        .into_iter()
        .collect();
        let analyzer = FrameAnalyzer::new(OwnMacSet::new(), dispatcher, metrics.clone());
        (analyzer, calls, metrics)
    }

    fn beacon() -> FrameBuilder {
        FrameBuilder::management(subtype::BEACON)
            .addr1(MacAddr::BROADCAST)
            .addr2(AP)
            .addr3(AP)
    }

    fn fast_settings() -> PollSettings {
        PollSettings {
            drain_batch: 64,
            idle_backoff: Duration::from_micros(100),
            pass_pause: Duration::from_micros(10),
        }
    }

    #[traced_test]
    #[test]
    fn rejected_frames_never_reach_plugins() {
        let (mut analyzer, calls, metrics) = analyzer();
        let short = CapturedFrame::new(0, vec![0u8; 8], luftvakt_core::frame::LinkType::Ieee80211);
        let alerts = analyzer.process_pass(vec![
            short,
            beacon().corrupt_fcs().radiotap().build(1),
            beacon().protocol_version(2).with_fcs().build(2),
        ]);

        assert!(alerts.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let stats = analyzer.stats();
        assert_eq!(stats.frames_received, 3);
        assert_eq!(stats.frames_dropped, 3);
        assert_eq!(stats.frames_dispatched, 0);

        assert!(logs_contain("frame too short to be analyzed"));
        assert!(logs_contain("ANOMALY - Invalid protocol version <2>"));
        let text = metrics.gather_metrics().unwrap();
        assert!(text.contains("luftvakt_frames_dropped_total{reason=\"fcs_mismatch\"} 1"));
    }

    #[test]
    fn valid_frames_are_dispatched_in_order() {
        let (mut analyzer, calls, metrics) = analyzer();
        let alerts = analyzer.process_pass((0..3).map(|t| beacon().with_fcs().build(t)).collect());

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            alerts.iter().map(|a| a.timestamp).collect::<Vec<_>>(),
            [0, 1, 2]
        );
        assert_eq!(analyzer.stats().alerts, 3);
        assert_eq!(metrics.alerts.with_label_values(&["tripwire"]).get(), 3);
    }

    #[tokio::test]
    async fn task_processes_queue_until_stopped() {
        let (analyzer, calls, _) = analyzer();
        let queue = Arc::new(FrameQueue::with_capacity(1024).unwrap());
        let handle = AnalysisTask::spawn(analyzer, queue.clone(), ShutdownSignal::new(), fast_settings());

        for t in 0..100 {
            queue.frame_enqueue(beacon().with_fcs().build(t)).unwrap();
        }
        while !queue.is_empty() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        handle.stop();
        handle.stopped().await;
        assert!(handle.is_started());
        assert!(handle.is_stopped());

        let analyzer = handle.join().await.unwrap();
        assert_eq!(analyzer.stats().frames_dispatched, 100);
        assert_eq!(calls.load(Ordering::SeqCst), 100);
    }

    #[tokio::test]
    async fn shutdown_signal_stops_task() {
        let (analyzer, _, _) = analyzer();
        let queue = Arc::new(FrameQueue::with_capacity(128).unwrap());
        let shutdown = ShutdownSignal::new();
        let handle = AnalysisTask::spawn(analyzer, queue, shutdown.clone(), fast_settings());

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), handle.stopped())
            .await
            .expect("worker should observe shutdown");
        assert!(handle.is_stopped());
        assert_eq!(handle.join().await.unwrap().stats().frames_received, 0);
    }

    #[tokio::test]
    async fn stop_before_start_processes_nothing() {
        let (analyzer, calls, _) = analyzer();
        let queue = Arc::new(FrameQueue::with_capacity(128).unwrap());
        let shutdown = ShutdownSignal::new();
        shutdown.trigger();
        queue.frame_enqueue(beacon().build(0)).unwrap();

        let handle = AnalysisTask::spawn(analyzer, queue.clone(), shutdown, fast_settings());
        let analyzer = handle.join().await.unwrap();
        assert_eq!(analyzer.stats().passes, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn worker_dropped_unrun_reports_stopped() {
        let (tx, rx) = watch::channel(false);
        let worker = {
            let stopped = StoppedGuard(tx);
            move || {
                let _stopped = stopped;
            }
        };
        assert!(!*rx.borrow());
        drop(worker);
        assert!(*rx.borrow());
    }

    #[tokio::test]
    async fn panicking_detector_marks_task_stopped() {
        let metrics = Arc::new(MetricsRecorder::new().unwrap());
        let dispatcher: Dispatcher = [Detector::single_frame(Faulty)].into_iter().collect();
        let analyzer = FrameAnalyzer::new(OwnMacSet::new(), dispatcher, metrics);
        let queue = Arc::new(FrameQueue::with_capacity(128).unwrap());
        queue.frame_enqueue(beacon().build(0)).unwrap();

        let handle = AnalysisTask::spawn(analyzer, queue, ShutdownSignal::new(), fast_settings());
        tokio::time::timeout(Duration::from_secs(5), handle.stopped())
            .await
            .expect("worker should unwind");
        assert!(handle.is_stopped());
        assert!(matches!(handle.join().await, Err(EngineError::Task(_))));
    }
}
