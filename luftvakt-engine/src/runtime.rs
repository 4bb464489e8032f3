//! # Runtime
//!
//! Wires a capture source, the intake queue and the analysis task together.
//! Live capture and pcap replay share the same analysis path so frontends
//! only pick the source.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use opentelemetry::KeyValue;
use tokio::task::spawn_blocking;
use tracing::{debug, info, instrument, warn};

use luftvakt_capture::{CaptureSettings, CaptureStats};
use luftvakt_config::LuftvaktConfig;
use luftvakt_core::queue::FrameQueue;
use luftvakt_detection::plugins::{DeauthFloodPlugin, DeauthFloodSettings, SsidSignaturePlugin};
use luftvakt_detection::{Detector, Dispatcher, OwnMacSet, SignatureEngine};
use luftvakt_telemetry::{EventLogger, MetricsRecorder};

use crate::analysis::{AnalysisHandle, AnalysisStats, AnalysisTask, FrameAnalyzer, PollSettings, ShutdownSignal};
use crate::error::EngineError;

/// Totals reported once a run ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub capture: CaptureStats,
    pub analysis: AnalysisStats,
}

/// Builds the analyzer with the enabled built-in detectors, in registration
/// order: deauthentication flood first, then SSID signatures.
pub fn build_analyzer(
    config: &LuftvaktConfig,
    metrics: Arc<MetricsRecorder>,
) -> Result<FrameAnalyzer, EngineError> {
    let own_macs = OwnMacSet::try_from_strings(&config.network.own_macs)?;
    let mut dispatcher = Dispatcher::new();

    let deauth = &config.plugins.deauth_flood;
    if deauth.enabled {
        let frames = NonZeroUsize::new(deauth.frames).unwrap_or(NonZeroUsize::MIN);
        dispatcher.register(Detector::stateful(DeauthFloodPlugin::new(
            DeauthFloodSettings {
                frames,
                window: deauth.window(),
            },
        )));
    }

    let ssid = &config.plugins.ssid_signature;
    if ssid.enabled {
        let engine = SignatureEngine::with_patterns(ssid.patterns.iter().cloned())?;
        dispatcher.register(Detector::single_frame(SsidSignaturePlugin::new(Arc::new(
            engine,
        ))));
    }

    for slot in dispatcher.slots() {
        debug!(plugin = slot.name(), "Plugin registered");
    }
    if own_macs.is_empty() {
        warn!("No own MAC addresses configured; ownership-gated plugins will never run");
    }

    Ok(FrameAnalyzer::new(own_macs, dispatcher, metrics)
        .log_fcs_mismatch(config.core.analysis.log_fcs_mismatch))
}

fn capture_settings(config: &LuftvaktConfig) -> CaptureSettings {
    CaptureSettings {
        promiscuous: config.capture.promiscuous,
        buffer_size: config.capture.buffer_size,
        timeout_ms: config.capture.timeout_ms,
    }
}

fn start_analysis(
    config: &LuftvaktConfig,
    metrics: Arc<MetricsRecorder>,
    shutdown: &ShutdownSignal,
) -> Result<(Arc<FrameQueue>, AnalysisHandle), EngineError> {
    let queue = Arc::new(FrameQueue::with_capacity(config.core.queue.capacity)?);
    let analyzer = build_analyzer(config, metrics)?;
    let plugins = analyzer.dispatcher().len();

    let handle = AnalysisTask::spawn(
        analyzer,
        queue.clone(),
        shutdown.clone(),
        PollSettings::from(&config.core.analysis),
    );

    EventLogger::log_event(
        "analysis_started",
        &[
            KeyValue::new("plugins", plugins as i64),
            KeyValue::new("queue_capacity", config.core.queue.capacity as i64),
        ],
    );
    Ok((queue, handle))
}

fn log_summary(summary: &RunSummary) {
    EventLogger::log_event(
        "analysis_stopped",
        &[
            KeyValue::new("frames_captured", summary.capture.frames as i64),
            KeyValue::new("frames_dropped", summary.analysis.frames_dropped as i64),
            KeyValue::new("frames_dispatched", summary.analysis.frames_dispatched as i64),
            KeyValue::new("alerts", summary.analysis.alerts as i64),
        ],
    );
}

/// Monitors `config.capture.interface` until `shutdown` is triggered.
///
/// Frames arriving while the intake queue is full are dropped and counted.
#[instrument(level = "info", name = "run_live", skip(config, metrics, shutdown), fields(interface = %config.capture.interface))]
pub async fn run_live(
    config: &LuftvaktConfig,
    metrics: Arc<MetricsRecorder>,
    shutdown: ShutdownSignal,
) -> Result<RunSummary, EngineError> {
    let (queue, analysis) = start_analysis(config, metrics.clone(), &shutdown)?;

    let interface = config.capture.interface.clone();
    let settings = capture_settings(config);
    let capture = spawn_blocking({
        let shutdown = shutdown.clone();
        move || {
            luftvakt_capture::run_live(&interface, &settings, shutdown.flag(), |frame| {
                if queue.frame_enqueue(frame).is_err() {
                    metrics.inc_frames_dropped("queue_full");
                }
            })
        }
    })
    .await?;

    // A failed capture leaves nothing to analyse.
    if capture.is_err() {
        shutdown.trigger();
    }
    analysis.stop();
    let analyzer = analysis.join().await?;

    let summary = RunSummary {
        capture: capture?,
        analysis: analyzer.stats(),
    };
    log_summary(&summary);
    Ok(summary)
}

/// Replays a pcap file through the analysis path and returns once every
/// frame has been analysed or `shutdown` is triggered.
#[instrument(level = "info", name = "run_replay", skip(config, metrics, shutdown))]
pub async fn run_replay(
    config: &LuftvaktConfig,
    path: &Path,
    metrics: Arc<MetricsRecorder>,
    shutdown: ShutdownSignal,
) -> Result<RunSummary, EngineError> {
    let (queue, analysis) = start_analysis(config, metrics, &shutdown)?;
    let backoff = config.core.analysis.idle_backoff();

    let capture = spawn_blocking({
        let queue = queue.clone();
        let shutdown = shutdown.clone();
        let path: PathBuf = path.to_path_buf();
        move || {
            luftvakt_capture::replay_file(&path, shutdown.flag(), |frame| {
                // Replay never drops: wait for the worker to make room.
                while queue.frame_enqueue(frame.clone()).is_err() {
                    if shutdown.is_triggered() {
                        return;
                    }
                    std::thread::sleep(backoff);
                }
            })
        }
    })
    .await?;

    if capture.is_ok() {
        while !queue.is_empty() && !shutdown.is_triggered() && !analysis.is_stopped() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }
    analysis.stop();
    let analyzer = analysis.join().await?;

    let summary = RunSummary {
        capture: capture?,
        analysis: analyzer.stats(),
    };
    info!(
        frames = summary.capture.frames,
        alerts = summary.analysis.alerts,
        "Replay complete"
    );
    log_summary(&summary);
    Ok(summary)
}
