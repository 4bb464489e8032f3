//! ## luftvakt-telemetry::metrics
//! **Prometheus exporter with histograms**

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub frames_received: IntCounter,
    /// Intake rejections by reason
    pub frames_dropped: IntCounterVec,
    /// Alerts by plugin
    pub alerts: IntCounterVec,
    pub dispatch_latency: Histogram,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let frames_received =
            IntCounter::new("luftvakt_frames_received_total", "Frames taken from the intake queue")?;
        let frames_dropped = IntCounterVec::new(
            Opts::new("luftvakt_frames_dropped_total", "Frames rejected at intake"),
            &["reason"],
        )?;
        let alerts = IntCounterVec::new(
            Opts::new("luftvakt_alerts_total", "Security alerts raised"),
            &["plugin"],
        )?;
        let dispatch_latency = Histogram::with_opts(
            HistogramOpts::new(
                "luftvakt_dispatch_latency_ns",
                "Time spent dispatching one frame to all plugins",
            )
            .buckets(vec![1_000.0, 10_000.0, 100_000.0, 1_000_000.0]),
        )?;

        registry.register(Box::new(frames_received.clone()))?;
        registry.register(Box::new(frames_dropped.clone()))?;
        registry.register(Box::new(alerts.clone()))?;
        registry.register(Box::new(dispatch_latency.clone()))?;

        Ok(Self {
            registry,
            frames_received,
            frames_dropped,
            alerts,
            dispatch_latency,
        })
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    pub fn inc_frames_received(&self) {
        self.frames_received.inc();
    }

    pub fn inc_frames_dropped(&self, reason: &str) {
        self.frames_dropped.with_label_values(&[reason]).inc();
    }

    pub fn inc_alerts(&self, plugin: &str) {
        self.alerts.with_label_values(&[plugin]).inc();
    }

    pub fn observe_dispatch_latency(&self, nanos: u64) {
        self.dispatch_latency.observe(nanos as f64);
    }
}
