//! ## luftvakt-telemetry::logging
//! Structured logging with tracing and OpenTelemetry attributes.

use opentelemetry::KeyValue;
use tracing::info_span;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the global subscriber. `RUST_LOG` overrides `level`.
    pub fn init(level: &str, json: bool) -> Result<(), TryInitError> {
        use tracing_subscriber::util::SubscriberInitExt;

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        let builder = fmt().with_env_filter(filter).with_thread_names(true);
        if json {
            builder.json().finish().try_init()
        } else {
            builder.finish().try_init()
        }
    }

    /// Records a security or lifecycle event inside a `security_event` span.
    pub fn log_event(event_type: &str, metadata: &[KeyValue]) {
        let span = info_span!(
            "security_event",
            event_type = event_type,
            otel.kind = "INTERNAL"
        );
        let _entered = span.enter();
        tracing::info!(metadata = ?metadata, "Security event occurred");
    }
}
