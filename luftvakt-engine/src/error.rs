use thiserror::Error;
use tokio::task::JoinError;

use luftvakt_capture::CaptureError;
use luftvakt_core::CoreError;
use luftvakt_detection::signatures::SignatureError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid setting: {0}")]
    Core(#[from] CoreError),

    #[error("Signature error: {0}")]
    Signature(#[from] SignatureError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Task failed: {0}")]
    Task(String),
}

impl From<JoinError> for EngineError {
    fn from(err: JoinError) -> Self {
        EngineError::Task(err.to_string())
    }
}
