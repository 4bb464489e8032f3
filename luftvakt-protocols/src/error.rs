use thiserror::Error;

/// Errors that can occur while parsing a captured frame.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Insufficient data: need {needed} bytes, have {available}")]
    InsufficientData { needed: usize, available: usize },
    #[error("Unsupported radiotap version {0}")]
    UnsupportedRadiotapVersion(u8),
    #[error("Radiotap length {length} is invalid for a {available} byte capture")]
    InvalidRadiotapLength { length: usize, available: usize },
}
