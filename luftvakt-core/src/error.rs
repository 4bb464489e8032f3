use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid MAC address: {0}")]
    InvalidMac(String),

    #[error("Invalid queue capacity: {0}")]
    InvalidCapacity(usize),
}
