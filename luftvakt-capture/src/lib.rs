//! luftvakt-capture
//!
//! Delivers captured 802.11 frames from a monitor-mode interface or a pcap
//! file to the intake queue.

pub mod capture;

pub use capture::{replay_file, run_live, CaptureError, CaptureSettings, CaptureStats};
