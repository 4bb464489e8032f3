//! # luftvakt-core
//!
//! Foundation types shared by every stage of the wireless intrusion
//! prevention pipeline.
//!
//! ### Key Submodules:
//! - `frame`: Captured radio frames with capture metadata
//! - `mac`: Hardware addresses
//! - `queue`: Lock-free intake queue between capture and analysis

pub mod error;
pub mod frame;
pub mod mac;
pub mod queue;

pub mod prelude {
    pub use crate::error::*;
    pub use crate::frame::*;
    pub use crate::mac::*;
    pub use crate::queue::*;
}

pub use error::CoreError;
pub use frame::{CapturedFrame, LinkType, FCS_SIZE, MIN_FRAME_SIZE};
pub use mac::MacAddr;
pub use queue::FrameQueue;
