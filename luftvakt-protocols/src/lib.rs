//! # Luftvakt Protocol Parsers
//!
//! Crate for parsing captured radio frames: the radiotap capture header,
//! the 802.11 MAC header and the trailing frame check sequence.

pub mod builder;
pub mod error;
pub mod fcs;
pub mod ieee80211;
pub mod management;
pub mod radiotap;

pub use error::ParseError;
pub use fcs::FcsMismatch;
pub use ieee80211::{FrameFlags, FrameHeader, FrameType, HeaderParser, Ieee80211Parser};
