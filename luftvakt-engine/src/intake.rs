//! ## luftvakt-engine::intake
//! **Frame validation ahead of dispatch**
//!
//! Checks run in a fixed order: capture length, header parse, FCS, protocol
//! version. The first failing check rejects the frame.

use thiserror::Error;

use luftvakt_core::frame::{CapturedFrame, FCS_SIZE, MIN_FRAME_SIZE};
use luftvakt_detection::Frame;
use luftvakt_protocols::{fcs, FcsMismatch, HeaderParser, Ieee80211Parser, ParseError};

/// Shortest capture the validator looks at.
pub const MIN_CAPTURE_LEN: usize = MIN_FRAME_SIZE + FCS_SIZE;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameRejection {
    #[error("Received invalid frame - frame too short to be analyzed. Expected {needed} bytes, received {cap_len}.")]
    TooShort { cap_len: usize, needed: usize },

    #[error("Malformed frame: {0}")]
    Malformed(#[from] ParseError),

    #[error("Invalid FCS: {0}. Ignoring frame.")]
    FcsMismatch(#[from] FcsMismatch),

    #[error("ANOMALY - Invalid protocol version <{version}> for frame (SN: {}): it should always be 0.", sequence_label(.sequence_number))]
    InvalidProtocolVersion {
        version: u8,
        sequence_number: Option<u16>,
    },
}

fn sequence_label(sequence_number: &Option<u16>) -> String {
    sequence_number.map_or_else(|| "-".to_string(), |sn| sn.to_string())
}

impl FrameRejection {
    /// Metric label for the rejection.
    pub fn reason(&self) -> &'static str {
        match self {
            FrameRejection::TooShort { .. } => "too_short",
            FrameRejection::Malformed(_) => "malformed",
            FrameRejection::FcsMismatch(_) => "fcs_mismatch",
            FrameRejection::InvalidProtocolVersion { .. } => "invalid_protocol_version",
        }
    }
}

pub struct FrameValidator<P: HeaderParser = Ieee80211Parser> {
    parser: P,
}

impl FrameValidator {
    pub fn new() -> Self {
        Self {
            parser: Ieee80211Parser::new(),
        }
    }
}

impl Default for FrameValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: HeaderParser> FrameValidator<P> {
    pub fn with_parser(parser: P) -> Self {
        Self { parser }
    }

    pub fn validate(&self, captured: CapturedFrame) -> Result<Frame, FrameRejection> {
        if captured.cap_len() < MIN_CAPTURE_LEN {
            return Err(FrameRejection::TooShort {
                cap_len: captured.cap_len(),
                needed: MIN_CAPTURE_LEN,
            });
        }

        let header = self.parser.parse(&captured)?;
        fcs::verify(&captured.data, &header)?;

        if header.protocol_version != 0 {
            return Err(FrameRejection::InvalidProtocolVersion {
                version: header.protocol_version,
                sequence_number: header.sequence_number,
            });
        }

        Ok(Frame::new(captured, header))
    }
}
