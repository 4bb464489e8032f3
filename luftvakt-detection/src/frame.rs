//! Validated frames and the copies detectors keep as evidence.

use bytes::Bytes;

use luftvakt_core::frame::CapturedFrame;
use luftvakt_core::mac::MacAddr;
use luftvakt_protocols::ieee80211::{FrameHeader, FrameType};

/// A captured frame that passed intake validation, with its parsed header.
#[derive(Clone, Debug)]
pub struct Frame {
    pub captured: CapturedFrame,
    pub header: FrameHeader,
}

impl Frame {
    pub fn new(captured: CapturedFrame, header: FrameHeader) -> Self {
        Self { captured, header }
    }

    /// Capture timestamp in nanoseconds.
    #[inline]
    pub fn timestamp(&self) -> u64 {
        self.captured.timestamp
    }

    #[inline]
    pub fn frame_type(&self) -> FrameType {
        self.header.frame_type
    }

    #[inline]
    pub fn subtype(&self) -> u8 {
        self.header.subtype
    }

    pub fn addresses(&self) -> &[Option<MacAddr>; 4] {
        &self.header.addresses
    }

    /// Frame body, FCS excluded.
    pub fn body(&self) -> &[u8] {
        self.header.body(&self.captured.data)
    }

    /// Copies the frame for an evidence buffer. The capture buffer is only
    /// retained when `keep_raw` is set.
    pub fn evidence(&self, keep_raw: bool) -> EvidenceFrame {
        EvidenceFrame {
            timestamp: self.captured.timestamp,
            cap_len: self.captured.cap_len(),
            header: self.header.clone(),
            raw: keep_raw.then(|| self.captured.data.clone()),
        }
    }
}

/// Frame copy held in a detector's evidence buffer.
#[derive(Clone, Debug)]
pub struct EvidenceFrame {
    pub timestamp: u64,
    pub cap_len: usize,
    pub header: FrameHeader,
    pub raw: Option<Bytes>,
}

impl EvidenceFrame {
    /// Frame body, if the raw capture was retained.
    pub fn body(&self) -> Option<&[u8]> {
        self.raw.as_deref().map(|raw| self.header.body(raw))
    }
}
