//! Captured frame types and payload handling.

use bytes::Bytes;

/// Shortest valid 802.11 frame (ACK/CTS header) without its FCS.
pub const MIN_FRAME_SIZE: usize = 10;

/// Size of the trailing frame check sequence.
pub const FCS_SIZE: usize = 4;

/// Link-layer encapsulation the frame was captured with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LinkType {
    /// Bare 802.11 frame without a trailing FCS.
    Ieee80211,
    /// Bare 802.11 frame followed by its 4-byte FCS.
    Ieee80211WithFcs,
    /// Radiotap header followed by an 802.11 frame. FCS presence is
    /// advertised in the radiotap flags field.
    Radiotap,
}

/// One captured unit of wireless traffic, as delivered by a capture source.
#[derive(Clone, Debug)]
pub struct CapturedFrame {
    /// Capture timestamp in nanoseconds since the Unix epoch
    pub timestamp: u64,

    /// Immutable capture buffer using zero-copy semantics
    pub data: Bytes,

    pub link_type: LinkType,
}

impl CapturedFrame {
    #[inline]
    pub fn new(timestamp: u64, data: impl Into<Bytes>, link_type: LinkType) -> Self {
        Self {
            timestamp,
            data: data.into(),
            link_type,
        }
    }

    /// Number of bytes actually captured.
    #[inline]
    pub fn cap_len(&self) -> usize {
        self.data.len()
    }
}
