//! ## luftvakt-protocols::ieee80211
//! 802.11 MAC header parser. Works directly on the capture buffer and records
//! offsets instead of copying the frame body.

use luftvakt_core::frame::{CapturedFrame, LinkType, FCS_SIZE, MIN_FRAME_SIZE};
use luftvakt_core::mac::MacAddr;

use crate::error::ParseError;
use crate::radiotap::RadiotapHeader;

/// Frame subtypes the detection layer refers to by name.
pub mod subtype {
    pub const ASSOC_REQUEST: u8 = 0;
    pub const ASSOC_RESPONSE: u8 = 1;
    pub const PROBE_REQUEST: u8 = 4;
    pub const PROBE_RESPONSE: u8 = 5;
    pub const BEACON: u8 = 8;
    pub const DISASSOCIATION: u8 = 10;
    pub const AUTHENTICATION: u8 = 11;
    pub const DEAUTHENTICATION: u8 = 12;
    pub const ACTION: u8 = 13;

    pub const BLOCK_ACK_REQUEST: u8 = 8;
    pub const BLOCK_ACK: u8 = 9;
    pub const PS_POLL: u8 = 10;
    pub const RTS: u8 = 11;
    pub const CTS: u8 = 12;
    pub const ACK: u8 = 13;
    pub const CF_END: u8 = 14;
    pub const CF_END_CF_ACK: u8 = 15;

    pub const DATA: u8 = 0;
    pub const NULL: u8 = 4;
    pub const QOS_DATA: u8 = 8;
}

/// Frame type (2 bits of the frame control field)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameType {
    Management = 0,
    Control = 1,
    Data = 2,
    Extension = 3,
}

impl FrameType {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => FrameType::Management,
            1 => FrameType::Control,
            2 => FrameType::Data,
            _ => FrameType::Extension,
        }
    }
}

/// Second byte of the frame control field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameFlags {
    pub to_ds: bool,
    pub from_ds: bool,
    pub more_fragments: bool,
    pub retry: bool,
    pub power_management: bool,
    pub more_data: bool,
    pub protected: bool,
    pub order: bool,
}

impl FrameFlags {
    pub fn from_bits(fc1: u8) -> Self {
        Self {
            to_ds: fc1 & 0x01 != 0,
            from_ds: fc1 & 0x02 != 0,
            more_fragments: fc1 & 0x04 != 0,
            retry: fc1 & 0x08 != 0,
            power_management: fc1 & 0x10 != 0,
            more_data: fc1 & 0x20 != 0,
            protected: fc1 & 0x40 != 0,
            order: fc1 & 0x80 != 0,
        }
    }
}

/// Parsed view of a captured frame. Offsets index into the capture buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    pub frame_type: FrameType,
    pub subtype: u8,
    pub protocol_version: u8,
    pub flags: FrameFlags,
    pub duration: u16,
    pub sequence_number: Option<u16>,
    pub fragment_number: Option<u8>,
    /// Address fields 1 to 4; absent fields are `None`.
    pub addresses: [Option<MacAddr>; 4],
    /// Frame check sequence carried by the frame, if any
    pub fcs: Option<u32>,
    /// Start of the 802.11 frame (after any capture header)
    pub frame_offset: usize,
    /// Length of the checksummed region, FCS excluded
    pub frame_len: usize,
    /// Start of the frame body
    pub body_offset: usize,
}

impl FrameHeader {
    /// Receiver address.
    pub fn addr1(&self) -> Option<MacAddr> {
        self.addresses[0]
    }

    /// Transmitter address.
    pub fn addr2(&self) -> Option<MacAddr> {
        self.addresses[1]
    }

    pub fn addr3(&self) -> Option<MacAddr> {
        self.addresses[2]
    }

    pub fn addr4(&self) -> Option<MacAddr> {
        self.addresses[3]
    }

    pub fn bssid(&self) -> Option<MacAddr> {
        match (self.flags.to_ds, self.flags.from_ds) {
            (false, false) => self.addr3(),
            (false, true) => self.addr2(),
            (true, false) => self.addr1(),
            (true, true) => None,
        }
    }

    pub fn is_management(&self) -> bool {
        self.frame_type == FrameType::Management
    }

    /// Bytes covered by the FCS.
    pub fn checksummed_region<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        data.get(self.frame_offset..self.frame_offset + self.frame_len)
            .unwrap_or(&[])
    }

    /// Frame body, FCS excluded.
    pub fn body<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        data.get(self.body_offset..self.frame_offset + self.frame_len)
            .unwrap_or(&[])
    }
}

/// Parse step turning a captured frame into its header view.
pub trait HeaderParser: Send + Sync {
    fn parse(&self, frame: &CapturedFrame) -> Result<FrameHeader, ParseError>;
}

/// Parser for bare and radiotap-encapsulated 802.11 frames.
#[derive(Default, Debug, Copy, Clone)]
pub struct Ieee80211Parser;

impl Ieee80211Parser {
    pub fn new() -> Self {
        Self
    }

    /// Locates the 802.11 frame in the capture and whether an FCS trails it.
    fn locate(frame: &CapturedFrame) -> Result<(usize, bool), ParseError> {
        match frame.link_type {
            LinkType::Ieee80211 => Ok((0, false)),
            LinkType::Ieee80211WithFcs => Ok((0, true)),
            LinkType::Radiotap => {
                let radiotap = RadiotapHeader::parse(&frame.data)?;
                Ok((radiotap.length, radiotap.fcs_at_end()))
            }
        }
    }

    /// Parses the MAC header of `mac` (the 802.11 frame without FCS). Returns the
    /// header fields and the MAC header length.
    fn parse_mac_header(mac: &[u8]) -> Result<MacHeader, ParseError> {
        require(mac, MIN_FRAME_SIZE)?;

        let fc0 = mac[0];
        let flags = FrameFlags::from_bits(mac[1]);
        let frame_type = FrameType::from_bits(fc0 >> 2);
        let sub = fc0 >> 4;
        let duration = u16::from_le_bytes([mac[2], mac[3]]);
        let mut addresses = [MacAddr::from_slice(&mac[4..]), None, None, None];

        let mut header = MacHeader {
            protocol_version: fc0 & 0x03,
            frame_type,
            subtype: sub,
            flags,
            duration,
            sequence_control: None,
            addresses,
            header_len: MIN_FRAME_SIZE,
        };

        match frame_type {
            FrameType::Control => {
                if matches!(
                    sub,
                    subtype::RTS
                        | subtype::PS_POLL
                        | subtype::CF_END
                        | subtype::CF_END_CF_ACK
                        | subtype::BLOCK_ACK
                        | subtype::BLOCK_ACK_REQUEST
                ) {
                    require(mac, 16)?;
                    addresses[1] = MacAddr::from_slice(&mac[10..]);
                    header.header_len = 16;
                }
            }
            FrameType::Management | FrameType::Data => {
                require(mac, 24)?;
                addresses[1] = MacAddr::from_slice(&mac[10..]);
                addresses[2] = MacAddr::from_slice(&mac[16..]);
                header.sequence_control = Some(u16::from_le_bytes([mac[22], mac[23]]));

                let mut len = 24;
                if frame_type == FrameType::Data && flags.to_ds && flags.from_ds {
                    require(mac, 30)?;
                    addresses[3] = MacAddr::from_slice(&mac[24..]);
                    len = 30;
                }
                // QoS data subtypes have bit 3 set and carry a 2-byte QoS control.
                let qos = frame_type == FrameType::Data && sub & 0x08 != 0;
                if qos {
                    len += 2;
                }
                if flags.order && (qos || frame_type == FrameType::Management) {
                    len += 4;
                }
                require(mac, len)?;
                header.header_len = len;
            }
            FrameType::Extension => {}
        }

        header.addresses = addresses;
        Ok(header)
    }
}

struct MacHeader {
    protocol_version: u8,
    frame_type: FrameType,
    subtype: u8,
    flags: FrameFlags,
    duration: u16,
    sequence_control: Option<u16>,
    addresses: [Option<MacAddr>; 4],
    header_len: usize,
}

impl HeaderParser for Ieee80211Parser {
    fn parse(&self, frame: &CapturedFrame) -> Result<FrameHeader, ParseError> {
        let data = &frame.data[..];
        let (frame_offset, fcs_present) = Self::locate(frame)?;

        let trailer = if fcs_present { FCS_SIZE } else { 0 };
        require(data, frame_offset + MIN_FRAME_SIZE + trailer)?;
        let frame_len = data.len() - frame_offset - trailer;

        let fcs = fcs_present.then(|| {
            let end = data.len();
            u32::from_le_bytes([data[end - 4], data[end - 3], data[end - 2], data[end - 1]])
        });

        let mac = &data[frame_offset..frame_offset + frame_len];
        let header = Self::parse_mac_header(mac)?;

        Ok(FrameHeader {
            frame_type: header.frame_type,
            subtype: header.subtype,
            protocol_version: header.protocol_version,
            flags: header.flags,
            duration: header.duration,
            sequence_number: header.sequence_control.map(|sc| sc >> 4),
            fragment_number: header.sequence_control.map(|sc| (sc & 0x0f) as u8),
            addresses: header.addresses,
            fcs,
            frame_offset,
            frame_len,
            body_offset: frame_offset + header.header_len,
        })
    }
}

#[inline]
fn require(data: &[u8], needed: usize) -> Result<(), ParseError> {
    if data.len() < needed {
        return Err(ParseError::InsufficientData {
            needed,
            available: data.len(),
        });
    }
    Ok(())
}
