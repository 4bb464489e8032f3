//! Frame construction for replay tooling, benchmarks and tests.

use bytes::Bytes;

use luftvakt_core::frame::{CapturedFrame, LinkType};
use luftvakt_core::mac::MacAddr;

use crate::fcs;
use crate::ieee80211::FrameType;
use crate::radiotap;

/// Builds a captured 802.11 frame field by field.
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    frame_type: FrameType,
    subtype: u8,
    protocol_version: u8,
    flags: u8,
    duration: u16,
    addresses: [Option<MacAddr>; 4],
    sequence: u16,
    body: Vec<u8>,
    with_fcs: bool,
    corrupt_fcs: bool,
    radiotap: bool,
}

impl FrameBuilder {
    pub fn new(frame_type: FrameType, subtype: u8) -> Self {
        Self {
            frame_type,
            subtype,
            protocol_version: 0,
            flags: 0,
            duration: 0,
            addresses: [None; 4],
            sequence: 0,
            body: Vec::new(),
            with_fcs: false,
            corrupt_fcs: false,
            radiotap: false,
        }
    }

    pub fn management(subtype: u8) -> Self {
        Self::new(FrameType::Management, subtype)
    }

    pub fn control(subtype: u8) -> Self {
        Self::new(FrameType::Control, subtype)
    }

    pub fn data(subtype: u8) -> Self {
        Self::new(FrameType::Data, subtype)
    }

    pub fn protocol_version(mut self, version: u8) -> Self {
        self.protocol_version = version & 0x03;
        self
    }

    /// Raw second byte of the frame control field.
    pub fn flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }

    pub fn duration(mut self, duration: u16) -> Self {
        self.duration = duration;
        self
    }

    pub fn addr1(mut self, addr: MacAddr) -> Self {
        self.addresses[0] = Some(addr);
        self
    }

    pub fn addr2(mut self, addr: MacAddr) -> Self {
        self.addresses[1] = Some(addr);
        self
    }

    pub fn addr3(mut self, addr: MacAddr) -> Self {
        self.addresses[2] = Some(addr);
        self
    }

    pub fn addr4(mut self, addr: MacAddr) -> Self {
        self.addresses[3] = Some(addr);
        self
    }

    pub fn sequence(mut self, sequence: u16) -> Self {
        self.sequence = sequence & 0x0fff;
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Appends a correct FCS.
    pub fn with_fcs(mut self) -> Self {
        self.with_fcs = true;
        self
    }

    /// Appends an FCS that does not match the frame.
    pub fn corrupt_fcs(mut self) -> Self {
        self.with_fcs = true;
        self.corrupt_fcs = true;
        self
    }

    /// Prefixes a radiotap header whose flags advertise the FCS.
    pub fn radiotap(mut self) -> Self {
        self.radiotap = true;
        self
    }

    /// Serialises the 802.11 frame, FCS included when requested.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut mac = Vec::with_capacity(32 + self.body.len());
        mac.push((self.subtype << 4) | ((self.frame_type as u8) << 2) | self.protocol_version);
        mac.push(self.flags);
        mac.extend_from_slice(&self.duration.to_le_bytes());
        mac.extend_from_slice(self.addresses[0].unwrap_or_default().as_bytes());

        match self.frame_type {
            FrameType::Management | FrameType::Data => {
                mac.extend_from_slice(self.addresses[1].unwrap_or_default().as_bytes());
                mac.extend_from_slice(self.addresses[2].unwrap_or_default().as_bytes());
                mac.extend_from_slice(&(self.sequence << 4).to_le_bytes());
                if let Some(addr4) = self.addresses[3] {
                    mac.extend_from_slice(addr4.as_bytes());
                }
                if self.frame_type == FrameType::Data && self.subtype & 0x08 != 0 {
                    mac.extend_from_slice(&[0, 0]);
                }
            }
            FrameType::Control | FrameType::Extension => {
                if let Some(addr2) = self.addresses[1] {
                    mac.extend_from_slice(addr2.as_bytes());
                }
            }
        }
        mac.extend_from_slice(&self.body);

        if self.with_fcs {
            let mut crc = fcs::compute(&mac);
            if self.corrupt_fcs {
                crc ^= 0xdead_beef;
            }
            mac.extend_from_slice(&crc.to_le_bytes());
        }

        if !self.radiotap {
            return mac;
        }

        let flags = if self.with_fcs {
            radiotap::flags::FCS_AT_END
        } else {
            0
        };
        let mut frame = vec![0x00, 0x00, 0x09, 0x00];
        frame.extend_from_slice(&radiotap::present::FLAGS.to_le_bytes());
        frame.push(flags);
        frame.extend_from_slice(&mac);
        frame
    }

    pub fn build(&self, timestamp: u64) -> CapturedFrame {
        let link_type = match (self.radiotap, self.with_fcs) {
            (true, _) => LinkType::Radiotap,
            (false, true) => LinkType::Ieee80211WithFcs,
            (false, false) => LinkType::Ieee80211,
        };
        CapturedFrame {
            timestamp,
            data: Bytes::from(self.to_bytes()),
            link_type,
        }
    }
}
