//! ## luftvakt-protocols::radiotap
//! Minimal radiotap header reader: enough to locate the 802.11 frame and to
//! learn whether the driver left the FCS attached.
//!
//! Reference: https://www.radiotap.org/

use crate::error::ParseError;

/// Fixed part of every radiotap header.
pub const RADIOTAP_MIN_LEN: usize = 8;

/// Radiotap present flags
pub mod present {
    pub const TSFT: u32 = 1 << 0;
    pub const FLAGS: u32 = 1 << 1;
    pub const EXT: u32 = 1 << 31;
}

/// Bits of the FLAGS field
pub mod flags {
    /// The frame includes its FCS at the end.
    pub const FCS_AT_END: u8 = 0x10;
    /// The frame failed the driver's FCS check.
    pub const BAD_FCS: u8 = 0x40;
}

/// Parsed radiotap header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadiotapHeader {
    pub version: u8,
    /// Total header length including fields
    pub length: usize,
    /// First present bitmap word
    pub present: u32,
    /// FLAGS field, when present
    pub flags: Option<u8>,
}

impl RadiotapHeader {
    pub fn parse(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < RADIOTAP_MIN_LEN {
            return Err(ParseError::InsufficientData {
                needed: RADIOTAP_MIN_LEN,
                available: data.len(),
            });
        }

        let version = data[0];
        if version != 0 {
            return Err(ParseError::UnsupportedRadiotapVersion(version));
        }

        let length = u16::from_le_bytes([data[2], data[3]]) as usize;
        if length < RADIOTAP_MIN_LEN || length > data.len() {
            return Err(ParseError::InvalidRadiotapLength {
                length,
                available: data.len(),
            });
        }

        let present = read_u32(data, 4, length)?;

        // Skip extended present bitmaps; fields start after the last one.
        let mut cursor = RADIOTAP_MIN_LEN;
        let mut word = present;
        while word & present::EXT != 0 {
            word = read_u32(data, cursor, length)?;
            cursor += 4;
        }

        if present & present::TSFT != 0 {
            cursor = align(cursor, 8) + 8;
        }

        let flags = if present & present::FLAGS != 0 {
            if cursor >= length {
                return Err(ParseError::InvalidRadiotapLength {
                    length,
                    available: data.len(),
                });
            }
            Some(data[cursor])
        } else {
            None
        };

        Ok(Self {
            version,
            length,
            present,
            flags,
        })
    }

    pub fn fcs_at_end(&self) -> bool {
        self.flags.is_some_and(|f| f & flags::FCS_AT_END != 0)
    }
}

fn read_u32(data: &[u8], at: usize, limit: usize) -> Result<u32, ParseError> {
    if at + 4 > limit {
        return Err(ParseError::InvalidRadiotapLength {
            length: limit,
            available: data.len(),
        });
    }
    Ok(u32::from_le_bytes([
        data[at],
        data[at + 1],
        data[at + 2],
        data[at + 3],
    ]))
}

#[inline]
fn align(offset: usize, to: usize) -> usize {
    (offset + to - 1) & !(to - 1)
}
