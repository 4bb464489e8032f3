//! ## luftvakt-protocols::fcs
//! Frame check sequence: CRC-32 (IEEE 802.3 polynomial, reflected, init and
//! final XOR `0xFFFFFFFF`), bit-identical to zlib's `crc32(0, ..)`.

use thiserror::Error;

use crate::ieee80211::FrameHeader;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("FCS mismatch: frame carries {expected:#010x}, computed {computed:#010x}")]
pub struct FcsMismatch {
    pub expected: u32,
    pub computed: u32,
}

#[inline]
pub fn compute(region: &[u8]) -> u32 {
    crc32fast::hash(region)
}

/// Recomputes the FCS over the header's checksummed region of `data`.
/// Frames without an FCS always verify.
pub fn verify(data: &[u8], header: &FrameHeader) -> Result<(), FcsMismatch> {
    let Some(expected) = header.fcs else {
        return Ok(());
    };
    let computed = compute(header.checksummed_region(data));
    if computed == expected {
        Ok(())
    } else {
        Err(FcsMismatch { expected, computed })
    }
}
