//! ## luftvakt-capture::capture
//! pcap-backed frame sources. Both sources stamp frames with the capture
//! time recorded by libpcap and stop early once `terminate` is set.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use pcap::{Activated, Capture, Device, Linktype};
use thiserror::Error;
use tracing::{debug, info, warn};

use luftvakt_core::frame::{CapturedFrame, LinkType};

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Capture device '{0}' not found")]
    DeviceNotFound(String),

    #[error("Unsupported link type {0} (expected 802.11 or radiotap)")]
    UnsupportedLinkType(i32),

    #[error("pcap error: {0}")]
    Pcap(#[from] pcap::Error),
}

/// Live capture handle options.
#[derive(Debug, Clone, Copy)]
pub struct CaptureSettings {
    pub promiscuous: bool,
    pub buffer_size: usize,
    pub timeout_ms: u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            promiscuous: true,
            buffer_size: 2 * 1024 * 1024,
            timeout_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub frames: u64,
    pub bytes: u64,
}

/// Maps a pcap datalink to the frame encapsulation it carries.
pub fn link_type_for(datalink: Linktype) -> Result<LinkType, CaptureError> {
    match datalink {
        Linktype::IEEE802_11 => Ok(LinkType::Ieee80211),
        Linktype::IEEE802_11_RADIOTAP => Ok(LinkType::Radiotap),
        Linktype(other) => Err(CaptureError::UnsupportedLinkType(other)),
    }
}

/// Run a live capture loop on the specified interface.
/// Blocks until `terminate` is set or the device fails.
pub fn run_live<F>(
    interface: &str,
    settings: &CaptureSettings,
    terminate: &AtomicBool,
    callback: F,
) -> Result<CaptureStats, CaptureError>
where
    F: FnMut(CapturedFrame),
{
    let device = Device::list()?
        .into_iter()
        .find(|d| d.name == interface)
        .ok_or_else(|| CaptureError::DeviceNotFound(interface.to_string()))?;

    let capture = Capture::from_device(device)?
        .promisc(settings.promiscuous)
        .buffer_size(i32::try_from(settings.buffer_size).unwrap_or(i32::MAX))
        .timeout(i32::try_from(settings.timeout_ms).unwrap_or(i32::MAX))
        .open()?;

    info!(interface, "Live capture opened");
    pump(capture, terminate, callback)
}

/// Replays every frame of a pcap file.
pub fn replay_file<F>(
    path: &Path,
    terminate: &AtomicBool,
    callback: F,
) -> Result<CaptureStats, CaptureError>
where
    F: FnMut(CapturedFrame),
{
    let capture = Capture::from_file(path)?;
    info!(path = %path.display(), "Replaying capture file");
    pump(capture, terminate, callback)
}

fn pump<T, F>(
    mut capture: Capture<T>,
    terminate: &AtomicBool,
    mut callback: F,
) -> Result<CaptureStats, CaptureError>
where
    T: Activated + ?Sized,
    F: FnMut(CapturedFrame),
{
    let link_type = link_type_for(capture.get_datalink())?;
    let mut stats = CaptureStats::default();

    while !terminate.load(Ordering::Relaxed) {
        match capture.next_packet() {
            Ok(packet) => {
                let ts = packet.header.ts;
                let timestamp = (ts.tv_sec as u64)
                    .saturating_mul(1_000_000_000)
                    .saturating_add(ts.tv_usec as u64 * 1_000);
                stats.frames += 1;
                stats.bytes += packet.data.len() as u64;
                callback(CapturedFrame::new(
                    timestamp,
                    Bytes::copy_from_slice(packet.data),
                    link_type,
                ));
            }
            Err(pcap::Error::TimeoutExpired) => continue,
            Err(pcap::Error::NoMorePackets) => break,
            Err(e) => {
                warn!("Capture stopped: {e}");
                return Err(e.into());
            }
        }
    }

    debug!(frames = stats.frames, bytes = stats.bytes, "Capture finished");
    Ok(stats)
}
