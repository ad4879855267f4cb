//! Byte source boundary.
//!
//! The core has no knowledge of how bytes arrive; anything that can hand
//! over `(timestamp, linktype, bytes)` triples is a frame source. The
//! only implementation shipped here reads PCAP/PCAPNG files.

mod pcap;

pub use pcap::PcapFileSource;

use pcap_parser::Linktype;
use thiserror::Error;

/// One captured frame as delivered by a source.
#[derive(Debug, Clone)]
pub struct FrameEvent {
    /// Capture timestamp in seconds since the epoch, when known.
    pub ts: Option<f64>,
    /// Link-layer type of `data`.
    pub linktype: Linktype,
    pub data: Vec<u8>,
}

/// Producer of captured frames for the dissection pipeline.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<FrameEvent>, SourceError>;
}

/// Error raised while acquiring frames.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PCAP parse error: {0}")]
    Pcap(String),
}
