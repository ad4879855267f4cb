//! Strata core library for packet composition and dissection.
//!
//! This crate models a packet as a singly linked chain of layers, outermost
//! first. Dissection walks raw bytes through a registry of parser functions
//! keyed by layer class and discriminator (linktype, ethertype, IP version,
//! IP protocol); unknown discriminators fall back to opaque raw nodes and
//! malformed regions are contained as illegal-data nodes that preserve the
//! failing bytes together with their cause. Composition mirrors dissection:
//! every packet converts to a mutable builder chain that rebuilds the packet
//! innermost first, optionally correcting length and checksum fields.
//!
//! Invariants:
//! - Packets and their layers are immutable once constructed.
//! - A dissected chain serializes back to the exact input bytes.
//! - Parser failures never escape a frame; they become illegal-data nodes.
//! - Byte access is bounds-checked up front through [`Span`].
//!
//! # Examples
//! ```
//! use strata_core::{LINKTYPE_ETHERNET, LayerKind, default_registry, dissect_frame};
//!
//! let mut frame = vec![0xFF; 6];
//! frame.extend_from_slice(&[0x02; 6]);
//! frame.extend_from_slice(&0x9000u16.to_be_bytes());
//! frame.extend_from_slice(b"opaque payload");
//!
//! let packet = dissect_frame(default_registry(), LINKTYPE_ETHERNET, &frame, 0, frame.len())?;
//! assert_eq!(packet.layer().kind(), LayerKind::Ethernet);
//! assert_eq!(packet.raw(), frame);
//! # Ok::<(), strata_core::BoundsError>(())
//! ```

mod builder;
mod error;
mod packet;
mod reader;
mod registry;
mod report;
mod selector;
mod source;
mod span;

pub mod checksum;
pub mod protocols;

pub use builder::{IllegalBuilder, LayerBuilder, PacketBuilder};
pub use error::{BuildError, DissectError};
pub use packet::{IllegalData, Layer, LayerKind, Layers, Packet};
pub use registry::{
    DissectFn, LINKTYPE_ETHERNET, LINKTYPE_RAW, LayerClass, Registry, RegistryError,
    default_registry,
};
pub use report::{
    CaptureSummary, DEFAULT_GENERATED_AT, InputInfo, LayerSummary, PacketSummary, Report,
    ReportError, ToolInfo, dissect_pcap_file, dissect_source,
};
pub use selector::ip_version;
pub use source::{FrameEvent, FrameSource, PcapFileSource, SourceError};
pub use span::{BoundsError, Span};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;

/// Dissect one captured frame into a packet chain.
///
/// `offset` and `length` select the frame region inside `buffer`; an
/// out-of-bounds region is a caller error and fails fast with
/// [`BoundsError`]. Everything inside the region dissects infallibly:
/// unknown link types produce a raw node and malformed layers produce
/// illegal-data nodes.
pub fn dissect_frame(
    registry: &Registry,
    linktype: u64,
    buffer: &[u8],
    offset: usize,
    length: usize,
) -> Result<Packet, BoundsError> {
    let span = Span::new(buffer, offset, length)?;
    Ok(registry.dissect(LayerClass::Linktype, linktype, span))
}

/// Map a capture link type onto its registry discriminator.
pub fn linktype_code(linktype: pcap_parser::Linktype) -> u64 {
    u64::from(linktype.0 as u32)
}
