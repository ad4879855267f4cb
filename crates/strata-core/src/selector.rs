//! Selectors: discriminator inference from raw bytes.
//!
//! Used at encapsulation points where the enclosing layer carries no type
//! field of its own. A selector peeks at the minimum number of bytes
//! needed to disambiguate, bounds-checked, and hands the inferred
//! discriminator to the dispatch registry.

use crate::error::DissectError;
use crate::packet::Packet;
use crate::reader::LayerReader;
use crate::registry::{LayerClass, Registry};
use crate::span::Span;

/// Infer the IP version from the high nibble of the first byte.
pub fn ip_version(span: Span<'_>) -> Result<u64, DissectError> {
    let reader = LayerReader::new(span, "IP version selector");
    Ok(u64::from(reader.read_u8(0)? >> 4))
}

/// Entry dissector for the raw-IP linktype, which has no link-layer
/// header to name the network protocol.
pub(crate) fn dissect_raw_ip(registry: &Registry, span: Span<'_>) -> Result<Packet, DissectError> {
    let version = ip_version(span)?;
    Ok(registry.dissect(LayerClass::IpVersion, version, span))
}
