use std::net::Ipv4Addr;

use super::layout;
use super::Ipv4Header;
use crate::error::DissectError;
use crate::packet::{Layer, Packet};
use crate::reader::LayerReader;
use crate::registry::{LayerClass, Registry};
use crate::span::Span;

/// Dissect an IPv4 header and recurse into its payload.
pub(crate) fn dissect(registry: &Registry, span: Span<'_>) -> Result<Packet, DissectError> {
    let reader = LayerReader::new(span, "IPv4 header");
    reader.require_len(layout::MIN_HEADER_LEN)?;

    let version_ihl = reader.read_u8(layout::VERSION_IHL_OFFSET)?;
    let version = version_ihl >> 4;
    if version != layout::VERSION {
        return Err(DissectError::InvalidField {
            layer: "IPv4 header",
            field: "version",
            value: u64::from(version),
        });
    }
    let ihl = version_ihl & 0x0F;
    if ihl < layout::MIN_IHL {
        return Err(DissectError::InvalidField {
            layer: "IPv4 header",
            field: "IHL",
            value: u64::from(ihl),
        });
    }
    let header_len = usize::from(ihl) * 4;
    reader.require_len(header_len)?;

    let tos = reader.read_u8(layout::TOS_OFFSET)?;
    let total_length = reader.read_u16_be(layout::TOTAL_LENGTH_RANGE)?;
    if usize::from(total_length) < header_len {
        return Err(DissectError::InvalidField {
            layer: "IPv4 header",
            field: "total length",
            value: u64::from(total_length),
        });
    }
    let identification = reader.read_u16_be(layout::IDENTIFICATION_RANGE)?;
    let flags_frag = reader.read_u16_be(layout::FLAGS_FRAGMENT_RANGE)?;
    let ttl = reader.read_u8(layout::TTL_OFFSET)?;
    let protocol = reader.read_u8(layout::PROTOCOL_OFFSET)?;
    let checksum = reader.read_u16_be(layout::CHECKSUM_RANGE)?;
    let src = Ipv4Addr::from(reader.read_array4(layout::SRC_RANGE)?);
    let dst = Ipv4Addr::from(reader.read_array4(layout::DST_RANGE)?);
    let options = reader
        .read_slice(layout::MIN_HEADER_LEN..header_len)?
        .to_vec();

    let rest = reader.rest(header_len)?;
    // The payload is bounded by the declared total length; bytes beyond
    // it are link-layer padding, kept on this node as a trailer. A total
    // length claiming more than is present leaves the trailer empty.
    let datagram_len = usize::from(total_length) - header_len;
    let (data, trailer) = if rest.len() > datagram_len {
        // Both sub-views were just bounds-checked against the remainder.
        match (
            rest.sub(0, datagram_len),
            rest.sub(datagram_len, rest.len() - datagram_len),
        ) {
            (Ok(data), Ok(trailer)) => (data, trailer.to_vec()),
            _ => (rest, Vec::new()),
        }
    } else {
        (rest, Vec::new())
    };
    let payload = if data.is_empty() {
        None
    } else {
        Some(registry.dissect(LayerClass::IpProtocol, u64::from(protocol), data))
    };

    Ok(Packet::new(
        Layer::Ipv4(Ipv4Header {
            tos,
            total_length,
            identification,
            flags: (flags_frag >> 13) as u8,
            fragment_offset: flags_frag & 0x1FFF,
            ttl,
            protocol,
            checksum,
            src,
            dst,
            options,
            trailer,
        }),
        payload,
    ))
}
