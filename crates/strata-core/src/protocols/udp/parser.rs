use super::layout;
use super::UdpHeader;
use crate::error::DissectError;
use crate::packet::{Layer, Packet};
use crate::reader::LayerReader;
use crate::registry::Registry;
use crate::span::Span;

/// Dissect a UDP header; the remaining bytes become an opaque payload.
pub(crate) fn dissect(registry: &Registry, span: Span<'_>) -> Result<Packet, DissectError> {
    let reader = LayerReader::new(span, "UDP header");
    reader.require_len(layout::HEADER_LEN)?;

    let src_port = reader.read_u16_be(layout::SRC_PORT_RANGE)?;
    let dst_port = reader.read_u16_be(layout::DST_PORT_RANGE)?;
    let length = reader.read_u16_be(layout::LENGTH_RANGE)?;
    if usize::from(length) < layout::HEADER_LEN {
        return Err(DissectError::InvalidField {
            layer: "UDP header",
            field: "length",
            value: u64::from(length),
        });
    }
    let checksum = reader.read_u16_be(layout::CHECKSUM_RANGE)?;

    let rest = reader.rest(layout::HEADER_LEN)?;
    let payload = if rest.is_empty() {
        None
    } else {
        Some(registry.dissect_opaque(rest))
    };

    Ok(Packet::new(
        Layer::Udp(UdpHeader {
            src_port,
            dst_port,
            length,
            checksum,
        }),
        payload,
    ))
}

#[cfg(test)]
mod tests {
    use super::dissect;
    use crate::error::DissectError;
    use crate::packet::{Layer, LayerKind};
    use crate::registry::Registry;
    use crate::span::Span;

    fn datagram(length: u16, payload: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&6454u16.to_be_bytes());
        bytes.extend_from_slice(&6454u16.to_be_bytes());
        bytes.extend_from_slice(&length.to_be_bytes());
        bytes.extend_from_slice(&[0x00, 0x00]);
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn dissect_reads_ports_and_payload() {
        let registry = Registry::with_builtins();
        let bytes = datagram(12, &[1, 2, 3, 4]);
        let packet = dissect(&registry, Span::whole(&bytes)).unwrap();
        match packet.layer() {
            Layer::Udp(h) => {
                assert_eq!(h.src_port(), 6454);
                assert_eq!(h.length(), 12);
            }
            other => panic!("expected udp layer, got {other:?}"),
        }
        assert!(packet.contains(LayerKind::Raw));
        assert_eq!(packet.raw(), bytes);
    }

    #[test]
    fn length_below_header_len_is_invalid() {
        let registry = Registry::with_builtins();
        let bytes = datagram(3, &[]);
        assert_eq!(
            dissect(&registry, Span::whole(&bytes)).unwrap_err(),
            DissectError::InvalidField {
                layer: "UDP header",
                field: "length",
                value: 3
            }
        );
    }

    #[test]
    fn truncated_header_is_an_error() {
        let registry = Registry::with_builtins();
        let bytes = [0u8; 5];
        assert!(matches!(
            dissect(&registry, Span::whole(&bytes)),
            Err(DissectError::Truncated { needed: 8, .. })
        ));
    }

    #[test]
    fn empty_payload_is_none() {
        let registry = Registry::with_builtins();
        let bytes = datagram(8, &[]);
        let packet = dissect(&registry, Span::whole(&bytes)).unwrap();
        assert!(packet.payload().is_none());
    }
}
