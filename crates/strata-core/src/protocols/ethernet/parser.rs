use super::layout;
use super::{EthernetHeader, MacAddr};
use crate::error::DissectError;
use crate::packet::{Layer, Packet};
use crate::reader::LayerReader;
use crate::registry::{LayerClass, Registry};
use crate::span::Span;

/// Dissect an Ethernet II frame and recurse into its payload.
pub(crate) fn dissect(registry: &Registry, span: Span<'_>) -> Result<Packet, DissectError> {
    let reader = LayerReader::new(span, "Ethernet header");
    reader.require_len(layout::HEADER_LEN)?;

    let dst = MacAddr(reader.read_array6(layout::DST_RANGE)?);
    let src = MacAddr(reader.read_array6(layout::SRC_RANGE)?);
    let ethertype = reader.read_u16_be(layout::ETHERTYPE_RANGE)?;
    let rest = reader.rest(layout::HEADER_LEN)?;

    let payload = if rest.is_empty() {
        None
    } else if ethertype <= layout::MAX_LLC_LENGTH {
        // 802.3 length framing; LLC is not in the built-in catalog.
        Some(registry.dissect_opaque(rest))
    } else {
        Some(registry.dissect(LayerClass::EtherType, u64::from(ethertype), rest))
    };

    Ok(Packet::new(
        Layer::Ethernet(EthernetHeader { dst, src, ethertype }),
        payload,
    ))
}

#[cfg(test)]
mod tests {
    use super::dissect;
    use crate::error::DissectError;
    use crate::packet::LayerKind;
    use crate::registry::Registry;
    use crate::span::Span;

    fn frame(ethertype: u16, payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF];
        bytes.extend_from_slice(&[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        bytes.extend_from_slice(&ethertype.to_be_bytes());
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn dissect_reads_addresses_and_type() {
        let registry = Registry::with_builtins();
        let bytes = frame(0x1234, &[1, 2, 3]);
        let packet = dissect(&registry, Span::whole(&bytes)).unwrap();

        match packet.layer() {
            crate::packet::Layer::Ethernet(h) => {
                assert_eq!(h.dst().octets(), [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
                assert_eq!(h.src().octets(), [0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
                assert_eq!(h.ethertype(), 0x1234);
            }
            other => panic!("expected ethernet layer, got {other:?}"),
        }
        assert_eq!(packet.raw(), bytes);
    }

    #[test]
    fn unknown_ethertype_falls_back_to_raw() {
        let registry = Registry::with_builtins();
        let bytes = frame(0x9999, &[7, 7, 7]);
        let packet = dissect(&registry, Span::whole(&bytes)).unwrap();
        assert!(packet.contains(LayerKind::Raw));
        assert!(!packet.contains(LayerKind::Illegal));
    }

    #[test]
    fn llc_length_field_yields_opaque_payload() {
        let registry = Registry::with_builtins();
        let bytes = frame(0x0003, &[0xAA, 0xAA, 0x03]);
        let packet = dissect(&registry, Span::whole(&bytes)).unwrap();
        assert!(packet.contains(LayerKind::Raw));
    }

    #[test]
    fn headerless_payload_is_none() {
        let registry = Registry::with_builtins();
        let bytes = frame(0x0800, &[]);
        let packet = dissect(&registry, Span::whole(&bytes)).unwrap();
        assert!(packet.payload().is_none());
        assert_eq!(packet.len(), 14);
    }

    #[test]
    fn truncated_header_is_an_error() {
        let registry = Registry::with_builtins();
        let bytes = [0u8; 10];
        let err = dissect(&registry, Span::whole(&bytes)).unwrap_err();
        assert_eq!(
            err,
            DissectError::Truncated {
                layer: "Ethernet header",
                needed: 14,
                actual: 10
            }
        );
    }
}
