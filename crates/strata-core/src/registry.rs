//! Dispatch registry: the framework's only extension point.
//!
//! A dissection routine is selected by `(class, discriminator)`, where the
//! class names the discriminator's namespace (an ethertype 0x0800 and a
//! linktype 0x0800 mean different things) and the discriminator is the
//! value a parsed field or a selector produced. The table is append-only:
//! registration happens at startup, lookups happen concurrently afterwards.
//! The process-wide default registry is published once behind a `OnceLock`
//! with every built-in protocol registered, so concurrent dissections read
//! it without locking.

use std::collections::HashMap;
use std::sync::OnceLock;

use thiserror::Error;

use crate::error::DissectError;
use crate::packet::{IllegalData, Layer, Packet};
use crate::protocols::ethernet::layout::ETHERTYPE_IPV4;
use crate::protocols::ipv4::layout::PROTO_UDP;
use crate::protocols::{ethernet, ipv4, raw, udp};
use crate::selector;
use crate::span::Span;

/// Discriminator namespace consulted when choosing a payload dissector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerClass {
    /// Capture link-layer type codes (1 = Ethernet, 101 = raw IP).
    Linktype,
    /// Ethernet type field values.
    EtherType,
    /// IP version nibbles, inferred by a selector where no enclosing
    /// type field exists.
    IpVersion,
    /// IPv4 protocol numbers.
    IpProtocol,
}

/// Linktype code for Ethernet frames.
pub const LINKTYPE_ETHERNET: u64 = 1;
/// Linktype code for raw IP packets with no link-layer header.
pub const LINKTYPE_RAW: u64 = 101;

/// A dissection routine: parses one layer from the span and recurses into
/// the payload through the registry it is handed.
pub type DissectFn = fn(&Registry, Span<'_>) -> Result<Packet, DissectError>;

/// Error raised on a conflicting registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("duplicate registration for {class:?} discriminator {discriminator:#x}")]
    Duplicate {
        class: LayerClass,
        discriminator: u64,
    },
}

/// Runtime-extensible `(class, discriminator) -> dissector` table.
#[derive(Debug, Default)]
pub struct Registry {
    table: HashMap<(LayerClass, u64), DissectFn>,
}

impl Registry {
    /// Empty registry; every lookup falls back to the opaque constructor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in protocol catalog registered.
    pub fn with_builtins() -> Self {
        let mut table: HashMap<(LayerClass, u64), DissectFn> = HashMap::new();
        table.insert(
            (LayerClass::Linktype, LINKTYPE_ETHERNET),
            ethernet::parser::dissect,
        );
        table.insert((LayerClass::Linktype, LINKTYPE_RAW), selector::dissect_raw_ip);
        table.insert(
            (LayerClass::EtherType, u64::from(ETHERTYPE_IPV4)),
            ipv4::parser::dissect,
        );
        // Several discriminator values may share one constructor; the
        // version nibble and the ethertype both select the IPv4 parser.
        table.insert((LayerClass::IpVersion, 4), ipv4::parser::dissect);
        table.insert(
            (LayerClass::IpProtocol, u64::from(PROTO_UDP)),
            udp::parser::dissect,
        );
        Self { table }
    }

    /// Register a dissector for one discriminator value.
    ///
    /// One discriminator maps to exactly one constructor; registering an
    /// already-claimed key is rejected rather than silently replaced.
    pub fn register(
        &mut self,
        class: LayerClass,
        discriminator: u64,
        dissector: DissectFn,
    ) -> Result<(), RegistryError> {
        if self.table.contains_key(&(class, discriminator)) {
            return Err(RegistryError::Duplicate {
                class,
                discriminator,
            });
        }
        self.table.insert((class, discriminator), dissector);
        Ok(())
    }

    pub fn lookup(&self, class: LayerClass, discriminator: u64) -> Option<DissectFn> {
        self.table.get(&(class, discriminator)).copied()
    }

    /// Dissect a span with the constructor registered for the
    /// discriminator, containing any failure locally.
    ///
    /// A lookup miss wraps the span as an opaque payload; a dissection
    /// error wraps it as an illegal-data node carrying the causal error.
    /// Either way the enclosing chain completes and still serializes back
    /// to the original bytes. Because every parser routes its own payload
    /// through this method, the node substituted on failure is always the
    /// smallest failing sub-tree.
    pub fn dissect(&self, class: LayerClass, discriminator: u64, span: Span<'_>) -> Packet {
        match self.lookup(class, discriminator) {
            Some(dissector) => match dissector(self, span) {
                Ok(packet) => packet,
                Err(cause) => {
                    Packet::new(Layer::Illegal(IllegalData::new(span.to_vec(), cause)), None)
                }
            },
            None => self.dissect_opaque(span),
        }
    }

    /// The distinguished unknown-protocol fallback: an opaque leaf.
    pub fn dissect_opaque(&self, span: Span<'_>) -> Packet {
        // The raw constructor is infallible for a validated span.
        match raw::dissect(self, span) {
            Ok(packet) => packet,
            Err(cause) => {
                Packet::new(Layer::Illegal(IllegalData::new(span.to_vec(), cause)), None)
            }
        }
    }
}

static DEFAULT_REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Process-wide registry with the built-in catalog, published once.
pub fn default_registry() -> &'static Registry {
    DEFAULT_REGISTRY.get_or_init(Registry::with_builtins)
}

#[cfg(test)]
mod tests {
    use super::{default_registry, LayerClass, Registry, RegistryError};
    use crate::error::DissectError;
    use crate::packet::{Layer, LayerKind, Packet};
    use crate::span::Span;

    fn failing_dissector(
        _registry: &Registry,
        _span: Span<'_>,
    ) -> Result<Packet, DissectError> {
        Err(DissectError::InvalidField {
            layer: "test",
            field: "marker",
            value: 0,
        })
    }

    #[test]
    fn lookup_miss_falls_back_to_opaque() {
        let registry = Registry::new();
        let bytes = [1u8, 2, 3];
        let packet = registry.dissect(LayerClass::EtherType, 0xFFFF, Span::whole(&bytes));
        assert_eq!(packet.layer().kind(), LayerKind::Raw);
        assert_eq!(packet.raw(), bytes);
    }

    #[test]
    fn dissection_error_becomes_illegal_node() {
        let mut registry = Registry::new();
        registry
            .register(LayerClass::EtherType, 0x1111, failing_dissector)
            .unwrap();
        let bytes = [9u8, 9];
        let packet = registry.dissect(LayerClass::EtherType, 0x1111, Span::whole(&bytes));
        match packet.layer() {
            Layer::Illegal(node) => {
                assert_eq!(node.raw(), bytes);
                assert!(matches!(
                    node.cause(),
                    DissectError::InvalidField { layer: "test", .. }
                ));
            }
            other => panic!("expected illegal node, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = Registry::new();
        registry
            .register(LayerClass::IpProtocol, 200, failing_dissector)
            .unwrap();
        assert_eq!(
            registry.register(LayerClass::IpProtocol, 200, failing_dissector),
            Err(RegistryError::Duplicate {
                class: LayerClass::IpProtocol,
                discriminator: 200
            })
        );
        // Same discriminator under another class is a distinct key.
        registry
            .register(LayerClass::EtherType, 200, failing_dissector)
            .unwrap();
    }

    #[test]
    fn default_registry_is_shared() {
        let first = default_registry() as *const Registry;
        let second = default_registry() as *const Registry;
        assert_eq!(first, second);
        assert!(default_registry()
            .lookup(LayerClass::Linktype, super::LINKTYPE_ETHERNET)
            .is_some());
    }
}
