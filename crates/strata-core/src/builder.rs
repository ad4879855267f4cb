//! Mutable mirror of the immutable packet chain.
//!
//! Every chain node owns a layer builder plus an optional nested payload
//! builder, so edits to an inner layer propagate outward on the next
//! `build` without re-dissection. Building is payload-first: the inner
//! packet exists before the enclosing header is constructed, which is
//! what lets length and checksum correction see the real encoded sizes.
//!
//! Correction defaults are asymmetric on purpose. A builder derived from
//! a cleanly dissected chain is assumed to be an edit and corrections
//! start enabled; a builder derived from a chain containing an
//! illegal-data node starts with corrections disabled on every layer, so
//! round-tripping a corrupted capture preserves the original raw values
//! instead of recomputing a checksum over bytes that are known-malformed.

use std::net::Ipv4Addr;

use crate::error::BuildError;
use crate::packet::{IllegalData, Layer, LayerKind, Packet};
use crate::protocols::ethernet::EthernetBuilder;
use crate::protocols::ipv4::Ipv4Builder;
use crate::protocols::raw::RawBuilder;
use crate::protocols::udp::UdpBuilder;

/// Builder for one layer of a chain.
#[derive(Debug, Clone)]
pub enum LayerBuilder {
    Ethernet(EthernetBuilder),
    Ipv4(Ipv4Builder),
    Udp(UdpBuilder),
    Raw(RawBuilder),
    /// Carried forward from an existing illegal-data node; never created
    /// from scratch.
    Illegal(IllegalBuilder),
}

impl LayerBuilder {
    pub fn kind(&self) -> LayerKind {
        match self {
            LayerBuilder::Ethernet(_) => LayerKind::Ethernet,
            LayerBuilder::Ipv4(_) => LayerKind::Ipv4,
            LayerBuilder::Udp(_) => LayerKind::Udp,
            LayerBuilder::Raw(_) => LayerKind::Raw,
            LayerBuilder::Illegal(_) => LayerKind::Illegal,
        }
    }

    pub fn as_ethernet_mut(&mut self) -> Option<&mut EthernetBuilder> {
        match self {
            LayerBuilder::Ethernet(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_ipv4_mut(&mut self) -> Option<&mut Ipv4Builder> {
        match self {
            LayerBuilder::Ipv4(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_udp_mut(&mut self) -> Option<&mut UdpBuilder> {
        match self {
            LayerBuilder::Udp(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_raw_mut(&mut self) -> Option<&mut RawBuilder> {
        match self {
            LayerBuilder::Raw(b) => Some(b),
            _ => None,
        }
    }

    fn build(&self, payload: Option<&Packet>) -> Result<Layer, BuildError> {
        match self {
            LayerBuilder::Ethernet(b) => Ok(Layer::Ethernet(b.build(payload)?)),
            LayerBuilder::Ipv4(b) => Ok(Layer::Ipv4(b.build(payload)?)),
            LayerBuilder::Udp(b) => Ok(Layer::Udp(b.build(payload)?)),
            LayerBuilder::Raw(b) => {
                if payload.is_some() {
                    return Err(BuildError::LeafPayload {
                        kind: LayerKind::Raw,
                    });
                }
                Ok(Layer::Raw(b.build()?))
            }
            LayerBuilder::Illegal(b) => {
                if payload.is_some() {
                    return Err(BuildError::LeafPayload {
                        kind: LayerKind::Illegal,
                    });
                }
                Ok(Layer::Illegal(b.inner.clone()))
            }
        }
    }
}

/// Round-trips an illegal-data node through a builder chain unchanged.
#[derive(Debug, Clone)]
pub struct IllegalBuilder {
    inner: IllegalData,
}

impl IllegalBuilder {
    pub fn bytes(&self) -> &[u8] {
        self.inner.bytes()
    }
}

/// Mutable chain node mirroring [`Packet`].
#[derive(Debug, Clone)]
pub struct PacketBuilder {
    layer: LayerBuilder,
    payload: Option<Box<PacketBuilder>>,
}

impl PacketBuilder {
    pub fn new(layer: LayerBuilder) -> Self {
        Self {
            layer,
            payload: None,
        }
    }

    /// Chainable payload setter for assembling chains from scratch.
    pub fn payload(mut self, payload: PacketBuilder) -> Self {
        self.payload = Some(Box::new(payload));
        self
    }

    pub fn set_payload(&mut self, payload: Option<PacketBuilder>) {
        self.payload = payload.map(Box::new);
    }

    pub fn layer(&self) -> &LayerBuilder {
        &self.layer
    }

    pub fn layer_mut(&mut self) -> &mut LayerBuilder {
        &mut self.layer
    }

    pub fn kind(&self) -> LayerKind {
        self.layer.kind()
    }

    /// Build the chain: payload first, then this layer with the
    /// now-known payload in hand. Side-effect-free on the builder;
    /// repeated calls over an unchanged builder yield equal packets.
    pub fn build(&self) -> Result<Packet, BuildError> {
        let payload = match &self.payload {
            Some(inner) => Some(inner.build()?),
            None => None,
        };
        let layer = self.layer.build(payload.as_ref())?;
        Ok(Packet::new(layer, payload))
    }

    /// Visit every builder in the chain, outer to inner, the same order
    /// the immutable chain iterates.
    pub fn for_each(&self, mut visit: impl FnMut(&PacketBuilder)) {
        let mut node = Some(self);
        while let Some(current) = node {
            visit(current);
            node = current.payload.as_deref();
        }
    }

    /// First builder of exactly `kind`, walking outer to inner.
    pub fn get(&self, kind: LayerKind) -> Option<&PacketBuilder> {
        if self.layer.kind() == kind {
            return Some(self);
        }
        self.payload.as_deref()?.get(kind)
    }

    pub fn get_mut(&mut self, kind: LayerKind) -> Option<&mut PacketBuilder> {
        if self.layer.kind() == kind {
            return Some(self);
        }
        self.payload.as_deref_mut()?.get_mut(kind)
    }

    /// Builder immediately enclosing the first builder of `kind`; the
    /// splice point for replacing a payload at a specific layer.
    pub fn outer_of(&self, kind: LayerKind) -> Option<&PacketBuilder> {
        let payload = self.payload.as_deref()?;
        if payload.layer.kind() == kind {
            Some(self)
        } else {
            payload.outer_of(kind)
        }
    }

    pub fn outer_of_mut(&mut self, kind: LayerKind) -> Option<&mut PacketBuilder> {
        let child_matches = self
            .payload
            .as_deref()
            .is_some_and(|payload| payload.layer.kind() == kind);
        if child_matches {
            return Some(self);
        }
        self.payload.as_deref_mut()?.outer_of_mut(kind)
    }
}

impl Packet {
    /// Builder chain pre-populated with this chain's fields.
    ///
    /// Corrections default to enabled only when the chain is clean; see
    /// the module documentation for why a chain containing illegal data
    /// keeps its parsed raw values instead. UDP builders are seeded with
    /// pseudo-header addresses from the enclosing IPv4 layer.
    pub fn to_builder(&self) -> PacketBuilder {
        let clean = !self.contains(LayerKind::Illegal);
        self.to_builder_inner(clean, None)
    }

    fn to_builder_inner(
        &self,
        correct: bool,
        enclosing_ipv4: Option<(Ipv4Addr, Ipv4Addr)>,
    ) -> PacketBuilder {
        let layer = match self.layer() {
            Layer::Ethernet(h) => LayerBuilder::Ethernet(h.to_builder()),
            Layer::Ipv4(h) => {
                let mut builder = h.to_builder();
                builder.correct_length(correct).correct_checksum(correct);
                LayerBuilder::Ipv4(builder)
            }
            Layer::Udp(h) => {
                let mut builder = h.to_builder();
                if let Some((src, dst)) = enclosing_ipv4 {
                    builder.pseudo_header(src, dst);
                }
                builder.correct_length(correct).correct_checksum(correct);
                LayerBuilder::Udp(builder)
            }
            Layer::Raw(d) => LayerBuilder::Raw(d.to_builder()),
            Layer::Illegal(d) => LayerBuilder::Illegal(IllegalBuilder { inner: d.clone() }),
        };

        let next_ipv4 = match self.layer() {
            Layer::Ipv4(h) => Some((h.src(), h.dst())),
            _ => enclosing_ipv4,
        };

        PacketBuilder {
            layer,
            payload: self
                .payload()
                .map(|inner| Box::new(inner.to_builder_inner(correct, next_ipv4))),
        }
    }
}
