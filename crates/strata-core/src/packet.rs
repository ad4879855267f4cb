use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DissectError;
use crate::protocols::ethernet::EthernetHeader;
use crate::protocols::ipv4::Ipv4Header;
use crate::protocols::raw::RawData;
use crate::protocols::udp::UdpHeader;

/// Discriminant of a [`Layer`], used for type-indexed chain lookups.
///
/// Matching is exact: `get(LayerKind::Ipv4)` finds IPv4 nodes only, never
/// "anything network-shaped".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Ethernet,
    Ipv4,
    Udp,
    Raw,
    Illegal,
}

/// One protocol layer of a dissected packet.
///
/// Every variant is an immutable value created either by parsing a span or
/// by finalizing a builder, and re-encodes to wire-correct bytes via
/// [`raw`](Layer::raw).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Layer {
    Ethernet(EthernetHeader),
    Ipv4(Ipv4Header),
    Udp(UdpHeader),
    Raw(RawData),
    Illegal(IllegalData),
}

impl Layer {
    pub fn kind(&self) -> LayerKind {
        match self {
            Layer::Ethernet(_) => LayerKind::Ethernet,
            Layer::Ipv4(_) => LayerKind::Ipv4,
            Layer::Udp(_) => LayerKind::Udp,
            Layer::Raw(_) => LayerKind::Raw,
            Layer::Illegal(_) => LayerKind::Illegal,
        }
    }

    /// Encoded byte length of this layer alone, payload excluded.
    pub fn len(&self) -> usize {
        match self {
            Layer::Ethernet(h) => h.len(),
            Layer::Ipv4(h) => h.len(),
            Layer::Udp(h) => h.len(),
            Layer::Raw(d) => d.len(),
            Layer::Illegal(d) => d.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes this layer emits after its payload subtree, outside any
    /// nested datagram. Only IPv4 carries one (link-layer padding).
    pub fn trailer(&self) -> &[u8] {
        match self {
            Layer::Ipv4(h) => h.trailer(),
            _ => &[],
        }
    }

    /// Re-encoded bytes of this layer alone.
    pub fn raw(&self) -> Vec<u8> {
        match self {
            Layer::Ethernet(h) => h.raw(),
            Layer::Ipv4(h) => h.raw(),
            Layer::Udp(h) => h.raw(),
            Layer::Raw(d) => d.raw(),
            Layer::Illegal(d) => d.raw(),
        }
    }

    /// One-line field summary used in capture reports.
    pub fn summary(&self) -> String {
        match self {
            Layer::Ethernet(h) => {
                format!("{} -> {}, type {:#06x}", h.src(), h.dst(), h.ethertype())
            }
            Layer::Ipv4(h) => format!("{} -> {}, proto {}", h.src(), h.dst(), h.protocol()),
            Layer::Udp(h) => format!(
                "{} -> {}, length {}",
                h.src_port(),
                h.dst_port(),
                h.length()
            ),
            Layer::Raw(d) => format!("{} bytes", d.len()),
            Layer::Illegal(d) => d.cause().to_string(),
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::Ethernet(h) => h.fmt(f),
            Layer::Ipv4(h) => h.fmt(f),
            Layer::Udp(h) => h.fmt(f),
            Layer::Raw(d) => d.fmt(f),
            Layer::Illegal(d) => d.fmt(f),
        }
    }
}

/// Substitute leaf produced when dissecting a sub-region fails.
///
/// Retains the offending raw bytes and the causal error, and still honours
/// the layer contracts (`len`, `raw`) so a chain containing corruption
/// serializes back to the original input byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IllegalData {
    data: Vec<u8>,
    cause: DissectError,
}

impl IllegalData {
    pub(crate) fn new(data: Vec<u8>, cause: DissectError) -> Self {
        Self { data, cause }
    }

    /// The dissection error that produced this node.
    pub fn cause(&self) -> &DissectError {
        &self.cause
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn raw(&self) -> Vec<u8> {
        self.data.clone()
    }
}

impl fmt::Display for IllegalData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[Illegal Data ({} bytes)]", self.len())?;
        writeln!(f, "  Cause: {}", self.cause)?;
        writeln!(f, "  Hex stream: {}", hex_stream(&self.data))
    }
}

/// Immutable chain node: one layer plus at most one nested payload packet.
///
/// Chains are built bottom-up during dissection (innermost payload first)
/// or top-down when finalizing a builder. The raw bytes of a chain are the
/// outer-to-inner concatenation of every layer's raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Packet {
    layer: Layer,
    payload: Option<Box<Packet>>,
}

impl Packet {
    pub fn new(layer: Layer, payload: Option<Packet>) -> Self {
        Self {
            layer,
            payload: payload.map(Box::new),
        }
    }

    pub fn layer(&self) -> &Layer {
        &self.layer
    }

    pub fn payload(&self) -> Option<&Packet> {
        self.payload.as_deref()
    }

    /// Total encoded length: this layer, all nested payloads, and any
    /// trailers.
    pub fn len(&self) -> usize {
        self.layer.len()
            + self.payload.as_deref().map_or(0, Packet::len)
            + self.layer.trailer().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wire bytes of the whole chain, outer to inner; a layer's trailer
    /// follows its entire payload subtree.
    pub fn raw(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        self.write_raw(&mut out);
        out
    }

    fn write_raw(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.layer.raw());
        if let Some(payload) = self.payload.as_deref() {
            payload.write_raw(out);
        }
        out.extend_from_slice(self.layer.trailer());
    }

    /// Outer-to-inner iterator over the chain nodes.
    pub fn layers(&self) -> Layers<'_> {
        Layers { next: Some(self) }
    }

    /// First node of exactly `kind`, walking outer to inner.
    pub fn get(&self, kind: LayerKind) -> Option<&Packet> {
        self.layers().find(|node| node.layer.kind() == kind)
    }

    pub fn contains(&self, kind: LayerKind) -> bool {
        self.get(kind).is_some()
    }

    /// Node whose payload is the node `get(kind)` would return.
    pub fn outer_of(&self, kind: LayerKind) -> Option<&Packet> {
        let payload = self.payload.as_deref()?;
        if payload.layer.kind() == kind {
            Some(self)
        } else {
            payload.outer_of(kind)
        }
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in self.layers() {
            node.layer.fmt(f)?;
        }
        Ok(())
    }
}

/// Iterator returned by [`Packet::layers`].
pub struct Layers<'a> {
    next: Option<&'a Packet>,
}

impl<'a> Iterator for Layers<'a> {
    type Item = &'a Packet;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = node.payload.as_deref();
        Some(node)
    }
}

pub(crate) fn hex_stream(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}
