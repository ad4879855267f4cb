//! Ethernet II layer.
//!
//! The ethertype field is the discriminator for the payload: the parser
//! hands it to the dispatch registry under the `EtherType` class. Values
//! at or below 1500 are 802.3 length fields; those frames carry an LLC
//! payload the built-in catalog does not model, so they fall back to an
//! opaque payload node.

pub mod layout;
pub mod parser;

use std::fmt;

use crate::error::BuildError;
use crate::packet::Packet;

/// 6-byte hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    pub const BROADCAST: MacAddr = MacAddr([0xFF; 6]);

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 == 0x01
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

/// Immutable Ethernet II header.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EthernetHeader {
    dst: MacAddr,
    src: MacAddr,
    ethertype: u16,
}

impl EthernetHeader {
    pub fn dst(&self) -> MacAddr {
        self.dst
    }

    pub fn src(&self) -> MacAddr {
        self.src
    }

    pub fn ethertype(&self) -> u16 {
        self.ethertype
    }

    pub fn len(&self) -> usize {
        layout::HEADER_LEN
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn raw(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(layout::HEADER_LEN);
        out.extend_from_slice(&self.dst.0);
        out.extend_from_slice(&self.src.0);
        out.extend_from_slice(&self.ethertype.to_be_bytes());
        out
    }

    /// Builder pre-populated with this header's fields.
    pub fn to_builder(&self) -> EthernetBuilder {
        EthernetBuilder {
            dst: self.dst,
            src: self.src,
            ethertype: self.ethertype,
        }
    }
}

impl fmt::Display for EthernetHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[Ethernet II Header ({} bytes)]", layout::HEADER_LEN)?;
        writeln!(f, "  Destination: {}", self.dst)?;
        writeln!(f, "  Source: {}", self.src)?;
        writeln!(f, "  Type: {:#06x}", self.ethertype)
    }
}

/// Mutable mirror of [`EthernetHeader`].
#[derive(Debug, Clone)]
pub struct EthernetBuilder {
    dst: MacAddr,
    src: MacAddr,
    ethertype: u16,
}

impl EthernetBuilder {
    pub fn new() -> Self {
        Self {
            dst: MacAddr([0; 6]),
            src: MacAddr([0; 6]),
            ethertype: 0,
        }
    }

    pub fn dst(&mut self, dst: MacAddr) -> &mut Self {
        self.dst = dst;
        self
    }

    pub fn src(&mut self, src: MacAddr) -> &mut Self {
        self.src = src;
        self
    }

    pub fn ethertype(&mut self, ethertype: u16) -> &mut Self {
        self.ethertype = ethertype;
        self
    }

    pub(crate) fn build(&self, _payload: Option<&Packet>) -> Result<EthernetHeader, BuildError> {
        Ok(EthernetHeader {
            dst: self.dst,
            src: self.src,
            ethertype: self.ethertype,
        })
    }
}

impl Default for EthernetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{EthernetBuilder, MacAddr};

    #[test]
    fn mac_display_is_lowercase_colon_separated() {
        let mac = MacAddr([0x00, 0x1A, 0x2B, 0x3C, 0x4D, 0x5E]);
        assert_eq!(mac.to_string(), "00:1a:2b:3c:4d:5e");
        assert!(MacAddr::BROADCAST.is_multicast());
        assert!(!mac.is_multicast());
    }

    #[test]
    fn builder_round_trips_fields() {
        let mut builder = EthernetBuilder::new();
        builder
            .dst(MacAddr([1; 6]))
            .src(MacAddr([2; 6]))
            .ethertype(0x0800);
        let header = builder.build(None).unwrap();
        assert_eq!(header.dst(), MacAddr([1; 6]));
        assert_eq!(header.ethertype(), 0x0800);
        assert_eq!(header.raw().len(), 14);
        assert_eq!(header.to_builder().build(None).unwrap(), header);
    }
}
