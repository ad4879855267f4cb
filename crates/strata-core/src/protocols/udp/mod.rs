//! UDP layer.
//!
//! The checksum covers a pseudo-header with the enclosing IPv4 addresses,
//! so the header alone cannot recompute it. The builder carries the
//! addresses separately; [`Packet::to_builder`](crate::Packet::to_builder)
//! seeds them from the enclosing IPv4 layer when one is present. A
//! computed checksum of zero is transmitted as `0xFFFF` because zero on
//! the wire means "no checksum".

pub mod layout;
pub mod parser;

use std::fmt;
use std::net::Ipv4Addr;

use crate::checksum::pseudo_header_checksum;
use crate::error::BuildError;
use crate::packet::Packet;
use crate::protocols::ipv4::layout::PROTO_UDP;

/// Immutable UDP header.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UdpHeader {
    src_port: u16,
    dst_port: u16,
    length: u16,
    checksum: u16,
}

impl UdpHeader {
    pub fn src_port(&self) -> u16 {
        self.src_port
    }

    pub fn dst_port(&self) -> u16 {
        self.dst_port
    }

    /// Length field as parsed or built (header plus payload).
    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn checksum(&self) -> u16 {
        self.checksum
    }

    pub fn len(&self) -> usize {
        layout::HEADER_LEN
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn raw(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(layout::HEADER_LEN);
        out.extend_from_slice(&self.src_port.to_be_bytes());
        out.extend_from_slice(&self.dst_port.to_be_bytes());
        out.extend_from_slice(&self.length.to_be_bytes());
        out.extend_from_slice(&self.checksum.to_be_bytes());
        out
    }

    /// Builder pre-populated with this header's fields; pseudo-header
    /// addresses start unset and corrections start off.
    pub fn to_builder(&self) -> UdpBuilder {
        UdpBuilder {
            src_port: self.src_port,
            dst_port: self.dst_port,
            length: self.length,
            checksum: self.checksum,
            src_addr: None,
            dst_addr: None,
            correct_length: false,
            correct_checksum: false,
        }
    }
}

impl fmt::Display for UdpHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[UDP Header ({} bytes)]", layout::HEADER_LEN)?;
        writeln!(f, "  Source port: {}", self.src_port)?;
        writeln!(f, "  Destination port: {}", self.dst_port)?;
        writeln!(f, "  Length: {}", self.length)?;
        writeln!(f, "  Checksum: {:#06x}", self.checksum)
    }
}

/// Mutable mirror of [`UdpHeader`] with opt-in derived-field correction.
#[derive(Debug, Clone)]
pub struct UdpBuilder {
    src_port: u16,
    dst_port: u16,
    length: u16,
    checksum: u16,
    src_addr: Option<Ipv4Addr>,
    dst_addr: Option<Ipv4Addr>,
    correct_length: bool,
    correct_checksum: bool,
}

impl UdpBuilder {
    /// Fresh builder for generating packets from scratch; both
    /// corrections start enabled.
    pub fn new() -> Self {
        Self {
            src_port: 0,
            dst_port: 0,
            length: 0,
            checksum: 0,
            src_addr: None,
            dst_addr: None,
            correct_length: true,
            correct_checksum: true,
        }
    }

    pub fn src_port(&mut self, src_port: u16) -> &mut Self {
        self.src_port = src_port;
        self
    }

    pub fn dst_port(&mut self, dst_port: u16) -> &mut Self {
        self.dst_port = dst_port;
        self
    }

    pub fn length(&mut self, length: u16) -> &mut Self {
        self.length = length;
        self
    }

    pub fn checksum(&mut self, checksum: u16) -> &mut Self {
        self.checksum = checksum;
        self
    }

    /// Pseudo-header addresses used only for checksum correction.
    pub fn pseudo_header(&mut self, src: Ipv4Addr, dst: Ipv4Addr) -> &mut Self {
        self.src_addr = Some(src);
        self.dst_addr = Some(dst);
        self
    }

    /// Recompute the length field from the actual encoded size at build
    /// time, overriding any explicitly set value.
    pub fn correct_length(&mut self, on: bool) -> &mut Self {
        self.correct_length = on;
        self
    }

    /// Recompute the checksum over the pseudo-header plus the fully
    /// encoded segment, with the checksum field zeroed during the pass.
    pub fn correct_checksum(&mut self, on: bool) -> &mut Self {
        self.correct_checksum = on;
        self
    }

    pub(crate) fn build(&self, payload: Option<&Packet>) -> Result<UdpHeader, BuildError> {
        let payload_len = payload.map_or(0, Packet::len);
        let length = if self.correct_length {
            (layout::HEADER_LEN + payload_len) as u16
        } else {
            self.length
        };

        let mut header = UdpHeader {
            src_port: self.src_port,
            dst_port: self.dst_port,
            length,
            checksum: self.checksum,
        };

        if self.correct_checksum {
            let (src, dst) = match (self.src_addr, self.dst_addr) {
                (Some(src), Some(dst)) => (src, dst),
                _ => return Err(BuildError::MissingPseudoHeader),
            };
            let mut segment = header.raw();
            segment[layout::CHECKSUM_RANGE].fill(0);
            if let Some(payload) = payload {
                segment.extend_from_slice(&payload.raw());
            }
            let sum = pseudo_header_checksum(src.octets(), dst.octets(), PROTO_UDP, &segment);
            header.checksum = if sum == 0 { 0xFFFF } else { sum };
        }

        Ok(header)
    }
}

impl Default for UdpBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::UdpBuilder;
    use crate::error::BuildError;
    use crate::packet::{Layer, Packet};
    use crate::protocols::raw::RawData;

    fn payload(bytes: &[u8]) -> Packet {
        Packet::new(Layer::Raw(RawData::new(bytes.to_vec())), None)
    }

    #[test]
    fn corrected_length_tracks_payload() {
        let mut builder = UdpBuilder::new();
        builder
            .src_port(4000)
            .dst_port(53)
            .length(0)
            .pseudo_header(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2));
        let header = builder.build(Some(&payload(&[1, 2, 3, 4]))).unwrap();
        assert_eq!(header.length(), 12);
    }

    #[test]
    fn checksum_correction_without_addresses_fails() {
        let mut builder = UdpBuilder::new();
        builder.correct_length(false);
        assert_eq!(
            builder.build(None).unwrap_err(),
            BuildError::MissingPseudoHeader
        );
    }

    #[test]
    fn disabled_corrections_preserve_set_values() {
        let mut builder = UdpBuilder::new();
        builder
            .correct_length(false)
            .correct_checksum(false)
            .length(77)
            .checksum(0x1234);
        let header = builder.build(Some(&payload(&[0; 4]))).unwrap();
        assert_eq!(header.length(), 77);
        assert_eq!(header.checksum(), 0x1234);
    }

    #[test]
    fn repeated_builds_are_identical() {
        let mut builder = UdpBuilder::new();
        builder
            .src_port(1)
            .dst_port(2)
            .pseudo_header(Ipv4Addr::new(1, 1, 1, 1), Ipv4Addr::new(2, 2, 2, 2));
        let data = payload(&[5, 6, 7]);
        let first = builder.build(Some(&data)).unwrap();
        let second = builder.build(Some(&data)).unwrap();
        assert_eq!(first, second);
    }
}
