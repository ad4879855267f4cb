//! IPv4 layer.
//!
//! The protocol field is the payload discriminator (`IpProtocol` class).
//! The header carries two derived fields the builder can correct: the
//! total length and the header checksum. The payload is bounded by the
//! declared total length; bytes present beyond it (link-layer padding on
//! minimum-size frames) are kept on this node as a trailer, serialized
//! after the payload subtree and excluded from every correction. A total
//! length claiming more bytes than the span holds is tolerated here and
//! surfaces, if at all, as a failure of the nested payload dissection.

pub mod layout;
pub mod parser;

use std::fmt;
use std::net::Ipv4Addr;

use crate::checksum::internet_checksum;
use crate::error::BuildError;
use crate::packet::Packet;

/// Immutable IPv4 header. The version is fixed at 4 and the IHL is
/// implied by the options length.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ipv4Header {
    tos: u8,
    total_length: u16,
    identification: u16,
    flags: u8,
    fragment_offset: u16,
    ttl: u8,
    protocol: u8,
    checksum: u16,
    src: Ipv4Addr,
    dst: Ipv4Addr,
    options: Vec<u8>,
    trailer: Vec<u8>,
}

impl Ipv4Header {
    pub fn tos(&self) -> u8 {
        self.tos
    }

    /// Total length field as parsed or built, which may legitimately
    /// disagree with the bytes present in a corrupted capture.
    pub fn total_length(&self) -> u16 {
        self.total_length
    }

    pub fn identification(&self) -> u16 {
        self.identification
    }

    /// Three-bit flags field (reserved, DF, MF).
    pub fn flags(&self) -> u8 {
        self.flags
    }

    pub fn fragment_offset(&self) -> u16 {
        self.fragment_offset
    }

    pub fn ttl(&self) -> u8 {
        self.ttl
    }

    pub fn protocol(&self) -> u8 {
        self.protocol
    }

    pub fn checksum(&self) -> u16 {
        self.checksum
    }

    pub fn src(&self) -> Ipv4Addr {
        self.src
    }

    pub fn dst(&self) -> Ipv4Addr {
        self.dst
    }

    pub fn options(&self) -> &[u8] {
        &self.options
    }

    /// Bytes found beyond the declared total length, typically link-layer
    /// padding. Not part of the datagram; emitted after the payload.
    pub fn trailer(&self) -> &[u8] {
        &self.trailer
    }

    pub fn len(&self) -> usize {
        layout::MIN_HEADER_LEN + self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn raw(&self) -> Vec<u8> {
        let header_len = self.len();
        let ihl = (header_len / 4) as u8;
        let mut out = Vec::with_capacity(header_len);
        out.push((layout::VERSION << 4) | ihl);
        out.push(self.tos);
        out.extend_from_slice(&self.total_length.to_be_bytes());
        out.extend_from_slice(&self.identification.to_be_bytes());
        let flags_frag = (u16::from(self.flags) << 13) | (self.fragment_offset & 0x1FFF);
        out.extend_from_slice(&flags_frag.to_be_bytes());
        out.push(self.ttl);
        out.push(self.protocol);
        out.extend_from_slice(&self.checksum.to_be_bytes());
        out.extend_from_slice(&self.src.octets());
        out.extend_from_slice(&self.dst.octets());
        out.extend_from_slice(&self.options);
        out
    }

    /// Builder pre-populated with this header's fields. Corrections are
    /// off; [`Packet::to_builder`](crate::Packet::to_builder) turns them
    /// on when the source chain is clean.
    pub fn to_builder(&self) -> Ipv4Builder {
        Ipv4Builder {
            tos: self.tos,
            total_length: self.total_length,
            identification: self.identification,
            flags: self.flags,
            fragment_offset: self.fragment_offset,
            ttl: self.ttl,
            protocol: self.protocol,
            checksum: self.checksum,
            src: self.src,
            dst: self.dst,
            options: self.options.clone(),
            trailer: self.trailer.clone(),
            correct_length: false,
            correct_checksum: false,
        }
    }
}

impl fmt::Display for Ipv4Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[IPv4 Header ({} bytes)]", self.len())?;
        writeln!(f, "  Version: 4")?;
        writeln!(f, "  TOS: {:#04x}", self.tos)?;
        writeln!(f, "  Total length: {}", self.total_length)?;
        writeln!(f, "  Identification: {:#06x}", self.identification)?;
        writeln!(
            f,
            "  Flags: {:#05b}, Fragment offset: {}",
            self.flags, self.fragment_offset
        )?;
        writeln!(f, "  TTL: {}", self.ttl)?;
        writeln!(f, "  Protocol: {}", self.protocol)?;
        writeln!(f, "  Header checksum: {:#06x}", self.checksum)?;
        writeln!(f, "  Source: {}", self.src)?;
        writeln!(f, "  Destination: {}", self.dst)?;
        if !self.trailer.is_empty() {
            writeln!(f, "  Trailer: {} bytes", self.trailer.len())?;
        }
        Ok(())
    }
}

/// Mutable mirror of [`Ipv4Header`] with opt-in derived-field correction.
#[derive(Debug, Clone)]
pub struct Ipv4Builder {
    tos: u8,
    total_length: u16,
    identification: u16,
    flags: u8,
    fragment_offset: u16,
    ttl: u8,
    protocol: u8,
    checksum: u16,
    src: Ipv4Addr,
    dst: Ipv4Addr,
    options: Vec<u8>,
    trailer: Vec<u8>,
    correct_length: bool,
    correct_checksum: bool,
}

impl Ipv4Builder {
    /// Fresh builder for generating packets from scratch; both
    /// corrections start enabled.
    pub fn new() -> Self {
        Self {
            tos: 0,
            total_length: 0,
            identification: 0,
            flags: 0,
            fragment_offset: 0,
            ttl: 64,
            protocol: 0,
            checksum: 0,
            src: Ipv4Addr::UNSPECIFIED,
            dst: Ipv4Addr::UNSPECIFIED,
            options: Vec::new(),
            trailer: Vec::new(),
            correct_length: true,
            correct_checksum: true,
        }
    }

    pub fn tos(&mut self, tos: u8) -> &mut Self {
        self.tos = tos;
        self
    }

    pub fn total_length(&mut self, total_length: u16) -> &mut Self {
        self.total_length = total_length;
        self
    }

    pub fn identification(&mut self, identification: u16) -> &mut Self {
        self.identification = identification;
        self
    }

    pub fn flags(&mut self, flags: u8) -> &mut Self {
        self.flags = flags & 0x07;
        self
    }

    pub fn fragment_offset(&mut self, fragment_offset: u16) -> &mut Self {
        self.fragment_offset = fragment_offset & 0x1FFF;
        self
    }

    pub fn ttl(&mut self, ttl: u8) -> &mut Self {
        self.ttl = ttl;
        self
    }

    pub fn protocol(&mut self, protocol: u8) -> &mut Self {
        self.protocol = protocol;
        self
    }

    pub fn checksum(&mut self, checksum: u16) -> &mut Self {
        self.checksum = checksum;
        self
    }

    pub fn src(&mut self, src: Ipv4Addr) -> &mut Self {
        self.src = src;
        self
    }

    pub fn dst(&mut self, dst: Ipv4Addr) -> &mut Self {
        self.dst = dst;
        self
    }

    /// Bytes to append after the payload, outside the datagram. Neither
    /// correction covers them.
    pub fn trailer(&mut self, trailer: Vec<u8>) -> &mut Self {
        self.trailer = trailer;
        self
    }

    pub fn options(&mut self, options: Vec<u8>) -> &mut Self {
        self.options = options;
        self
    }

    /// Recompute the total length from the encoded sizes at build time,
    /// overriding any explicitly set value.
    pub fn correct_length(&mut self, on: bool) -> &mut Self {
        self.correct_length = on;
        self
    }

    /// Recompute the header checksum at build time with the checksum
    /// field zeroed during the computation pass.
    pub fn correct_checksum(&mut self, on: bool) -> &mut Self {
        self.correct_checksum = on;
        self
    }

    pub(crate) fn build(&self, payload: Option<&Packet>) -> Result<Ipv4Header, BuildError> {
        if self.options.len() % 4 != 0 {
            return Err(BuildError::UnalignedOptions(self.options.len()));
        }
        if self.options.len() > layout::MAX_OPTIONS_LEN {
            return Err(BuildError::OversizedOptions(self.options.len()));
        }

        let header_len = layout::MIN_HEADER_LEN + self.options.len();
        let total_length = if self.correct_length {
            (header_len + payload.map_or(0, Packet::len)) as u16
        } else {
            self.total_length
        };

        let mut header = Ipv4Header {
            tos: self.tos,
            total_length,
            identification: self.identification,
            flags: self.flags,
            fragment_offset: self.fragment_offset,
            ttl: self.ttl,
            protocol: self.protocol,
            checksum: self.checksum,
            src: self.src,
            dst: self.dst,
            options: self.options.clone(),
            trailer: self.trailer.clone(),
        };

        if self.correct_checksum {
            let mut bytes = header.raw();
            bytes[layout::CHECKSUM_RANGE].fill(0);
            header.checksum = internet_checksum(&bytes);
        }

        Ok(header)
    }
}

impl Default for Ipv4Builder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::{layout, Ipv4Builder};
    use crate::checksum::internet_checksum;
    use crate::error::BuildError;

    #[test]
    fn corrected_checksum_verifies_to_zero() {
        let mut builder = Ipv4Builder::new();
        builder
            .protocol(layout::PROTO_UDP)
            .src(Ipv4Addr::new(10, 0, 0, 1))
            .dst(Ipv4Addr::new(10, 0, 0, 2));
        let header = builder.build(None).unwrap();
        // Checksum over a header including its own checksum folds to zero.
        assert_eq!(internet_checksum(&header.raw()), 0);
        assert_eq!(header.total_length(), 20);
    }

    #[test]
    fn disabled_corrections_preserve_set_values() {
        let mut builder = Ipv4Builder::new();
        builder
            .correct_length(false)
            .correct_checksum(false)
            .total_length(9999)
            .checksum(0xBEEF);
        let header = builder.build(None).unwrap();
        assert_eq!(header.total_length(), 9999);
        assert_eq!(header.checksum(), 0xBEEF);
    }

    #[test]
    fn trailer_is_excluded_from_corrections() {
        let mut builder = Ipv4Builder::new();
        builder.trailer(vec![0xAA; 10]);
        let header = builder.build(None).unwrap();
        assert_eq!(header.total_length(), 20);
        assert_eq!(header.trailer(), &[0xAA; 10]);
        assert_eq!(internet_checksum(&header.raw()), 0);
    }

    #[test]
    fn unaligned_options_are_rejected() {
        let mut builder = Ipv4Builder::new();
        builder.options(vec![1, 2, 3]);
        assert_eq!(
            builder.build(None).unwrap_err(),
            BuildError::UnalignedOptions(3)
        );
    }

    #[test]
    fn oversized_options_are_rejected() {
        let mut builder = Ipv4Builder::new();
        builder.options(vec![0; 44]);
        assert_eq!(
            builder.build(None).unwrap_err(),
            BuildError::OversizedOptions(44)
        );
    }

    #[test]
    fn options_extend_header_len_and_ihl() {
        let mut builder = Ipv4Builder::new();
        builder.options(vec![0; 8]);
        let header = builder.build(None).unwrap();
        assert_eq!(header.len(), 28);
        assert_eq!(header.raw()[layout::VERSION_IHL_OFFSET], (4 << 4) | 7);
        assert_eq!(header.total_length(), 28);
    }
}
