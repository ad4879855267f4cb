//! Internet checksum arithmetic (RFC 1071).
//!
//! Pure functions over bytes with no knowledge of the packet model. The
//! builder layer calls these when checksum correction is enabled; they are
//! also usable on their own to verify captured headers.

/// One's-complement sum over 16-bit big-endian words, odd trailing byte
/// padded with zero, folded to 16 bits and complemented.
pub fn internet_checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;

    let mut chunks = data.chunks_exact(2);
    for chunk in &mut chunks {
        sum += u32::from(u16::from_be_bytes([chunk[0], chunk[1]]));
    }
    if let Some(&byte) = chunks.remainder().first() {
        sum += u32::from(byte) << 8;
    }

    while (sum >> 16) != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }

    !sum as u16
}

/// Checksum of a transport segment prefixed with the IPv4 pseudo-header
/// (source, destination, zero, protocol, segment length).
pub fn pseudo_header_checksum(src: [u8; 4], dst: [u8; 4], protocol: u8, data: &[u8]) -> u16 {
    let mut covered = Vec::with_capacity(12 + data.len());
    covered.extend_from_slice(&src);
    covered.extend_from_slice(&dst);
    covered.push(0);
    covered.push(protocol);
    covered.extend_from_slice(&(data.len() as u16).to_be_bytes());
    covered.extend_from_slice(data);
    internet_checksum(&covered)
}
