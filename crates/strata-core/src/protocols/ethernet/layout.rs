pub const DST_RANGE: std::ops::Range<usize> = 0..6;
pub const SRC_RANGE: std::ops::Range<usize> = 6..12;
pub const ETHERTYPE_RANGE: std::ops::Range<usize> = 12..14;

pub const HEADER_LEN: usize = 14;

/// Values at or below this in the type field are 802.3 length fields.
pub const MAX_LLC_LENGTH: u16 = 1500;

pub const ETHERTYPE_IPV4: u16 = 0x0800;
