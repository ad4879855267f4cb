pub const VERSION_IHL_OFFSET: usize = 0;
pub const TOS_OFFSET: usize = 1;
pub const TOTAL_LENGTH_RANGE: std::ops::Range<usize> = 2..4;
pub const IDENTIFICATION_RANGE: std::ops::Range<usize> = 4..6;
pub const FLAGS_FRAGMENT_RANGE: std::ops::Range<usize> = 6..8;
pub const TTL_OFFSET: usize = 8;
pub const PROTOCOL_OFFSET: usize = 9;
pub const CHECKSUM_RANGE: std::ops::Range<usize> = 10..12;
pub const SRC_RANGE: std::ops::Range<usize> = 12..16;
pub const DST_RANGE: std::ops::Range<usize> = 16..20;

pub const MIN_HEADER_LEN: usize = 20;
pub const MAX_OPTIONS_LEN: usize = 40;

pub const VERSION: u8 = 4;
pub const MIN_IHL: u8 = 5;

pub const PROTO_UDP: u8 = 17;
