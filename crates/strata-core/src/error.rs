use thiserror::Error;

use crate::packet::LayerKind;

/// Data-shape error raised while dissecting one layer.
///
/// Unlike [`BoundsError`](crate::BoundsError), a dissection error is
/// recovered locally: the nearest enclosing dissection substitutes an
/// illegal-data node carrying the failing bytes and this error, and the
/// outer chain completes. The error is never silently dropped; it stays
/// inspectable on the node via [`IllegalData::cause`](crate::IllegalData::cause).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum DissectError {
    #[error("truncated {layer}: need {needed} bytes, got {actual}")]
    Truncated {
        layer: &'static str,
        needed: usize,
        actual: usize,
    },
    #[error("invalid {field} in {layer}: {value:#x}")]
    InvalidField {
        layer: &'static str,
        field: &'static str,
        value: u64,
    },
}

/// Error raised when finalizing a builder chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("UDP checksum correction requires pseudo-header addresses")]
    MissingPseudoHeader,
    #[error("IPv4 options length {0} is not a multiple of 4")]
    UnalignedOptions(usize),
    #[error("IPv4 options too long: {0} bytes, maximum 40")]
    OversizedOptions(usize),
    #[error("{kind:?} layer cannot carry a payload")]
    LeafPayload { kind: LayerKind },
}
