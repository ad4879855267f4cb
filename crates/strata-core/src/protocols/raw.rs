//! Opaque payload leaf.
//!
//! Doubles as the dispatch registry's fallback: a discriminator with no
//! registered constructor wraps the remaining span as undissected bytes
//! instead of failing, so unknown protocols never abort the dissection of
//! everything enclosing them.

use std::fmt;

use crate::error::{BuildError, DissectError};
use crate::packet::{hex_stream, Layer, Packet};
use crate::registry::Registry;
use crate::span::Span;

/// Undissected bytes carried as a headerless leaf.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawData {
    data: Vec<u8>,
}

impl RawData {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
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

    pub fn to_builder(&self) -> RawBuilder {
        RawBuilder {
            data: self.data.clone(),
        }
    }
}

impl fmt::Display for RawData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[Data ({} bytes)]", self.len())?;
        writeln!(f, "  Hex stream: {}", hex_stream(&self.data))
    }
}

/// Mutable mirror of [`RawData`].
#[derive(Debug, Clone, Default)]
pub struct RawBuilder {
    data: Vec<u8>,
}

impl RawBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&mut self, data: Vec<u8>) -> &mut Self {
        self.data = data;
        self
    }

    pub(crate) fn build(&self) -> Result<RawData, BuildError> {
        Ok(RawData {
            data: self.data.clone(),
        })
    }
}

/// Wrap a span as an opaque leaf. Never fails for a validated span.
pub(crate) fn dissect(_registry: &Registry, span: Span<'_>) -> Result<Packet, DissectError> {
    Ok(Packet::new(Layer::Raw(RawData::new(span.to_vec())), None))
}
