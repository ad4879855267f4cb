use std::ops::Range;

use crate::error::DissectError;
use crate::span::Span;

/// Bounds-checked field reads over one layer's span.
///
/// Parsers never index the span directly; every read goes through this
/// reader so that a short span surfaces as a `Truncated` dissection error
/// naming the layer, not a panic or an out-of-span read.
pub(crate) struct LayerReader<'a> {
    span: Span<'a>,
    layer: &'static str,
}

impl<'a> LayerReader<'a> {
    pub(crate) fn new(span: Span<'a>, layer: &'static str) -> Self {
        Self { span, layer }
    }

    pub(crate) fn require_len(&self, needed: usize) -> Result<(), DissectError> {
        if self.span.len() < needed {
            return Err(DissectError::Truncated {
                layer: self.layer,
                needed,
                actual: self.span.len(),
            });
        }
        Ok(())
    }

    pub(crate) fn read_u8(&self, offset: usize) -> Result<u8, DissectError> {
        self.span
            .bytes()
            .get(offset)
            .copied()
            .ok_or(DissectError::Truncated {
                layer: self.layer,
                needed: offset + 1,
                actual: self.span.len(),
            })
    }

    pub(crate) fn read_u16_be(&self, range: Range<usize>) -> Result<u16, DissectError> {
        let bytes = self.read_slice(range)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub(crate) fn read_array6(&self, range: Range<usize>) -> Result<[u8; 6], DissectError> {
        let bytes = self.read_slice(range)?;
        let mut out = [0u8; 6];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub(crate) fn read_array4(&self, range: Range<usize>) -> Result<[u8; 4], DissectError> {
        let bytes = self.read_slice(range)?;
        let mut out = [0u8; 4];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub(crate) fn read_slice(&self, range: Range<usize>) -> Result<&'a [u8], DissectError> {
        self.span
            .bytes()
            .get(range.clone())
            .ok_or(DissectError::Truncated {
                layer: self.layer,
                needed: range.end,
                actual: self.span.len(),
            })
    }

    /// Remainder of the span after `from` bytes of header.
    pub(crate) fn rest(&self, from: usize) -> Result<Span<'a>, DissectError> {
        self.require_len(from)?;
        // The length was just checked, so the sub-view cannot fail.
        self.span
            .sub(from, self.span.len() - from)
            .map_err(|_| DissectError::Truncated {
                layer: self.layer,
                needed: from,
                actual: self.span.len(),
            })
    }
}
