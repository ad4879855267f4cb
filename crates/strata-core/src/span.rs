use thiserror::Error;

/// Error raised when a `(buffer, offset, length)` request does not fit the
/// backing buffer.
///
/// A bounds failure is a usage bug or a buffer shorter than its declared
/// length. It is always fatal to the dissection call that raised it and is
/// never converted into an illegal-data node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoundsError {
    #[error("span out of bounds: offset {offset} + length {length} exceeds buffer of {buffer} bytes")]
    OutOfBuffer {
        offset: usize,
        length: usize,
        buffer: usize,
    },
}

/// A validated `(buffer, offset, length)` view into a byte sequence.
///
/// Validation never copies; bytes are copied only on extraction
/// (`to_vec`). Every dissection entry point builds a `Span` before any
/// field is read, so all downstream reads are bounded by construction.
#[derive(Debug, Clone, Copy)]
pub struct Span<'a> {
    buffer: &'a [u8],
    offset: usize,
    length: usize,
}

impl<'a> Span<'a> {
    /// Validate `offset + length` against `buffer` and return the view.
    pub fn new(buffer: &'a [u8], offset: usize, length: usize) -> Result<Self, BoundsError> {
        let end = offset.checked_add(length).ok_or(BoundsError::OutOfBuffer {
            offset,
            length,
            buffer: buffer.len(),
        })?;
        if end > buffer.len() {
            return Err(BoundsError::OutOfBuffer {
                offset,
                length,
                buffer: buffer.len(),
            });
        }
        Ok(Self {
            buffer,
            offset,
            length,
        })
    }

    /// View covering the whole buffer.
    pub fn whole(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            offset: 0,
            length: buffer.len(),
        }
    }

    /// Sub-view relative to this span, re-validated against it.
    pub fn sub(&self, offset: usize, length: usize) -> Result<Self, BoundsError> {
        let end = offset.checked_add(length).ok_or(BoundsError::OutOfBuffer {
            offset,
            length,
            buffer: self.length,
        })?;
        if end > self.length {
            return Err(BoundsError::OutOfBuffer {
                offset,
                length,
                buffer: self.length,
            });
        }
        Ok(Self {
            buffer: self.buffer,
            offset: self.offset + offset,
            length,
        })
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Borrow the covered bytes without copying.
    pub fn bytes(&self) -> &'a [u8] {
        &self.buffer[self.offset..self.offset + self.length]
    }

    /// Copy the covered bytes out.
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::{BoundsError, Span};

    #[test]
    fn new_accepts_exact_fit() {
        let buf = [1u8, 2, 3, 4];
        let span = Span::new(&buf, 1, 3).unwrap();
        assert_eq!(span.bytes(), &[2, 3, 4]);
        assert_eq!(span.len(), 3);
    }

    #[test]
    fn new_rejects_overrun() {
        let buf = [0u8; 4];
        let err = Span::new(&buf, 2, 3).unwrap_err();
        assert_eq!(
            err,
            BoundsError::OutOfBuffer {
                offset: 2,
                length: 3,
                buffer: 4
            }
        );
    }

    #[test]
    fn new_rejects_offset_overflow() {
        let buf = [0u8; 4];
        assert!(Span::new(&buf, usize::MAX, 1).is_err());
    }

    #[test]
    fn sub_is_relative_and_bounded() {
        let buf = [0u8, 1, 2, 3, 4, 5];
        let span = Span::new(&buf, 1, 4).unwrap();
        let sub = span.sub(2, 2).unwrap();
        assert_eq!(sub.bytes(), &[3, 4]);
        assert!(span.sub(2, 3).is_err());
    }

    #[test]
    fn whole_covers_buffer() {
        let buf = [7u8, 8];
        let span = Span::whole(&buf);
        assert_eq!(span.to_vec(), vec![7, 8]);
        assert!(!span.is_empty());
    }

    #[test]
    fn empty_span_at_end_is_valid() {
        let buf = [0u8; 4];
        let span = Span::new(&buf, 4, 0).unwrap();
        assert!(span.is_empty());
    }
}
