//! Size-capped accumulation of streamed bytes.

use thiserror::Error;

/// Returned when a chunk would push a [`BoundedByteSink`] past its cap.
///
/// The caller must tear down whatever is producing the bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("byte cap exceeded: {attempted} bytes offered, limit is {limit}")]
pub struct Overflow {
    /// The configured cap.
    pub limit: u64,
    /// Total that would have been held had the chunk been accepted.
    pub attempted: u64,
}

/// Accumulates chunks in memory while enforcing an optional hard cap.
///
/// The held buffer never exceeds the cap: the chunk that would cross it is
/// rejected whole and the sink reports [`Overflow`]. There is no disk spill.
///
/// # Example
///
/// ```
/// use mediagrab_core::download::BoundedByteSink;
///
/// let mut sink = BoundedByteSink::new(Some(8));
/// sink.feed(b"abcd").unwrap();
/// assert!(sink.feed(b"efghij").is_err());
/// assert_eq!(sink.finish(), b"abcd");
/// ```
#[derive(Debug, Default)]
pub struct BoundedByteSink {
    buf: Vec<u8>,
    max_bytes: Option<u64>,
}

impl BoundedByteSink {
    /// Creates a sink. `None` accepts any amount and must only be used where
    /// another bound already applies.
    #[must_use]
    pub fn new(max_bytes: Option<u64>) -> Self {
        Self {
            buf: Vec::new(),
            max_bytes,
        }
    }

    /// Creates a sink and pre-allocates for an announced length when it fits the cap.
    #[must_use]
    pub fn with_size_hint(max_bytes: Option<u64>, hint: Option<u64>) -> Self {
        let capacity = match (hint, max_bytes) {
            (Some(hint), Some(max)) if hint <= max => hint,
            (Some(hint), None) => hint.min(super::DELIVERY_MAX_BYTES),
            _ => 0,
        };
        Self {
            buf: Vec::with_capacity(usize::try_from(capacity).unwrap_or(0)),
            max_bytes,
        }
    }

    /// Appends a chunk.
    ///
    /// # Errors
    ///
    /// Returns [`Overflow`] when accepting the chunk would exceed the cap. The
    /// chunk is not stored.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<(), Overflow> {
        let attempted = self.len().saturating_add(chunk.len() as u64);
        if let Some(limit) = self.max_bytes
            && attempted > limit
        {
            return Err(Overflow { limit, attempted });
        }
        self.buf.extend_from_slice(chunk);
        Ok(())
    }

    /// Bytes held so far.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.buf.len() as u64
    }

    /// True when nothing has been fed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The configured cap, if any.
    #[must_use]
    pub fn max_bytes(&self) -> Option<u64> {
        self.max_bytes
    }

    /// Consumes the sink and returns the accumulated buffer.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_accepts_up_to_exact_limit() {
        let mut sink = BoundedByteSink::new(Some(10));
        sink.feed(&[1; 4]).unwrap();
        sink.feed(&[2; 6]).unwrap();
        assert_eq!(sink.len(), 10);
        assert_eq!(sink.finish().len(), 10);
    }

    #[test]
    fn test_sink_rejects_crossing_chunk_and_keeps_prior_bytes() {
        let mut sink = BoundedByteSink::new(Some(10));
        sink.feed(&[1; 6]).unwrap();

        let err = sink.feed(&[2; 5]).unwrap_err();
        assert_eq!(err.limit, 10);
        assert_eq!(err.attempted, 11);
        assert_eq!(sink.len(), 6, "crossing chunk must not be stored");
    }

    #[test]
    fn test_sink_never_holds_more_than_limit() {
        let limit = 1000;
        let mut sink = BoundedByteSink::new(Some(limit));
        let mut overflowed_at = None;
        for (index, size) in [300_usize, 300, 300, 300, 300].into_iter().enumerate() {
            if sink.feed(&vec![0; size]).is_err() {
                overflowed_at = Some(index);
                break;
            }
            assert!(sink.len() <= limit);
        }
        assert_eq!(overflowed_at, Some(3), "fourth chunk crosses 1000");
        assert!(sink.len() <= limit);
    }

    #[test]
    fn test_sink_unbounded_accepts_everything() {
        let mut sink = BoundedByteSink::new(None);
        for _ in 0..64 {
            sink.feed(&[7; 1024]).unwrap();
        }
        assert_eq!(sink.len(), 64 * 1024);
        assert!(sink.max_bytes().is_none());
    }

    #[test]
    fn test_sink_zero_cap_rejects_first_byte() {
        let mut sink = BoundedByteSink::new(Some(0));
        sink.feed(&[]).unwrap();
        assert!(sink.feed(&[1]).is_err());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_size_hint_ignored_when_above_cap() {
        let sink = BoundedByteSink::with_size_hint(Some(10), Some(1_000_000));
        assert!(sink.is_empty());
        assert_eq!(sink.max_bytes(), Some(10));
    }
}
