//! Byte buffers as seen by a hex view.
//!
//! The [`HexBuffer`] trait is the read seam the rest of the engine depends
//! on. [`ByteBuffer`] is the in-memory implementation used by the CLI host
//! and the tests; it can also simulate unreadable regions (the holes a
//! process-memory or sparse-file source would have).

mod span;

pub use span::BufferSpan;

/// Result of asking whether a range of bytes can be read.
///
/// The `Mixed` case means callers have to fall back to per-byte checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteValidity {
    AllValid,
    AllInvalid,
    Mixed,
}

/// A single content change, in both pre-change and post-change coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentChange {
    pub old_span: BufferSpan,
    pub new_span: BufferSpan,
}

/// Read access to the bytes behind a hex view.
pub trait HexBuffer {
    /// Number of addressable bytes.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies bytes starting at `offset` into `dest`.
    ///
    /// Bytes past the end of the buffer or inside unreadable regions are
    /// written as zero. Returns how many bytes were inside the buffer.
    fn read_bytes(&self, offset: u64, dest: &mut [u8]) -> usize;

    /// Whether the byte at `offset` exists and can be read.
    fn is_valid(&self, offset: u64) -> bool;

    /// Readability of a whole span. Bytes past the end count as invalid.
    fn validity(&self, span: BufferSpan) -> ByteValidity {
        let mut valid = 0u64;
        for offset in span.start..span.end {
            if self.is_valid(offset) {
                valid += 1;
            }
        }
        if valid == span.len() {
            ByteValidity::AllValid
        } else if valid == 0 {
            ByteValidity::AllInvalid
        } else {
            ByteValidity::Mixed
        }
    }
}

/// In-memory, fixed-position byte buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteBuffer {
    bytes: Vec<u8>,
    unreadable: Vec<BufferSpan>,
}

impl ByteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            unreadable: Vec::new(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Overwrite bytes at `offset`, growing the buffer (zero-filled) if the
    /// write reaches past the current end.
    pub fn write(&mut self, offset: u64, data: &[u8]) -> ContentChange {
        let start = offset as usize;
        let end = start + data.len();
        if end > self.bytes.len() {
            self.bytes.resize(end, 0);
        }
        self.bytes[start..end].copy_from_slice(data);

        let span = BufferSpan::from_start_and_len(offset, data.len() as u64);
        log::trace!("buffer write {span:?}");
        ContentChange {
            old_span: span,
            new_span: span,
        }
    }

    /// Shrink the buffer to `len` bytes. A no-op change is reported when the
    /// buffer is already shorter.
    pub fn truncate(&mut self, len: u64) -> ContentChange {
        let old_len = self.len();
        let new_len = len.min(old_len);
        self.bytes.truncate(new_len as usize);
        ContentChange {
            old_span: BufferSpan::new(new_len, old_len),
            new_span: BufferSpan::new(new_len, new_len),
        }
    }

    /// Mark a span as unreadable, as if the backing storage had a hole there.
    pub fn mark_unreadable(&mut self, span: BufferSpan) -> ContentChange {
        if !span.is_empty() {
            self.unreadable.push(span);
        }
        ContentChange {
            old_span: span,
            new_span: span,
        }
    }
}

impl HexBuffer for ByteBuffer {
    fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn read_bytes(&self, offset: u64, dest: &mut [u8]) -> usize {
        dest.fill(0);
        let len = self.len();
        if offset >= len {
            return 0;
        }
        let count = (len - offset).min(dest.len() as u64) as usize;
        let start = offset as usize;
        dest[..count].copy_from_slice(&self.bytes[start..start + count]);
        for (i, byte) in dest[..count].iter_mut().enumerate() {
            if !self.is_valid(offset + i as u64) {
                *byte = 0;
            }
        }
        count
    }

    fn is_valid(&self, offset: u64) -> bool {
        offset < self.len() && !self.unreadable.iter().any(|span| span.contains(offset))
    }
}
