use std::cell::RefCell;

use crate::buffer::{BufferSpan, ByteValidity, HexBuffer};
use crate::layout::{Column, HexCell, HexLine};

/// The bytes of the cell under the caret, kept as the comparison baseline.
///
/// `data` and `scratch` are sized once at capture and never reallocated. The
/// recorded span can be shorter than `data` when the cell sits at the end of
/// the buffer; the missing tail of `data` is zero.
#[derive(Debug)]
pub struct ByteSnapshot {
    data: Box<[u8]>,
    scratch: RefCell<Box<[u8]>>,
    span: BufferSpan,
    column: Column,
}

impl ByteSnapshot {
    /// Capture `size` bytes for `cell`.
    ///
    /// # Panics
    ///
    /// If `cell` has no data behind it. Callers only ever pass the cell under
    /// the caret, which the view guarantees is data-backed.
    pub fn capture(size: usize, column: Column, cell: &HexCell, buffer: &dyn HexBuffer) -> Self {
        assert!(
            cell.has_data,
            "cannot capture {column:?} cell {} at {:?}: cell has no data",
            cell.index, cell.buffer_span
        );
        debug_assert!(cell.buffer_span.len() <= size as u64);

        let mut data = vec![0; size].into_boxed_slice();
        read_span(buffer, cell.buffer_span, &mut data);
        log::debug!(
            "captured {column:?} value {:02X?} at {:?}",
            data,
            cell.buffer_span
        );
        Self {
            data,
            scratch: RefCell::new(vec![0; size].into_boxed_slice()),
            span: cell.buffer_span,
            column,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn span(&self) -> BufferSpan {
        self.span
    }

    pub fn column(&self) -> Column {
        self.column
    }

    /// Follow the caret to `cell` in the same column.
    ///
    /// Returns true only when the span moved and the bytes found there differ
    /// from the current value.
    ///
    /// # Panics
    ///
    /// If `cell` has no data behind it.
    pub fn refresh(&mut self, cell: &HexCell, buffer: &dyn HexBuffer) -> bool {
        assert!(
            cell.has_data,
            "cannot refresh value from cell {} at {:?}: cell has no data",
            cell.index, cell.buffer_span
        );
        debug_assert!(cell.buffer_span.len() <= self.data.len() as u64);

        let old_span = self.span;
        self.span = cell.buffer_span;
        if old_span == self.span {
            return false;
        }

        let scratch: &mut [u8] = self.scratch.get_mut();
        read_span(buffer, self.span, scratch);
        if values_equal(scratch, &self.data) {
            return false;
        }
        self.data.copy_from_slice(scratch);
        log::trace!("value at {:?} changed to {:02X?}", self.span, self.data);
        true
    }

    /// Re-read the value at the same span, after the buffer changed there.
    pub fn reread(&mut self, buffer: &dyn HexBuffer) {
        read_span(buffer, self.span, &mut self.data);
    }

    /// Whether `cell` of `line` currently holds the same bytes.
    ///
    /// Cells with any unreadable byte never match.
    pub fn matches(&self, line: &HexLine, cell: &HexCell) -> bool {
        if !cell.has_data || cell.buffer_span.start < line.buffer_span.start {
            return false;
        }
        let index = (cell.buffer_span.start - line.buffer_span.start) as usize;
        match line.hex_bytes.all_valid() {
            ByteValidity::AllValid => {}
            // Never mark data that isn't there.
            ByteValidity::AllInvalid => return false,
            ByteValidity::Mixed => {
                let len = cell.buffer_span.len() as usize;
                if !(index..index + len).all(|i| line.hex_bytes.is_valid(i)) {
                    return false;
                }
            }
        }

        let mut scratch = self.scratch.borrow_mut();
        line.hex_bytes.read_bytes(index, &mut scratch);
        values_equal(&scratch, &self.data)
    }
}

/// Read the bytes of `span` into the front of `dest`, zeroing the rest.
fn read_span(buffer: &dyn HexBuffer, span: BufferSpan, dest: &mut [u8]) {
    let len = (span.len() as usize).min(dest.len());
    dest.fill(0);
    buffer.read_bytes(span.start, &mut dest[..len]);
}

fn values_equal(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).all(|(x, y)| x == y)
}
