use std::ops::Range;

use crate::buffer::{BufferSpan, ByteValidity, HexBuffer};
use crate::layout::Column;

/// The smallest addressable unit of one column in a rendered line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexCell {
    /// Position of the cell within its column.
    pub index: usize,
    pub column: Column,
    /// Bytes this cell shows. Shorter than the cell width at the buffer tail,
    /// empty past the end.
    pub buffer_span: BufferSpan,
    /// Character range the cell occupies in [`HexLine::text`].
    pub cell_span: Range<usize>,
    /// False when no buffer byte backs this cell.
    pub has_data: bool,
}

/// All cells of one column in a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexCells {
    cells: Vec<HexCell>,
    cell_width: usize,
}

impl HexCells {
    pub(crate) fn new(cells: Vec<HexCell>, cell_width: usize) -> Self {
        Self { cells, cell_width }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&HexCell> {
        self.cells.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HexCell> {
        self.cells.iter()
    }

    /// The cell whose nominal range contains `offset`.
    pub fn get_cell(&self, offset: u64) -> Option<&HexCell> {
        let first = self.cells.first()?.buffer_span.start;
        if offset < first {
            return None;
        }
        let index = ((offset - first) / self.cell_width as u64) as usize;
        self.cells.get(index)
    }

    /// Cells that show data and intersect the visible character range.
    pub fn visible_cells<'a>(&'a self, visible: &'a Range<usize>) -> impl Iterator<Item = &'a HexCell> {
        self.cells.iter().filter(move |cell| {
            cell.has_data && cell.cell_span.start < visible.end && visible.start < cell.cell_span.end
        })
    }
}

/// Copy of a line's bytes and their readability, taken when the line was built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexBytes {
    span: BufferSpan,
    bytes: Vec<u8>,
    valid: Vec<bool>,
    available: usize,
    all_valid: ByteValidity,
}

impl HexBytes {
    pub(crate) fn read(buffer: &dyn HexBuffer, span: BufferSpan) -> Self {
        let len = span.len() as usize;
        let mut bytes = vec![0; len];
        let available = buffer.read_bytes(span.start, &mut bytes);
        let valid: Vec<bool> = (0..len)
            .map(|i| i < available && buffer.is_valid(span.start + i as u64))
            .collect();
        let all_valid = if valid.iter().all(|&v| v) {
            ByteValidity::AllValid
        } else if valid.iter().all(|&v| !v) {
            ByteValidity::AllInvalid
        } else {
            ByteValidity::Mixed
        };
        Self {
            span,
            bytes,
            valid,
            available,
            all_valid,
        }
    }

    pub fn span(&self) -> BufferSpan {
        self.span
    }

    /// Number of line bytes that were inside the buffer.
    pub fn available(&self) -> usize {
        self.available
    }

    pub fn all_valid(&self) -> ByteValidity {
        self.all_valid
    }

    pub fn is_valid(&self, index: usize) -> bool {
        self.valid.get(index).copied().unwrap_or(false)
    }

    /// The byte at `index` if it is readable.
    pub fn byte(&self, index: usize) -> Option<u8> {
        self.is_valid(index).then(|| self.bytes[index])
    }

    /// Fill `dest` from `index`; unreadable or absent bytes become zero.
    pub fn read_bytes(&self, index: usize, dest: &mut [u8]) {
        for (i, slot) in dest.iter_mut().enumerate() {
            *slot = self.byte(index + i).unwrap_or(0);
        }
    }
}

/// One rendered line of a hex view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexLine {
    pub line_number: u64,
    pub buffer_span: BufferSpan,
    pub text: String,
    pub value_cells: HexCells,
    pub text_cells: HexCells,
    pub hex_bytes: HexBytes,
    /// Character range of `text` currently on screen.
    pub visible_text: Range<usize>,
}

impl HexLine {
    pub fn cells(&self, column: Column) -> &HexCells {
        match column {
            Column::Value => &self.value_cells,
            Column::Text => &self.text_cells,
        }
    }

    pub fn visible_cells(&self, column: Column) -> impl Iterator<Item = &HexCell> {
        self.cells(column).visible_cells(&self.visible_text)
    }

    pub fn contains(&self, offset: u64) -> bool {
        self.buffer_span.contains(offset)
    }

    /// Restrict the on-screen character range, e.g. for horizontal scrolling.
    pub fn set_visible_text(&mut self, visible: Range<usize>) {
        let end = visible.end.min(self.text.len());
        self.visible_text = visible.start.min(end)..end;
    }
}
