//! Line layout for hex views.
//!
//! A [`LineLayout`] turns a buffer into rendered [`HexLine`]s. Each line owns
//! a copy of its bytes ([`HexBytes`]) taken when it was built, so queries
//! against a line never touch the buffer again even if the buffer has since
//! shrunk or become unreadable.
//!
//! Rendered text looks like:
//!
//! ```text
//! 00000000  41 41 42 41  AABA
//! ```
//!
//! offset, the value column, then the text column.

mod line;

pub use line::{HexBytes, HexCell, HexCells, HexLine};

use crate::buffer::{BufferSpan, HexBuffer};
use thiserror::Error;

const OFFSET_DIGITS: usize = 8;
const COLUMN_GAP: usize = 2;

/// The two logical columns of a hex view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    /// Numeric values, `bytes_per_value` bytes per cell.
    Value,
    /// One character per byte.
    Text,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Bytes per value must be 1, 2, 4 or 8, got {0}")]
    UnsupportedValueWidth(usize),
    #[error(
        "Bytes per line must be a non-zero multiple of bytes per value ({bytes_per_value}), got {bytes_per_line}"
    )]
    InvalidLineWidth {
        bytes_per_line: usize,
        bytes_per_value: usize,
    },
}

/// Geometry of the rendered lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutOptions {
    pub bytes_per_line: usize,
    pub bytes_per_value: usize,
    /// Buffer offset of the first byte shown; lines and cells align from here.
    pub start_position: u64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            bytes_per_line: 16,
            bytes_per_value: 1,
            start_position: 0,
        }
    }
}

impl LayoutOptions {
    pub fn validate(&self) -> Result<(), LayoutError> {
        if !matches!(self.bytes_per_value, 1 | 2 | 4 | 8) {
            return Err(LayoutError::UnsupportedValueWidth(self.bytes_per_value));
        }
        if self.bytes_per_line == 0 || self.bytes_per_line % self.bytes_per_value != 0 {
            return Err(LayoutError::InvalidLineWidth {
                bytes_per_line: self.bytes_per_line,
                bytes_per_value: self.bytes_per_value,
            });
        }
        Ok(())
    }
}

/// Builds [`HexLine`]s from a buffer using validated [`LayoutOptions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineLayout {
    options: LayoutOptions,
}

impl LineLayout {
    pub fn new(options: LayoutOptions) -> Result<Self, LayoutError> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> LayoutOptions {
        self.options
    }

    pub fn bytes_per_value(&self) -> usize {
        self.options.bytes_per_value
    }

    pub fn bytes_per_line(&self) -> usize {
        self.options.bytes_per_line
    }

    fn values_per_line(&self) -> usize {
        self.options.bytes_per_line / self.options.bytes_per_value
    }

    /// Number of lines needed to show the buffer. An empty buffer still has one line.
    pub fn line_count(&self, buffer: &dyn HexBuffer) -> u64 {
        let shown = buffer.len().saturating_sub(self.options.start_position);
        shown.div_ceil(self.options.bytes_per_line as u64).max(1)
    }

    /// Line number containing `offset`. Offsets before the start position map to line 0.
    pub fn line_number_of(&self, offset: u64) -> u64 {
        offset.saturating_sub(self.options.start_position) / self.options.bytes_per_line as u64
    }

    pub fn line_span(&self, line_number: u64) -> BufferSpan {
        let bpl = self.options.bytes_per_line as u64;
        BufferSpan::from_start_and_len(self.options.start_position + line_number * bpl, bpl)
    }

    /// Clamp a caret offset into the range of bytes the layout can show.
    pub fn filter_position(&self, buffer: &dyn HexBuffer, offset: u64) -> u64 {
        let start = self.options.start_position;
        let last = buffer.len().saturating_sub(1).max(start);
        offset.clamp(start, last)
    }

    pub fn build_line(&self, buffer: &dyn HexBuffer, line_number: u64) -> HexLine {
        let span = self.line_span(line_number);
        let hex_bytes = HexBytes::read(buffer, span);
        let bpv = self.options.bytes_per_value;
        let value_chars = bpv * 2;

        let mut text = format!("{:0width$X}", span.start, width = OFFSET_DIGITS);
        text.push_str(&" ".repeat(COLUMN_GAP));

        let mut value_cells = Vec::with_capacity(self.values_per_line());
        for index in 0..self.values_per_line() {
            if index > 0 {
                text.push(' ');
            }
            let first = index * bpv;
            let cell_start = text.len();
            for i in first..first + bpv {
                match hex_bytes.byte(i) {
                    Some(b) => text.push_str(&format!("{b:02X}")),
                    None if i < hex_bytes.available() => text.push_str("??"),
                    None => text.push_str("  "),
                }
            }
            value_cells.push(self.make_cell(
                Column::Value,
                index,
                span.start + first as u64,
                bpv,
                &hex_bytes,
                cell_start..cell_start + value_chars,
            ));
        }

        text.push_str(&" ".repeat(COLUMN_GAP));

        let mut text_cells = Vec::with_capacity(self.options.bytes_per_line);
        for index in 0..self.options.bytes_per_line {
            let cell_start = text.len();
            text.push(match hex_bytes.byte(index) {
                Some(b) if b.is_ascii_graphic() || b == b' ' => b as char,
                Some(_) => '.',
                None if index < hex_bytes.available() => '?',
                None => ' ',
            });
            text_cells.push(self.make_cell(
                Column::Text,
                index,
                span.start + index as u64,
                1,
                &hex_bytes,
                cell_start..cell_start + 1,
            ));
        }

        let visible_text = 0..text.len();
        HexLine {
            line_number,
            buffer_span: span,
            text,
            value_cells: HexCells::new(value_cells, bpv),
            text_cells: HexCells::new(text_cells, 1),
            hex_bytes,
            visible_text,
        }
    }

    /// Build up to `count` consecutive lines starting at `first_line`,
    /// stopping after the last line that shows buffer data.
    pub fn build_lines(&self, buffer: &dyn HexBuffer, first_line: u64, count: usize) -> Vec<HexLine> {
        let end = self.line_count(buffer).min(first_line.saturating_add(count as u64));
        (first_line..end)
            .map(|line_number| self.build_line(buffer, line_number))
            .collect()
    }

    fn make_cell(
        &self,
        column: Column,
        index: usize,
        start: u64,
        width: usize,
        hex_bytes: &HexBytes,
        cell_span: std::ops::Range<usize>,
    ) -> HexCell {
        // Tail cells are cut short where the buffer ends.
        let line_end = hex_bytes.span().start + hex_bytes.available() as u64;
        let end = (start + width as u64).min(line_end).max(start);
        HexCell {
            index,
            column,
            buffer_span: BufferSpan::new(start, end),
            cell_span,
            has_data: end > start,
        }
    }
}
