//! The view seam between the highlight engine and whatever hosts it.
//!
//! The engine never stores a view. Every handler on
//! [`crate::highlight::ValueTracker`] takes the view it should read from, so
//! the host keeps ownership of caret, selection, options and lines.

mod memory;

pub use memory::MemoryView;

use crate::buffer::HexBuffer;
use crate::layout::{Column, HexLine};

/// Identity of one open view, used as the registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub u64);

/// Where the caret is: which column and which buffer byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaretPosition {
    pub column: Column,
    pub offset: u64,
}

impl CaretPosition {
    pub fn new(column: Column, offset: u64) -> Self {
        Self { column, offset }
    }
}

/// Identifiers of view options whose change the host reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewOption {
    HighlightCurrentValue,
    BytesPerValue,
}

/// User-facing highlight options held by a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightOptions {
    pub highlight_current_value: bool,
}

impl Default for HighlightOptions {
    fn default() -> Self {
        Self {
            highlight_current_value: true,
        }
    }
}

/// Read access to a hex view, as needed by the value tracker.
pub trait HexView {
    fn is_closed(&self) -> bool;

    fn buffer(&self) -> &dyn HexBuffer;

    fn caret(&self) -> CaretPosition;

    fn selection_is_empty(&self) -> bool;

    fn highlight_current_value(&self) -> bool;

    /// Width of a value-column cell in bytes.
    fn bytes_per_value(&self) -> usize;

    /// Clamp a caret offset to a byte the view can show.
    fn filter_position(&self, offset: u64) -> u64;

    /// The rendered line holding the caret. `None` while a layout pass is
    /// still in progress.
    fn caret_line(&self) -> Option<&HexLine>;
}
