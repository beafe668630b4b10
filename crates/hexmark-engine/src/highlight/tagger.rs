use std::ops::Range;

use crate::buffer::BufferSpan;
use crate::highlight::ValueTracker;
use crate::layout::{Column, HexLine};

/// Tag attached to a cell holding the current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HighlightTag {
    ValueCell,
    TextCell,
}

impl HighlightTag {
    pub fn for_column(column: Column) -> Self {
        match column {
            Column::Value => HighlightTag::ValueCell,
            Column::Text => HighlightTag::TextCell,
        }
    }

    /// Classification name the renderer maps to a style.
    pub fn classification(self) -> &'static str {
        match self {
            HighlightTag::ValueCell => "hex-current-value-cell",
            HighlightTag::TextCell => "hex-current-text-cell",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSpan {
    /// Character range of the cell in the line text.
    pub cell_span: Range<usize>,
    pub buffer_span: BufferSpan,
    pub tag: HighlightTag,
}

/// Tags for every visible cell of `line` that holds the current value.
///
/// Only the column the value was captured from is scanned. Nothing is
/// produced while the tracker has no value. The iterator is lazy and
/// borrows the tracker only for its own lifetime.
pub fn get_tags<'a>(tracker: &'a ValueTracker, line: &'a HexLine) -> impl Iterator<Item = TagSpan> + 'a {
    tracker.active_column().into_iter().flat_map(move |column| {
        let tag = HighlightTag::for_column(column);
        line.visible_cells(column)
            .filter(move |cell| tracker.matches(line, cell))
            .map(move |cell| TagSpan {
                cell_span: cell.cell_span.clone(),
                buffer_span: cell.buffer_span,
                tag,
            })
    })
}

/// Tags over arbitrary buffer spans. Always empty: the highlight only exists
/// relative to a rendered line.
pub fn get_tags_for_spans<'a>(
    _tracker: &'a ValueTracker,
    _spans: &'a [BufferSpan],
) -> impl Iterator<Item = TagSpan> + 'a {
    std::iter::empty()
}
