use crate::buffer::{BufferSpan, ByteBuffer, ContentChange, HexBuffer};
use crate::layout::{Column, HexLine, LayoutError, LayoutOptions, LineLayout};
use crate::view::{CaretPosition, HexView, HighlightOptions, ViewOption};

/// A complete in-memory hex view: buffer, layout, caret, selection and the
/// currently laid-out lines.
///
/// Scrolling and value width changes start a layout pass themselves
/// ([`MemoryView::begin_layout`]); between that and
/// [`MemoryView::rebuild_lines`] the view has no lines and
/// [`HexView::caret_line`] returns `None`. Data edits only touch the buffer:
/// lines keep the bytes they were built from until the host re-lays them out.
#[derive(Debug)]
pub struct MemoryView {
    buffer: ByteBuffer,
    layout: LineLayout,
    options: HighlightOptions,
    caret: CaretPosition,
    /// Anchor and active end of the selection; empty when they coincide.
    selection: Option<BufferSpan>,
    top_line: u64,
    visible_line_count: usize,
    lines: Vec<HexLine>,
    caret_line: Option<HexLine>,
    layout_pending: bool,
    closed: bool,
}

impl MemoryView {
    pub fn new(
        buffer: ByteBuffer,
        layout: LayoutOptions,
        options: HighlightOptions,
        visible_line_count: usize,
    ) -> Result<Self, LayoutError> {
        let layout = LineLayout::new(layout)?;
        let caret = CaretPosition::new(Column::Value, layout.options().start_position);
        let mut view = Self {
            buffer,
            layout,
            options,
            caret,
            selection: None,
            top_line: 0,
            visible_line_count: visible_line_count.max(1),
            lines: Vec::new(),
            caret_line: None,
            layout_pending: true,
            closed: false,
        };
        view.rebuild_lines();
        Ok(view)
    }

    pub fn layout(&self) -> &LineLayout {
        &self.layout
    }

    pub fn lines(&self) -> &[HexLine] {
        &self.lines
    }

    pub fn top_line(&self) -> u64 {
        self.top_line
    }

    pub fn is_layout_pending(&self) -> bool {
        self.layout_pending
    }

    pub fn byte_buffer(&self) -> &ByteBuffer {
        &self.buffer
    }

    /// Drop the current lines; the view stays line-less until [`Self::rebuild_lines`].
    pub fn begin_layout(&mut self) {
        self.layout_pending = true;
        self.lines.clear();
        self.caret_line = None;
    }

    pub fn rebuild_lines(&mut self) {
        self.lines = self
            .layout
            .build_lines(&self.buffer, self.top_line, self.visible_line_count);
        self.layout_pending = false;
        self.update_caret_line();
    }

    fn update_caret_line(&mut self) {
        if self.layout_pending {
            self.caret_line = None;
            return;
        }
        let position = self.filter_position(self.caret.offset);
        let line_number = self.layout.line_number_of(position);
        self.caret_line = Some(
            self.lines
                .iter()
                .find(|line| line.line_number == line_number)
                .cloned()
                .unwrap_or_else(|| self.layout.build_line(&self.buffer, line_number)),
        );
    }

    pub fn set_caret(&mut self, caret: CaretPosition) {
        self.caret = CaretPosition::new(caret.column, self.filter_position(caret.offset));
        self.update_caret_line();
    }

    /// Move the caret by `cells` cells of its current column.
    pub fn move_caret(&mut self, cells: i64) {
        let step = match self.caret.column {
            Column::Value => self.layout.bytes_per_value() as i64,
            Column::Text => 1,
        };
        let offset = self.caret.offset.saturating_add_signed(cells.saturating_mul(step));
        self.set_caret(CaretPosition::new(self.caret.column, offset));
    }

    pub fn switch_column(&mut self) {
        let column = match self.caret.column {
            Column::Value => Column::Text,
            Column::Text => Column::Value,
        };
        self.set_caret(CaretPosition::new(column, self.caret.offset));
    }

    pub fn select(&mut self, span: BufferSpan) {
        self.selection = Some(span);
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn selection(&self) -> Option<BufferSpan> {
        self.selection.filter(|span| !span.is_empty())
    }

    pub fn set_highlight_current_value(&mut self, enabled: bool) -> ViewOption {
        self.options.highlight_current_value = enabled;
        ViewOption::HighlightCurrentValue
    }

    /// Change the value-column width. Leaves the view in a pending layout.
    pub fn set_bytes_per_value(&mut self, bytes_per_value: usize) -> Result<ViewOption, LayoutError> {
        self.layout = LineLayout::new(LayoutOptions {
            bytes_per_value,
            ..self.layout.options()
        })?;
        self.begin_layout();
        Ok(ViewOption::BytesPerValue)
    }

    /// Scroll so `top_line` is the first visible line. Leaves the view in a
    /// pending layout when the viewport moved.
    pub fn scroll_to(&mut self, top_line: u64) -> bool {
        let last = self.layout.line_count(&self.buffer).saturating_sub(1);
        let top_line = top_line.min(last);
        if top_line == self.top_line {
            return false;
        }
        self.top_line = top_line;
        self.begin_layout();
        true
    }

    /// Scroll the minimum needed for the caret's line to be visible.
    pub fn ensure_caret_visible(&mut self) -> bool {
        let caret_line = self.layout.line_number_of(self.caret.offset);
        let rows = self.visible_line_count as u64;
        if caret_line < self.top_line {
            self.scroll_to(caret_line)
        } else if caret_line >= self.top_line + rows {
            self.scroll_to(caret_line + 1 - rows)
        } else {
            false
        }
    }

    pub fn write(&mut self, offset: u64, data: &[u8]) -> ContentChange {
        self.buffer.write(offset, data)
    }

    pub fn truncate(&mut self, len: u64) -> ContentChange {
        let change = self.buffer.truncate(len);
        self.caret.offset = self.filter_position(self.caret.offset);
        change
    }

    pub fn mark_unreadable(&mut self, span: BufferSpan) -> ContentChange {
        self.buffer.mark_unreadable(span)
    }

    pub fn close(&mut self) {
        self.closed = true;
        self.lines.clear();
        self.caret_line = None;
    }
}

impl HexView for MemoryView {
    fn is_closed(&self) -> bool {
        self.closed
    }

    fn buffer(&self) -> &dyn HexBuffer {
        &self.buffer
    }

    fn caret(&self) -> CaretPosition {
        self.caret
    }

    fn selection_is_empty(&self) -> bool {
        self.selection().is_none()
    }

    fn highlight_current_value(&self) -> bool {
        self.options.highlight_current_value
    }

    fn bytes_per_value(&self) -> usize {
        self.layout.bytes_per_value()
    }

    fn filter_position(&self, offset: u64) -> u64 {
        self.layout.filter_position(&self.buffer, offset)
    }

    fn caret_line(&self) -> Option<&HexLine> {
        self.caret_line.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(len: usize) -> MemoryView {
        MemoryView::new(
            ByteBuffer::from_bytes(vec![0; len]),
            LayoutOptions {
                bytes_per_line: 4,
                bytes_per_value: 1,
                start_position: 0,
            },
            HighlightOptions::default(),
            2,
        )
        .unwrap()
    }

    #[test]
    fn test_new_view_has_lines_and_caret_line() {
        let view = view(16);

        assert_eq!(view.lines().len(), 2);
        assert_eq!(view.caret_line().map(|l| l.line_number), Some(0));
        assert!(view.selection_is_empty());
    }

    #[test]
    fn test_caret_line_absent_while_layout_pending() {
        let mut view = view(16);

        view.begin_layout();
        assert!(view.caret_line().is_none());

        view.rebuild_lines();
        assert!(view.caret_line().is_some());
    }

    #[test]
    fn test_caret_is_clamped_and_line_built_offscreen() {
        let mut view = view(16);

        view.set_caret(CaretPosition::new(Column::Text, 100));

        assert_eq!(view.caret().offset, 15);
        assert_eq!(view.caret_line().map(|l| l.line_number), Some(3));
    }

    #[test]
    fn test_ensure_caret_visible_scrolls_down() {
        let mut view = view(16);
        view.set_caret(CaretPosition::new(Column::Value, 13));

        assert!(view.ensure_caret_visible());
        view.rebuild_lines();

        assert_eq!(view.top_line(), 2);
        let numbers: Vec<_> = view.lines().iter().map(|l| l.line_number).collect();
        assert_eq!(numbers, vec![2, 3]);
    }

    #[test]
    fn test_write_keeps_built_lines_until_relayout() {
        let mut view = view(4);

        view.write(0, &[0xab]);
        assert_eq!(view.lines()[0].hex_bytes.byte(0), Some(0));
        assert_eq!(view.caret_line().and_then(|l| l.hex_bytes.byte(0)), Some(0));

        view.begin_layout();
        view.rebuild_lines();
        assert_eq!(view.lines()[0].hex_bytes.byte(0), Some(0xab));
        assert_eq!(view.caret_line().and_then(|l| l.hex_bytes.byte(0)), Some(0xab));
    }

    #[test]
    fn test_empty_selection_counts_as_no_selection() {
        let mut view = view(4);

        view.select(BufferSpan::new(2, 2));
        assert!(view.selection_is_empty());

        view.select(BufferSpan::new(1, 2));
        assert!(!view.selection_is_empty());
    }
}
