use crossbeam_channel::Receiver;
use hexmark_engine::highlight::{self, HighlightRequest, HighlightTag, TrackerState, ValueTracker};
use hexmark_engine::{
    BufferSpan, ByteBuffer, CaretPosition, Column, HighlightOptions, LayoutOptions, MemoryView,
};
use pretty_assertions::assert_eq;

/// A view, its tracker and the request queue, pumped the way a host would.
struct Harness {
    view: MemoryView,
    tracker: ValueTracker,
    requests: Receiver<HighlightRequest>,
}

impl Harness {
    fn new(bytes: &[u8], bytes_per_line: usize, bytes_per_value: usize) -> Self {
        Self::with_layout(
            bytes,
            LayoutOptions {
                bytes_per_line,
                bytes_per_value,
                start_position: 0,
            },
        )
    }

    fn with_layout(bytes: &[u8], layout: LayoutOptions) -> Self {
        let view = MemoryView::new(
            ByteBuffer::from_bytes(bytes.to_vec()),
            layout,
            HighlightOptions::default(),
            8,
        )
        .unwrap();
        let (sender, requests) = highlight::request_channel();
        let tracker = ValueTracker::new(&view, sender);
        let mut harness = Self {
            view,
            tracker,
            requests,
        };
        harness.pump();
        harness
    }

    /// Run queued requests; returns how many refreshes were asked for.
    fn pump(&mut self) -> usize {
        let mut refreshes = 0;
        while let Ok(request) = self.requests.try_recv() {
            match request {
                HighlightRequest::RefreshTags(span) => {
                    assert_eq!(span, BufferSpan::FULL);
                    refreshes += 1;
                }
                HighlightRequest::DeferredRecapture => self.tracker.recapture(&self.view),
            }
        }
        refreshes
    }

    fn move_caret(&mut self, column: Column, offset: u64) -> usize {
        self.view.set_caret(CaretPosition::new(column, offset));
        self.tracker.on_caret_moved(&self.view);
        self.pump()
    }

    fn relayout(&mut self) -> usize {
        self.view.begin_layout();
        self.tracker.on_lines_rebuilt();
        self.view.rebuild_lines();
        self.pump()
    }

    fn tags(&self) -> Vec<(u64, HighlightTag)> {
        self.view
            .lines()
            .iter()
            .flat_map(|line| highlight::get_tags(&self.tracker, line))
            .map(|tag| (tag.buffer_span.start, tag.tag))
            .collect()
    }

    fn tagged_offsets(&self) -> Vec<u64> {
        self.tags().into_iter().map(|(offset, _)| offset).collect()
    }
}

#[test]
fn highlights_every_cell_equal_to_caret_value() {
    let harness = Harness::new(&[0x41, 0x41, 0x42, 0x41], 4, 1);

    let snapshot = harness.tracker.snapshot().unwrap();
    assert_eq!(snapshot.data(), &[0x41]);
    assert_eq!(snapshot.span(), BufferSpan::new(0, 1));
    assert_eq!(harness.tagged_offsets(), vec![0, 1, 3]);
}

#[test]
fn get_tags_is_idempotent() {
    let harness = Harness::new(b"abcabcab", 4, 1);

    let first = harness.tags();
    let second = harness.tags();

    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
}

#[test]
fn tail_cell_captures_only_available_bytes() {
    let harness = Harness::with_layout(
        &[0x10, 0x20, 0x30, 0x40],
        LayoutOptions {
            bytes_per_line: 4,
            bytes_per_value: 4,
            start_position: 3,
        },
    );

    let snapshot = harness.tracker.snapshot().unwrap();
    assert_eq!(snapshot.span().len(), 1);
    assert_eq!(snapshot.data(), &[0x40, 0, 0, 0]);
    assert_eq!(harness.tagged_offsets(), vec![3]);
}

#[test]
fn column_switch_recaptures_with_column_width() {
    let mut harness = Harness::new(&[0x10, 0x20, 0x30, 0x40, 0x10, 0x20, 0x30, 0x40], 8, 4);
    assert_eq!(harness.tracker.snapshot().unwrap().data().len(), 4);
    assert_eq!(
        harness.tags(),
        vec![(0, HighlightTag::ValueCell), (4, HighlightTag::ValueCell)]
    );

    let refreshes = harness.move_caret(Column::Text, 0);

    let snapshot = harness.tracker.snapshot().unwrap();
    assert_eq!(refreshes, 1);
    assert_eq!(snapshot.column(), Column::Text);
    assert_eq!(snapshot.data(), &[0x10]);
    assert_eq!(
        harness.tags(),
        vec![(0, HighlightTag::TextCell), (4, HighlightTag::TextCell)]
    );

    harness.move_caret(Column::Value, 0);
    assert_eq!(harness.tracker.snapshot().unwrap().data().len(), 4);
}

#[test]
fn write_overlapping_snapshot_rereads_and_refreshes() {
    let mut harness = Harness::new(&[5, 5, 5, 5], 4, 1);

    let outside = harness.view.write(2, &[9]);
    harness.tracker.on_data_changed(&harness.view, &[outside]);
    assert_eq!(harness.pump(), 0);
    assert_eq!(harness.tracker.snapshot().unwrap().data(), &[5]);

    let inside = harness.view.write(0, &[9]);
    harness.tracker.on_data_changed(&harness.view, &[outside, inside]);
    assert_eq!(harness.pump(), 1);
    assert_eq!(harness.tracker.snapshot().unwrap().data(), &[9]);

    harness.relayout();
    assert_eq!(harness.tagged_offsets(), vec![0, 2]);
}

#[test]
fn several_overlapping_changes_reread_and_refresh_once() {
    let mut harness = Harness::new(&[5, 5, 5, 5, 5, 5, 5, 5], 8, 2);
    assert_eq!(harness.tracker.snapshot().unwrap().span(), BufferSpan::new(0, 2));

    let first = harness.view.write(0, &[7]);
    let second = harness.view.write(1, &[8]);
    harness.tracker.on_data_changed(&harness.view, &[first, second]);

    assert_eq!(harness.pump(), 1);
    assert_eq!(harness.tracker.snapshot().unwrap().data(), &[7, 8]);
}

#[test]
fn overlapping_write_refreshes_even_when_bytes_are_unchanged() {
    let mut harness = Harness::new(&[5, 6], 4, 1);

    let change = harness.view.write(0, &[5]);
    harness.tracker.on_data_changed(&harness.view, &[change]);

    assert_eq!(harness.pump(), 1);
}

#[test]
fn non_empty_selection_disables_until_cleared() {
    let mut harness = Harness::new(&[1, 1, 1, 1, 1, 1, 1, 1], 4, 1);
    assert_eq!(harness.tagged_offsets().len(), 8);

    harness.view.select(BufferSpan::new(0, 2));
    harness.tracker.on_selection_changed(&harness.view);

    assert_eq!(harness.tracker.state(), TrackerState::Disabled);
    assert_eq!(harness.pump(), 1);
    assert!(harness.tagged_offsets().is_empty());

    harness.move_caret(Column::Value, 5);
    assert!(harness.tagged_offsets().is_empty());

    harness.view.clear_selection();
    harness.tracker.on_selection_changed(&harness.view);

    assert_eq!(harness.tracker.state(), TrackerState::EnabledWithSnapshot);
    assert_eq!(harness.tracker.snapshot().unwrap().span(), BufferSpan::new(5, 6));
    assert_eq!(harness.tagged_offsets().len(), 8);
}

#[test]
fn unreadable_bytes_never_match() {
    let mut harness = Harness::new(&[7, 7, 7, 7], 4, 1);
    harness.view.mark_unreadable(BufferSpan::new(2, 3));

    harness.relayout();

    assert_eq!(harness.tagged_offsets(), vec![0, 1, 3]);
}

#[test]
fn multi_byte_cell_with_one_unreadable_byte_never_matches() {
    let mut harness = Harness::new(&[1, 2, 1, 2, 1, 2, 1, 2], 8, 2);
    harness.view.mark_unreadable(BufferSpan::new(5, 6));

    harness.relayout();

    assert_eq!(harness.tagged_offsets(), vec![0, 2, 6]);
}

#[test]
fn viewport_rebuild_defers_recapture() {
    let mut harness = Harness::new(&[3, 3, 4, 3], 4, 1);

    harness.view.begin_layout();
    harness.tracker.on_lines_rebuilt();
    assert_eq!(harness.tracker.state(), TrackerState::EnabledNoSnapshot);

    harness.view.rebuild_lines();
    assert_eq!(harness.pump(), 1);

    assert_eq!(harness.tracker.state(), TrackerState::EnabledWithSnapshot);
    assert_eq!(harness.tagged_offsets(), vec![0, 1, 3]);
}

#[test]
fn deferred_recapture_after_close_is_a_no_op() {
    let mut harness = Harness::new(&[3, 3], 4, 1);

    harness.view.begin_layout();
    harness.tracker.on_lines_rebuilt();
    harness.view.close();
    harness.tracker.on_view_closed();

    assert_eq!(harness.pump(), 0);
    assert_eq!(harness.tracker.state(), TrackerState::Disabled);
    assert!(harness.tracker.snapshot().is_none());
}

#[test]
fn shrinking_buffer_keeps_queries_inside_line_bytes() {
    let mut harness = Harness::new(&[1, 2, 1, 2, 1, 2], 8, 2);
    harness.move_caret(Column::Value, 4);
    assert_eq!(harness.tagged_offsets(), vec![0, 2, 4]);

    let change = harness.view.truncate(5);
    harness.tracker.on_data_changed(&harness.view, &[change]);
    assert_eq!(harness.pump(), 1);
    assert_eq!(harness.tracker.snapshot().unwrap().data(), &[1, 0]);

    harness.relayout();

    let snapshot = harness.tracker.snapshot().unwrap();
    assert_eq!(snapshot.span(), BufferSpan::new(4, 5));
    assert_eq!(harness.tagged_offsets(), vec![4]);
}

#[test]
fn value_width_change_recaptures_after_layout() {
    let mut harness = Harness::new(&[1, 2, 1, 2, 1, 2, 1, 2], 8, 1);
    assert_eq!(harness.tagged_offsets(), vec![0, 2, 4, 6]);

    harness.view.set_bytes_per_value(2).unwrap();
    harness.tracker.on_lines_rebuilt();
    harness.view.rebuild_lines();
    harness.pump();

    assert_eq!(harness.tracker.snapshot().unwrap().data(), &[1, 2]);
    assert_eq!(harness.tagged_offsets(), vec![0, 2, 4, 6]);
}

#[test]
fn option_off_clears_tags_and_on_restores_them() {
    let mut harness = Harness::new(&[9, 9], 4, 1);

    let option = harness.view.set_highlight_current_value(false);
    harness.tracker.on_option_changed(&harness.view, option);
    assert_eq!(harness.pump(), 1);
    assert!(harness.tagged_offsets().is_empty());

    let option = harness.view.set_highlight_current_value(true);
    harness.tracker.on_option_changed(&harness.view, option);
    assert_eq!(harness.pump(), 1);
    assert_eq!(harness.tagged_offsets(), vec![0, 1]);
}

#[test]
fn span_query_is_always_empty() {
    let harness = Harness::new(&[1, 1, 1], 4, 1);

    let tags: Vec<_> =
        highlight::get_tags_for_spans(&harness.tracker, &[BufferSpan::new(0, 3)]).collect();

    assert!(tags.is_empty());
}

#[test]
fn horizontally_scrolled_line_only_tags_visible_cells() {
    let mut harness = Harness::new(&[1, 1, 1, 1], 4, 1);
    let mut line = harness.view.lines()[0].clone();
    let end = line.value_cells.get(1).unwrap().cell_span.end;
    line.set_visible_text(0..end);

    let offsets: Vec<_> = highlight::get_tags(&harness.tracker, &line)
        .map(|tag| tag.buffer_span.start)
        .collect();

    assert_eq!(offsets, vec![0, 1]);
    assert_eq!(harness.pump(), 0);
}
