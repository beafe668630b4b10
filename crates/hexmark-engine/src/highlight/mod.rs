/*!
 * # Current value highlighting
 *
 * Marks every visible cell whose bytes equal the bytes under the caret.
 *
 * ## Pieces
 *
 * - **`snapshot`**: [`ByteSnapshot`], the captured bytes, span and column of
 *   the caret cell plus a reusable scratch buffer for comparisons
 * - **`tracker`**: [`ValueTracker`], one per view, keeps the snapshot in sync
 *   with caret moves, layout passes, option and selection changes and buffer
 *   edits
 * - **`tagger`**: [`get_tags`], the read-only per-line query
 * - **`registry`**: [`HighlighterRegistry`], one tracker per open view
 *
 * ## Host loop
 *
 * ```rust
 * use hexmark_engine::buffer::ByteBuffer;
 * use hexmark_engine::highlight::{self, HighlightRequest, ValueTracker};
 * use hexmark_engine::layout::LayoutOptions;
 * use hexmark_engine::view::{HighlightOptions, MemoryView};
 *
 * let view = MemoryView::new(
 *     ByteBuffer::from_bytes(b"AABA".to_vec()),
 *     LayoutOptions { bytes_per_line: 4, ..LayoutOptions::default() },
 *     HighlightOptions::default(),
 *     1,
 * )
 * .unwrap();
 * let (sender, requests) = highlight::request_channel();
 * let mut tracker = ValueTracker::new(&view, sender);
 *
 * for request in requests.try_iter() {
 *     if request == HighlightRequest::DeferredRecapture {
 *         tracker.recapture(&view);
 *     }
 * }
 *
 * let tags: Vec<_> = highlight::get_tags(&tracker, &view.lines()[0]).collect();
 * assert_eq!(tags.len(), 3);
 * ```
 */

pub mod registry;
pub mod snapshot;
pub mod tagger;
pub mod tracker;

pub use registry::HighlighterRegistry;
pub use snapshot::ByteSnapshot;
pub use tagger::{HighlightTag, TagSpan, get_tags, get_tags_for_spans};
pub use tracker::{TrackerState, ValueTracker};

use crossbeam_channel::{Receiver, Sender};

use crate::buffer::BufferSpan;

/// What a tracker asks of its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightRequest {
    /// Tags inside the span may have changed; query them again.
    RefreshTags(BufferSpan),
    /// Call [`ValueTracker::recapture`] once the current layout pass is done.
    DeferredRecapture,
}

/// Channel pair connecting trackers to their host.
pub fn request_channel() -> (Sender<HighlightRequest>, Receiver<HighlightRequest>) {
    crossbeam_channel::unbounded()
}
