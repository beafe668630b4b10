use crossbeam_channel::Sender;

use crate::buffer::{BufferSpan, ContentChange};
use crate::highlight::{ByteSnapshot, HighlightRequest};
use crate::layout::{Column, HexCell, HexLine};
use crate::view::{HexView, ViewOption};

/// Observable states of a [`ValueTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Disabled,
    EnabledNoSnapshot,
    EnabledWithSnapshot,
}

/// Tracks the value under the caret of one view.
///
/// The tracker is enabled while the "highlight current value" option is on
/// and the selection is empty. While disabled, caret, layout and data
/// notifications are ignored, which is how listeners are detached. Every
/// observable change is announced on the request channel handed over at
/// construction; the host answers [`HighlightRequest::RefreshTags`] by
/// re-querying tags and [`HighlightRequest::DeferredRecapture`] by calling
/// [`ValueTracker::recapture`] on its next turn.
#[derive(Debug)]
pub struct ValueTracker {
    enabled: bool,
    closed: bool,
    snapshot: Option<ByteSnapshot>,
    requests: Sender<HighlightRequest>,
}

impl ValueTracker {
    pub fn new(view: &dyn HexView, requests: Sender<HighlightRequest>) -> Self {
        let mut tracker = Self {
            enabled: false,
            closed: false,
            snapshot: None,
            requests,
        };
        tracker.update_enabled(view);
        tracker
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn snapshot(&self) -> Option<&ByteSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn state(&self) -> TrackerState {
        match (self.enabled, &self.snapshot) {
            (false, _) => TrackerState::Disabled,
            (true, None) => TrackerState::EnabledNoSnapshot,
            (true, Some(_)) => TrackerState::EnabledWithSnapshot,
        }
    }

    /// Column whose cells are being compared, if anything is being highlighted.
    pub fn active_column(&self) -> Option<Column> {
        if self.closed || !self.enabled {
            return None;
        }
        self.snapshot.as_ref().map(ByteSnapshot::column)
    }

    pub fn on_selection_changed(&mut self, view: &dyn HexView) {
        self.update_enabled(view);
    }

    pub fn on_option_changed(&mut self, view: &dyn HexView, option: ViewOption) {
        if option == ViewOption::HighlightCurrentValue {
            self.update_enabled(view);
        }
    }

    fn update_enabled(&mut self, view: &dyn HexView) {
        let enabled = view.highlight_current_value() && view.selection_is_empty();
        self.set_enabled(view, enabled);
    }

    pub fn set_enabled(&mut self, view: &dyn HexView, enabled: bool) {
        if self.closed || enabled == self.enabled {
            return;
        }
        self.enabled = enabled;
        log::debug!(
            "current value highlighting {}",
            if enabled { "enabled" } else { "disabled" }
        );

        self.snapshot = None;
        if enabled {
            self.update_current_value(view);
        }
        self.refresh_all();
    }

    pub fn on_caret_moved(&mut self, view: &dyn HexView) {
        if self.update_current_value(view) {
            self.refresh_all();
        }
    }

    /// The view re-laid out its lines. Line objects are not usable until the
    /// layout pass finishes, so the snapshot is dropped now and recaptured
    /// once the host runs the deferred request.
    pub fn on_lines_rebuilt(&mut self) {
        if self.closed || !self.enabled {
            return;
        }
        self.snapshot = None;
        self.send(HighlightRequest::DeferredRecapture);
    }

    /// Drop the snapshot and capture the value under the caret again.
    ///
    /// A no-op once the view has closed or highlighting is off, so stale
    /// deferred requests are harmless.
    pub fn recapture(&mut self, view: &dyn HexView) {
        if self.closed || view.is_closed() || !self.enabled {
            return;
        }
        self.snapshot = None;
        if self.update_current_value(view) {
            self.refresh_all();
        }
    }

    /// Buffer bytes changed. Any change overlapping the snapshot's bytes
    /// re-reads them and refreshes, whether or not the value differs.
    pub fn on_data_changed(&mut self, view: &dyn HexView, changes: &[ContentChange]) {
        if self.closed || !self.enabled {
            return;
        }
        let Some(snapshot) = self.snapshot.as_mut() else {
            return;
        };
        let span = snapshot.span();
        if let Some(change) = changes.iter().find(|c| span.overlaps_with(c.old_span)) {
            log::trace!("change {:?} overlaps current value at {span:?}", change.old_span);
            snapshot.reread(view.buffer());
            self.refresh_all();
        }
    }

    pub fn on_view_closed(&mut self) {
        if self.closed {
            return;
        }
        log::debug!("view closed, releasing current value");
        self.closed = true;
        self.enabled = false;
        self.snapshot = None;
    }

    /// Whether `cell` of `line` holds the current value. False whenever there
    /// is nothing to compare against.
    pub fn matches(&self, line: &HexLine, cell: &HexCell) -> bool {
        if self.closed || !self.enabled {
            return false;
        }
        self.snapshot
            .as_ref()
            .is_some_and(|snapshot| snapshot.matches(line, cell))
    }

    /// Capture or follow the value under the caret. Returns true when tags
    /// need refreshing.
    fn update_current_value(&mut self, view: &dyn HexView) -> bool {
        if self.closed || view.is_closed() || !self.enabled {
            return false;
        }
        let caret = view.caret();
        let position = view.filter_position(caret.offset);
        // Empty buffer, or one shrunk below the view's start position.
        if position >= view.buffer().len() {
            log::trace!("no byte behind caret position {position}");
            return self.snapshot.take().is_some();
        }
        let Some(line) = view.caret_line() else {
            log::trace!("caret line not laid out yet, waiting for recapture");
            return false;
        };

        let Some(cell) = line.cells(caret.column).get_cell(position) else {
            log::warn!(
                "caret position {position} outside its line {:?}",
                line.buffer_span
            );
            return false;
        };

        if let Some(snapshot) = self
            .snapshot
            .as_mut()
            .filter(|snapshot| snapshot.column() == caret.column)
        {
            return snapshot.refresh(cell, view.buffer());
        }

        let size = match caret.column {
            Column::Value => view.bytes_per_value(),
            Column::Text => 1,
        };
        self.snapshot = Some(ByteSnapshot::capture(size, caret.column, cell, view.buffer()));
        true
    }

    fn refresh_all(&self) {
        self.send(HighlightRequest::RefreshTags(BufferSpan::FULL));
    }

    fn send(&self, request: HighlightRequest) {
        if self.requests.send(request).is_err() {
            log::warn!("highlight request {request:?} dropped, receiver is gone");
        }
    }
}
