use std::collections::HashMap;

use crate::highlight::ValueTracker;
use crate::view::ViewId;

/// One [`ValueTracker`] per open view, created on first use and torn down
/// when the view closes.
#[derive(Debug, Default)]
pub struct HighlighterRegistry {
    trackers: HashMap<ViewId, ValueTracker>,
}

impl HighlighterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tracker for `view_id`, built with `factory` if there is none yet.
    pub fn get_or_create(
        &mut self,
        view_id: ViewId,
        factory: impl FnOnce() -> ValueTracker,
    ) -> &mut ValueTracker {
        self.trackers.entry(view_id).or_insert_with(|| {
            log::debug!("creating value tracker for {view_id:?}");
            factory()
        })
    }

    pub fn get(&self, view_id: ViewId) -> Option<&ValueTracker> {
        self.trackers.get(&view_id)
    }

    pub fn get_mut(&mut self, view_id: ViewId) -> Option<&mut ValueTracker> {
        self.trackers.get_mut(&view_id)
    }

    /// Shut down and drop the tracker of a closed view.
    ///
    /// Returns the closed tracker, if there was one.
    pub fn close(&mut self, view_id: ViewId) -> Option<ValueTracker> {
        let mut tracker = self.trackers.remove(&view_id)?;
        tracker.on_view_closed();
        Some(tracker)
    }

    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }
}
