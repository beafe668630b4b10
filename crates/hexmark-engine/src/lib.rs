pub mod buffer;
pub mod highlight;
pub mod layout;
pub mod view;

// Re-export key types for easier usage
pub use buffer::{BufferSpan, ByteBuffer, ByteValidity, ContentChange, HexBuffer};
pub use highlight::{
    ByteSnapshot, HighlightRequest, HighlightTag, HighlighterRegistry, TagSpan, TrackerState,
    ValueTracker, get_tags, get_tags_for_spans,
};
pub use layout::{Column, HexCell, HexLine, LayoutError, LayoutOptions, LineLayout};
pub use view::{CaretPosition, HexView, HighlightOptions, MemoryView, ViewId, ViewOption};
