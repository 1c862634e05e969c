//! Document model, export sanitizer and session controller for the
//! rich-text editing surface.

pub mod commands;
pub mod document;
pub mod error;
pub mod host;
pub mod markup;
pub mod sanitize;
pub mod session;
pub mod style;
pub mod text;

pub use commands::{Alignment, ImageOptions, LinkRequest};
pub use document::{Document, Element, NodeId, NodeKind};
pub use error::EditorError;
pub use host::{EditingHost, FormatKind, TreeHost};
pub use rich_pad_mod_history::{HistoryConfig, HistoryManager, Snapshot};
pub use sanitize::{ExportSanitizer, LayoutProbe, RenderedSize, StyleLayout};
pub use session::{
    Affordances, EditorEvent, EditorSession, HiddenField, MemoryField, SessionOptions,
};
pub use text::WordCount;
