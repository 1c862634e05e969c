pub mod config;
pub mod drafts;

pub use config::EditorConfig;
pub use drafts::{DraftRecord, DraftStore};
