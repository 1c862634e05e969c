/// Linear undo/redo history of full-document snapshots.
///
/// Provides a `HistoryManager` that records serialized document states in a
/// bounded log with a cursor. Committing after an undo truncates the redo
/// branch; the oldest states are evicted once the log is full. History lives
/// for one editing session and is never persisted.
pub mod config;
pub mod manager;
pub mod snapshot;

pub use config::HistoryConfig;
pub use manager::HistoryManager;
pub use snapshot::Snapshot;
