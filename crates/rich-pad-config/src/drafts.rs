/// Draft persistence: stores submitted article HTML across runs.
///
/// Metadata (counts, timestamp) is stored in a redb table as bincode.
/// The exported HTML is stored as raw `&str` in a separate table, avoiding
/// escaping issues with markup or large inline images.
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

/// Draft metadata table: article id → bincode(`DraftMeta`).
const DRAFT_META: TableDefinition<&str, &[u8]> = TableDefinition::new("draft_meta");

/// Draft content table: article id → sanitized HTML.
const DRAFT_HTML: TableDefinition<&str, &str> = TableDefinition::new("draft_html");

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct DraftMeta {
    words: usize,
    characters: usize,
    saved_at: i64,
}

/// One stored draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftRecord {
    /// Sanitized export markup.
    pub html: String,
    pub words: usize,
    pub characters: usize,
    /// Unix timestamp (seconds) of the save.
    pub saved_at: i64,
}

impl DraftRecord {
    /// Creates a record stamped with the current time.
    pub fn new(html: impl Into<String>, words: usize, characters: usize) -> Self {
        Self {
            html: html.into(),
            words,
            characters,
            saved_at: Utc::now().timestamp(),
        }
    }

    pub fn saved_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.saved_at, 0)
    }
}

/// Draft store backed by redb.
pub struct DraftStore {
    db: Database,
}

impl std::fmt::Debug for DraftStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftStore").finish()
    }
}

impl DraftStore {
    /// Opens or creates the draft database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create draft directory: {}", parent.display())
            })?;
        }
        let db = Database::create(path)
            .with_context(|| format!("Failed to open draft database: {}", path.display()))?;

        // Ensure tables exist
        let write_txn = db
            .begin_write()
            .context("Failed to begin initial draft write transaction")?;
        {
            let _ = write_txn
                .open_table(DRAFT_META)
                .context("Failed to create draft_meta table")?;
            let _ = write_txn
                .open_table(DRAFT_HTML)
                .context("Failed to create draft_html table")?;
        }
        write_txn
            .commit()
            .context("Failed to commit initial draft transaction")?;

        Ok(Self { db })
    }

    /// Saves (or overwrites) the draft for `id`.
    pub fn save(&self, id: &str, record: &DraftRecord) -> Result<()> {
        let meta = DraftMeta {
            words: record.words,
            characters: record.characters,
            saved_at: record.saved_at,
        };
        let bytes = bincode::serialize(&meta).context("Failed to serialize draft metadata")?;

        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut meta_table = write_txn
                .open_table(DRAFT_META)
                .context("Failed to open draft_meta table")?;
            meta_table
                .insert(id, bytes.as_slice())
                .context("Failed to insert draft metadata")?;

            let mut html_table = write_txn
                .open_table(DRAFT_HTML)
                .context("Failed to open draft_html table")?;
            html_table
                .insert(id, record.html.as_str())
                .context("Failed to insert draft content")?;
        }
        write_txn.commit().context("Failed to commit draft")?;
        tracing::debug!(id, bytes = record.html.len(), "Saved draft");
        Ok(())
    }

    /// Loads the draft for `id`, or `None` if none was saved.
    pub fn load(&self, id: &str) -> Result<Option<DraftRecord>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let meta_table = read_txn
            .open_table(DRAFT_META)
            .context("Failed to open draft_meta table")?;
        let html_table = read_txn
            .open_table(DRAFT_HTML)
            .context("Failed to open draft_html table")?;

        let Some(meta_guard) = meta_table.get(id).context("Failed to read draft metadata")? else {
            return Ok(None);
        };
        let meta: DraftMeta = bincode::deserialize(meta_guard.value())
            .context("Failed to deserialize draft metadata")?;
        let html = html_table
            .get(id)
            .context("Failed to read draft content")?
            .map(|guard| guard.value().to_string())
            .unwrap_or_default();

        Ok(Some(DraftRecord {
            html,
            words: meta.words,
            characters: meta.characters,
            saved_at: meta.saved_at,
        }))
    }

    /// Deletes the draft for `id`. Missing drafts are ignored.
    pub fn delete(&self, id: &str) -> Result<()> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut meta_table = write_txn
                .open_table(DRAFT_META)
                .context("Failed to open draft_meta table")?;
            meta_table
                .remove(id)
                .context("Failed to delete draft metadata")?;
            let mut html_table = write_txn
                .open_table(DRAFT_HTML)
                .context("Failed to open draft_html table")?;
            html_table
                .remove(id)
                .context("Failed to delete draft content")?;
        }
        write_txn
            .commit()
            .context("Failed to commit draft deletion")?;
        Ok(())
    }

    /// Ids of all stored drafts, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let table = read_txn
            .open_table(DRAFT_META)
            .context("Failed to open draft_meta table")?;
        let mut ids = Vec::new();
        for entry in table.iter().context("Failed to iterate draft_meta")? {
            let (key, _) = entry.context("Failed to read draft_meta entry")?;
            ids.push(key.value().to_string());
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_test_store() -> (DraftStore, TempDir) {
        let dir = TempDir::new().expect("create temp dir");
        let db_path = dir.path().join("test-drafts.redb");
        let store = DraftStore::open(&db_path).expect("open draft store");
        (store, dir)
    }

    #[test]
    fn test_load_missing_draft() {
        let (store, _dir) = open_test_store();
        assert!(store.load("nope").expect("load").is_none());
    }

    #[test]
    fn test_save_and_load() {
        let (store, _dir) = open_test_store();
        let record = DraftRecord::new("<p>hello world</p>", 2, 11);
        store.save("article-1", &record).expect("save");

        let loaded = store.load("article-1").expect("load").expect("present");
        assert_eq!(loaded, record);
        assert!(loaded.saved_at_utc().is_some());
    }

    #[test]
    fn test_save_overwrites() {
        let (store, _dir) = open_test_store();
        store
            .save("a", &DraftRecord::new("<p>one</p>", 1, 3))
            .expect("save");
        store
            .save("a", &DraftRecord::new("<p>two two</p>", 2, 7))
            .expect("save");
        let loaded = store.load("a").expect("load").expect("present");
        assert_eq!(loaded.html, "<p>two two</p>");
        assert_eq!(loaded.words, 2);
        assert_eq!(store.list().expect("list"), vec!["a".to_string()]);
    }

    #[test]
    fn test_delete_and_list() {
        let (store, _dir) = open_test_store();
        store.save("b", &DraftRecord::new("x", 1, 1)).expect("save");
        store.save("a", &DraftRecord::new("y", 1, 1)).expect("save");
        assert_eq!(store.list().expect("list"), vec!["a", "b"]);

        store.delete("a").expect("delete");
        store.delete("missing").expect("delete missing");
        assert_eq!(store.list().expect("list"), vec!["b"]);
        assert!(store.load("a").expect("load").is_none());
    }

    #[test]
    fn test_markup_with_special_chars() {
        let (store, _dir) = open_test_store();
        let html = "<p>\"quotes\" & 'apostrophes' — ünïcödé\n<img src=\"data:image/jpeg;base64,/9j/\"></p>";
        store.save("s", &DraftRecord::new(html, 4, 60)).expect("save");
        assert_eq!(store.load("s").expect("load").expect("present").html, html);
    }
}
