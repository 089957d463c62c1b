//! SQLite storage layer for threadscan
//!
//! This module handles persistent storage of:
//! - Content objects (the object store)
//! - Word occurrences (the word index)
//! - The history of completed passes
//!
//! All writes of a pass go through a [`PassTransaction`], which is committed
//! once at the end of the pass and rolled back if it is dropped uncommitted.

mod schema;

pub use schema::SCHEMA;

use crate::content::{ContentObject, ObjectKind, Token};
use crate::ingest::PassReport;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

/// A failed store operation
#[derive(Error, Debug)]
#[error("store {operation} failed for '{object_id}': {source}")]
pub struct StoreError {
    /// What was being done (`insert`, `exists`, ...)
    pub operation: &'static str,
    /// The object the operation concerned
    pub object_id: String,
    #[source]
    pub source: rusqlite::Error,
}

impl StoreError {
    fn wrap(operation: &'static str, object_id: &str) -> impl FnOnce(rusqlite::Error) -> Self {
        let object_id = object_id.to_string();
        move |source| {
            tracing::error!(operation, object_id = %object_id, "store operation failed: {}", source);
            Self {
                operation,
                object_id,
                source,
            }
        }
    }
}

/// Durable table of previously seen content objects
pub trait ObjectStore {
    /// Whether an object with this id is already stored
    fn exists(&self, id: &str) -> Result<bool, StoreError>;

    /// Store the object unless its id is already present.
    ///
    /// Returns true if the object was written.
    fn insert_if_absent(&self, object: &ContentObject) -> Result<bool, StoreError>;

    /// The comment count recorded for a stored link, if any
    fn recorded_comment_count(&self, id: &str) -> Result<Option<i64>, StoreError>;

    /// Overwrite the recorded comment count of a stored object
    fn update_comment_count(&self, id: &str, count: i64) -> Result<(), StoreError>;
}

/// Durable table of word occurrences
pub trait WordIndex {
    /// Store one row per token for `object_id`, returning the rows written
    fn insert_words(&self, object_id: &str, tokens: &[Token]) -> Result<usize, StoreError>;
}

/// Database connection wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {:?}", path))?;

        let db = Self { conn };
        db.initialize()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;

        let db = Self { conn };
        db.initialize()?;

        Ok(db)
    }

    /// Initialize the database schema
    fn initialize(&self) -> Result<()> {
        self.conn
            .pragma_update(None, "foreign_keys", true)
            .context("Failed to enable foreign keys")?;
        self.conn
            .execute_batch(SCHEMA)
            .context("Failed to initialize database schema")?;
        Ok(())
    }

    /// Start the unit of work for one ingestion pass
    pub fn begin_pass(&mut self) -> Result<PassTransaction<'_>, StoreError> {
        let tx = self
            .conn
            .transaction()
            .map_err(StoreError::wrap("begin", "pass"))?;

        Ok(PassTransaction {
            tx,
            started_at: Utc::now(),
        })
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    // ==================== Reads ====================

    /// Get a stored object by id
    pub fn get_object(&self, id: &str) -> Result<Option<ContentObject>> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT id, kind, created_time, content, url, comment_count
                FROM objects WHERE id = ?1
                "#,
                params![id],
                |row| {
                    Ok(ObjectRow {
                        id: row.get(0)?,
                        kind: row.get(1)?,
                        created_time: row.get(2)?,
                        content: row.get(3)?,
                        url: row.get(4)?,
                        comment_count: row.get(5)?,
                    })
                },
            )
            .optional()
            .context("Failed to get object")?;

        row.map(ObjectRow::into_object).transpose()
    }

    /// Get the indexed words of an object, in insertion order
    pub fn get_words(&self, object_id: &str) -> Result<Vec<Token>> {
        let mut stmt = self.conn.prepare(
            "SELECT original_word, normalized_word FROM words WHERE object_id = ?1 ORDER BY id",
        )?;

        let rows = stmt.query_map(params![object_id], |row| {
            Ok(Token {
                original: row.get(0)?,
                normalized: row.get(1)?,
            })
        })?;

        let mut tokens = Vec::new();
        for row in rows {
            tokens.push(row?);
        }

        Ok(tokens)
    }

    // ==================== Statistics ====================

    /// Get database statistics
    pub fn stats(&self) -> Result<StoreStats> {
        let objects: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM objects", [], |row| row.get(0))?;

        let mut stmt = self
            .conn
            .prepare("SELECT kind, COUNT(*) FROM objects GROUP BY kind ORDER BY kind")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        let mut objects_by_kind = Vec::new();
        for row in rows {
            let (kind, count) = row?;
            objects_by_kind.push((kind, count as usize));
        }

        let words: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM words", [], |row| row.get(0))?;

        let distinct_words: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT normalized_word) FROM words",
            [],
            |row| row.get(0),
        )?;

        let passes: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM passes", [], |row| row.get(0))?;

        let last_pass = self
            .conn
            .query_row(
                r#"
                SELECT target, started_at, finished_at, posts_seen, posts_skipped,
                       objects_inserted, words_inserted
                FROM passes ORDER BY id DESC LIMIT 1
                "#,
                [],
                |row| {
                    Ok(PassRecord {
                        target: row.get(0)?,
                        started_at: row.get(1)?,
                        finished_at: row.get(2)?,
                        posts_seen: row.get::<_, i64>(3)? as usize,
                        posts_skipped: row.get::<_, i64>(4)? as usize,
                        objects_inserted: row.get::<_, i64>(5)? as usize,
                        words_inserted: row.get::<_, i64>(6)? as usize,
                    })
                },
            )
            .optional()
            .context("Failed to get last pass")?;

        Ok(StoreStats {
            objects: objects as usize,
            objects_by_kind,
            words: words as usize,
            distinct_words: distinct_words as usize,
            passes: passes as usize,
            last_pass,
        })
    }

    /// Number of stored objects of one kind
    pub fn count_objects(&self, kind: ObjectKind) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM objects WHERE kind = ?1",
            params![kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

/// Unit of work for one ingestion pass.
///
/// Nothing written through it is visible to other connections until
/// [`commit`](PassTransaction::commit). Dropping it rolls everything back.
pub struct PassTransaction<'conn> {
    tx: Transaction<'conn>,
    started_at: DateTime<Utc>,
}

impl PassTransaction<'_> {
    /// Append a row to the pass history
    pub fn record_pass(&self, target: &str, report: &PassReport) -> Result<(), StoreError> {
        self.tx
            .execute(
                r#"
                INSERT INTO passes (
                    target, started_at, finished_at, posts_seen, posts_skipped,
                    objects_inserted, words_inserted
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    target,
                    self.started_at.to_rfc3339(),
                    Utc::now().to_rfc3339(),
                    report.posts_seen as i64,
                    report.posts_skipped as i64,
                    report.objects_inserted() as i64,
                    report.words_inserted as i64,
                ],
            )
            .map_err(StoreError::wrap("record pass", target))?;
        Ok(())
    }

    /// Make every write of the pass durable
    pub fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().map_err(StoreError::wrap("commit", "pass"))
    }

    /// Discard every write of the pass
    pub fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().map_err(StoreError::wrap("rollback", "pass"))
    }
}

impl ObjectStore for PassTransaction<'_> {
    fn exists(&self, id: &str) -> Result<bool, StoreError> {
        self.tx
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM objects WHERE id = ?1)",
                params![id],
                |row| row.get(0),
            )
            .map_err(StoreError::wrap("exists", id))
    }

    fn insert_if_absent(&self, object: &ContentObject) -> Result<bool, StoreError> {
        // Single connection, single pass: check-then-act cannot race.
        if self.exists(&object.id)? {
            return Ok(false);
        }

        self.tx
            .execute(
                r#"
                INSERT INTO objects (id, kind, created_time, content, url, comment_count)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    object.id,
                    object.kind.as_str(),
                    object.created_time.timestamp(),
                    object.text,
                    object.location,
                    object.comment_count,
                ],
            )
            .map_err(StoreError::wrap("insert", &object.id))?;

        Ok(true)
    }

    fn recorded_comment_count(&self, id: &str) -> Result<Option<i64>, StoreError> {
        let count: Option<Option<i64>> = self
            .tx
            .query_row(
                "SELECT comment_count FROM objects WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::wrap("read comment count", id))?;

        Ok(count.flatten())
    }

    fn update_comment_count(&self, id: &str, count: i64) -> Result<(), StoreError> {
        self.tx
            .execute(
                "UPDATE objects SET comment_count = ?1 WHERE id = ?2",
                params![count, id],
            )
            .map_err(StoreError::wrap("update comment count", id))?;
        Ok(())
    }
}

impl WordIndex for PassTransaction<'_> {
    fn insert_words(&self, object_id: &str, tokens: &[Token]) -> Result<usize, StoreError> {
        let mut stmt = self
            .tx
            .prepare_cached(
                "INSERT INTO words (original_word, normalized_word, object_id) VALUES (?1, ?2, ?3)",
            )
            .map_err(StoreError::wrap("insert words", object_id))?;

        for token in tokens {
            stmt.execute(params![token.original, token.normalized, object_id])
                .map_err(StoreError::wrap("insert words", object_id))?;
        }

        Ok(tokens.len())
    }
}

/// Database statistics
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub objects: usize,
    pub objects_by_kind: Vec<(String, usize)>,
    pub words: usize,
    pub distinct_words: usize,
    pub passes: usize,
    pub last_pass: Option<PassRecord>,
}

/// A row of the pass history
#[derive(Debug, Clone, Serialize)]
pub struct PassRecord {
    pub target: String,
    pub started_at: String,
    pub finished_at: String,
    pub posts_seen: usize,
    pub posts_skipped: usize,
    pub objects_inserted: usize,
    pub words_inserted: usize,
}

// Internal row type for database mapping

struct ObjectRow {
    id: String,
    kind: String,
    created_time: i64,
    content: Option<String>,
    url: Option<String>,
    comment_count: Option<i64>,
}

impl ObjectRow {
    fn into_object(self) -> Result<ContentObject> {
        let kind = ObjectKind::from_name(&self.kind)
            .ok_or_else(|| anyhow::anyhow!("Unknown object kind in store: {}", self.kind))?;

        Ok(ContentObject {
            id: self.id,
            kind,
            created_time: DateTime::<Utc>::from_timestamp(self.created_time, 0).unwrap_or_default(),
            text: self.content.unwrap_or_default(),
            location: self.url.unwrap_or_default(),
            comment_count: self.comment_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::tokenize;
    use crate::remote::{Comment, Post};

    fn link(id: &str, comments: i64) -> ContentObject {
        ContentObject::from_post(&Post::new(id, "Some title", "https://example.com", comments))
            .unwrap()
    }

    #[test]
    fn test_database_creation() {
        let db = Database::open_in_memory().unwrap();
        let stats = db.stats().unwrap();
        assert_eq!(stats.objects, 0);
        assert_eq!(stats.words, 0);
        assert!(stats.last_pass.is_none());
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("store.db");
        let _db = Database::open(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_insert_if_absent() {
        let mut db = Database::open_in_memory().unwrap();
        let tx = db.begin_pass().unwrap();

        let object = link("t3_a", 2);
        assert!(!tx.exists("t3_a").unwrap());
        assert!(tx.insert_if_absent(&object).unwrap());
        assert!(tx.exists("t3_a").unwrap());

        let mut changed = object.clone();
        changed.comment_count = Some(9);
        assert!(!tx.insert_if_absent(&changed).unwrap());
        assert_eq!(tx.recorded_comment_count("t3_a").unwrap(), Some(2));

        tx.commit().unwrap();
        assert_eq!(db.get_object("t3_a").unwrap(), Some(object));
    }

    #[test]
    fn test_recorded_comment_count_absent() {
        let mut db = Database::open_in_memory().unwrap();
        let tx = db.begin_pass().unwrap();

        assert_eq!(tx.recorded_comment_count("t3_missing").unwrap(), None);

        let comment = ContentObject::from_comment(&Comment::new("t1_c", "hi")).unwrap();
        tx.insert_if_absent(&comment).unwrap();
        assert_eq!(tx.recorded_comment_count("t1_c").unwrap(), None);

        tx.insert_if_absent(&link("t3_a", 5)).unwrap();
        tx.update_comment_count("t3_a", 7).unwrap();
        assert_eq!(tx.recorded_comment_count("t3_a").unwrap(), Some(7));
    }

    #[test]
    fn test_dropped_pass_rolls_back() {
        let mut db = Database::open_in_memory().unwrap();
        {
            let tx = db.begin_pass().unwrap();
            tx.insert_if_absent(&link("t3_a", 0)).unwrap();
        }
        assert_eq!(db.stats().unwrap().objects, 0);

        let tx = db.begin_pass().unwrap();
        tx.insert_if_absent(&link("t3_a", 0)).unwrap();
        tx.rollback().unwrap();
        assert!(db.get_object("t3_a").unwrap().is_none());
    }

    #[test]
    fn test_words_round_trip() {
        let mut db = Database::open_in_memory().unwrap();
        let tx = db.begin_pass().unwrap();
        tx.insert_if_absent(&link("t3_a", 0)).unwrap();

        let tokens = tokenize("Buy buy XYZ!");
        assert_eq!(tx.insert_words("t3_a", &tokens).unwrap(), 3);
        tx.commit().unwrap();

        assert_eq!(db.get_words("t3_a").unwrap(), tokens);
        let stats = db.stats().unwrap();
        assert_eq!(stats.words, 3);
        assert_eq!(stats.distinct_words, 2);
    }

    #[test]
    fn test_words_require_known_object() {
        let mut db = Database::open_in_memory().unwrap();
        let tx = db.begin_pass().unwrap();

        let err = tx.insert_words("t1_nobody", &tokenize("orphan")).unwrap_err();
        assert_eq!(err.operation, "insert words");
        assert_eq!(err.object_id, "t1_nobody");
    }

    #[test]
    fn test_stats_by_kind_and_last_pass() {
        let mut db = Database::open_in_memory().unwrap();
        let tx = db.begin_pass().unwrap();
        tx.insert_if_absent(&link("t3_a", 1)).unwrap();
        tx.insert_if_absent(&ContentObject::from_comment(&Comment::new("t1_c", "x")).unwrap())
            .unwrap();

        let report = PassReport {
            posts_seen: 1,
            links_inserted: 1,
            comments_inserted: 1,
            ..PassReport::default()
        };
        tx.record_pass("stocks", &report).unwrap();
        tx.commit().unwrap();

        let stats = db.stats().unwrap();
        assert_eq!(stats.objects, 2);
        assert_eq!(
            stats.objects_by_kind,
            vec![("Comment".to_string(), 1), ("Link".to_string(), 1)]
        );
        assert_eq!(db.count_objects(ObjectKind::Link).unwrap(), 1);

        let last = stats.last_pass.unwrap();
        assert_eq!(last.target, "stocks");
        assert_eq!(last.objects_inserted, 2);
    }
}
