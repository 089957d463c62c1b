//! Database schema definition

/// SQL schema for the threadscan database
pub const SCHEMA: &str = r#"
-- Every content object seen so far; rows are never updated except for
-- the comment count of revisited links
CREATE TABLE IF NOT EXISTS objects (
    id TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    created_time INTEGER NOT NULL,
    content TEXT,
    url TEXT,
    comment_count INTEGER NULL
);

CREATE INDEX IF NOT EXISTS idx_objects_kind ON objects(kind);

-- One row per indexable word occurrence
CREATE TABLE IF NOT EXISTS words (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    original_word TEXT NOT NULL,
    normalized_word TEXT NOT NULL,
    object_id TEXT NOT NULL REFERENCES objects(id)
);

CREATE INDEX IF NOT EXISTS idx_words_normalized ON words(normalized_word);
CREATE INDEX IF NOT EXISTS idx_words_object ON words(object_id);

-- Completed ingestion passes
CREATE TABLE IF NOT EXISTS passes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    target TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT NOT NULL,
    posts_seen INTEGER NOT NULL,
    posts_skipped INTEGER NOT NULL,
    objects_inserted INTEGER NOT NULL,
    words_inserted INTEGER NOT NULL
);
"#;
