//! SQL schema for the Questree SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS sections (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT    NOT NULL,
    description TEXT,
    order_index INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT    NOT NULL,   -- RFC 3339 UTC
    updated_at  TEXT    NOT NULL
);

-- Questions self-reference through parent_id. Removing a section removes its
-- questions; removing a question removes its subtree.
CREATE TABLE IF NOT EXISTS questions (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    section_id  INTEGER NOT NULL REFERENCES sections(id)  ON DELETE CASCADE,
    parent_id   INTEGER          REFERENCES questions(id) ON DELETE CASCADE,
    text        TEXT    NOT NULL,
    type        TEXT    NOT NULL,   -- QuestionType tag
    options     TEXT,               -- JSON or NULL
    condition   TEXT,               -- JSON or NULL
    order_index INTEGER NOT NULL DEFAULT 0,
    is_required INTEGER NOT NULL DEFAULT 0,
    notes       TEXT,
    created_at  TEXT    NOT NULL,
    updated_at  TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS sections_order_idx   ON sections(order_index);
CREATE INDEX IF NOT EXISTS questions_order_idx  ON questions(order_index);
CREATE INDEX IF NOT EXISTS questions_section_idx ON questions(section_id);
CREATE INDEX IF NOT EXISTS questions_parent_idx ON questions(parent_id);

PRAGMA user_version = 1;
";
