use rusqlite::Connection;
use tracing::info;

use crate::Result;

/// Create the four tables if they are missing. Safe to run on every start.
///
/// `documents.name` is indexed but not UNIQUE: one row per name is kept by
/// `create_draft`, which runs under the writer lock.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS documents (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            name            TEXT NOT NULL CHECK (length(name) > 0),
            latest_version  INTEGER NOT NULL DEFAULT 1 CHECK (latest_version >= 1),
            created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_documents_name
            ON documents(name);

        CREATE TABLE IF NOT EXISTS drafts (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            document_id     INTEGER NOT NULL REFERENCES documents(id),
            content         TEXT NOT NULL DEFAULT '',
            version_number  INTEGER NOT NULL CHECK (version_number >= 1),
            created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_drafts_document
            ON drafts(document_id, id);

        CREATE TABLE IF NOT EXISTS comments (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            draft_id            INTEGER NOT NULL REFERENCES drafts(id),
            user_id             INTEGER NOT NULL,
            text                TEXT NOT NULL CHECK (length(text) > 0),
            parent_comment_id   INTEGER REFERENCES comments(id),
            created_at          TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_comments_draft
            ON comments(draft_id);

        CREATE TABLE IF NOT EXISTS reactions (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            comment_id  INTEGER NOT NULL REFERENCES comments(id),
            user_id     INTEGER NOT NULL,
            emoji       TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_reactions_comment
            ON reactions(comment_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
