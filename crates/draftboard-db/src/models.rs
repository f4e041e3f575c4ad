//! Database row types. These map directly to SQLite rows and are converted
//! into the `draftboard-types` records before leaving the crate.

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::Row;
use tracing::warn;

use draftboard_types::models::{Comment, Document, Draft, Reaction};

pub struct DocumentRow {
    pub id: i64,
    pub name: String,
    pub latest_version: i64,
    pub created_at: String,
}

impl DocumentRow {
    pub(crate) const COLUMNS: &'static str = "id, name, latest_version, created_at";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            latest_version: row.get(2)?,
            created_at: row.get(3)?,
        })
    }

    pub fn into_document(self) -> Document {
        Document {
            created_at: parse_timestamp(&self.created_at, "document", self.id),
            id: self.id,
            name: self.name,
            latest_version: self.latest_version,
        }
    }
}

pub struct DraftRow {
    pub id: i64,
    pub document_id: i64,
    pub content: String,
    pub version_number: i64,
    pub created_at: String,
}

impl DraftRow {
    pub(crate) const COLUMNS: &'static str =
        "id, document_id, content, version_number, created_at";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            document_id: row.get(1)?,
            content: row.get(2)?,
            version_number: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    pub fn into_draft(self) -> Draft {
        Draft {
            created_at: parse_timestamp(&self.created_at, "draft", self.id),
            id: self.id,
            document_id: self.document_id,
            content: self.content,
            version_number: self.version_number,
        }
    }
}

pub struct CommentRow {
    pub id: i64,
    pub draft_id: i64,
    pub user_id: i64,
    pub text: String,
    pub parent_comment_id: Option<i64>,
    pub created_at: String,
}

impl CommentRow {
    pub fn into_comment(self) -> Comment {
        Comment {
            created_at: parse_timestamp(&self.created_at, "comment", self.id),
            id: self.id,
            draft_id: self.draft_id,
            user_id: self.user_id,
            text: self.text,
            parent_comment_id: self.parent_comment_id,
        }
    }
}

pub struct ReactionRow {
    pub id: i64,
    pub comment_id: i64,
    pub user_id: i64,
    pub emoji: String,
    pub created_at: String,
}

impl ReactionRow {
    pub fn into_reaction(self) -> Reaction {
        Reaction {
            created_at: parse_timestamp(&self.created_at, "reaction", self.id),
            id: self.id,
            comment_id: self.comment_id,
            user_id: self.user_id,
            emoji: self.emoji,
        }
    }
}

/// One row of `comments LEFT JOIN reactions`. `reaction` is `None` when the
/// comment has no reactions and every reaction column came back NULL.
pub struct CommentReactionRow {
    pub comment: CommentRow,
    pub reaction: Option<ReactionRow>,
}

impl CommentReactionRow {
    /// Expects columns in the order: the six comment columns, then
    /// `r.id, r.comment_id, r.user_id, r.emoji, r.created_at`.
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let comment = CommentRow {
            id: row.get(0)?,
            draft_id: row.get(1)?,
            user_id: row.get(2)?,
            text: row.get(3)?,
            parent_comment_id: row.get(4)?,
            created_at: row.get(5)?,
        };

        let reaction = match row.get::<_, Option<i64>>(6)? {
            Some(id) => Some(ReactionRow {
                id,
                comment_id: row.get(7)?,
                user_id: row.get(8)?,
                emoji: row.get(9)?,
                created_at: row.get(10)?,
            }),
            None => None,
        };

        Ok(Self { comment, reaction })
    }
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS.SSS" without a zone.
/// Those are UTC; RFC 3339 strings are accepted too.
pub(crate) fn parse_timestamp(raw: &str, entity: &str, id: i64) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on {} {}: {}", raw, entity, id, e);
            DateTime::default()
        })
}
