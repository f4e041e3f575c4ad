use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use tracing::debug;

use draftboard_types::models::{CommentWithReactions, Document, Draft};

use crate::error::is_foreign_key_violation;
use crate::models::{CommentReactionRow, DocumentRow, DraftRow};
use crate::{Database, Result, StoreError};

impl Database {
    // -- Documents --

    pub fn get_document_by_id(&self, id: i64) -> Result<Option<Document>> {
        self.with_conn(|conn| query_document_by_id(conn, id))
    }

    pub fn get_document_by_name(&self, name: &str) -> Result<Option<Document>> {
        self.with_conn(|conn| query_document_by_name(conn, name))
    }

    /// Every document in id order, each with its current `latest_version`.
    pub fn get_all_documents_latest_versions(&self) -> Result<Vec<Document>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM documents ORDER BY id", DocumentRow::COLUMNS);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], DocumentRow::from_row)?
                .map(|r| r.map(DocumentRow::into_document))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Drafts --

    /// Store `content` as the next version of the document called `name`,
    /// creating the document at version 1 if no document has that name yet.
    ///
    /// The lookup, the document write and the draft insert run in one
    /// IMMEDIATE transaction on the writer connection, so two calls for the
    /// same name always produce consecutive versions of a single document.
    pub fn create_draft(&self, name: &str, content: &str) -> Result<Draft> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let existing: Option<(i64, i64)> = tx
                .query_row(
                    "SELECT id, latest_version FROM documents WHERE name = ?1 ORDER BY id LIMIT 1",
                    [name],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let (document_id, version) = match existing {
                Some((id, latest)) => {
                    let next = latest + 1;
                    tx.execute(
                        "UPDATE documents SET latest_version = ?1 WHERE id = ?2",
                        params![next, id],
                    )?;
                    (id, next)
                }
                None => {
                    tx.execute(
                        "INSERT INTO documents (name, latest_version) VALUES (?1, 1)",
                        [name],
                    )?;
                    (tx.last_insert_rowid(), 1)
                }
            };

            tx.execute(
                "INSERT INTO drafts (document_id, content, version_number) VALUES (?1, ?2, ?3)",
                params![document_id, content, version],
            )?;
            let draft_id = tx.last_insert_rowid();

            let draft = query_draft_by_id(&tx, draft_id)?.ok_or(StoreError::NotFound("draft"))?;
            tx.commit()?;

            debug!(
                "Draft {} stored as version {} of document {}",
                draft.id, draft.version_number, document_id
            );
            Ok(draft)
        })
    }

    pub fn get_draft_by_id(&self, id: i64) -> Result<Option<Draft>> {
        self.with_conn(|conn| query_draft_by_id(conn, id))
    }

    /// The `limit` newest drafts of every document, ordered by
    /// `version_number` descending. `0` returns every draft; a negative
    /// limit returns nothing.
    pub fn get_latest_drafts(&self, limit: i64) -> Result<Vec<Draft>> {
        if limit < 0 {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            // Equal versions keep insertion order.
            let sql = if limit == 0 {
                format!(
                    "SELECT {} FROM drafts ORDER BY version_number DESC, id ASC",
                    DraftRow::COLUMNS
                )
            } else {
                format!(
                    "SELECT {cols}
                     FROM (
                         SELECT {cols},
                                ROW_NUMBER() OVER (PARTITION BY document_id ORDER BY id DESC) AS rn
                         FROM drafts
                     )
                     WHERE rn <= ?1
                     ORDER BY version_number DESC, id ASC",
                    cols = DraftRow::COLUMNS
                )
            };

            let mut stmt = conn.prepare(&sql)?;
            let rows = if limit == 0 {
                stmt.query_map([], DraftRow::from_row)?
                    .map(|r| r.map(DraftRow::into_draft))
                    .collect::<std::result::Result<Vec<_>, _>>()?
            } else {
                stmt.query_map([limit], DraftRow::from_row)?
                    .map(|r| r.map(DraftRow::into_draft))
                    .collect::<std::result::Result<Vec<_>, _>>()?
            };
            Ok(rows)
        })
    }

    /// Drafts whose content contains `query` verbatim, newest id first.
    /// The match is a case-sensitive substring test; `%` and `_` are not
    /// treated as wildcards.
    pub fn search_drafts(&self, query: &str) -> Result<Vec<Draft>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM drafts WHERE instr(content, ?1) > 0 ORDER BY id DESC",
                DraftRow::COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([query], DraftRow::from_row)?
                .map(|r| r.map(DraftRow::into_draft))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Comments --

    /// Insert a comment and return its id. Fails with `NotFound` when the
    /// draft or the parent comment does not exist.
    pub fn add_comment(
        &self,
        draft_id: i64,
        user_id: i64,
        text: &str,
        parent_comment_id: Option<i64>,
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO comments (draft_id, user_id, text, parent_comment_id) VALUES (?1, ?2, ?3, ?4)",
                params![draft_id, user_id, text, parent_comment_id],
            )
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    StoreError::NotFound("draft or parent comment")
                } else {
                    e.into()
                }
            })?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Every comment on `draft_id` with its reactions, from a single
    /// `comments LEFT JOIN reactions` folded by comment id.
    pub fn get_comments_and_reactions(&self, draft_id: i64) -> Result<Vec<CommentWithReactions>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.draft_id, c.user_id, c.text, c.parent_comment_id, c.created_at,
                        r.id, r.comment_id, r.user_id, r.emoji, r.created_at
                 FROM comments c
                 LEFT JOIN reactions r ON r.comment_id = c.id
                 WHERE c.draft_id = ?1
                 ORDER BY c.id, r.id",
            )?;

            let rows = stmt.query_map([draft_id], CommentReactionRow::from_row)?;
            let comments = fold_comment_rows(rows)?;
            Ok(comments)
        })
    }

    // -- Reactions --

    /// Insert a reaction. The emoji must already have been validated.
    /// Fails with `NotFound` when the comment does not exist.
    pub fn add_reaction(&self, comment_id: i64, user_id: i64, emoji: &str) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO reactions (comment_id, user_id, emoji) VALUES (?1, ?2, ?3)",
                params![comment_id, user_id, emoji],
            )
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    StoreError::NotFound("comment")
                } else {
                    e.into()
                }
            })?;
            Ok(conn.last_insert_rowid())
        })
    }
}

/// Fold joined rows into one entry per comment.
///
/// Comments come out in the order they are first seen; scalar fields are
/// taken from that first row. Reactions are appended in arrival order, and a
/// row without a reaction contributes nothing beyond the comment itself.
pub(crate) fn fold_comment_rows<I, E>(rows: I) -> std::result::Result<Vec<CommentWithReactions>, E>
where
    I: IntoIterator<Item = std::result::Result<CommentReactionRow, E>>,
{
    let mut comments: Vec<CommentWithReactions> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();

    for row in rows {
        let CommentReactionRow { comment, reaction } = row?;

        let slot = match index.get(&comment.id) {
            Some(&slot) => slot,
            None => {
                index.insert(comment.id, comments.len());
                comments.push(CommentWithReactions::new(comment.into_comment()));
                comments.len() - 1
            }
        };

        if let Some(reaction) = reaction {
            comments[slot].reactions.push(reaction.into_reaction());
        }
    }

    Ok(comments)
}

fn query_document_by_id(conn: &Connection, id: i64) -> Result<Option<Document>> {
    let sql = format!("SELECT {} FROM documents WHERE id = ?1", DocumentRow::COLUMNS);
    let row = conn
        .query_row(&sql, [id], DocumentRow::from_row)
        .optional()?;
    Ok(row.map(DocumentRow::into_document))
}

/// The first document with this name is "the" document for it.
fn query_document_by_name(conn: &Connection, name: &str) -> Result<Option<Document>> {
    let sql = format!(
        "SELECT {} FROM documents WHERE name = ?1 ORDER BY id LIMIT 1",
        DocumentRow::COLUMNS
    );
    let row = conn
        .query_row(&sql, [name], DocumentRow::from_row)
        .optional()?;
    Ok(row.map(DocumentRow::into_document))
}

fn query_draft_by_id(conn: &Connection, id: i64) -> Result<Option<Draft>> {
    let sql = format!("SELECT {} FROM drafts WHERE id = ?1", DraftRow::COLUMNS);
    let row = conn.query_row(&sql, [id], DraftRow::from_row).optional()?;
    Ok(row.map(DraftRow::into_draft))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CommentRow, ReactionRow};
    use std::path::PathBuf;
    use std::sync::Arc;

    /// Removes the database file and its WAL companions on drop.
    struct TempPath(PathBuf);

    impl Drop for TempPath {
        fn drop(&mut self) {
            for suffix in ["", "-wal", "-shm"] {
                let mut p = self.0.clone().into_os_string();
                p.push(suffix);
                let _ = std::fs::remove_file(p);
            }
        }
    }

    fn temp_db() -> (TempPath, Database) {
        let path = std::env::temp_dir().join(format!("draftboard_{}.db", uuid::Uuid::new_v4()));
        let db = Database::open(&path).expect("open db");
        (TempPath(path), db)
    }

    fn comment_row(id: i64) -> CommentRow {
        CommentRow {
            id,
            draft_id: 1,
            user_id: 7,
            text: format!("comment {id}"),
            parent_comment_id: None,
            created_at: "2024-01-01 00:00:00".into(),
        }
    }

    fn reaction_row(id: i64, comment_id: i64, emoji: &str) -> ReactionRow {
        ReactionRow {
            id,
            comment_id,
            user_id: 9,
            emoji: emoji.into(),
            created_at: "2024-01-01 00:00:01".into(),
        }
    }

    #[test]
    fn create_draft_versions_existing_document() {
        let (_tmp, db) = temp_db();

        let first = db.create_draft("A", "x").unwrap();
        let second = db.create_draft("A", "y").unwrap();
        let other = db.create_draft("B", "z").unwrap();

        assert_eq!(first.version_number, 1);
        assert_eq!(second.version_number, 2);
        assert_eq!(first.document_id, second.document_id);
        assert_ne!(other.document_id, first.document_id);
        assert_eq!(other.version_number, 1);

        let docs = db.get_all_documents_latest_versions().unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].name, "A");
        assert_eq!(docs[0].latest_version, 2);
        assert_eq!(docs[1].name, "B");
        assert_eq!(docs[1].latest_version, 1);
    }

    #[test]
    fn k_drafts_yield_versions_one_through_k() {
        let (_tmp, db) = temp_db();
        for i in 0..5 {
            db.create_draft("X", &format!("v{i}")).unwrap();
        }

        let doc = db.get_document_by_name("X").unwrap().expect("document exists");
        assert_eq!(doc.latest_version, 5);

        let mut versions: Vec<i64> = db
            .get_latest_drafts(0)
            .unwrap()
            .into_iter()
            .filter(|d| d.document_id == doc.id)
            .map(|d| d.version_number)
            .collect();
        versions.sort();
        assert_eq!(versions, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn concurrent_create_draft_produces_consecutive_versions() {
        let (_tmp, db) = temp_db();
        let db = Arc::new(db);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let db = db.clone();
                std::thread::spawn(move || db.create_draft("shared", &format!("c{i}")).unwrap())
            })
            .collect();
        let mut versions: Vec<i64> = handles
            .into_iter()
            .map(|h| h.join().unwrap().version_number)
            .collect();
        versions.sort();
        assert_eq!(versions, (1..=8).collect::<Vec<_>>());

        let docs = db.get_all_documents_latest_versions().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].latest_version, 8);
    }

    #[test]
    fn latest_drafts_limit_semantics() {
        let (_tmp, db) = temp_db();
        db.create_draft("A", "a1").unwrap();
        db.create_draft("A", "a2").unwrap();
        db.create_draft("A", "a3").unwrap();
        db.create_draft("B", "b1").unwrap();

        let heads: Vec<String> = db
            .get_latest_drafts(1)
            .unwrap()
            .into_iter()
            .map(|d| d.content)
            .collect();
        assert_eq!(heads, vec!["a3", "b1"]);

        let two: Vec<String> = db
            .get_latest_drafts(2)
            .unwrap()
            .into_iter()
            .map(|d| d.content)
            .collect();
        assert_eq!(two, vec!["a3", "a2", "b1"]);

        assert_eq!(db.get_latest_drafts(0).unwrap().len(), 4);
        assert!(db.get_latest_drafts(-1).unwrap().is_empty());
    }

    #[test]
    fn equal_versions_keep_insertion_order() {
        let (_tmp, db) = temp_db();
        db.create_draft("Test Draft 1", "Draft content 1").unwrap();
        db.create_draft("Test Draft 2", "Draft content 2").unwrap();

        let drafts = db.get_latest_drafts(1).unwrap();
        assert_eq!(drafts[0].content, "Draft content 1");
        assert_eq!(drafts[1].content, "Draft content 2");
    }

    #[test]
    fn search_is_substring_match() {
        let (_tmp, db) = temp_db();
        db.create_draft("Custodia", "Content about custodia bank").unwrap();
        db.create_draft("Other", "API testing").unwrap();
        db.create_draft("Percent", "100% sure").unwrap();

        let found = db.search_drafts("custodia bank").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].content, "Content about custodia bank");

        assert!(db.search_drafts("Custodia Bank").unwrap().is_empty());
        assert_eq!(db.search_drafts("%").unwrap().len(), 1);
        assert!(db.search_drafts("_").unwrap().is_empty());

        let all = db.search_drafts("e").unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].id > w[1].id));
    }

    #[test]
    fn single_row_lookups_return_none_when_absent() {
        let (_tmp, db) = temp_db();
        assert!(db.get_document_by_id(1).unwrap().is_none());
        assert!(db.get_document_by_name("nope").unwrap().is_none());
        assert!(db.get_draft_by_id(1).unwrap().is_none());

        let draft = db.create_draft("A", "").unwrap();
        let found = db.get_draft_by_id(draft.id).unwrap().expect("draft exists");
        assert_eq!(found.content, "");
        assert_eq!(db.get_document_by_id(draft.document_id).unwrap().unwrap().name, "A");
    }

    #[test]
    fn comments_and_reactions_fold() {
        let (_tmp, db) = temp_db();
        let draft = db.create_draft("A", "x").unwrap();
        let other = db.create_draft("B", "y").unwrap();

        let c1 = db.add_comment(draft.id, 1, "first", None).unwrap();
        let c2 = db.add_comment(draft.id, 2, "reply", Some(c1)).unwrap();
        let c3 = db.add_comment(other.id, 3, "elsewhere", None).unwrap();

        db.add_reaction(c1, 5, "👍").unwrap();
        db.add_reaction(c1, 6, "🎉").unwrap();
        db.add_reaction(c3, 7, "🚀").unwrap();

        let comments = db.get_comments_and_reactions(draft.id).unwrap();
        assert_eq!(comments.len(), 2);

        let first = comments.iter().find(|c| c.id == c1).unwrap();
        let emojis: Vec<&str> = first.reactions.iter().map(|r| r.emoji.as_str()).collect();
        assert_eq!(emojis, vec!["👍", "🎉"]);
        assert!(first.reactions.iter().all(|r| r.comment_id == c1));

        let reply = comments.iter().find(|c| c.id == c2).unwrap();
        assert_eq!(reply.parent_comment_id, Some(c1));
        assert!(reply.reactions.is_empty());

        assert!(db.get_comments_and_reactions(9999).unwrap().is_empty());
    }

    #[test]
    fn failed_create_draft_leaves_no_rows() {
        let (_tmp, db) = temp_db();
        db.create_draft("A", "x").unwrap();

        db.with_conn_mut(|conn| {
            conn.execute_batch(
                "CREATE TRIGGER reject_marker BEFORE INSERT ON drafts
                 WHEN NEW.content = 'reject me'
                 BEGIN SELECT RAISE(ABORT, 'boom'); END;",
            )?;
            Ok(())
        })
        .unwrap();

        // existing document: the version bump must roll back
        assert!(matches!(db.create_draft("A", "reject me"), Err(StoreError::Sqlite(_))));
        // new document: the document insert must roll back
        assert!(matches!(db.create_draft("B", "reject me"), Err(StoreError::Sqlite(_))));

        let docs: Vec<(String, i64)> = db
            .get_all_documents_latest_versions()
            .unwrap()
            .into_iter()
            .map(|d| (d.name, d.latest_version))
            .collect();
        assert_eq!(docs, vec![("A".to_string(), 1)]);
        assert_eq!(db.get_latest_drafts(0).unwrap().len(), 1);

        // the writer is still usable afterwards
        assert_eq!(db.create_draft("A", "y").unwrap().version_number, 2);
    }

    #[test]
    fn writer_survives_a_panicking_caller() {
        let (_tmp, db) = temp_db();
        db.create_draft("A", "x").unwrap();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            db.with_conn_mut(|conn| -> Result<()> {
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                tx.execute("UPDATE documents SET latest_version = 99", [])?;
                panic!("handler bug");
            })
        }));
        assert!(result.is_err());

        let draft = db.create_draft("A", "y").unwrap();
        assert_eq!(draft.version_number, 2);
        assert_eq!(db.get_document_by_name("A").unwrap().unwrap().latest_version, 2);
    }

    #[test]
    fn writes_against_missing_rows_are_not_found() {
        let (_tmp, db) = temp_db();
        assert!(matches!(
            db.add_comment(42, 1, "hi", None),
            Err(StoreError::NotFound(_))
        ));

        let draft = db.create_draft("A", "x").unwrap();
        assert!(matches!(
            db.add_comment(draft.id, 1, "hi", Some(42)),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            db.add_reaction(42, 1, "👍"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn reopening_keeps_schema_and_data() {
        let (tmp, db) = temp_db();
        db.create_draft("A", "x").unwrap();

        let again = Database::open(&tmp.0).unwrap();
        let docs = again.get_all_documents_latest_versions().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].latest_version, 1);
    }

    #[test]
    fn fold_groups_rows_and_tolerates_null_reactions() {
        let rows: Vec<std::result::Result<CommentReactionRow, ()>> = vec![
            Ok(CommentReactionRow {
                comment: comment_row(1),
                reaction: Some(reaction_row(10, 1, "👍")),
            }),
            Ok(CommentReactionRow {
                comment: comment_row(2),
                reaction: None,
            }),
            Ok(CommentReactionRow {
                comment: comment_row(1),
                reaction: Some(reaction_row(11, 1, "😀")),
            }),
        ];

        let folded = fold_comment_rows(rows).unwrap();
        assert_eq!(folded.len(), 2);
        assert_eq!(folded[0].id, 1);
        assert_eq!(folded[0].text, "comment 1");
        let ids: Vec<i64> = folded[0].reactions.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![10, 11]);
        assert_eq!(folded[1].id, 2);
        assert!(folded[1].reactions.is_empty());
    }

    #[test]
    fn fold_propagates_row_errors() {
        let rows: Vec<std::result::Result<CommentReactionRow, &str>> = vec![
            Ok(CommentReactionRow {
                comment: comment_row(1),
                reaction: None,
            }),
            Err("boom"),
        ];
        assert_eq!(fold_comment_rows(rows).unwrap_err(), "boom");
    }
}
