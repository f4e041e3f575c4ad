use thiserror::Error;

/// Failures reported by the store.
///
/// Absence of a single-row lookup is not an error; those methods return
/// `Ok(None)`. `NotFound` is reserved for writes that reference a row which
/// does not exist.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// True if `err` is SQLite rejecting a row because a REFERENCES target is missing.
pub(crate) fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}
