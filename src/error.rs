//! Error types for Shelfmark
//!
//! This module defines error types using thiserror for ergonomic error handling.
//! The only errors the catalog itself produces are validation failures
//! (duplicate names, duplicate ISBNs, out-of-range loan statuses, over-long
//! fields, restricted deletes); everything else is carried through from the
//! database layer. Validation failures are reported synchronously to the
//! caller of the create/update operation and are never fatal.

use thiserror::Error;

/// Result type alias using our CatalogError type
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Main error type for Shelfmark
#[derive(Error, Debug)]
pub enum CatalogError {
    // ===== Validation failures =====

    /// A genre with the same name already exists, ignoring case.
    #[error("Genre already exists (case insensitive match)")]
    DuplicateGenre { name: String },

    /// A language with the same name already exists, ignoring case.
    #[error("Language already exists (case insensitive match)")]
    DuplicateLanguage { name: String },

    /// Another book already carries this ISBN (exact, case-sensitive match).
    #[error("A book with ISBN '{isbn}' already exists")]
    DuplicateIsbn { isbn: String },

    /// Loan status value outside the closed set (Maintenance, On loan,
    /// Available, Reserved).
    #[error("Invalid loan status: '{0}'")]
    InvalidLoanStatus(String),

    /// A text field exceeded its column length cap.
    #[error("Field '{field}' too long: {len} characters (maximum {max})")]
    FieldTooLong {
        field: &'static str,
        max: usize,
        len: usize,
    },

    // ===== Referential integrity (restrict-on-delete) =====

    /// The author is still referenced by at least one book.
    #[error("Author {author_id} is referenced by {book_count} book(s) and cannot be deleted")]
    AuthorInUse { author_id: i64, book_count: i64 },

    /// The book still has physical copies on record.
    #[error("Book {book_id} has {instance_count} copies and cannot be deleted")]
    BookInUse {
        book_id: i64,
        instance_count: i64,
    },

    // ===== Lookup failures =====

    /// Update or delete targeted a row that does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    // ===== Infrastructure =====

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// File system error (database directory creation, export, etc.)
    #[error("File I/O error: {0}")]
    FileIoError(String),

    /// Wrapped sqlx database error
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),
}

impl CatalogError {
    /// True for errors the caller can fix by changing the submitted data.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CatalogError::DuplicateGenre { .. }
                | CatalogError::DuplicateLanguage { .. }
                | CatalogError::DuplicateIsbn { .. }
                | CatalogError::InvalidLoanStatus(_)
                | CatalogError::FieldTooLong { .. }
        )
    }
}
