//! Database models for the library catalog
//!
//! Five related record types describe the catalog: Genre, Author, Language,
//! Book, and BookInstance (one physical, loanable copy of a Book).
//!
//! # SQLite Adaptations
//! - Dates stored as TEXT in ISO 8601 format (YYYY-MM-DD)
//! - Row timestamps stored as TEXT, maintained by a trigger
//! - Loan status stored as its single-character code ('m', 'o', 'a', 'r')
//! - BookInstance primary keys are v4 UUIDs stored as hyphenated TEXT
//! - The many-to-many Book <-> Genre relationship uses a junction table

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use crate::error::{CatalogError, Result};

// ============================================================================
// FIELD LENGTH CAPS
// ============================================================================

pub const GENRE_NAME_MAX: usize = 200;
pub const AUTHOR_NAME_MAX: usize = 200;
pub const LANGUAGE_NAME_MAX: usize = 100;
pub const BOOK_TITLE_MAX: usize = 200;
pub const BOOK_SUMMARY_MAX: usize = 2000;
pub const BOOK_ISBN_MAX: usize = 50;
pub const INSTANCE_IMPRINT_MAX: usize = 200;

/// Reject a field value that exceeds its column cap.
///
/// Length is counted in characters, not bytes, so multi-byte names get the
/// same cap as ASCII ones.
pub(crate) fn check_len(field: &'static str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len > max {
        return Err(CatalogError::FieldTooLong { field, max, len });
    }
    Ok(())
}

// ============================================================================
// ENUMS
// ============================================================================

/// Availability of a single physical copy.
///
/// Closed set of four states; anything else is rejected at the edges
/// (`from_code`, `FromStr`) and by a CHECK constraint in the schema. There
/// are no transition rules: any status may be set from any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LoanStatus {
    #[default]
    Maintenance,
    OnLoan,
    Available,
    Reserved,
}

impl LoanStatus {
    pub const ALL: [LoanStatus; 4] = [
        LoanStatus::Maintenance,
        LoanStatus::OnLoan,
        LoanStatus::Available,
        LoanStatus::Reserved,
    ];

    /// Single-character code stored in the database.
    pub fn as_code(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "m",
            LoanStatus::OnLoan => "o",
            LoanStatus::Available => "a",
            LoanStatus::Reserved => "r",
        }
    }

    /// Parse the stored single-character code.
    pub fn from_code(code: &str) -> Result<Self> {
        match code {
            "m" => Ok(LoanStatus::Maintenance),
            "o" => Ok(LoanStatus::OnLoan),
            "a" => Ok(LoanStatus::Available),
            "r" => Ok(LoanStatus::Reserved),
            other => Err(CatalogError::InvalidLoanStatus(other.to_string())),
        }
    }

    /// Human-readable label shown in listings.
    pub fn label(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "Maintenance",
            LoanStatus::OnLoan => "On loan",
            LoanStatus::Available => "Available",
            LoanStatus::Reserved => "Reserved",
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LoanStatus {
    type Err = CatalogError;

    /// Accepts either the stored code or the display label.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Maintenance" => Ok(LoanStatus::Maintenance),
            "On loan" => Ok(LoanStatus::OnLoan),
            "Available" => Ok(LoanStatus::Available),
            "Reserved" => Ok(LoanStatus::Reserved),
            other => LoanStatus::from_code(other),
        }
    }
}

// ============================================================================
// MAIN ENTITIES
// ============================================================================

/// A descriptive category tag applicable to many books.
///
/// Names are unique under case-insensitive comparison.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Genre {
    pub genre_id: i64,
    pub name: String,
}

impl Genre {
    pub fn display_label(&self) -> &str {
        &self.name
    }

    /// Resource locator consumed by the presentation layer.
    pub fn absolute_url(&self) -> String {
        format!("/genre/{}", self.genre_id)
    }
}

/// A person credited with writing one or more books.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Author {
    pub author_id: i64,
    pub first_name: String,
    pub last_name: String,
    #[sqlx(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[sqlx(default)]
    pub date_of_death: Option<NaiveDate>,
}

impl Author {
    /// Display label for listings.
    ///
    /// TODO: this repeats the last name twice ("Tolkien, Tolkien"); confirm
    /// with the catalog owners whether "last_name, first_name" is intended
    /// before changing the label.
    pub fn display_label(&self) -> String {
        format!("{}, {}", self.last_name, self.last_name)
    }

    pub fn absolute_url(&self) -> String {
        format!("/author/{}", self.author_id)
    }
}

/// The language a book is written in.
///
/// Names are unique under case-insensitive comparison.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Language {
    pub language_id: i64,
    pub name: String,
}

impl Language {
    pub fn display_label(&self) -> &str {
        &self.name
    }

    pub fn absolute_url(&self) -> String {
        format!("/language/{}", self.language_id)
    }
}

/// A catalog entry describing a title, independent of physical copies.
///
/// `author_id` is restrict-on-delete (the author cannot be removed while
/// books reference them); `language_id` is nullify-on-delete.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Book {
    pub book_id: i64,
    pub title: String,
    #[sqlx(default)]
    pub author_id: Option<i64>,
    #[sqlx(default)]
    pub language_id: Option<i64>,
    pub summary: String,
    /// Globally unique, compared case-sensitively.
    pub isbn: String,

    // Timestamps
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    pub fn display_label(&self) -> &str {
        &self.title
    }

    pub fn absolute_url(&self) -> String {
        format!("/book/{}", self.book_id)
    }
}

/// One physical, loanable copy of a Book.
///
/// Identified by a v4 UUID assigned at insert time, unique across the whole
/// catalog. `book_id` is restrict-on-delete.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BookInstance {
    /// Hyphenated UUID, e.g. "550e8400-e29b-41d4-a716-446655440000"
    pub instance_id: String,
    #[sqlx(default)]
    pub book_id: Option<i64>,
    pub imprint: String,
    #[sqlx(default)]
    pub due_back: Option<NaiveDate>,
    /// Single-character status code; see [`LoanStatus`].
    pub status: String,
}

impl BookInstance {
    /// Get status as enum.
    ///
    /// The CHECK constraint keeps stored codes inside the closed set, so an
    /// unrecognized code only appears if the row was written outside this
    /// crate; it reads back as Maintenance.
    pub fn status(&self) -> LoanStatus {
        LoanStatus::from_code(&self.status).unwrap_or(LoanStatus::Maintenance)
    }

    /// Display label: "{uuid} ({book title})".
    pub fn display_label(&self, book_title: &str) -> String {
        format!("{} ({})", self.instance_id, book_title)
    }
}

// ============================================================================
// NEW RECORD STRUCTS (for inserts)
// ============================================================================

/// New genre record for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGenre {
    pub name: String,
}

impl NewGenre {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn validate(&self) -> Result<()> {
        check_len("name", &self.name, GENRE_NAME_MAX)
    }
}

/// New author record for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuthor {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl NewAuthor {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            date_of_birth: None,
            date_of_death: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_len("first_name", &self.first_name, AUTHOR_NAME_MAX)?;
        check_len("last_name", &self.last_name, AUTHOR_NAME_MAX)
    }
}

/// New language record for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLanguage {
    pub name: String,
}

impl NewLanguage {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn validate(&self) -> Result<()> {
        check_len("name", &self.name, LANGUAGE_NAME_MAX)
    }
}

/// New book record for insertion
///
/// `genre_ids` are linked through the junction table in the same
/// transaction as the book row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author_id: Option<i64>,
    pub language_id: Option<i64>,
    pub summary: String,
    pub isbn: String,
    pub genre_ids: Vec<i64>,
}

impl NewBook {
    pub fn new(title: impl Into<String>, isbn: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author_id: None,
            language_id: None,
            summary: String::new(),
            isbn: isbn.into(),
            genre_ids: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_len("title", &self.title, BOOK_TITLE_MAX)?;
        check_len("summary", &self.summary, BOOK_SUMMARY_MAX)?;
        check_len("isbn", &self.isbn, BOOK_ISBN_MAX)
    }
}

/// New book instance record for insertion
///
/// The UUID primary key is generated at insert time, not here, so a record
/// can be reused to create several distinct copies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBookInstance {
    pub book_id: Option<i64>,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
}

impl NewBookInstance {
    pub fn new(imprint: impl Into<String>) -> Self {
        Self {
            book_id: None,
            imprint: imprint.into(),
            due_back: None,
            status: LoanStatus::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_len("imprint", &self.imprint, INSTANCE_IMPRINT_MAX)
    }
}
