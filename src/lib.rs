//! Shelfmark core - library catalog data layer
//!
//! Database-backed entities for a library's catalog: books, authors,
//! genres, languages, and the individual physical copies that get loaned
//! out. The crate fixes the schema, the uniqueness and on-delete rules, and
//! the repository functions; request handling and rendering belong to
//! whatever sits on top.

pub mod error;
pub mod storage;

pub use error::{CatalogError, Result};
pub use storage::{
    Author, Book, BookInstance, BookWithRelations, Database, Genre, Language, LoanStatus,
    NewAuthor, NewBook, NewBookInstance, NewGenre, NewLanguage,
};
