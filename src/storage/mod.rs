// Shelfmark - Library Catalog Data Layer
// Copyright (C) 2026 Shelfmark contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Database storage and models
//!
//! This module handles all catalog persistence using SQLite via sqlx.
//!
//! # Database Schema
//! - Genres: category tags, case-insensitively unique names
//! - Authors: writers, listed by (last_name, first_name)
//! - Languages: case-insensitively unique names
//! - Books: titles with ISBN, optional author (restrict-on-delete) and
//!   language (nullify-on-delete)
//! - BookGenres: Book <-> Genre junction table
//! - BookInstances: physical copies with UUID keys and loan status, listed
//!   by due date
//!
//! # Usage Example
//! ```no_run
//! use shelfmark_core::storage::{queries, Database, NewBook, NewGenre};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Create database
//! let db = Database::new("./catalog.db").await?;
//!
//! // Insert a genre and a book carrying it
//! let fantasy = queries::insert_genre(db.pool(), &NewGenre::new("Fantasy")).await?;
//!
//! let mut book = NewBook::new("The Hobbit", "978-0-261-10221-7");
//! book.genre_ids = vec![fantasy];
//! let book_id = queries::insert_book(db.pool(), &book).await?;
//!
//! // Look it up by ISBN
//! let book = queries::find_book_by_isbn(db.pool(), "978-0-261-10221-7").await?;
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

// Re-export commonly used types
pub use database::Database;
pub use models::{
    Author, Book, BookInstance, Genre, Language, LoanStatus, NewAuthor, NewBook, NewBookInstance,
    NewGenre, NewLanguage,
};
pub use queries::BookWithRelations;
