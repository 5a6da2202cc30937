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


//! Database migrations
//!
//! This module handles database schema creation and migrations.
//!
//! # Migration Strategy
//! Since sqlx's compile-time migration system requires a build-time database
//! connection, migrations run as plain SQL at startup and are tracked in the
//! `_migrations` table. Re-running is a no-op.

use crate::error::Result;
use sqlx::{Executor, SqlitePool};

/// Run all database migrations
///
/// This function creates the database schema and applies any pending migrations.
/// Migrations are tracked in the `_migrations` table.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    // Create migrations tracking table
    create_migrations_table(pool).await?;

    // Run all migrations in order
    run_migration(pool, 1, "initial_schema", create_initial_schema(pool)).await?;

    Ok(())
}

/// Create migrations tracking table
async fn create_migrations_table(pool: &SqlitePool) -> Result<()> {
    pool.execute(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .await?;

    Ok(())
}

/// Run a single migration if it hasn't been applied yet
async fn run_migration(
    pool: &SqlitePool,
    id: i32,
    name: &str,
    migration_fn: impl std::future::Future<Output = Result<()>>,
) -> Result<()> {
    // Check if migration has been applied
    let applied: Option<i32> = sqlx::query_scalar("SELECT id FROM _migrations WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    if applied.is_some() {
        // Migration already applied
        return Ok(());
    }

    // Run migration
    migration_fn.await?;

    // Record migration
    sqlx::query("INSERT INTO _migrations (id, name) VALUES (?, ?)")
        .bind(id)
        .bind(name)
        .execute(pool)
        .await?;

    Ok(())
}

/// Create initial database schema
///
/// Creates all catalog tables with their relationships, indexes, and
/// constraints. On-delete policies live in the schema so the database backs
/// up the pre-checks in the query layer.
async fn create_initial_schema(pool: &SqlitePool) -> Result<()> {
    pool.execute(
        r#"
-- ============================================================================
-- MAIN ENTITIES
-- ============================================================================

-- Genres table: descriptive category tags
CREATE TABLE IF NOT EXISTS Genres (
    genre_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL  -- <= 200 chars, enforced in the model layer
);

-- Functional unique constraint: genre names are unique ignoring case
CREATE UNIQUE INDEX IF NOT EXISTS idx_genres_name_ci ON Genres(LOWER(name));

-- Authors table
CREATE TABLE IF NOT EXISTS Authors (
    author_id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    date_of_birth TEXT,  -- ISO 8601 date (YYYY-MM-DD)
    date_of_death TEXT
);

-- Supports the default (last_name, first_name) listing order
CREATE INDEX IF NOT EXISTS idx_authors_name ON Authors(last_name, first_name);

-- Languages table
CREATE TABLE IF NOT EXISTS Languages (
    language_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL  -- <= 100 chars, enforced in the model layer
);

-- Functional unique constraint: language names are unique ignoring case
CREATE UNIQUE INDEX IF NOT EXISTS idx_languages_name_ci ON Languages(LOWER(name));

-- Books table: one row per title, independent of physical copies
CREATE TABLE IF NOT EXISTS Books (
    book_id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    author_id INTEGER REFERENCES Authors(author_id) ON DELETE RESTRICT,
    language_id INTEGER REFERENCES Languages(language_id) ON DELETE SET NULL,
    summary TEXT NOT NULL DEFAULT '',
    isbn TEXT NOT NULL UNIQUE,  -- exact, case-sensitive uniqueness

    -- Timestamps
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_books_title ON Books(title);
CREATE INDEX IF NOT EXISTS idx_books_author ON Books(author_id);
CREATE INDEX IF NOT EXISTS idx_books_language ON Books(language_id);

-- BookInstances table: one row per physical, loanable copy
CREATE TABLE IF NOT EXISTS BookInstances (
    instance_id TEXT PRIMARY KEY,  -- v4 UUID, hyphenated
    book_id INTEGER REFERENCES Books(book_id) ON DELETE RESTRICT,
    imprint TEXT NOT NULL,
    due_back TEXT,  -- ISO 8601 date; NULL while not on loan
    status TEXT NOT NULL DEFAULT 'm'
        CHECK (status IN ('m', 'o', 'a', 'r'))  -- Maintenance/On loan/Available/Reserved
);

-- Supports the default due_back ascending listing order (NULLs sort first)
CREATE INDEX IF NOT EXISTS idx_book_instances_due_back ON BookInstances(due_back);
CREATE INDEX IF NOT EXISTS idx_book_instances_book ON BookInstances(book_id);
CREATE INDEX IF NOT EXISTS idx_book_instances_status ON BookInstances(status);

-- ============================================================================
-- JUNCTION TABLES (Many-to-Many Relationships)
-- ============================================================================

-- BookGenres: Book <-> Genre junction
CREATE TABLE IF NOT EXISTS BookGenres (
    book_id INTEGER NOT NULL,
    genre_id INTEGER NOT NULL,
    FOREIGN KEY (book_id) REFERENCES Books(book_id) ON DELETE CASCADE,
    FOREIGN KEY (genre_id) REFERENCES Genres(genre_id) ON DELETE CASCADE,
    PRIMARY KEY (book_id, genre_id)
);

CREATE INDEX IF NOT EXISTS idx_book_genres_genre ON BookGenres(genre_id);

-- ============================================================================
-- TRIGGERS for Automatic Timestamp Updates
-- ============================================================================

-- Trigger to update updated_at timestamp when a book is modified
CREATE TRIGGER IF NOT EXISTS update_books_timestamp
AFTER UPDATE ON Books
FOR EACH ROW
BEGIN
    UPDATE Books SET updated_at = CURRENT_TIMESTAMP WHERE book_id = NEW.book_id;
END;
        "#,
    )
    .await?;

    Ok(())
}
