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


//! Database query functions
//!
//! Repository-style functions per entity type, async throughout, built on
//! sqlx. Uniqueness rules (case-insensitive genre/language names, exact
//! ISBNs) are probed before insert so callers get the descriptive
//! validation error; the unique indexes in the schema remain the hard
//! backstop. Restrict-on-delete is likewise checked explicitly so the
//! caller learns how many rows are in the way.

use crate::error::{CatalogError, Result};
use crate::storage::models::*;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

// ============================================================================
// GENRE QUERIES
// ============================================================================

/// Insert a new genre
///
/// Returns the genre_id of the inserted genre. Fails with
/// [`CatalogError::DuplicateGenre`] when a genre with the same name already
/// exists, ignoring case.
pub async fn insert_genre(pool: &SqlitePool, genre: &NewGenre) -> Result<i64> {
    genre.validate()?;

    if find_genre_by_name(pool, &genre.name).await?.is_some() {
        return Err(CatalogError::DuplicateGenre {
            name: genre.name.clone(),
        });
    }

    let result = sqlx::query("INSERT INTO Genres (name) VALUES (?)")
        .bind(&genre.name)
        .execute(pool)
        .await?;

    Ok(result.last_insert_rowid())
}

/// Find genre by ID
pub async fn find_genre_by_id(pool: &SqlitePool, genre_id: i64) -> Result<Option<Genre>> {
    let genre = sqlx::query_as::<_, Genre>("SELECT * FROM Genres WHERE genre_id = ?")
        .bind(genre_id)
        .fetch_optional(pool)
        .await?;

    Ok(genre)
}

/// Find genre by name, ignoring case
pub async fn find_genre_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Genre>> {
    let genre = sqlx::query_as::<_, Genre>("SELECT * FROM Genres WHERE LOWER(name) = LOWER(?)")
        .bind(name)
        .fetch_optional(pool)
        .await?;

    Ok(genre)
}

/// List all genres ordered by name
pub async fn list_genres(pool: &SqlitePool) -> Result<Vec<Genre>> {
    let genres = sqlx::query_as::<_, Genre>("SELECT * FROM Genres ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(genres)
}

/// Rename a genre
///
/// The new name must not collide with another genre, ignoring case; the
/// genre may keep its own name with different casing.
pub async fn rename_genre(pool: &SqlitePool, genre_id: i64, new_name: &str) -> Result<()> {
    check_len("name", new_name, GENRE_NAME_MAX)?;

    let clash: Option<i64> = sqlx::query_scalar(
        "SELECT genre_id FROM Genres WHERE LOWER(name) = LOWER(?) AND genre_id != ?",
    )
    .bind(new_name)
    .bind(genre_id)
    .fetch_optional(pool)
    .await?;

    if clash.is_some() {
        return Err(CatalogError::DuplicateGenre {
            name: new_name.to_string(),
        });
    }

    let result = sqlx::query("UPDATE Genres SET name = ? WHERE genre_id = ?")
        .bind(new_name)
        .bind(genre_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(CatalogError::NotFound {
            entity: "Genre",
            id: genre_id.to_string(),
        });
    }

    Ok(())
}

/// Delete a genre
///
/// Junction rows linking books to this genre are removed via CASCADE; the
/// books themselves are untouched.
pub async fn delete_genre(pool: &SqlitePool, genre_id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM Genres WHERE genre_id = ?")
        .bind(genre_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(CatalogError::NotFound {
            entity: "Genre",
            id: genre_id.to_string(),
        });
    }

    Ok(())
}

// ============================================================================
// AUTHOR QUERIES
// ============================================================================

/// Insert a new author
///
/// Returns the author_id of the inserted author.
pub async fn insert_author(pool: &SqlitePool, author: &NewAuthor) -> Result<i64> {
    author.validate()?;

    let result = sqlx::query(
        r#"
        INSERT INTO Authors (first_name, last_name, date_of_birth, date_of_death)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&author.first_name)
    .bind(&author.last_name)
    .bind(author.date_of_birth)
    .bind(author.date_of_death)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Find author by ID
pub async fn find_author_by_id(pool: &SqlitePool, author_id: i64) -> Result<Option<Author>> {
    let author = sqlx::query_as::<_, Author>("SELECT * FROM Authors WHERE author_id = ?")
        .bind(author_id)
        .fetch_optional(pool)
        .await?;

    Ok(author)
}

/// List all authors in the default (last_name, first_name) order
pub async fn list_authors(pool: &SqlitePool) -> Result<Vec<Author>> {
    let authors =
        sqlx::query_as::<_, Author>("SELECT * FROM Authors ORDER BY last_name, first_name")
            .fetch_all(pool)
            .await?;

    Ok(authors)
}

/// Update an existing author
pub async fn update_author(pool: &SqlitePool, author: &Author) -> Result<()> {
    check_len("first_name", &author.first_name, AUTHOR_NAME_MAX)?;
    check_len("last_name", &author.last_name, AUTHOR_NAME_MAX)?;

    let result = sqlx::query(
        r#"
        UPDATE Authors SET
            first_name = ?, last_name = ?, date_of_birth = ?, date_of_death = ?
        WHERE author_id = ?
        "#,
    )
    .bind(&author.first_name)
    .bind(&author.last_name)
    .bind(author.date_of_birth)
    .bind(author.date_of_death)
    .bind(author.author_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(CatalogError::NotFound {
            entity: "Author",
            id: author.author_id.to_string(),
        });
    }

    Ok(())
}

/// Delete an author (restrict-on-delete)
///
/// Fails with [`CatalogError::AuthorInUse`] while any book references the
/// author.
pub async fn delete_author(pool: &SqlitePool, author_id: i64) -> Result<()> {
    let book_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Books WHERE author_id = ?")
        .bind(author_id)
        .fetch_one(pool)
        .await?;

    if book_count > 0 {
        return Err(CatalogError::AuthorInUse {
            author_id,
            book_count,
        });
    }

    let result = sqlx::query("DELETE FROM Authors WHERE author_id = ?")
        .bind(author_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(CatalogError::NotFound {
            entity: "Author",
            id: author_id.to_string(),
        });
    }

    Ok(())
}

// ============================================================================
// LANGUAGE QUERIES
// ============================================================================

/// Insert a new language
///
/// Returns the language_id of the inserted language. Fails with
/// [`CatalogError::DuplicateLanguage`] when a language with the same name
/// already exists, ignoring case.
pub async fn insert_language(pool: &SqlitePool, language: &NewLanguage) -> Result<i64> {
    language.validate()?;

    if find_language_by_name(pool, &language.name).await?.is_some() {
        return Err(CatalogError::DuplicateLanguage {
            name: language.name.clone(),
        });
    }

    let result = sqlx::query("INSERT INTO Languages (name) VALUES (?)")
        .bind(&language.name)
        .execute(pool)
        .await?;

    Ok(result.last_insert_rowid())
}

/// Find language by ID
pub async fn find_language_by_id(pool: &SqlitePool, language_id: i64) -> Result<Option<Language>> {
    let language = sqlx::query_as::<_, Language>("SELECT * FROM Languages WHERE language_id = ?")
        .bind(language_id)
        .fetch_optional(pool)
        .await?;

    Ok(language)
}

/// Find language by name, ignoring case
pub async fn find_language_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Language>> {
    let language =
        sqlx::query_as::<_, Language>("SELECT * FROM Languages WHERE LOWER(name) = LOWER(?)")
            .bind(name)
            .fetch_optional(pool)
            .await?;

    Ok(language)
}

/// List all languages ordered by name
pub async fn list_languages(pool: &SqlitePool) -> Result<Vec<Language>> {
    let languages = sqlx::query_as::<_, Language>("SELECT * FROM Languages ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(languages)
}

/// Rename a language
pub async fn rename_language(pool: &SqlitePool, language_id: i64, new_name: &str) -> Result<()> {
    check_len("name", new_name, LANGUAGE_NAME_MAX)?;

    let clash: Option<i64> = sqlx::query_scalar(
        "SELECT language_id FROM Languages WHERE LOWER(name) = LOWER(?) AND language_id != ?",
    )
    .bind(new_name)
    .bind(language_id)
    .fetch_optional(pool)
    .await?;

    if clash.is_some() {
        return Err(CatalogError::DuplicateLanguage {
            name: new_name.to_string(),
        });
    }

    let result = sqlx::query("UPDATE Languages SET name = ? WHERE language_id = ?")
        .bind(new_name)
        .bind(language_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(CatalogError::NotFound {
            entity: "Language",
            id: language_id.to_string(),
        });
    }

    Ok(())
}

/// Delete a language (nullify-on-delete)
///
/// Books referencing this language keep existing with `language_id` set to
/// NULL by the schema's ON DELETE SET NULL policy.
pub async fn delete_language(pool: &SqlitePool, language_id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM Languages WHERE language_id = ?")
        .bind(language_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(CatalogError::NotFound {
            entity: "Language",
            id: language_id.to_string(),
        });
    }

    Ok(())
}

// ============================================================================
// BOOK QUERIES
// ============================================================================

/// Insert a new book together with its genre links
///
/// The book row and its junction rows are written in one transaction.
/// Returns the book_id of the inserted book. Fails with
/// [`CatalogError::DuplicateIsbn`] when the ISBN is already on record.
pub async fn insert_book(pool: &SqlitePool, book: &NewBook) -> Result<i64> {
    book.validate()?;

    if find_book_by_isbn(pool, &book.isbn).await?.is_some() {
        return Err(CatalogError::DuplicateIsbn {
            isbn: book.isbn.clone(),
        });
    }

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO Books (title, author_id, language_id, summary, isbn)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&book.title)
    .bind(book.author_id)
    .bind(book.language_id)
    .bind(&book.summary)
    .bind(&book.isbn)
    .execute(&mut *tx)
    .await?;

    let book_id = result.last_insert_rowid();

    for genre_id in &book.genre_ids {
        sqlx::query("INSERT OR IGNORE INTO BookGenres (book_id, genre_id) VALUES (?, ?)")
            .bind(book_id)
            .bind(genre_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(book_id)
}

/// Find book by ID
pub async fn find_book_by_id(pool: &SqlitePool, book_id: i64) -> Result<Option<Book>> {
    let book = sqlx::query_as::<_, Book>("SELECT * FROM Books WHERE book_id = ?")
        .bind(book_id)
        .fetch_optional(pool)
        .await?;

    Ok(book)
}

/// Find book by ISBN (exact, case-sensitive match)
pub async fn find_book_by_isbn(pool: &SqlitePool, isbn: &str) -> Result<Option<Book>> {
    let book = sqlx::query_as::<_, Book>("SELECT * FROM Books WHERE isbn = ?")
        .bind(isbn)
        .fetch_optional(pool)
        .await?;

    Ok(book)
}

/// List all books ordered by title
pub async fn list_books(pool: &SqlitePool) -> Result<Vec<Book>> {
    let books = sqlx::query_as::<_, Book>("SELECT * FROM Books ORDER BY title")
        .fetch_all(pool)
        .await?;

    Ok(books)
}

/// Count total books
pub async fn count_books(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Books")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Update an existing book
///
/// Genre links are managed separately via [`set_book_genres`]. The
/// `updated_at` timestamp advances through the schema trigger.
pub async fn update_book(pool: &SqlitePool, book: &Book) -> Result<()> {
    check_len("title", &book.title, BOOK_TITLE_MAX)?;
    check_len("summary", &book.summary, BOOK_SUMMARY_MAX)?;
    check_len("isbn", &book.isbn, BOOK_ISBN_MAX)?;

    let clash: Option<i64> =
        sqlx::query_scalar("SELECT book_id FROM Books WHERE isbn = ? AND book_id != ?")
            .bind(&book.isbn)
            .bind(book.book_id)
            .fetch_optional(pool)
            .await?;

    if clash.is_some() {
        return Err(CatalogError::DuplicateIsbn {
            isbn: book.isbn.clone(),
        });
    }

    let result = sqlx::query(
        r#"
        UPDATE Books SET
            title = ?, author_id = ?, language_id = ?, summary = ?, isbn = ?
        WHERE book_id = ?
        "#,
    )
    .bind(&book.title)
    .bind(book.author_id)
    .bind(book.language_id)
    .bind(&book.summary)
    .bind(&book.isbn)
    .bind(book.book_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(CatalogError::NotFound {
            entity: "Book",
            id: book.book_id.to_string(),
        });
    }

    Ok(())
}

/// Replace the genre set of a book
pub async fn set_book_genres(pool: &SqlitePool, book_id: i64, genre_ids: &[i64]) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM BookGenres WHERE book_id = ?")
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

    for genre_id in genre_ids {
        sqlx::query("INSERT OR IGNORE INTO BookGenres (book_id, genre_id) VALUES (?, ?)")
            .bind(book_id)
            .bind(genre_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(())
}

/// Genres linked to a book, ordered by name
pub async fn genres_for_book(pool: &SqlitePool, book_id: i64) -> Result<Vec<Genre>> {
    let genres = sqlx::query_as::<_, Genre>(
        r#"
        SELECT g.* FROM Genres g
        INNER JOIN BookGenres bg ON g.genre_id = bg.genre_id
        WHERE bg.book_id = ?
        ORDER BY g.name
        "#,
    )
    .bind(book_id)
    .fetch_all(pool)
    .await?;

    Ok(genres)
}

/// Books carrying a genre, ordered by title
pub async fn list_books_by_genre(pool: &SqlitePool, genre_id: i64) -> Result<Vec<Book>> {
    let books = sqlx::query_as::<_, Book>(
        r#"
        SELECT b.* FROM Books b
        INNER JOIN BookGenres bg ON b.book_id = bg.book_id
        WHERE bg.genre_id = ?
        ORDER BY b.title
        "#,
    )
    .bind(genre_id)
    .fetch_all(pool)
    .await?;

    Ok(books)
}

/// Book data joined with author, language, genres, and copy count
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BookWithRelations {
    pub book_id: i64,
    pub title: String,
    pub isbn: String,
    pub summary: String,

    // Related data
    pub author_name: Option<String>,
    pub language_name: Option<String>,
    pub genres_str: Option<String>, // comma-separated genre names
    pub instance_count: i64,
}

/// List books with all related data (author, language, genres, copies)
pub async fn list_books_with_relations(
    pool: &SqlitePool,
    limit: i64,
    offset: i64,
) -> Result<Vec<BookWithRelations>> {
    let books = sqlx::query_as::<_, BookWithRelations>(
        r#"
        WITH book_genres AS (
            SELECT
                bg.book_id,
                GROUP_CONCAT(g.name, ', ') as genres
            FROM BookGenres bg
            JOIN Genres g ON bg.genre_id = g.genre_id
            GROUP BY bg.book_id
        ),
        copy_counts AS (
            SELECT book_id, COUNT(*) as copies
            FROM BookInstances
            GROUP BY book_id
        )
        SELECT
            b.book_id,
            b.title,
            b.isbn,
            b.summary,
            a.last_name || ', ' || a.first_name as author_name,
            l.name as language_name,
            bg.genres as genres_str,
            COALESCE(cc.copies, 0) as instance_count
        FROM Books b
        LEFT JOIN Authors a ON b.author_id = a.author_id
        LEFT JOIN Languages l ON b.language_id = l.language_id
        LEFT JOIN book_genres bg ON b.book_id = bg.book_id
        LEFT JOIN copy_counts cc ON b.book_id = cc.book_id
        ORDER BY b.title
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(books)
}

/// Delete a book (restrict-on-delete)
///
/// Fails with [`CatalogError::BookInUse`] while any physical copy
/// references the book. Genre junction rows go via CASCADE.
pub async fn delete_book(pool: &SqlitePool, book_id: i64) -> Result<()> {
    let instance_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM BookInstances WHERE book_id = ?")
            .bind(book_id)
            .fetch_one(pool)
            .await?;

    if instance_count > 0 {
        return Err(CatalogError::BookInUse {
            book_id,
            instance_count,
        });
    }

    let result = sqlx::query("DELETE FROM Books WHERE book_id = ?")
        .bind(book_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(CatalogError::NotFound {
            entity: "Book",
            id: book_id.to_string(),
        });
    }

    Ok(())
}

// ============================================================================
// BOOK INSTANCE QUERIES
// ============================================================================

/// Insert a new book instance
///
/// A v4 UUID is generated here and returned; the caller never supplies the
/// identifier.
pub async fn insert_book_instance(
    pool: &SqlitePool,
    instance: &NewBookInstance,
) -> Result<String> {
    instance.validate()?;

    let instance_id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO BookInstances (instance_id, book_id, imprint, due_back, status)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&instance_id)
    .bind(instance.book_id)
    .bind(&instance.imprint)
    .bind(instance.due_back)
    .bind(instance.status.as_code())
    .execute(pool)
    .await?;

    Ok(instance_id)
}

/// Find book instance by its UUID
pub async fn find_book_instance_by_id(
    pool: &SqlitePool,
    instance_id: &str,
) -> Result<Option<BookInstance>> {
    let instance =
        sqlx::query_as::<_, BookInstance>("SELECT * FROM BookInstances WHERE instance_id = ?")
            .bind(instance_id)
            .fetch_optional(pool)
            .await?;

    Ok(instance)
}

/// List all book instances in the default due_back ascending order
///
/// SQLite sorts NULLs first in ascending order, so copies without a due
/// date lead the listing.
pub async fn list_book_instances(pool: &SqlitePool) -> Result<Vec<BookInstance>> {
    let instances =
        sqlx::query_as::<_, BookInstance>("SELECT * FROM BookInstances ORDER BY due_back")
            .fetch_all(pool)
            .await?;

    Ok(instances)
}

/// List book instances with a given status, due_back ascending
pub async fn list_book_instances_by_status(
    pool: &SqlitePool,
    status: LoanStatus,
) -> Result<Vec<BookInstance>> {
    let instances = sqlx::query_as::<_, BookInstance>(
        "SELECT * FROM BookInstances WHERE status = ? ORDER BY due_back",
    )
    .bind(status.as_code())
    .fetch_all(pool)
    .await?;

    Ok(instances)
}

/// Count total book instances
pub async fn count_book_instances(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM BookInstances")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Update an existing book instance
///
/// The stored status code is re-parsed so a struct carrying an out-of-set
/// code is rejected before it reaches the database.
pub async fn update_book_instance(pool: &SqlitePool, instance: &BookInstance) -> Result<()> {
    check_len("imprint", &instance.imprint, INSTANCE_IMPRINT_MAX)?;
    let status = LoanStatus::from_code(&instance.status)?;

    let result = sqlx::query(
        r#"
        UPDATE BookInstances SET
            book_id = ?, imprint = ?, due_back = ?, status = ?
        WHERE instance_id = ?
        "#,
    )
    .bind(instance.book_id)
    .bind(&instance.imprint)
    .bind(instance.due_back)
    .bind(status.as_code())
    .bind(&instance.instance_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(CatalogError::NotFound {
            entity: "BookInstance",
            id: instance.instance_id.clone(),
        });
    }

    Ok(())
}

/// Set the status of a single copy
///
/// No transition rules apply; any status may follow any other.
pub async fn set_book_instance_status(
    pool: &SqlitePool,
    instance_id: &str,
    status: LoanStatus,
) -> Result<()> {
    let result = sqlx::query("UPDATE BookInstances SET status = ? WHERE instance_id = ?")
        .bind(status.as_code())
        .bind(instance_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(CatalogError::NotFound {
            entity: "BookInstance",
            id: instance_id.to_string(),
        });
    }

    Ok(())
}

/// Delete a book instance
pub async fn delete_book_instance(pool: &SqlitePool, instance_id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM BookInstances WHERE instance_id = ?")
        .bind(instance_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(CatalogError::NotFound {
            entity: "BookInstance",
            id: instance_id.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::Database;

    #[tokio::test]
    async fn test_genre_names_unique_ignoring_case() {
        let db = Database::new_in_memory().await.expect("Failed to create database");

        insert_genre(db.pool(), &NewGenre::new("Fantasy"))
            .await
            .expect("Failed to insert genre");

        let err = insert_genre(db.pool(), &NewGenre::new("fantasy"))
            .await
            .expect_err("Duplicate genre accepted");

        assert_eq!(err.to_string(), "Genre already exists (case insensitive match)");
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_language_names_unique_ignoring_case() {
        let db = Database::new_in_memory().await.expect("Failed to create database");

        insert_language(db.pool(), &NewLanguage::new("English"))
            .await
            .expect("Failed to insert language");

        let err = insert_language(db.pool(), &NewLanguage::new("ENGLISH"))
            .await
            .expect_err("Duplicate language accepted");

        assert_eq!(
            err.to_string(),
            "Language already exists (case insensitive match)"
        );
    }

    #[tokio::test]
    async fn test_rename_genre_keeps_own_name_but_rejects_clash() {
        let db = Database::new_in_memory().await.expect("Failed to create database");

        let fantasy = insert_genre(db.pool(), &NewGenre::new("fantasy"))
            .await
            .expect("insert");
        insert_genre(db.pool(), &NewGenre::new("Horror"))
            .await
            .expect("insert");

        // Re-casing the genre's own name is allowed
        rename_genre(db.pool(), fantasy, "Fantasy")
            .await
            .expect("Re-casing own name rejected");

        // Colliding with another genre is not
        let err = rename_genre(db.pool(), fantasy, "horror")
            .await
            .expect_err("Clashing rename accepted");
        assert!(matches!(err, CatalogError::DuplicateGenre { .. }));
    }

    #[tokio::test]
    async fn test_isbn_unique_exact() {
        let db = Database::new_in_memory().await.expect("Failed to create database");

        let mut book = NewBook::new("Dive Into Design Patterns", "978-0-13-468599-1");
        book.summary = "A patterns catalog.".to_string();

        insert_book(db.pool(), &book).await.expect("Failed to insert book");

        let second = NewBook::new("Another Title Entirely", "978-0-13-468599-1");
        let err = insert_book(db.pool(), &second)
            .await
            .expect_err("Duplicate ISBN accepted");

        assert!(matches!(err, CatalogError::DuplicateIsbn { ref isbn } if isbn == "978-0-13-468599-1"));
    }

    #[tokio::test]
    async fn test_delete_author_restricted_while_referenced() {
        let db = Database::new_in_memory().await.expect("Failed to create database");

        let author_id = insert_author(db.pool(), &NewAuthor::new("John", "Tolkien"))
            .await
            .expect("Failed to insert author");

        let mut book = NewBook::new("The Hobbit", "978-0-00-000001-1");
        book.author_id = Some(author_id);
        let book_id = insert_book(db.pool(), &book).await.expect("Failed to insert book");

        let err = delete_author(db.pool(), author_id)
            .await
            .expect_err("Referenced author deleted");
        assert!(matches!(
            err,
            CatalogError::AuthorInUse { author_id: id, book_count: 1 } if id == author_id
        ));

        // Once the book is gone the author can go too
        delete_book(db.pool(), book_id).await.expect("Failed to delete book");
        delete_author(db.pool(), author_id)
            .await
            .expect("Unreferenced author not deletable");
    }

    #[tokio::test]
    async fn test_delete_language_nullifies_book_reference() {
        let db = Database::new_in_memory().await.expect("Failed to create database");

        let language_id = insert_language(db.pool(), &NewLanguage::new("Norwegian"))
            .await
            .expect("Failed to insert language");

        let mut book = NewBook::new("Sult", "978-0-00-000002-2");
        book.language_id = Some(language_id);
        let book_id = insert_book(db.pool(), &book).await.expect("Failed to insert book");

        delete_language(db.pool(), language_id)
            .await
            .expect("Failed to delete language");

        let book = find_book_by_id(db.pool(), book_id)
            .await
            .expect("Failed to find book")
            .expect("Book vanished with its language");
        assert_eq!(book.language_id, None);
    }

    #[tokio::test]
    async fn test_delete_book_restricted_while_copies_exist() {
        let db = Database::new_in_memory().await.expect("Failed to create database");

        let book_id = insert_book(db.pool(), &NewBook::new("Dune", "978-0-00-000003-3"))
            .await
            .expect("Failed to insert book");

        let mut instance = NewBookInstance::new("Chilton, 1965");
        instance.book_id = Some(book_id);
        let instance_id = insert_book_instance(db.pool(), &instance)
            .await
            .expect("Failed to insert instance");

        let err = delete_book(db.pool(), book_id)
            .await
            .expect_err("Book with copies deleted");
        assert!(matches!(err, CatalogError::BookInUse { instance_count: 1, .. }));

        delete_book_instance(db.pool(), &instance_id)
            .await
            .expect("Failed to delete instance");
        delete_book(db.pool(), book_id)
            .await
            .expect("Copy-free book not deletable");
    }

    #[tokio::test]
    async fn test_instance_gets_generated_uuid_and_default_status() {
        let db = Database::new_in_memory().await.expect("Failed to create database");

        let first = insert_book_instance(db.pool(), &NewBookInstance::new("Imprint A"))
            .await
            .expect("Failed to insert instance");
        let second = insert_book_instance(db.pool(), &NewBookInstance::new("Imprint A"))
            .await
            .expect("Failed to insert instance");

        assert_ne!(first, second, "UUIDs collided");
        assert!(Uuid::parse_str(&first).is_ok(), "Not a valid UUID: {first}");

        let instance = find_book_instance_by_id(db.pool(), &first)
            .await
            .expect("Failed to find instance")
            .expect("Instance missing");
        assert_eq!(instance.status(), LoanStatus::Maintenance);
    }

    #[tokio::test]
    async fn test_update_instance_rejects_out_of_set_status() {
        let db = Database::new_in_memory().await.expect("Failed to create database");

        let id = insert_book_instance(db.pool(), &NewBookInstance::new("Imprint"))
            .await
            .expect("Failed to insert instance");

        let mut instance = find_book_instance_by_id(db.pool(), &id)
            .await
            .expect("Failed to find instance")
            .expect("Instance missing");
        instance.status = "x".to_string();

        let err = update_book_instance(db.pool(), &instance)
            .await
            .expect_err("Bad status accepted");
        assert!(matches!(err, CatalogError::InvalidLoanStatus(ref s) if s == "x"));
    }

    #[tokio::test]
    async fn test_authors_listed_last_name_then_first_name() {
        let db = Database::new_in_memory().await.expect("Failed to create database");

        insert_author(db.pool(), &NewAuthor::new("Ursula", "Le Guin"))
            .await
            .expect("insert");
        insert_author(db.pool(), &NewAuthor::new("Christopher", "Tolkien"))
            .await
            .expect("insert");
        insert_author(db.pool(), &NewAuthor::new("John", "Tolkien"))
            .await
            .expect("insert");

        let authors = list_authors(db.pool()).await.expect("Failed to list authors");
        let names: Vec<(String, String)> = authors
            .into_iter()
            .map(|a| (a.last_name, a.first_name))
            .collect();

        assert_eq!(
            names,
            vec![
                ("Le Guin".to_string(), "Ursula".to_string()),
                ("Tolkien".to_string(), "Christopher".to_string()),
                ("Tolkien".to_string(), "John".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_genre_links_written_and_cascaded() {
        let db = Database::new_in_memory().await.expect("Failed to create database");

        let fantasy = insert_genre(db.pool(), &NewGenre::new("Fantasy"))
            .await
            .expect("insert");
        let adventure = insert_genre(db.pool(), &NewGenre::new("Adventure"))
            .await
            .expect("insert");

        let mut book = NewBook::new("The Hobbit", "978-0-00-000004-4");
        book.genre_ids = vec![fantasy, adventure];
        let book_id = insert_book(db.pool(), &book).await.expect("insert book");

        let genres = genres_for_book(db.pool(), book_id).await.expect("genres");
        let names: Vec<&str> = genres.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Adventure", "Fantasy"]);

        // Dropping a genre removes the link but leaves the book alone
        delete_genre(db.pool(), adventure).await.expect("delete genre");
        let genres = genres_for_book(db.pool(), book_id).await.expect("genres");
        assert_eq!(genres.len(), 1);
        assert!(find_book_by_id(db.pool(), book_id).await.expect("find").is_some());
    }
}
