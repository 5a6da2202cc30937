//! Integration tests for the catalog storage layer
//!
//! Exercises the full workflow against real on-disk and in-memory SQLite
//! databases: catalog setup, relationship queries, loan status changes,
//! default orderings, and persistence across close/reopen.

use chrono::NaiveDate;
use shelfmark_core::storage::queries;
use shelfmark_core::{
    Database, LoanStatus, NewAuthor, NewBook, NewBookInstance, NewGenre, NewLanguage,
};

#[tokio::test]
async fn test_full_catalog_workflow() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempfile::tempdir()?;
    let db_path = temp_dir.path().join("catalog.db");
    let db = Database::new(&db_path).await?;
    assert_eq!(db.path(), Some(db_path.as_path()));

    // Reference data
    let fantasy = queries::insert_genre(db.pool(), &NewGenre::new("Fantasy")).await?;
    let adventure = queries::insert_genre(db.pool(), &NewGenre::new("Adventure")).await?;
    let english = queries::insert_language(db.pool(), &NewLanguage::new("English")).await?;

    let mut tolkien = NewAuthor::new("John", "Tolkien");
    tolkien.date_of_birth = NaiveDate::from_ymd_opt(1892, 1, 3);
    tolkien.date_of_death = NaiveDate::from_ymd_opt(1973, 9, 2);
    let tolkien = queries::insert_author(db.pool(), &tolkien).await?;

    // A book carrying both genres
    let mut hobbit = NewBook::new("The Hobbit", "978-0-261-10221-7");
    hobbit.author_id = Some(tolkien);
    hobbit.language_id = Some(english);
    hobbit.summary = "Bilbo Baggins is swept into a quest.".to_string();
    hobbit.genre_ids = vec![fantasy, adventure];
    let hobbit = queries::insert_book(db.pool(), &hobbit).await?;

    // Two physical copies, one of them out on loan
    let mut copy = NewBookInstance::new("Allen & Unwin, 1937");
    copy.book_id = Some(hobbit);
    copy.status = LoanStatus::Available;
    queries::insert_book_instance(db.pool(), &copy).await?;

    copy.status = LoanStatus::OnLoan;
    copy.due_back = NaiveDate::from_ymd_opt(2026, 9, 15);
    let loaned = queries::insert_book_instance(db.pool(), &copy).await?;

    // Joined read model surfaces the relationships
    let rows = queries::list_books_with_relations(db.pool(), 50, 0).await?;
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.title, "The Hobbit");
    assert_eq!(row.author_name.as_deref(), Some("Tolkien, John"));
    assert_eq!(row.language_name.as_deref(), Some("English"));
    assert_eq!(row.instance_count, 2);
    let genres = row.genres_str.as_deref().unwrap_or("");
    assert!(genres.contains("Fantasy") && genres.contains("Adventure"));

    // The read model serializes cleanly for the presentation layer
    let json = serde_json::to_value(row)?;
    assert_eq!(json["isbn"], "978-0-261-10221-7");

    // Loaned copy comes back and becomes available
    queries::set_book_instance_status(db.pool(), &loaned, LoanStatus::Available).await?;
    let returned = queries::find_book_instance_by_id(db.pool(), &loaned)
        .await?
        .expect("Loaned copy missing");
    assert_eq!(returned.status(), LoanStatus::Available);

    // Data survives close and reopen
    db.close().await?;
    let db = Database::new(&db_path).await?;
    assert_eq!(queries::count_books(db.pool()).await?, 1);
    assert_eq!(queries::count_book_instances(db.pool()).await?, 2);
    let book = queries::find_book_by_isbn(db.pool(), "978-0-261-10221-7")
        .await?
        .expect("Book missing after reopen");
    assert_eq!(book.display_label(), "The Hobbit");
    assert_eq!(book.absolute_url(), format!("/book/{}", book.book_id));

    Ok(())
}

#[tokio::test]
async fn test_instances_listed_by_due_date_with_undated_first(
) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::new_in_memory().await?;

    let book = queries::insert_book(db.pool(), &NewBook::new("Dune", "978-0-441-17271-9")).await?;

    let mut copy = NewBookInstance::new("Chilton, 1965");
    copy.book_id = Some(book);

    copy.due_back = NaiveDate::from_ymd_opt(2026, 10, 1);
    let late = queries::insert_book_instance(db.pool(), &copy).await?;

    copy.due_back = NaiveDate::from_ymd_opt(2026, 9, 1);
    let soon = queries::insert_book_instance(db.pool(), &copy).await?;

    copy.due_back = None;
    let undated = queries::insert_book_instance(db.pool(), &copy).await?;

    let instances = queries::list_book_instances(db.pool()).await?;
    let ids: Vec<&str> = instances.iter().map(|i| i.instance_id.as_str()).collect();

    assert_eq!(ids, vec![undated.as_str(), soon.as_str(), late.as_str()]);

    Ok(())
}

#[tokio::test]
async fn test_status_filter_uses_stored_codes() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::new_in_memory().await?;

    let mut copy = NewBookInstance::new("Imprint");
    queries::insert_book_instance(db.pool(), &copy).await?;

    copy.status = LoanStatus::Reserved;
    let reserved = queries::insert_book_instance(db.pool(), &copy).await?;

    let found = queries::list_book_instances_by_status(db.pool(), LoanStatus::Reserved).await?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].instance_id, reserved);
    assert_eq!(found[0].status, "r");

    let maintenance =
        queries::list_book_instances_by_status(db.pool(), LoanStatus::Maintenance).await?;
    assert_eq!(maintenance.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_book_update_advances_timestamp() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::new_in_memory().await?;

    let book_id =
        queries::insert_book(db.pool(), &NewBook::new("First Title", "978-0-00-000010-0")).await?;
    let inserted = queries::find_book_by_id(db.pool(), book_id)
        .await?
        .expect("Book missing");

    // CURRENT_TIMESTAMP has one-second resolution
    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    let mut changed = inserted.clone();
    changed.title = "Second Title".to_string();
    queries::update_book(db.pool(), &changed).await?;

    let updated = queries::find_book_by_id(db.pool(), book_id)
        .await?
        .expect("Book missing");
    assert_eq!(updated.title, "Second Title");
    assert_eq!(updated.created_at, inserted.created_at);
    assert!(
        updated.updated_at > inserted.updated_at,
        "updated_at did not advance: {} -> {}",
        inserted.updated_at,
        updated.updated_at
    );

    Ok(())
}

#[tokio::test]
async fn test_duplicate_probes_survive_reopen() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempfile::tempdir()?;
    let db_path = temp_dir.path().join("catalog.db");

    {
        let db = Database::new(&db_path).await?;
        queries::insert_genre(db.pool(), &NewGenre::new("Science Fiction")).await?;
        db.close().await?;
    }

    let db = Database::new(&db_path).await?;
    let err = queries::insert_genre(db.pool(), &NewGenre::new("SCIENCE FICTION"))
        .await
        .expect_err("Duplicate accepted after reopen");
    assert_eq!(
        err.to_string(),
        "Genre already exists (case insensitive match)"
    );

    Ok(())
}
