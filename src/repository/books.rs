//! Books repository for database operations

use std::collections::HashSet;

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookQuery, CreateBook, UpdateBook},
        PageQuery,
    },
};

/// Book columns plus author and genre names, `b` aliases `books`
const BOOK_COLUMNS: &str = r#"
    b.id, b.title, b.description, b.publication_date, b.available_copies,
    ARRAY(
        SELECT g.name::TEXT FROM books_genres bg
        JOIN genres g ON g.id = bg.genre_id
        WHERE bg.book_id = b.id
        ORDER BY g.name
    ) AS genres,
    ARRAY(
        SELECT a.name::TEXT FROM books_authors ba
        JOIN authors a ON a.id = ba.author_id
        WHERE ba.book_id = b.id
        ORDER BY a.name
    ) AS authors
"#;

const BOOK_FILTER: &str = r#"
    WHERE ($1::TEXT IS NULL OR b.title ILIKE '%' || $1 || '%')
      AND ($2::TEXT IS NULL OR EXISTS (
            SELECT 1 FROM books_authors ba JOIN authors a ON a.id = ba.author_id
            WHERE ba.book_id = b.id AND a.name = $2))
      AND ($3::TEXT IS NULL OR EXISTS (
            SELECT 1 FROM books_genres bg JOIN genres g ON g.id = bg.genre_id
            WHERE bg.book_id = b.id AND g.name = $3))
"#;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Search books with pagination
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let page = PageQuery {
            page: query.page,
            per_page: query.per_page,
        };

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM books b {}", BOOK_FILTER))
            .bind(&query.title)
            .bind(&query.author)
            .bind(&query.genre)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {} FROM books b {} ORDER BY b.id LIMIT $4 OFFSET $5",
            BOOK_COLUMNS, BOOK_FILTER
        );
        let books = sqlx::query_as::<_, Book>(&sql)
            .bind(&query.title)
            .bind(&query.author)
            .bind(&query.genre)
            .bind(page.per_page())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((books, total))
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Book> {
        let mut conn = self.pool.acquire().await?;
        fetch_book(&mut conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }

    /// Create a book and link it to existing authors and genres
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let author_ids = resolve_names(&mut tx, "authors", &book.authors).await?;
        let genre_ids = resolve_names(&mut tx, "genres", &book.genres).await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO books (title, description, publication_date, available_copies)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&book.title)
        .bind(&book.description)
        .bind(book.publication_date)
        .bind(book.available_copies)
        .fetch_one(&mut *tx)
        .await?;

        link_authors(&mut tx, id, &author_ids).await?;
        link_genres(&mut tx, id, &genre_ids).await?;

        let created = fetch_book(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Book {} vanished after insert", id)))?;
        tx.commit().await?;

        Ok(created)
    }

    /// Update the fields present in the request
    pub async fn update(&self, id: i64, book: &UpdateBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE books
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                publication_date = COALESCE($4, publication_date),
                available_copies = COALESCE($5, available_copies)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&book.title)
        .bind(&book.description)
        .bind(book.publication_date)
        .bind(book.available_copies)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("Book not found".to_string()));
        }

        if let Some(genres) = book.genres.as_ref().filter(|g| !g.is_empty()) {
            let genre_ids = resolve_names(&mut tx, "genres", genres).await?;
            sqlx::query("DELETE FROM books_genres WHERE book_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            link_genres(&mut tx, id, &genre_ids).await?;
        }

        if let Some(authors) = book.authors.as_ref().filter(|a| !a.is_empty()) {
            let author_ids = resolve_names(&mut tx, "authors", authors).await?;
            sqlx::query("DELETE FROM books_authors WHERE book_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            link_authors(&mut tx, id, &author_ids).await?;
        }

        let book = fetch_book(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;
        tx.commit().await?;

        Ok(book)
    }

    /// Delete a book that nobody is currently holding
    ///
    /// Closed loans keep their `book_id` as history.
    pub async fn delete(&self, id: i64) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT id FROM books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;

        let open_loans: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM book_loans WHERE book_id = $1 AND actual_return_date IS NULL",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if open_loans > 0 {
            return Err(AppError::BadRequest(format!(
                "Book is currently borrowed ({} open loans)",
                open_loans
            )));
        }

        let book = fetch_book(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;

        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(book)
    }
}

async fn fetch_book(conn: &mut PgConnection, id: i64) -> AppResult<Option<Book>> {
    let sql = format!("SELECT {} FROM books b WHERE b.id = $1", BOOK_COLUMNS);
    let book = sqlx::query_as::<_, Book>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(book)
}

/// Map author or genre names to ids, every name must exist
async fn resolve_names(
    conn: &mut PgConnection,
    table: &'static str,
    names: &[String],
) -> AppResult<Vec<i64>> {
    let wanted: HashSet<&str> = names.iter().map(String::as_str).collect();
    if wanted.is_empty() {
        return Ok(Vec::new());
    }

    let rows: Vec<(i64, String)> = sqlx::query_as(&format!(
        "SELECT id, name::TEXT FROM {} WHERE name = ANY($1)",
        table
    ))
    .bind(names)
    .fetch_all(&mut *conn)
    .await?;

    matched_ids(table, wanted.len(), rows)
}

/// Exactly one row per requested name, an ambiguous name is rejected too
fn matched_ids(table: &str, wanted: usize, rows: Vec<(i64, String)>) -> AppResult<Vec<i64>> {
    if rows.len() != wanted {
        return Err(AppError::BadRequest(format!("Some {} do not exist", table)));
    }
    Ok(rows.into_iter().map(|(id, _)| id).collect())
}

async fn link_authors(conn: &mut PgConnection, book_id: i64, author_ids: &[i64]) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO books_authors (author_id, book_id) SELECT UNNEST($1::BIGINT[]), $2 ON CONFLICT DO NOTHING",
    )
    .bind(author_ids)
    .bind(book_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn link_genres(conn: &mut PgConnection, book_id: i64, genre_ids: &[i64]) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO books_genres (book_id, genre_id) SELECT $2, UNNEST($1::BIGINT[]) ON CONFLICT DO NOTHING",
    )
    .bind(genre_ids)
    .bind(book_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
