//! Catalog management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, CreateAuthor, UpdateAuthor},
        book::{Book, BookQuery, CreateBook, UpdateBook},
        genre::{Genre, GenreInput},
        PageQuery,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search books with filters
    pub async fn search_books(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let (books, total) = self.repository.books.search(query).await?;
        if total == 0 {
            return Err(AppError::NotFound("Books not found".to_string()));
        }
        Ok((books, total))
    }

    pub async fn get_book(&self, id: i64) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    pub async fn create_book(&self, book: CreateBook) -> AppResult<Book> {
        book.validate()?;
        let created = self.repository.books.create(&book).await?;
        tracing::info!(book_id = created.id, title = %created.title, "Book created");
        Ok(created)
    }

    pub async fn update_book(&self, id: i64, book: UpdateBook) -> AppResult<Book> {
        book.validate()?;
        self.repository.books.update(id, &book).await
    }

    /// Delete a book, refused while copies are out
    pub async fn delete_book(&self, id: i64) -> AppResult<Book> {
        let book = self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, "Book deleted");
        Ok(book)
    }

    pub async fn list_authors(&self, page: &PageQuery) -> AppResult<(Vec<Author>, i64)> {
        let (authors, total) = self.repository.authors.list(page).await?;
        if total == 0 {
            return Err(AppError::NotFound("Authors not found".to_string()));
        }
        Ok((authors, total))
    }

    pub async fn get_author(&self, id: i64) -> AppResult<Author> {
        self.repository.authors.get_by_id(id).await
    }

    pub async fn create_author(&self, author: CreateAuthor) -> AppResult<Author> {
        author.validate()?;
        self.repository.authors.create(&author).await
    }

    pub async fn update_author(&self, id: i64, author: UpdateAuthor) -> AppResult<Author> {
        author.validate()?;
        self.repository.authors.update(id, &author).await
    }

    pub async fn delete_author(&self, id: i64) -> AppResult<Author> {
        self.repository.authors.delete(id).await
    }

    pub async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        let genres = self.repository.genres.list().await?;
        if genres.is_empty() {
            return Err(AppError::NotFound("Genres not found".to_string()));
        }
        Ok(genres)
    }

    pub async fn get_genre(&self, id: i64) -> AppResult<Genre> {
        self.repository.genres.get_by_id(id).await
    }

    pub async fn create_genre(&self, genre: GenreInput) -> AppResult<Genre> {
        genre.validate()?;
        self.repository.genres.create(&genre.name).await
    }

    pub async fn update_genre(&self, id: i64, genre: GenreInput) -> AppResult<Genre> {
        genre.validate()?;
        self.repository.genres.update(id, &genre.name).await
    }

    pub async fn delete_genre(&self, id: i64) -> AppResult<Genre> {
        self.repository.genres.delete(id).await
    }
}
