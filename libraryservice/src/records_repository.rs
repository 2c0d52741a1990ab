pub use in_memory_records_repository::InMemoryRecordsRepository;
pub use record_sequence::{Record, RecordSequence};

use serde_json::{Map, Value};

use crate::api::{Book, BookId, User, UserId};

mod in_memory_records_repository;
mod record_sequence;
mod seed;

#[derive(thiserror::Error, Debug)]
pub enum RecordsRepositoryError {
    #[error("Book not found for id: {0}")]
    BookNotFound(BookId),

    #[error("User not found for id: {0}")]
    UserNotFound(UserId),

    #[error("Book already exists with id: {0}")]
    BookAlreadyExists(BookId),

    #[error("User already exists with id: {0}")]
    UserAlreadyExists(UserId),

    #[error("Invalid update data: {0}")]
    InvalidUpdate(#[from] serde_json::Error),

    #[error("Book not found for id: {book_id} (issued to user {user_id})")]
    DanglingIssuedBook { user_id: UserId, book_id: BookId },
}

#[async_trait::async_trait]
pub trait RecordsRepository: Send + Sync {
    /// Lists all books in insertion order
    async fn list_books(&self) -> Result<Vec<Book>, RecordsRepositoryError>;
    /// Retrieves the first book with the given id
    async fn get_book(&self, book_id: &str) -> Result<Book, RecordsRepositoryError>;
    /// Appends a book, fails if a book with the same id already exists
    async fn add_book(&self, book: Book) -> Result<Book, RecordsRepositoryError>;
    /// Shallow merges `patch` over the matching book, returns the whole books sequence
    async fn update_book(
        &self,
        book_id: &str,
        patch: Map<String, Value>,
    ) -> Result<Vec<Book>, RecordsRepositoryError>;
    /// Removes the first matching book, returns the remaining books
    async fn delete_book(&self, book_id: &str) -> Result<Vec<Book>, RecordsRepositoryError>;
    /// Lists books referenced by users' `issuedBook`, annotated with who holds them.
    /// The annotation is written back onto the stored books.
    async fn list_issued_books(&self) -> Result<Vec<Book>, RecordsRepositoryError>;

    async fn list_users(&self) -> Result<Vec<User>, RecordsRepositoryError>;
    async fn get_user(&self, user_id: &str) -> Result<User, RecordsRepositoryError>;
    async fn add_user(&self, user: User) -> Result<User, RecordsRepositoryError>;
    async fn update_user(
        &self,
        user_id: &str,
        patch: Map<String, Value>,
    ) -> Result<Vec<User>, RecordsRepositoryError>;
    async fn delete_user(&self, user_id: &str) -> Result<Vec<User>, RecordsRepositoryError>;
}
