use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::api::{Book, User};
use crate::records_repository::InMemoryRecordsRepository;

#[derive(Deserialize)]
struct BooksDocument {
    books: Vec<Book>,
}

#[derive(Deserialize)]
struct UsersDocument {
    users: Vec<User>,
}

fn read_document<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

impl InMemoryRecordsRepository {
    /// Loads the initial books and users from `{"books": [...]}` and `{"users": [...]}` documents.
    /// Nothing is ever written back to these files.
    pub fn from_files(books_path: &Path, users_path: &Path) -> anyhow::Result<Self> {
        let BooksDocument { books } = read_document(books_path)?;
        let UsersDocument { users } = read_document(users_path)?;
        tracing::info!(
            books = books.len(),
            users = users.len(),
            "Loaded initial library records"
        );
        Ok(Self::new(books, users))
    }
}
