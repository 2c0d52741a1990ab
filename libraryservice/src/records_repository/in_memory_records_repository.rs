use serde_json::{Map, Value};

use crate::api::{Book, User};
use crate::records_repository::{RecordSequence, RecordsRepository, RecordsRepositoryError};

/// Record store living for the process lifetime.
/// Every operation keeps the lock for its whole find+mutate sequence; books are always locked before users.
#[derive(Default)]
pub struct InMemoryRecordsRepository {
    books: parking_lot::RwLock<RecordSequence<Book>>,
    users: parking_lot::RwLock<RecordSequence<User>>,
}

impl InMemoryRecordsRepository {
    pub fn new(books: Vec<Book>, users: Vec<User>) -> Self {
        Self {
            books: parking_lot::RwLock::new(RecordSequence::new(books)),
            users: parking_lot::RwLock::new(RecordSequence::new(users)),
        }
    }
}

#[async_trait::async_trait]
impl RecordsRepository for InMemoryRecordsRepository {
    async fn list_books(&self) -> Result<Vec<Book>, RecordsRepositoryError> {
        Ok(self.books.read().to_vec())
    }

    async fn get_book(&self, book_id: &str) -> Result<Book, RecordsRepositoryError> {
        self.books
            .read()
            .find(book_id)
            .cloned()
            .ok_or_else(|| RecordsRepositoryError::BookNotFound(book_id.to_string()))
    }

    async fn add_book(&self, book: Book) -> Result<Book, RecordsRepositoryError> {
        let mut locked_books = self.books.write();
        if locked_books.insert(book.clone()) {
            Ok(book)
        } else {
            Err(RecordsRepositoryError::BookAlreadyExists(book.id))
        }
    }

    async fn update_book(
        &self,
        book_id: &str,
        patch: Map<String, Value>,
    ) -> Result<Vec<Book>, RecordsRepositoryError> {
        let mut locked_books = self.books.write();
        let index = locked_books
            .position(book_id)
            .ok_or_else(|| RecordsRepositoryError::BookNotFound(book_id.to_string()))?;
        locked_books.merge_at(index, patch)?;
        Ok(locked_books.to_vec())
    }

    async fn delete_book(&self, book_id: &str) -> Result<Vec<Book>, RecordsRepositoryError> {
        let mut locked_books = self.books.write();
        let index = locked_books
            .position(book_id)
            .ok_or_else(|| RecordsRepositoryError::BookNotFound(book_id.to_string()))?;
        locked_books.remove_at(index);
        Ok(locked_books.to_vec())
    }

    async fn list_issued_books(&self) -> Result<Vec<Book>, RecordsRepositoryError> {
        let mut locked_books = self.books.write();
        let locked_users = self.users.read();

        let holders: Vec<&User> = locked_users
            .as_slice()
            .iter()
            .filter(|user| user.issued_book_id().is_some())
            .collect();

        // Nothing is annotated unless every reference resolves
        if let Some(user) = holders
            .iter()
            .find(|user| locked_books.find(user.issued_book_id().unwrap_or_default()).is_none())
        {
            let book_id = user.issued_book_id().unwrap_or_default().to_string();
            tracing::error!(user_id = %user.id, %book_id, "User references a book that does not exist");
            return Err(RecordsRepositoryError::DanglingIssuedBook {
                user_id: user.id.clone(),
                book_id,
            });
        }

        let mut issued_books = Vec::with_capacity(holders.len());
        for user in holders {
            let Some(book) = locked_books.find_mut(user.issued_book_id().unwrap_or_default())
            else {
                continue;
            };
            book.issued_by = Some(user.name.clone());
            book.issued_date = user.issued_date.clone();
            book.return_date = user.return_date.clone();
            issued_books.push(book.clone());
        }
        Ok(issued_books)
    }

    async fn list_users(&self) -> Result<Vec<User>, RecordsRepositoryError> {
        Ok(self.users.read().to_vec())
    }

    async fn get_user(&self, user_id: &str) -> Result<User, RecordsRepositoryError> {
        self.users
            .read()
            .find(user_id)
            .cloned()
            .ok_or_else(|| RecordsRepositoryError::UserNotFound(user_id.to_string()))
    }

    async fn add_user(&self, user: User) -> Result<User, RecordsRepositoryError> {
        let mut locked_users = self.users.write();
        if locked_users.insert(user.clone()) {
            Ok(user)
        } else {
            Err(RecordsRepositoryError::UserAlreadyExists(user.id))
        }
    }

    async fn update_user(
        &self,
        user_id: &str,
        patch: Map<String, Value>,
    ) -> Result<Vec<User>, RecordsRepositoryError> {
        let mut locked_users = self.users.write();
        let index = locked_users
            .position(user_id)
            .ok_or_else(|| RecordsRepositoryError::UserNotFound(user_id.to_string()))?;
        locked_users.merge_at(index, patch)?;
        Ok(locked_users.to_vec())
    }

    async fn delete_user(&self, user_id: &str) -> Result<Vec<User>, RecordsRepositoryError> {
        let mut locked_users = self.users.write();
        let index = locked_users
            .position(user_id)
            .ok_or_else(|| RecordsRepositoryError::UserNotFound(user_id.to_string()))?;
        locked_users.remove_at(index);
        Ok(locked_users.to_vec())
    }
}

#[cfg(test)]
mod in_memory_records_repository_tests {
    use serde_json::json;

    use crate::api::{Book, User};
    use crate::records_repository::{
        InMemoryRecordsRepository, RecordsRepository, RecordsRepositoryError,
    };

    fn book(id: &str, title: &str) -> Book {
        serde_json::from_value(json!({"id": id, "title": title, "author": "Author", "year": "2020"}))
            .unwrap()
    }

    fn user(id: &str, name: &str) -> User {
        serde_json::from_value(json!({
            "id": id,
            "name": name,
            "email": format!("{name}@example.com"),
            "subscriptionType": "Basic",
            "subscriptionDate": "01/01/2024"
        }))
        .unwrap()
    }

    fn patch(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("patch must be an object"),
        }
    }

    #[tokio::test]
    /// Tests if add_book and get_book work correctly
    /// 1. Gets not existing book - expects not found
    /// 2. Adds book and gets it back
    /// 3. Adds book with the same id - expects conflict
    async fn test_add_book_and_get_it() {
        let repo = InMemoryRecordsRepository::default();

        let book_not_found = repo.get_book("1").await;
        assert!(matches!(
            book_not_found,
            Err(RecordsRepositoryError::BookNotFound(..))
        ));

        let created = repo.add_book(book("1", "A")).await.expect("Failed to add book");
        assert_eq!(created, book("1", "A"));
        assert_eq!(repo.get_book("1").await.unwrap(), book("1", "A"));

        let duplicate = repo.add_book(book("1", "Other")).await;
        assert!(matches!(
            duplicate,
            Err(RecordsRepositoryError::BookAlreadyExists(id)) if id == "1"
        ));
        assert_eq!(repo.list_books().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_book_merges_and_returns_whole_sequence() {
        let repo = InMemoryRecordsRepository::new(vec![book("1", "A"), book("2", "B")], vec![]);

        let not_found = repo.update_book("3", patch(json!({}))).await;
        assert!(matches!(
            not_found,
            Err(RecordsRepositoryError::BookNotFound(..))
        ));

        let unchanged = repo.update_book("1", patch(json!({}))).await.unwrap();
        assert_eq!(unchanged, vec![book("1", "A"), book("2", "B")]);

        let updated = repo
            .update_book("2", patch(json!({"title": "B2"})))
            .await
            .unwrap();
        assert_eq!(updated, vec![book("1", "A"), book("2", "B2")]);
        assert_eq!(repo.get_book("2").await.unwrap().author, "Author");

        let invalid = repo.update_book("2", patch(json!({"year": 1999}))).await;
        assert!(matches!(
            invalid,
            Err(RecordsRepositoryError::InvalidUpdate(..))
        ));
        assert_eq!(repo.get_book("2").await.unwrap().year, "2020");
    }

    #[tokio::test]
    async fn test_delete_book_removes_one_record() {
        let repo = InMemoryRecordsRepository::new(
            vec![book("1", "A"), book("2", "B"), book("3", "C")],
            vec![],
        );

        let remaining = repo.delete_book("2").await.unwrap();
        assert_eq!(remaining, vec![book("1", "A"), book("3", "C")]);
        assert!(matches!(
            repo.get_book("2").await,
            Err(RecordsRepositoryError::BookNotFound(..))
        ));
        assert!(matches!(
            repo.delete_book("2").await,
            Err(RecordsRepositoryError::BookNotFound(..))
        ));
    }

    #[tokio::test]
    /// Update is allowed to reuse a taken id, delete then removes only the first of the two
    async fn test_delete_with_duplicate_ids_removes_first_match_only() {
        let repo = InMemoryRecordsRepository::new(
            vec![],
            vec![user("1", "Jane"), user("2", "John"), user("3", "Joe")],
        );

        let updated = repo
            .update_user("2", patch(json!({"id": "1"})))
            .await
            .unwrap();
        let ids: Vec<_> = updated.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "1", "3"]);

        let remaining = repo.delete_user("1").await.unwrap();
        assert_eq!(remaining.len(), 2);
        assert_eq!(remaining[0].id, "1");
        assert_eq!(remaining[0].name, "John");
        assert_eq!(remaining[1].id, "3");
        assert_eq!(repo.get_user("1").await.unwrap().name, "John");
    }

    #[tokio::test]
    /// Two users holding the same book get one entry each, annotated with their own details.
    /// The stored book keeps the last holder.
    async fn test_list_issued_books_shared_by_two_users() {
        let mut jane = user("10", "Jane");
        jane.issued_book = Some("1".to_string());
        jane.return_date = Some("01/16/2024".to_string());
        let mut john = user("11", "John");
        john.issued_book = Some("1".to_string());
        john.return_date = Some("02/16/2024".to_string());

        let repo = InMemoryRecordsRepository::new(vec![book("1", "A")], vec![jane, john]);

        let issued = repo.list_issued_books().await.unwrap();
        assert_eq!(issued.len(), 2);
        assert_eq!(issued[0].issued_by.as_deref(), Some("Jane"));
        assert_eq!(issued[0].return_date.as_deref(), Some("01/16/2024"));
        assert_eq!(issued[1].issued_by.as_deref(), Some("John"));
        assert_eq!(issued[1].return_date.as_deref(), Some("02/16/2024"));
        assert_eq!(
            repo.get_book("1").await.unwrap().issued_by.as_deref(),
            Some("John")
        );
    }

    #[tokio::test]
    /// Only users with a non empty issuedBook contribute, books get annotated in place
    async fn test_list_issued_books() {
        let mut holder = user("10", "Jane");
        holder.issued_book = Some("2".to_string());
        holder.issued_date = Some("01/02/2024".to_string());
        holder.return_date = Some("01/16/2024".to_string());
        let mut empty_reference = user("11", "John");
        empty_reference.issued_book = Some(String::new());

        let repo = InMemoryRecordsRepository::new(
            vec![book("1", "A"), book("2", "B")],
            vec![holder, empty_reference, user("12", "Joe")],
        );

        let issued = repo.list_issued_books().await.unwrap();
        assert_eq!(issued.len(), 1);
        assert_eq!(issued[0].id, "2");
        assert_eq!(issued[0].issued_by.as_deref(), Some("Jane"));
        assert_eq!(issued[0].issued_date.as_deref(), Some("01/02/2024"));
        assert_eq!(issued[0].return_date.as_deref(), Some("01/16/2024"));

        let stored = repo.get_book("2").await.unwrap();
        assert_eq!(stored, issued[0]);
        assert_eq!(repo.list_issued_books().await.unwrap(), issued);
    }

    #[tokio::test]
    async fn test_list_issued_books_without_holders_is_empty() {
        let repo = InMemoryRecordsRepository::new(vec![book("1", "A")], vec![user("1", "Jane")]);
        assert!(repo.list_issued_books().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_issued_books_fails_on_dangling_reference() {
        let mut holder = user("10", "Jane");
        holder.issued_book = Some("1".to_string());
        let mut dangling = user("11", "John");
        dangling.issued_book = Some("404".to_string());

        let repo = InMemoryRecordsRepository::new(vec![book("1", "A")], vec![holder, dangling]);

        let result = repo.list_issued_books().await;
        assert!(matches!(
            result,
            Err(RecordsRepositoryError::DanglingIssuedBook { ref user_id, ref book_id })
                if user_id == "11" && book_id == "404"
        ));
        assert_eq!(repo.get_book("1").await.unwrap().issued_by, None);
    }

    #[tokio::test]
    /// 1. Lists users - expects empty
    /// 2. Adds two users, second one twice
    /// 3. Updates first user, deletes second one
    async fn test_user_management() {
        let repo = InMemoryRecordsRepository::default();
        assert_eq!(repo.list_users().await.unwrap(), vec![]);

        repo.add_user(user("1", "Jane")).await.unwrap();
        repo.add_user(user("2", "John")).await.unwrap();
        assert!(matches!(
            repo.add_user(user("2", "Other")).await,
            Err(RecordsRepositoryError::UserAlreadyExists(..))
        ));

        let updated = repo
            .update_user("1", patch(json!({"subscriptionType": "Premium"})))
            .await
            .unwrap();
        assert_eq!(updated.len(), 2);
        assert_eq!(updated[0].subscription_type, "Premium");
        assert_eq!(updated[0].name, "Jane");

        let remaining = repo.delete_user("2").await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(matches!(
            repo.get_user("2").await,
            Err(RecordsRepositoryError::UserNotFound(..))
        ));
    }
}
