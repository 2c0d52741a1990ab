use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type BookId = String;
pub type UserId = String;

pub const WELCOME_MESSAGE: &str = "HOME PAGE: Welcome to the Library Management System";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Book record as stored in the books sequence.
/// `issued_by`, `issued_date` and `return_date` are only filled in by the issued books listing.
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub year: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<String>,
    /// Fields added through updates that are not part of the book shape
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// User record as stored in the users sequence
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// One of `Basic`, `Standard`, `Premium`; other values are kept as is
    pub subscription_type: String,
    pub subscription_date: String,
    /// Id of the book currently issued to the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_book: Option<BookId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Id of the issued book, if the user has a non empty one
    pub fn issued_book_id(&self) -> Option<&str> {
        self.issued_book.as_deref().filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// Body of `POST /books`. Anything beside these four fields is dropped.
pub struct CreateBookRequest {
    pub id: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub year: Option<String>,
}

impl CreateBookRequest {
    pub const MISSING_FIELDS_MESSAGE: &'static str =
        "All fields are required: id, title, author, year";

    /// Builds the book, returns None when any of the fields is missing or empty
    pub fn into_book(self) -> Option<Book> {
        Some(Book {
            id: non_empty(self.id)?,
            title: non_empty(self.title)?,
            author: non_empty(self.author)?,
            year: non_empty(self.year)?,
            issued_by: None,
            issued_date: None,
            return_date: None,
            extra: Map::new(),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Body of `POST /users`
pub struct CreateUserRequest {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub subscription_type: Option<String>,
    pub subscription_date: Option<String>,
}

impl CreateUserRequest {
    pub const MISSING_FIELDS_MESSAGE: &'static str =
        "All fields are required: id, name, email, subscriptionType, subscriptionDate";

    pub fn into_user(self) -> Option<User> {
        Some(User {
            id: non_empty(self.id)?,
            name: non_empty(self.name)?,
            email: non_empty(self.email)?,
            subscription_type: non_empty(self.subscription_type)?,
            subscription_date: non_empty(self.subscription_date)?,
            issued_book: None,
            issued_date: None,
            return_date: None,
            extra: Map::new(),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// Body of `PUT /books/{id}` and `PUT /users/{id}`.
/// `data` is shallow merged over the stored record.
pub struct UpdateRecordRequest {
    #[serde(default)]
    pub data: Option<Value>,
}

impl UpdateRecordRequest {
    pub const MISSING_DATA_MESSAGE: &'static str = "Data field is required in the request body";
    pub const NOT_AN_OBJECT_MESSAGE: &'static str = "Data field must be a JSON object";

    /// Extracts the merge patch.
    /// Missing, null, false, 0 and "" count as missing data.
    pub fn into_patch(self) -> Result<Map<String, Value>, &'static str> {
        match self.data {
            Some(Value::Object(patch)) => Ok(patch),
            Some(value) if is_truthy(&value) => Err(Self::NOT_AN_OBJECT_MESSAGE),
            _ => Err(Self::MISSING_DATA_MESSAGE),
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Uniform response envelope `{success, message?, data?}`
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn with_data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn with_message_and_data(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}
