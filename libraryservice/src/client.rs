use anyhow::{bail, Context};
use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::RetryTransientMiddleware;
use reqwest_tracing::TracingMiddleware;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::api::{ApiResponse, Book, CreateBookRequest, CreateUserRequest, User};

/// Typed client for the library service HTTP api
pub struct LibraryServiceClient {
    url: String,
    client: ClientWithMiddleware,
}

impl LibraryServiceClient {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let reqwest_client = reqwest::Client::builder()
            .build()
            .context("Failed to build reqwest client")?;
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);
        let client = ClientBuilder::new(reqwest_client)
            // Insert the tracing middleware
            .with(TracingMiddleware::default())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub async fn list_books(&self) -> anyhow::Result<Vec<Book>> {
        self.send(self.client.get(format!("{}/books", self.url)))
            .await
    }

    /// Returns None when the book does not exist
    pub async fn get_book(&self, book_id: &str) -> anyhow::Result<Option<Book>> {
        self.send_optional(self.client.get(format!("{}/books/{}", self.url, book_id)))
            .await
    }

    pub async fn add_book(&self, request: &CreateBookRequest) -> anyhow::Result<Book> {
        self.send(self.client.post(format!("{}/books", self.url)).json(request))
            .await
    }

    /// Merges `data` over the book, returns all books after the update
    pub async fn update_book(
        &self,
        book_id: &str,
        data: Map<String, Value>,
    ) -> anyhow::Result<Vec<Book>> {
        self.send(
            self.client
                .put(format!("{}/books/{}", self.url, book_id))
                .json(&json!({ "data": data })),
        )
        .await
    }

    /// Returns the remaining books
    pub async fn delete_book(&self, book_id: &str) -> anyhow::Result<Vec<Book>> {
        self.send(self.client.delete(format!("{}/books/{}", self.url, book_id)))
            .await
    }

    /// Returns an empty list when no book is issued
    pub async fn list_issued_books(&self) -> anyhow::Result<Vec<Book>> {
        Ok(self
            .send_optional(
                self.client
                    .get(format!("{}/books/issued-books/for-users", self.url)),
            )
            .await?
            .unwrap_or_default())
    }

    pub async fn list_users(&self) -> anyhow::Result<Vec<User>> {
        self.send(self.client.get(format!("{}/users", self.url)))
            .await
    }

    pub async fn get_user(&self, user_id: &str) -> anyhow::Result<Option<User>> {
        self.send_optional(self.client.get(format!("{}/users/{}", self.url, user_id)))
            .await
    }

    pub async fn add_user(&self, request: &CreateUserRequest) -> anyhow::Result<User> {
        self.send(self.client.post(format!("{}/users", self.url)).json(request))
            .await
    }

    pub async fn update_user(
        &self,
        user_id: &str,
        data: Map<String, Value>,
    ) -> anyhow::Result<Vec<User>> {
        self.send(
            self.client
                .put(format!("{}/users/{}", self.url, user_id))
                .json(&json!({ "data": data })),
        )
        .await
    }

    pub async fn delete_user(&self, user_id: &str) -> anyhow::Result<Vec<User>> {
        self.send(self.client.delete(format!("{}/users/{}", self.url, user_id)))
            .await
    }

    /// User fields together with the computed subscription fields
    pub async fn get_subscription_details(
        &self,
        user_id: &str,
    ) -> anyhow::Result<Option<Map<String, Value>>> {
        self.send_optional(
            self.client
                .get(format!("{}/users/subscription-details/{}", self.url, user_id)),
        )
        .await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> anyhow::Result<T> {
        match self.send_optional(request).await? {
            Some(data) => Ok(data),
            None => bail!("Requested record not found"),
        }
    }

    async fn send_optional<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> anyhow::Result<Option<T>> {
        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .with_context(|| format!("Failed to parse response with status {}", status))?;
        if !status.is_success() || !envelope.success {
            bail!(
                "Request failed with status {}: {}",
                status,
                envelope.message.unwrap_or_default()
            )
        }
        envelope
            .data
            .map(Some)
            .context("Response has no data")
    }
}
