//! HTTP client for the board API.
//!
//! [`BoardApi`] is the seam the client-side store talks through.
//! [`HttpClient`] implements it over `reqwest`, unwrapping the
//! `{success, data, error}` envelope; tests substitute in-memory fakes.

use std::future::Future;

use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::models::{
    ApiResponse, Category, Deleted, NewCategory, NewTask, ReorderRequest, Task, TaskPatch,
    TaskUpdate,
};
use crate::{Error, Result};

/// Default server address used when nothing else is configured.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3030";

/// The CRUD surface of the board server.
pub trait BoardApi {
    /// `GET /api/categories`
    fn list_categories(&self) -> impl Future<Output = Result<Vec<Category>>> + Send;

    /// `POST /api/categories`
    fn create_category(&self, name: &str) -> impl Future<Output = Result<Category>> + Send;

    /// `GET /api/tasks`
    fn list_tasks(&self) -> impl Future<Output = Result<Vec<Task>>> + Send;

    /// `POST /api/tasks`
    fn create_task(&self, task: &NewTask) -> impl Future<Output = Result<Task>> + Send;

    /// `PUT /api/tasks/:id`
    fn update_task(
        &self,
        id: &str,
        update: &TaskUpdate,
    ) -> impl Future<Output = Result<Task>> + Send;

    /// `DELETE /api/tasks/:id`
    fn delete_task(&self, id: &str) -> impl Future<Output = Result<Deleted>> + Send;

    /// `POST /api/tasks/reorder`
    fn reorder_tasks(&self, patches: &[TaskPatch])
    -> impl Future<Output = Result<Vec<Task>>> + Send;
}

/// `reqwest`-backed implementation of [`BoardApi`].
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpClient {
    /// Create a client for the server at `base_url` (e.g. `http://127.0.0.1:3030`).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "server url must start with http:// or https://, got: {}",
                base_url
            )));
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("clarity/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { base_url, http })
    }

    /// The server address this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
    }

    fn request_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> RequestBuilder {
        self.request(method, path).json(body)
    }

    /// Send a request and unwrap the response envelope.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        let envelope: ApiResponse<T> = response.json().await?;

        if !status.is_success() || !envelope.success {
            return Err(Error::Api {
                status: status.as_u16(),
                message: envelope
                    .error
                    .unwrap_or_else(|| status.to_string()),
            });
        }

        envelope.data.ok_or_else(|| Error::Api {
            status: status.as_u16(),
            message: "response carried no data".to_string(),
        })
    }
}

impl BoardApi for HttpClient {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        self.send(self.request(Method::GET, "/api/categories")).await
    }

    async fn create_category(&self, name: &str) -> Result<Category> {
        let body = NewCategory {
            name: name.to_string(),
        };
        self.send(self.request_json(Method::POST, "/api/categories", &body))
            .await
    }

    async fn list_tasks(&self) -> Result<Vec<Task>> {
        self.send(self.request(Method::GET, "/api/tasks")).await
    }

    async fn create_task(&self, task: &NewTask) -> Result<Task> {
        self.send(self.request_json(Method::POST, "/api/tasks", task))
            .await
    }

    async fn update_task(&self, id: &str, update: &TaskUpdate) -> Result<Task> {
        let path = format!("/api/tasks/{}", id);
        self.send(self.request_json(Method::PUT, &path, update)).await
    }

    async fn delete_task(&self, id: &str) -> Result<Deleted> {
        let path = format!("/api/tasks/{}", id);
        self.send(self.request(Method::DELETE, &path)).await
    }

    async fn reorder_tasks(&self, patches: &[TaskPatch]) -> Result<Vec<Task>> {
        let body = ReorderRequest {
            tasks: patches.to_vec(),
        };
        self.send(self.request_json(Method::POST, "/api/tasks/reorder", &body))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_trailing_slash() {
        let client = HttpClient::new("http://localhost:3030/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:3030");
    }

    #[test]
    fn test_new_rejects_non_http_url() {
        let err = HttpClient::new("localhost:3030").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_an_http_error() {
        // port 9 (discard) is not serving HTTP on loopback
        let client = HttpClient::new("http://127.0.0.1:9").unwrap();
        let err = client.list_tasks().await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }
}
