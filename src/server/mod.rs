//! HTTP server for the board API.

pub mod error;
pub mod routes;

pub use error::ApiError;

use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::storage::Storage;
use crate::{Error, Result};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3030;

/// Default listen address.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Board storage (wrapped in Mutex so handlers serialise writes)
    pub storage: Arc<Mutex<Storage>>,
}

impl AppState {
    pub fn new(storage: Storage) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
        }
    }
}

/// Build the `/api` router over `state`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(routes::health))
        .route(
            "/api/categories",
            get(routes::list_categories).post(routes::create_category),
        )
        .route(
            "/api/tasks",
            get(routes::list_tasks).post(routes::create_task),
        )
        .route("/api/tasks/reorder", post(routes::reorder_tasks))
        .route(
            "/api/tasks/:id",
            put(routes::update_task).delete(routes::delete_task),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the API on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Open the database at `db_path` and serve the API on `host:port` until Ctrl+C.
pub async fn start_server(db_path: &Path, host: &str, port: u16) -> Result<()> {
    let storage = Storage::open(db_path)?;

    let host_addr: std::net::IpAddr = host
        .parse()
        .map_err(|e| Error::Config(format!("Invalid host address '{}': {}", host, e)))?;
    let addr = SocketAddr::from((host_addr, port));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        db = %db_path.display(),
        "clarity server listening"
    );

    serve(listener, AppState::new(storage), shutdown_signal()).await?;

    tracing::info!("clarity server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ApiResponse, Category, Deleted, Task};
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde::de::DeserializeOwned;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState::new(Storage::open_in_memory().unwrap())
    }

    async fn call<T: DeserializeOwned>(
        state: &AppState,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, ApiResponse<T>) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(v) => request.body(Body::from(v.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = build_router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn create_task(state: &AppState, content: &str, category: &str, order: u32) -> Task {
        let (status, body) = call::<Task>(
            state,
            Method::POST,
            "/api/tasks",
            Some(json!({ "content": content, "categoryId": category, "order": order })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body.data.unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let state = test_state();
        let (status, body) = call::<Value>(&state, Method::GET, "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.data.unwrap()["status"], "ok");
    }

    #[tokio::test]
    async fn test_categories_seeded_on_first_list() {
        let state = test_state();
        let (_, body) = call::<Vec<Category>>(&state, Method::GET, "/api/categories", None).await;
        let names: Vec<_> = body.data.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["To Do", "In Progress", "Done"]);

        // second access does not reseed
        let (_, body) = call::<Vec<Category>>(&state, Method::GET, "/api/categories", None).await;
        assert_eq!(body.data.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_create_category_requires_name() {
        let state = test_state();
        let (status, body) =
            call::<Category>(&state, Method::POST, "/api/categories", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.success);
        assert_eq!(body.error.as_deref(), Some("name is required"));

        let (status, _) = call::<Category>(
            &state,
            Method::POST,
            "/api/categories",
            Some(json!({ "name": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call::<Category>(
            &state,
            Method::POST,
            "/api/categories",
            Some(json!({ "name": "Blocked" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.data.unwrap().name, "Blocked");
    }

    #[tokio::test]
    async fn test_create_task_validates_fields() {
        let state = test_state();
        let (status, body) = call::<Task>(
            &state,
            Method::POST,
            "/api/tasks",
            Some(json!({ "content": "x", "categoryId": "todo" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(
            body.error
                .unwrap()
                .starts_with("content, categoryId, and order are required")
        );

        let (status, _) = call::<Task>(
            &state,
            Method::POST,
            "/api/tasks",
            Some(json!({ "content": 7, "categoryId": "todo", "order": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_json_is_enveloped() {
        let state = test_state();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/tasks")
            .body(Body::from("{not json"))
            .unwrap();
        let response = build_router(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ApiResponse<Value> = serde_json::from_slice(&bytes).unwrap();
        assert!(!body.success);
    }

    #[tokio::test]
    async fn test_created_task_starts_incomplete() {
        let state = test_state();
        let task = create_task(&state, "Write docs", "todo", 0).await;
        assert!(!task.completed);
        assert!(!task.id.is_empty());

        let (_, body) = call::<Vec<Task>>(&state, Method::GET, "/api/tasks", None).await;
        assert_eq!(body.data.unwrap(), vec![task]);
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let state = test_state();
        let task = create_task(&state, "Write docs", "todo", 0).await;

        let (status, body) = call::<Task>(
            &state,
            Method::PUT,
            &format!("/api/tasks/{}", task.id),
            Some(json!({ "completed": true, "id": "renamed" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let updated = body.data.unwrap();
        assert_eq!(updated.id, task.id);
        assert!(updated.completed);
        assert_eq!(updated.content, "Write docs");
    }

    #[tokio::test]
    async fn test_update_unknown_task_is_404() {
        let state = test_state();
        let (status, body) = call::<Task>(
            &state,
            Method::PUT,
            "/api/tasks/ghost",
            Some(json!({ "completed": true })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error.as_deref(), Some("Task not found"));
    }

    #[tokio::test]
    async fn test_update_rejects_mistyped_field() {
        let state = test_state();
        let task = create_task(&state, "Write docs", "todo", 0).await;
        let (status, _) = call::<Task>(
            &state,
            Method::PUT,
            &format!("/api/tasks/{}", task.id),
            Some(json!({ "completed": "yes" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_task() {
        let state = test_state();
        let task = create_task(&state, "Write docs", "todo", 0).await;
        let uri = format!("/api/tasks/{}", task.id);

        let (status, body) = call::<Deleted>(&state, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body.data.unwrap(),
            Deleted {
                id: task.id.clone(),
                deleted: true
            }
        );

        let (status, _) = call::<Deleted>(&state, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reorder_skips_unknown_ids() {
        let state = test_state();
        let a = create_task(&state, "a", "todo", 0).await;
        let b = create_task(&state, "b", "todo", 1).await;

        let (status, body) = call::<Vec<Task>>(
            &state,
            Method::POST,
            "/api/tasks/reorder",
            Some(json!({ "tasks": [
                { "id": b.id, "order": 0, "categoryId": "done" },
                { "id": "ghost", "order": 5, "categoryId": "done" },
                { "id": a.id, "order": 0, "categoryId": "todo" },
            ]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let updated = body.data.unwrap();
        assert_eq!(updated.len(), 2);
        assert_eq!(updated[0].id, b.id);
        assert_eq!(updated[0].category_id, "done");
        assert_eq!(updated[0].order, 0);
        // other fields are untouched
        assert_eq!(updated[0].content, "b");
    }

    #[tokio::test]
    async fn test_reorder_rejects_malformed_body() {
        let state = test_state();
        let (status, _) = call::<Vec<Task>>(
            &state,
            Method::POST,
            "/api/tasks/reorder",
            Some(json!({ "tasks": "nope" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call::<Vec<Task>>(
            &state,
            Method::POST,
            "/api/tasks/reorder",
            Some(json!({ "tasks": [{ "id": "a" }] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_start_server_rejects_bad_host() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = start_server(&dir.path().join("board.db"), "not-a-host", 0)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
