//! Request handlers for the `/api` surface.
//!
//! Bodies are taken as raw bytes and validated here so malformed JSON and
//! mistyped fields come back in the envelope instead of axum's plain-text
//! rejections.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::AppState;
use super::error::ApiError;
use crate::models::{ApiResponse, Category, Deleted, NewTask, Task, TaskPatch, TaskUpdate};
use crate::storage::generate_id;

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

const TASK_NOT_FOUND: &str = "Task not found";

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}

/// Parse a request body as a JSON object.
fn parse_object(body: &Bytes) -> Result<serde_json::Map<String, Value>, ApiError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ApiError::Validation("request body must be a JSON object".into())),
        Err(e) => Err(ApiError::Validation(format!("invalid JSON body: {}", e))),
    }
}

fn from_value<T: DeserializeOwned>(value: Value, message: &str) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Validation(format!("{}: {}", message, e)))
}

/// `GET /api/health`
pub async fn health() -> ApiResult<Value> {
    ok(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "commit": env!("CLARITY_GIT_COMMIT"),
    }))
}

/// `GET /api/categories`, seeding the default columns on first access.
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Vec<Category>> {
    let mut storage = state.storage.lock().await;
    storage.ensure_seed::<Category>()?;
    ok(storage.list::<Category>()?)
}

/// `POST /api/categories`
pub async fn create_category(State(state): State<AppState>, body: Bytes) -> ApiResult<Category> {
    let fields = parse_object(&body)?;
    let name = match fields.get("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name.clone(),
        _ => return Err(ApiError::Validation("name is required".into())),
    };

    let category = Category::new(generate_id(), name);
    let mut storage = state.storage.lock().await;
    storage.put(&category)?;

    tracing::info!(id = %category.id, name = %category.name, "category created");
    ok(category)
}

/// `GET /api/tasks`
pub async fn list_tasks(State(state): State<AppState>) -> ApiResult<Vec<Task>> {
    let storage = state.storage.lock().await;
    ok(storage.list::<Task>()?)
}

/// `POST /api/tasks`
pub async fn create_task(State(state): State<AppState>, body: Bytes) -> ApiResult<Task> {
    let fields = parse_object(&body)?;
    let new: NewTask = from_value(
        Value::Object(fields),
        "content, categoryId, and order are required",
    )?;

    let task = Task::new(generate_id(), new.content, new.category_id, new.order);
    let mut storage = state.storage.lock().await;
    storage.put(&task)?;

    tracing::info!(id = %task.id, category = %task.category_id, "task created");
    ok(task)
}

/// `PUT /api/tasks/:id` merges the given fields into the stored task.
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Task> {
    let mut fields = parse_object(&body)?;
    // the path names the record; an id in the body never renames it
    fields.remove("id");
    let update: TaskUpdate = from_value(Value::Object(fields), "invalid task fields")?;

    let mut storage = state.storage.lock().await;
    let task = storage
        .patch::<Task, _>(&id, |task| task.apply(&update))?
        .ok_or_else(|| ApiError::NotFound(TASK_NOT_FOUND.into()))?;

    tracing::debug!(id = %task.id, "task updated");
    ok(task)
}

/// `DELETE /api/tasks/:id`
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    let mut storage = state.storage.lock().await;
    if !storage.delete::<Task>(&id)? {
        return Err(ApiError::NotFound(TASK_NOT_FOUND.into()));
    }

    tracing::info!(id = %id, "task deleted");
    ok(Deleted { id, deleted: true })
}

/// `POST /api/tasks/reorder` applies each `{id, order, categoryId}` patch.
///
/// Unknown ids are skipped; the response lists only the tasks that exist.
pub async fn reorder_tasks(State(state): State<AppState>, body: Bytes) -> ApiResult<Vec<Task>> {
    let mut fields = parse_object(&body)?;
    let entries = match fields.remove("tasks") {
        Some(Value::Array(entries)) => entries,
        _ => return Err(ApiError::Validation("tasks must be an array".into())),
    };
    let patches: Vec<TaskPatch> = entries
        .into_iter()
        .map(|entry| from_value(entry, "each task needs id, order, and categoryId"))
        .collect::<Result<_, _>>()?;

    let mut storage = state.storage.lock().await;
    let mut updated = Vec::with_capacity(patches.len());
    for patch in &patches {
        match storage.patch::<Task, _>(&patch.id, |task| task.apply_patch(patch))? {
            Some(task) => updated.push(task),
            None => tracing::debug!(id = %patch.id, "reorder skipped unknown task"),
        }
    }

    tracing::info!(requested = patches.len(), updated = updated.len(), "tasks reordered");
    ok(updated)
}
