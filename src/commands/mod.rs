//! Command implementations for the Clarity CLI.
//!
//! Every board command runs the same way a front end would: load the board
//! into a [`TaskStore`], apply the change optimistically, and let the store
//! settle it against the server. A rolled back mutation becomes an error
//! carrying the store's toast message.

use serde::Serialize;

use crate::client::BoardApi;
use crate::config::{ResolvedConfig, ValueSource};
use crate::drag::{DragSession, DropTarget};
use crate::models::{Category, Task, TaskPatch, TaskUpdate};
use crate::store::{MutationKind, MutationState, TaskStore};
use crate::{Error, Result};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
}

/// Turn a rolled back mutation into an error.
fn settled(state: MutationState, kind: MutationKind) -> Result<()> {
    match state {
        MutationState::RolledBack => Err(Error::Other(kind.failure_message().to_string())),
        MutationState::Committed | MutationState::Pending => Ok(()),
    }
}

async fn load<A: BoardApi>(api: A) -> Result<TaskStore<A>> {
    let mut store = TaskStore::new(api);
    store.fetch_data().await?;
    Ok(store)
}

fn require_task<A: BoardApi>(store: &TaskStore<A>, id: &str) -> Result<()> {
    match store.task(id) {
        Some(_) => Ok(()),
        None => Err(Error::NotFound(format!("task not found: {}", id))),
    }
}

// === show ===

/// One board column.
#[derive(Serialize)]
pub struct Column {
    pub category: Category,
    pub tasks: Vec<Task>,
}

#[derive(Serialize)]
pub struct BoardView {
    pub columns: Vec<Column>,
}

impl Output for BoardView {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        for column in &self.columns {
            lines.push(format!(
                "{} ({}) [{}]",
                column.category.name,
                column.tasks.len(),
                column.category.id
            ));
            if column.tasks.is_empty() {
                lines.push("  (empty)".to_string());
            }
            for task in &column.tasks {
                lines.push(format!("  {}", task));
            }
        }
        lines.join("\n")
    }
}

/// Fetch the board and group tasks by category.
pub async fn show<A: BoardApi>(api: A) -> Result<BoardView> {
    let store = load(api).await?;
    let columns = store
        .tasks_by_category()
        .into_iter()
        .map(|(category, tasks)| Column {
            category: category.clone(),
            tasks: tasks.into_iter().cloned().collect(),
        })
        .collect();
    Ok(BoardView { columns })
}

// === add / done / undone / rm ===

#[derive(Serialize)]
pub struct TaskResult {
    pub task: Task,
}

impl Output for TaskResult {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        format!("{} [{} #{}]", self.task, self.task.category_id, self.task.order)
    }
}

/// Add a task at the end of `category_id`, or of the first category.
pub async fn add<A: BoardApi>(api: A, content: &str, category_id: Option<&str>) -> Result<TaskResult> {
    let content = content.trim();
    if content.is_empty() {
        return Err(Error::InvalidInput("task content must not be empty".to_string()));
    }

    let mut store = load(api).await?;
    let category_id = match category_id {
        Some(id) => store
            .categories()
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.id.clone())
            .ok_or_else(|| Error::NotFound(format!("category not found: {}", id)))?,
        None => store.default_category()?.id.clone(),
    };

    let state = store.add_task(content, &category_id).await;
    settled(state, MutationKind::AddTask)?;

    // the committed record replaced the provisional one at the end of the list
    let task = store
        .tasks()
        .last()
        .cloned()
        .ok_or_else(|| Error::Other("created task missing from board".to_string()))?;
    Ok(TaskResult { task })
}

/// Set a task's `completed` flag.
pub async fn set_completed<A: BoardApi>(api: A, id: &str, completed: bool) -> Result<TaskResult> {
    let mut store = load(api).await?;
    let state = store
        .update_task(id, TaskUpdate::completed(completed))
        .await
        .ok_or_else(|| Error::NotFound(format!("task not found: {}", id)))?;
    settled(state, MutationKind::UpdateTask)?;

    let task = store
        .task(id)
        .cloned()
        .ok_or_else(|| Error::NotFound(format!("task not found: {}", id)))?;
    Ok(TaskResult { task })
}

#[derive(Serialize)]
pub struct TaskRemoved {
    pub id: String,
    pub deleted: bool,
}

impl Output for TaskRemoved {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        format!("Deleted task {}", self.id)
    }
}

/// Delete a task.
pub async fn remove<A: BoardApi>(api: A, id: &str) -> Result<TaskRemoved> {
    let mut store = load(api).await?;
    require_task(&store, id)?;

    let state = store.delete_task(id).await;
    settled(state, MutationKind::DeleteTask)?;

    Ok(TaskRemoved {
        id: id.to_string(),
        deleted: true,
    })
}

// === mv ===

#[derive(Serialize)]
pub struct TaskMoved {
    pub task: Task,
    /// Whether anything was persisted
    pub moved: bool,
    pub patches: Vec<TaskPatch>,
}

impl Output for TaskMoved {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        if !self.moved {
            return format!("{} stays put", self.task.id);
        }
        format!(
            "Moved {} to {} #{} ({} task(s) renumbered)",
            self.task.id,
            self.task.category_id,
            self.task.order,
            self.patches.len()
        )
    }
}

/// Run one drag gesture for task `id` ending over `target`, then persist it.
pub async fn move_task<A: BoardApi>(api: A, id: &str, target: DropTarget) -> Result<TaskMoved> {
    let mut store = load(api).await?;
    require_task(&store, id)?;

    match &target {
        DropTarget::Task(over) => require_task(&store, over)?,
        DropTarget::Category(over) => {
            if !store.categories().iter().any(|c| &c.id == over) {
                return Err(Error::NotFound(format!("category not found: {}", over)));
            }
        }
    }

    let mut session = DragSession::start(store.tasks(), id)
        .ok_or_else(|| Error::NotFound(format!("task not found: {}", id)))?;
    session.over(Some(&target));
    let patches = session.end(Some(&target));

    let moved = !patches.is_empty();
    if let Some(state) = store.reorder_tasks(patches.clone()).await {
        settled(state, MutationKind::Reorder)?;
    }

    let task = store
        .task(id)
        .cloned()
        .ok_or_else(|| Error::NotFound(format!("task not found: {}", id)))?;
    Ok(TaskMoved {
        task,
        moved,
        patches,
    })
}

// === category add ===

#[derive(Serialize)]
pub struct CategoryResult {
    pub category: Category,
}

impl Output for CategoryResult {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        format!("Created category {} [{}]", self.category.name, self.category.id)
    }
}

/// Add a category.
pub async fn category_add<A: BoardApi>(api: A, name: &str) -> Result<CategoryResult> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("category name must not be empty".to_string()));
    }

    let mut store = load(api).await?;
    let state = store.add_category(name).await;
    settled(state, MutationKind::AddCategory)?;

    let category = store
        .categories()
        .last()
        .cloned()
        .ok_or_else(|| Error::Other("created category missing from board".to_string()))?;
    Ok(CategoryResult { category })
}

// === config ===

#[derive(Serialize)]
pub struct ConfigEntry {
    pub key: &'static str,
    pub value: String,
    pub source: String,
}

#[derive(Serialize)]
pub struct ConfigView {
    pub path: String,
    pub settings: Vec<ConfigEntry>,
}

impl Output for ConfigView {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![format!("Config file: {}", self.path)];
        for entry in &self.settings {
            lines.push(format!("  {:<11} {} ({})", entry.key, entry.value, entry.source));
        }
        lines.join("\n")
    }
}

fn entry(key: &'static str, value: impl ToString, source: &ValueSource) -> ConfigEntry {
    ConfigEntry {
        key,
        value: value.to_string(),
        source: source.to_string(),
    }
}

/// Describe the resolved configuration.
pub fn config_show(config_path: &std::path::Path, resolved: &ResolvedConfig) -> ConfigView {
    ConfigView {
        path: config_path.display().to_string(),
        settings: vec![
            entry("host", &resolved.host.value, &resolved.host.source),
            entry("port", resolved.port.value, &resolved.port.source),
            entry(
                "data-dir",
                resolved.data_dir.value.display(),
                &resolved.data_dir.source,
            ),
            entry("server-url", &resolved.server_url.value, &resolved.server_url.source),
            entry("log-level", &resolved.log_level.value, &resolved.log_level.source),
        ],
    }
}
