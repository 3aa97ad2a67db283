//! Client-side board state with optimistic updates.
//!
//! [`TaskStore`] holds the task and category lists a front end renders.
//! Every user mutation is applied locally first, then sent to the server
//! through a [`BoardApi`]; if the server call fails the local change is
//! undone and a toast is raised.
//!
//! Each mutation is split in two phases so callers (and tests) can observe
//! the in-between state:
//!
//! 1. `begin_*` applies the change and returns a [`PendingMutation`]
//! 2. [`TaskStore::settle`] commits or rolls it back once the call returns
//!
//! The `async` methods (`add_task`, `update_task`, ...) run both phases
//! around the server call. A store instance is owned by one session; nothing
//! here is global.

pub mod mutation;
pub mod toast;

pub use mutation::{
    Ack, MutationKind, MutationState, PendingMutation, Request, is_provisional, provisional_id,
};
pub use toast::{NotificationLevel, NotificationManager, Toast};

use crate::client::BoardApi;
use crate::models::{Category, NewTask, Task, TaskPatch, TaskUpdate};
use crate::{Error, Result};

/// Toast shown when the initial load fails.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load data.";

/// In-memory board state for one session.
pub struct TaskStore<A> {
    api: A,
    tasks: Vec<Task>,
    categories: Vec<Category>,
    is_loading: bool,
    notifications: NotificationManager,
}

impl<A: BoardApi> TaskStore<A> {
    /// Create an empty store. It reports loading until [`fetch_data`](Self::fetch_data) runs.
    pub fn new(api: A) -> Self {
        Self {
            api,
            tasks: Vec::new(),
            categories: Vec::new(),
            is_loading: true,
            notifications: NotificationManager::new(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn notifications(&self) -> &NotificationManager {
        &self.notifications
    }

    /// Look up a task by id.
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Each known category with its tasks sorted by `order`.
    pub fn tasks_by_category(&self) -> Vec<(&Category, Vec<&Task>)> {
        self.categories
            .iter()
            .map(|category| {
                let mut tasks: Vec<&Task> = self
                    .tasks
                    .iter()
                    .filter(|t| t.category_id == category.id)
                    .collect();
                tasks.sort_by_key(|t| t.order);
                (category, tasks)
            })
            .collect()
    }

    /// Replace the task list wholesale. No server call.
    pub fn set_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
    }

    /// Load categories and tasks from the server.
    ///
    /// On failure the previous lists are kept and a toast is raised.
    pub async fn fetch_data(&mut self) -> Result<()> {
        self.is_loading = true;

        let result = tokio::try_join!(self.api.list_categories(), self.api.list_tasks());

        self.is_loading = false;
        match result {
            Ok((categories, tasks)) => {
                tracing::debug!(
                    categories = categories.len(),
                    tasks = tasks.len(),
                    "board loaded"
                );
                self.categories = categories;
                self.tasks = tasks;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load board");
                self.notifications.error(LOAD_FAILED_MESSAGE);
                Err(e)
            }
        }
    }

    // === Phase 1: optimistic apply ===

    /// Append a provisional task at the end of `category_id`.
    pub fn begin_add_task(&mut self, content: &str, category_id: &str) -> PendingMutation {
        let order = self
            .tasks
            .iter()
            .filter(|t| t.category_id == category_id)
            .count() as u32;
        let id = provisional_id();

        self.tasks.push(Task::new(
            id.clone(),
            content.to_string(),
            category_id.to_string(),
            order,
        ));

        PendingMutation::new(
            Request::AddTask {
                provisional_id: id,
                body: NewTask {
                    content: content.to_string(),
                    category_id: category_id.to_string(),
                    order,
                },
            },
            None,
        )
    }

    /// Merge `update` into the task. `None` if the task isn't in the store.
    pub fn begin_update_task(&mut self, id: &str, update: TaskUpdate) -> Option<PendingMutation> {
        let index = self.tasks.iter().position(|t| t.id == id)?;
        let snapshot = self.tasks.clone();

        self.tasks[index].apply(&update);

        Some(PendingMutation::new(
            Request::UpdateTask {
                id: id.to_string(),
                update,
            },
            Some(snapshot),
        ))
    }

    /// Remove the task from the list.
    pub fn begin_delete_task(&mut self, id: &str) -> PendingMutation {
        let snapshot = self.tasks.clone();
        self.tasks.retain(|t| t.id != id);

        PendingMutation::new(Request::DeleteTask { id: id.to_string() }, Some(snapshot))
    }

    /// Append a provisional category.
    pub fn begin_add_category(&mut self, name: &str) -> PendingMutation {
        let id = provisional_id();
        self.categories.push(Category::new(id.clone(), name));

        PendingMutation::new(
            Request::AddCategory {
                provisional_id: id,
                name: name.to_string(),
            },
            None,
        )
    }

    /// Apply reorder patches. `None` when there is nothing to apply.
    pub fn begin_reorder(&mut self, patches: Vec<TaskPatch>) -> Option<PendingMutation> {
        if patches.is_empty() {
            return None;
        }
        let snapshot = self.tasks.clone();

        for patch in &patches {
            if let Some(task) = self.tasks.iter_mut().find(|t| t.id == patch.id) {
                task.apply_patch(patch);
            }
        }

        Some(PendingMutation::new(
            Request::Reorder { patches },
            Some(snapshot),
        ))
    }

    // === Server call ===

    /// Issue the server call a pending mutation is waiting on.
    pub async fn dispatch(&self, pending: &PendingMutation) -> Result<Ack> {
        match pending.request() {
            Request::AddTask { body, .. } => self.api.create_task(body).await.map(Ack::Task),
            Request::UpdateTask { id, update } => {
                self.api.update_task(id, update).await.map(Ack::Task)
            }
            Request::DeleteTask { id } => self.api.delete_task(id).await.map(Ack::Deleted),
            Request::AddCategory { name, .. } => {
                self.api.create_category(name).await.map(Ack::Category)
            }
            Request::Reorder { patches } => self.api.reorder_tasks(patches).await.map(Ack::Tasks),
        }
    }

    // === Phase 2: commit or roll back ===

    /// Settle a pending mutation with the outcome of its server call.
    pub fn settle(&mut self, pending: PendingMutation, outcome: Result<Ack>) -> MutationState {
        let kind = pending.kind();

        match outcome {
            Ok(ack) => {
                self.commit(pending.request, ack);
                tracing::debug!(mutation = %kind, "mutation committed");
                MutationState::Committed
            }
            Err(e) => {
                tracing::warn!(mutation = %kind, error = %e, "mutation failed, rolling back");
                self.roll_back(pending);
                self.notifications.error(kind.failure_message());
                MutationState::RolledBack
            }
        }
    }

    fn commit(&mut self, request: Request, ack: Ack) {
        match (request, ack) {
            (Request::AddTask { provisional_id, .. }, Ack::Task(created)) => {
                if let Some(slot) = self.tasks.iter_mut().find(|t| t.id == provisional_id) {
                    *slot = created;
                }
            }
            (Request::AddCategory { provisional_id, .. }, Ack::Category(created)) => {
                if let Some(slot) = self.categories.iter_mut().find(|c| c.id == provisional_id) {
                    *slot = created;
                }
            }
            // updates, deletes and reorders are already reflected locally
            _ => {}
        }
    }

    fn roll_back(&mut self, pending: PendingMutation) {
        match pending.request {
            Request::AddTask { provisional_id, .. } => {
                self.tasks.retain(|t| t.id != provisional_id);
            }
            Request::AddCategory { provisional_id, .. } => {
                self.categories.retain(|c| c.id != provisional_id);
            }
            _ => {
                if let Some(snapshot) = pending.snapshot {
                    self.tasks = snapshot;
                }
            }
        }
    }

    async fn run(&mut self, pending: PendingMutation) -> MutationState {
        let outcome = self.dispatch(&pending).await;
        self.settle(pending, outcome)
    }

    // === Whole operations ===

    /// Optimistically add a task at the end of `category_id`.
    pub async fn add_task(&mut self, content: &str, category_id: &str) -> MutationState {
        let pending = self.begin_add_task(content, category_id);
        self.run(pending).await
    }

    /// Optimistically update a task. `None` if the task isn't in the store.
    pub async fn update_task(&mut self, id: &str, update: TaskUpdate) -> Option<MutationState> {
        let pending = self.begin_update_task(id, update)?;
        Some(self.run(pending).await)
    }

    /// Optimistically delete a task.
    pub async fn delete_task(&mut self, id: &str) -> MutationState {
        let pending = self.begin_delete_task(id);
        self.run(pending).await
    }

    /// Optimistically add a category.
    pub async fn add_category(&mut self, name: &str) -> MutationState {
        let pending = self.begin_add_category(name);
        self.run(pending).await
    }

    /// Optimistically apply and persist reorder patches.
    ///
    /// `None` when `patches` is empty; no server call is made.
    pub async fn reorder_tasks(&mut self, patches: Vec<TaskPatch>) -> Option<MutationState> {
        let pending = self.begin_reorder(patches)?;
        Some(self.run(pending).await)
    }

    /// The category new tasks go to when none is given: the first one.
    pub fn default_category(&self) -> Result<&Category> {
        self.categories
            .first()
            .ok_or_else(|| Error::InvalidInput("board has no categories".to_string()))
    }
}
