//! Per-call optimistic mutation lifecycle.
//!
//! ```text
//! begin_*  ──▶  Pending  ──settle(Ok)──▶  Committed
//!                  │
//!                  └──────settle(Err)──▶  RolledBack
//! ```
//!
//! There is no retry state; a rolled back mutation is final and the caller
//! re-issues the whole operation to try again.

use std::fmt;

use crate::models::{Category, Deleted, NewTask, Task, TaskPatch, TaskUpdate};

/// Prefix of locally synthesized ids. Server ids never carry it.
pub const PROVISIONAL_PREFIX: &str = "local-";

/// Make a fresh provisional id.
pub fn provisional_id() -> String {
    format!("{}{}", PROVISIONAL_PREFIX, uuid::Uuid::new_v4())
}

/// Whether `id` was synthesized locally and not yet confirmed.
pub fn is_provisional(id: &str) -> bool {
    id.starts_with(PROVISIONAL_PREFIX)
}

/// The user-initiated operations the store knows how to apply optimistically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    AddTask,
    UpdateTask,
    DeleteTask,
    AddCategory,
    Reorder,
}

impl MutationKind {
    /// Toast shown when the server rejects this kind of mutation.
    pub fn failure_message(&self) -> &'static str {
        match self {
            MutationKind::AddTask => "Failed to add task.",
            MutationKind::UpdateTask => "Failed to update task.",
            MutationKind::DeleteTask => "Failed to delete task.",
            MutationKind::AddCategory => "Failed to add category.",
            MutationKind::Reorder => "Failed to save new order.",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::AddTask => "add_task",
            MutationKind::UpdateTask => "update_task",
            MutationKind::DeleteTask => "delete_task",
            MutationKind::AddCategory => "add_category",
            MutationKind::Reorder => "reorder",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a mutation is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    /// Applied locally, server call in flight
    Pending,
    /// Server acknowledged
    Committed,
    /// Server call failed, local state restored
    RolledBack,
}

/// The server call a pending mutation is waiting on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    AddTask {
        provisional_id: String,
        body: NewTask,
    },
    UpdateTask {
        id: String,
        update: TaskUpdate,
    },
    DeleteTask {
        id: String,
    },
    AddCategory {
        provisional_id: String,
        name: String,
    },
    Reorder {
        patches: Vec<TaskPatch>,
    },
}

impl Request {
    pub fn kind(&self) -> MutationKind {
        match self {
            Request::AddTask { .. } => MutationKind::AddTask,
            Request::UpdateTask { .. } => MutationKind::UpdateTask,
            Request::DeleteTask { .. } => MutationKind::DeleteTask,
            Request::AddCategory { .. } => MutationKind::AddCategory,
            Request::Reorder { .. } => MutationKind::Reorder,
        }
    }
}

/// What the server returned for a successful call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ack {
    Task(Task),
    Category(Category),
    Deleted(Deleted),
    Tasks(Vec<Task>),
}

/// A mutation that has been applied locally and awaits the server.
///
/// Creates carry no snapshot: their rollback removes the provisional record.
/// Every other kind carries the full task list as it was strictly before
/// the optimistic change.
#[derive(Debug, Clone)]
#[must_use = "a pending mutation must be settled"]
pub struct PendingMutation {
    pub(crate) request: Request,
    pub(crate) snapshot: Option<Vec<Task>>,
}

impl PendingMutation {
    pub(crate) fn new(request: Request, snapshot: Option<Vec<Task>>) -> Self {
        Self { request, snapshot }
    }

    /// Always [`MutationState::Pending`] until settled.
    pub fn state(&self) -> MutationState {
        MutationState::Pending
    }

    pub fn kind(&self) -> MutationKind {
        self.request.kind()
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// The provisional id of a create, if this is one.
    pub fn provisional_id(&self) -> Option<&str> {
        match &self.request {
            Request::AddTask { provisional_id, .. }
            | Request::AddCategory { provisional_id, .. } => Some(provisional_id),
            _ => None,
        }
    }
}
