//! Data models for Clarity entities.
//!
//! This module defines the core data structures:
//! - `Task` - A card on the board, positioned inside one category
//! - `Category` - A board column holding an ordered list of tasks
//! - `TaskPatch` - The `{id, order, categoryId}` delta produced by a drag
//! - `TaskUpdate` - Partial task fields accepted by the update endpoint
//! - `ApiResponse` - The `{success, data, error}` envelope used on the wire

use serde::{Deserialize, Serialize};
use std::fmt;

/// A work item on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier, immutable for the lifetime of the task
    pub id: String,

    /// Display text
    pub content: String,

    /// Owning category (a reference, not ownership)
    pub category_id: String,

    /// Whether the task has been checked off
    #[serde(default)]
    pub completed: bool,

    /// Zero-based position within the category
    #[serde(default)]
    pub order: u32,
}

impl Task {
    /// Create a new, not yet completed task.
    pub fn new(id: String, content: String, category_id: String, order: u32) -> Self {
        Self {
            id,
            content,
            category_id,
            completed: false,
            order,
        }
    }

    /// Apply a partial update in place.
    pub fn apply(&mut self, update: &TaskUpdate) {
        if let Some(ref content) = update.content {
            self.content = content.clone();
        }
        if let Some(ref category_id) = update.category_id {
            self.category_id = category_id.clone();
        }
        if let Some(completed) = update.completed {
            self.completed = completed;
        }
        if let Some(order) = update.order {
            self.order = order;
        }
    }

    /// Apply a reorder patch in place.
    pub fn apply_patch(&mut self, patch: &TaskPatch) {
        self.order = patch.order;
        self.category_id = patch.category_id.clone();
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.completed { "x" } else { " " };
        write!(f, "[{}] {} ({})", mark, self.content, self.id)
    }
}

/// A board column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier
    pub id: String,

    /// Display name
    pub name: String,
}

impl Category {
    /// Create a new category.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// The fixed set of columns present on first use.
    pub fn seed() -> Vec<Category> {
        vec![
            Category::new("todo", "To Do"),
            Category::new("in-progress", "In Progress"),
            Category::new("done", "Done"),
        ]
    }
}

/// Position and category assignment for one task, as sent to the reorder endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    pub id: String,
    pub order: u32,
    pub category_id: String,
}

/// Partial task fields. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
}

impl TaskUpdate {
    /// Update that only flips the completed flag.
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }
}

/// Body of a create-task request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub content: String,
    pub category_id: String,
    pub order: u32,
}

/// Body of a create-category request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
}

/// Body of a reorder request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderRequest {
    pub tasks: Vec<TaskPatch>,
}

/// Acknowledgement returned by the delete endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deleted {
    pub id: String,
    pub deleted: bool,
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Successful envelope wrapping `data`.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Failed envelope carrying a message.
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}
