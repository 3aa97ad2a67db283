//! Clarity - A kanban task board with optimistic drag-and-drop reordering.
//!
//! This library provides the pieces behind the `clarity` binary:
//! the indexed entity store, the HTTP CRUD server, a typed client for it,
//! the optimistic client-side state store, and the drag/reorder engine.

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod drag;
pub mod models;
pub mod server;
pub mod storage;
pub mod store;


/// Library-level error type for Clarity operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server rejected request ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Clarity operations.
pub type Result<T> = std::result::Result<T, Error>;
