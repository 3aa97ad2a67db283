//! Storage layer for Clarity data.
//!
//! A generic indexed entity store on top of SQLite:
//!
//! - `entities` maps an entity-type-prefixed key (`task:<id>`) to the JSON
//!   record plus its last write time
//! - `entity_index` keeps one ordered id list per entity type, so listing
//!   returns records in the order they were first written
//!
//! Any type implementing [`IndexedEntity`] can be stored. Writes are
//! last-write-wins per id; there is no cross-id transaction beyond a
//! single put.

pub mod entity;

pub use entity::IndexedEntity;

use crate::{Error, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the board database inside the data directory.
pub const DB_FILE: &str = "board.db";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "CLARITY_DATA_DIR";

/// Entity store backed by a single SQLite connection.
pub struct Storage {
    /// Database file, `None` for in-memory stores
    pub path: Option<PathBuf>,
    conn: Connection,
}

impl Storage {
    /// Open (creating if needed) the store at `db_path`.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            path: Some(db_path.to_path_buf()),
            conn,
        })
    }

    /// Open a throwaway in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self { path: None, conn })
    }

    /// Check if a store exists at `db_path`.
    pub fn exists(db_path: &Path) -> bool {
        db_path.is_file()
    }

    /// Initialize the SQLite schema.
    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS entities (
                key TEXT PRIMARY KEY,
                entity TEXT NOT NULL,
                id TEXT NOT NULL,
                state TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS entity_index (
                index_name TEXT NOT NULL,
                id TEXT NOT NULL,
                position INTEGER NOT NULL,
                PRIMARY KEY (index_name, id)
            );

            CREATE INDEX IF NOT EXISTS idx_entities_entity ON entities(entity);
            CREATE INDEX IF NOT EXISTS idx_entity_index_position ON entity_index(index_name, position);
            "#,
        )?;

        Ok(())
    }

    // === Generic entity operations ===

    /// Get a record by id, if present.
    pub fn get<E: IndexedEntity>(&self, id: &str) -> Result<Option<E>> {
        let state: Option<String> = self
            .conn
            .query_row(
                "SELECT state FROM entities WHERE key = ?",
                [E::key(id)],
                |row| row.get(0),
            )
            .optional()?;

        match state {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Get a record by id, failing with `NotFound` when absent.
    pub fn get_state<E: IndexedEntity>(&self, id: &str) -> Result<E> {
        self.get(id)?.ok_or_else(|| {
            Error::NotFound(format!("{} not found: {}", E::ENTITY_NAME, id))
        })
    }

    /// Check whether a record exists.
    pub fn contains<E: IndexedEntity>(&self, id: &str) -> Result<bool> {
        let found: bool = self.conn.query_row(
            "SELECT COUNT(*) > 0 FROM entities WHERE key = ?",
            [E::key(id)],
            |row| row.get(0),
        )?;
        Ok(found)
    }

    /// Insert or replace a record. New ids are appended to the type's index.
    pub fn put<E: IndexedEntity>(&mut self, entity: &E) -> Result<()> {
        let json = serde_json::to_string(entity)?;
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT OR REPLACE INTO entities (key, entity, id, state, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                E::key(entity.id()),
                E::ENTITY_NAME,
                entity.id(),
                json,
                Utc::now().to_rfc3339(),
            ],
        )?;

        tx.execute(
            "INSERT OR IGNORE INTO entity_index (index_name, id, position)
             VALUES (?1, ?2, COALESCE((SELECT MAX(position) FROM entity_index WHERE index_name = ?1), -1) + 1)",
            params![E::INDEX_NAME, entity.id()],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// Read-modify-write a record. Returns the new state, or `None` if absent.
    pub fn patch<E, F>(&mut self, id: &str, f: F) -> Result<Option<E>>
    where
        E: IndexedEntity,
        F: FnOnce(&mut E),
    {
        let Some(mut entity) = self.get::<E>(id)? else {
            return Ok(None);
        };
        f(&mut entity);
        self.put(&entity)?;
        Ok(Some(entity))
    }

    /// Delete a record and drop it from the index. Returns whether it existed.
    pub fn delete<E: IndexedEntity>(&mut self, id: &str) -> Result<bool> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute("DELETE FROM entities WHERE key = ?", [E::key(id)])?;
        tx.execute(
            "DELETE FROM entity_index WHERE index_name = ? AND id = ?",
            params![E::INDEX_NAME, id],
        )?;
        tx.commit()?;
        Ok(removed > 0)
    }

    /// List every record of a type in index order.
    pub fn list<E: IndexedEntity>(&self) -> Result<Vec<E>> {
        let mut stmt = self.conn.prepare(
            "SELECT e.state FROM entity_index i
             JOIN entities e ON e.entity = ?2 AND e.id = i.id
             WHERE i.index_name = ?1
             ORDER BY i.position ASC",
        )?;

        let states: Vec<String> = stmt
            .query_map(params![E::INDEX_NAME, E::ENTITY_NAME], |row| row.get(0))?
            .collect::<rusqlite::Result<_>>()?;

        states
            .iter()
            .map(|json| serde_json::from_str(json).map_err(Error::from))
            .collect()
    }

    /// Number of ids in a type's index.
    pub fn count<E: IndexedEntity>(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM entity_index WHERE index_name = ?",
            [E::INDEX_NAME],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Write the type's seed records if its index is empty.
    ///
    /// Returns the number of records written.
    pub fn ensure_seed<E: IndexedEntity>(&mut self) -> Result<usize> {
        if self.count::<E>()? > 0 {
            return Ok(0);
        }

        let seeds = E::seed_data();
        for entity in &seeds {
            self.put(entity)?;
        }

        if !seeds.is_empty() {
            tracing::info!(index = E::INDEX_NAME, count = seeds.len(), "seeded entity index");
        }
        Ok(seeds.len())
    }
}

/// Data directory named by `CLARITY_DATA_DIR`, if set and non-blank.
pub fn data_dir_from_env() -> Option<PathBuf> {
    std::env::var(DATA_DIR_ENV)
        .ok()
        .filter(|dir| !dir.trim().is_empty())
        .map(PathBuf::from)
}

/// Platform data directory for clarity (e.g. `~/.local/share/clarity/`).
pub fn default_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| Error::Other("Could not determine data directory".to_string()))?;

    Ok(data_dir.join("clarity"))
}

/// Get the data directory: `CLARITY_DATA_DIR` wins, else [`default_data_dir`].
pub fn get_storage_dir() -> Result<PathBuf> {
    match data_dir_from_env() {
        Some(dir) => Ok(dir),
        None => default_data_dir(),
    }
}

/// Generate a server-side identifier.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
