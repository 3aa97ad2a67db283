//! Entity descriptors for the indexed store.
//!
//! Each persisted type names its key prefix and the index that keeps
//! its ids in insertion order.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::models::{Category, Task};

/// A record type that can live in [`Storage`](super::Storage).
pub trait IndexedEntity: Serialize + DeserializeOwned + Clone {
    /// Key prefix, e.g. `task` in `task:<id>`.
    const ENTITY_NAME: &'static str;

    /// Name of the ordered id index for this type.
    const INDEX_NAME: &'static str;

    /// The record's identifier.
    fn id(&self) -> &str;

    /// Records written the first time the index is found empty.
    fn seed_data() -> Vec<Self> {
        Vec::new()
    }

    /// Storage key for an id of this type.
    fn key(id: &str) -> String {
        format!("{}:{}", Self::ENTITY_NAME, id)
    }
}

impl IndexedEntity for Task {
    const ENTITY_NAME: &'static str = "task";
    const INDEX_NAME: &'static str = "tasks";

    fn id(&self) -> &str {
        &self.id
    }
}

impl IndexedEntity for Category {
    const ENTITY_NAME: &'static str = "category";
    const INDEX_NAME: &'static str = "categories";

    fn id(&self) -> &str {
        &self.id
    }

    fn seed_data() -> Vec<Self> {
        Category::seed()
    }
}
