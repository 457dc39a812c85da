// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer: a path-addressed document store.
//!
//! Services only see [`DocumentStore`]. Production runs on
//! [`FirestoreStore`]; tests run on [`MemoryStore`].

pub mod firestore;
pub mod memory;
pub mod paths;

pub use self::firestore::FirestoreStore;
pub use memory::MemoryStore;
pub use paths::{CollectionPath, DocPath};

use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Membership join records, nested under a user
    pub const USER_PROJECTS: &str = "projects";
    pub const PROJECTS: &str = "projects";
    pub const CANVAS: &str = "canvas";
    pub const FRAMES: &str = "frames";
    pub const USER_CANVASES: &str = "userCanvases";
    pub const INVITATIONS: &str = "invitations";
    pub const USER_SETTINGS: &str = "userSettings";
}

// Firestore limits transactions to 500 writes.
// We use a safe limit of 400 to allow headroom.
pub const BATCH_SIZE: usize = 400;

/// A stored document and where it lives.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: DocPath,
    pub data: Value,
}

impl Document {
    pub fn id(&self) -> &str {
        self.path.id()
    }

    /// Deserialize the document body into a model.
    pub fn into_model<T: DeserializeOwned>(self) -> Result<T> {
        serde_json::from_value(self.data).map_err(|e| {
            AppError::Database(format!("Malformed document {}: {}", self.path, e))
        })
    }
}

/// Serialize a model into a document body.
pub fn to_document<T: Serialize>(model: &T) -> Result<Value> {
    serde_json::to_value(model)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize document: {}", e)))
}

/// Single-field query filter. All filtered fields hold strings.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq { field: &'static str, value: String },
    In { field: &'static str, values: Vec<String> },
    Lt { field: &'static str, value: String },
}

impl Filter {
    /// Evaluate the filter against a document body.
    pub fn matches(&self, data: &Value) -> bool {
        let field_value = |field: &str| data.get(field).and_then(Value::as_str);
        match self {
            Filter::Eq { field, value } => field_value(field) == Some(value.as_str()),
            Filter::In { field, values } => {
                field_value(field).is_some_and(|v| values.iter().any(|candidate| candidate == v))
            }
            Filter::Lt { field, value } => field_value(field).is_some_and(|v| v < value.as_str()),
        }
    }
}

/// Collection query: optional filter plus optional limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Option<Filter>,
    pub limit: Option<u32>,
}

impl Query {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// How a set combines with an existing document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Overwrite the whole document.
    Replace,
    /// Deep-merge maps; fields absent from the write are retained.
    Merge,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Set {
        path: DocPath,
        data: Value,
        mode: WriteMode,
    },
    Delete {
        path: DocPath,
    },
}

/// All-or-nothing set of writes, applied by [`DocumentStore::commit`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: DocPath, data: Value) -> &mut Self {
        self.ops.push(WriteOp::Set {
            path,
            data,
            mode: WriteMode::Replace,
        });
        self
    }

    pub fn set_model<T: Serialize>(&mut self, path: DocPath, model: &T) -> Result<&mut Self> {
        let data = to_document(model)?;
        Ok(self.set(path, data))
    }

    pub fn delete(&mut self, path: DocPath) -> &mut Self {
        self.ops.push(WriteOp::Delete { path });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// Remote hierarchical document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>>;

    async fn set(&self, path: &DocPath, data: Value, mode: WriteMode) -> Result<()>;

    async fn delete(&self, path: &DocPath) -> Result<()>;

    /// Documents directly inside `collection`, ordered by document id.
    async fn list(&self, collection: &CollectionPath, query: Query) -> Result<Vec<Document>>;

    /// Documents in every collection named `collection_id`, at any depth.
    async fn collection_group(&self, collection_id: &str, query: Query) -> Result<Vec<Document>>;

    /// Apply every write in the batch, or none of them.
    async fn commit(&self, batch: WriteBatch) -> Result<()>;
}

/// Typed read helper over [`DocumentStore::get`].
pub async fn get_model<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    path: &DocPath,
) -> Result<Option<T>> {
    store.get(path).await?.map(Document::into_model).transpose()
}

/// Delete the given documents in atomic chunks of [`BATCH_SIZE`].
///
/// Returns the number of deletes committed.
pub async fn batch_delete(store: &dyn DocumentStore, paths: Vec<DocPath>) -> Result<usize> {
    let mut deleted = 0;
    for chunk in paths.chunks(BATCH_SIZE) {
        let mut batch = WriteBatch::new();
        for path in chunk {
            batch.delete(path.clone());
        }
        store.commit(batch).await?;
        deleted += chunk.len();
    }
    Ok(deleted)
}

/// Recursive map merge with Firestore `merge: true` semantics.
pub fn merge_value(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match existing.get_mut(&key) {
                    Some(slot) if slot.is_object() && value.is_object() => merge_value(slot, value),
                    _ => {
                        existing.insert(key, value);
                    }
                }
            }
        }
        (slot, patch) => *slot = patch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_retains_absent_fields() {
        let mut doc = json!({"scale": 0.7, "pan": {"x": 1, "y": 2}, "name": "a"});
        merge_value(&mut doc, json!({"pan": {"x": 5}, "name": "b"}));
        assert_eq!(doc, json!({"scale": 0.7, "pan": {"x": 5, "y": 2}, "name": "b"}));
    }

    #[test]
    fn merge_is_idempotent() {
        let patch = json!({"pan": {"x": 5}, "zoom": 2});
        let mut once = json!({"pan": {"y": 1}});
        merge_value(&mut once, patch.clone());
        let mut twice = once.clone();
        merge_value(&mut twice, patch);
        assert_eq!(once, twice);
    }

    #[test]
    fn filter_matching() {
        let doc = json!({"projectId": "p1", "expiresAt": "2026-01-01T00:00:00Z"});
        assert!(Filter::Eq {
            field: "projectId",
            value: "p1".to_string()
        }
        .matches(&doc));
        assert!(Filter::In {
            field: "projectId",
            values: vec!["p0".to_string(), "p1".to_string()]
        }
        .matches(&doc));
        assert!(Filter::Lt {
            field: "expiresAt",
            value: "2026-06-01T00:00:00Z".to_string()
        }
        .matches(&doc));
        assert!(!Filter::Eq {
            field: "missing",
            value: "p1".to_string()
        }
        .matches(&doc));
    }
}
