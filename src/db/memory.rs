//! In-process document store with the same semantics as Firestore.
//!
//! Used by tests and local runs without the emulator. Also supports fault
//! injection so failure paths can be exercised deterministically.

use super::{
    merge_value, CollectionPath, DocPath, Document, DocumentStore, Query, WriteBatch, WriteMode,
    WriteOp,
};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::RwLock;

/// In-memory [`DocumentStore`].
#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<BTreeMap<String, Value>>,
    fail_next_commit: AtomicBool,
    fail_writes: AtomicBool,
    query_log: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next batch commit fail without applying any write.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Make every single-document write fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Collections queried so far (`list` and `collection_group`), in order.
    pub fn queries(&self) -> Vec<String> {
        self.query_log
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    /// All stored document paths, sorted.
    pub async fn paths(&self) -> Vec<String> {
        self.docs.read().await.keys().cloned().collect()
    }

    pub async fn contains(&self, path: &DocPath) -> bool {
        self.docs.read().await.contains_key(path.as_str())
    }

    fn record_query(&self, target: String) {
        if let Ok(mut log) = self.query_log.lock() {
            log.push(target);
        }
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Database("injected write failure".to_string()));
        }
        Ok(())
    }

    fn apply(docs: &mut BTreeMap<String, Value>, op: WriteOp) {
        match op {
            WriteOp::Set {
                path,
                data,
                mode: WriteMode::Replace,
            } => {
                docs.insert(path.as_str().to_string(), data);
            }
            WriteOp::Set {
                path,
                data,
                mode: WriteMode::Merge,
            } => {
                let slot = docs
                    .entry(path.as_str().to_string())
                    .or_insert_with(|| Value::Object(Default::default()));
                merge_value(slot, data);
            }
            WriteOp::Delete { path } => {
                docs.remove(path.as_str());
            }
        }
    }

    fn select(
        docs: &BTreeMap<String, Value>,
        query: &Query,
        mut include: impl FnMut(&DocPath) -> bool,
    ) -> Vec<Document> {
        let matching = docs.iter().filter_map(|(raw, data)| {
            let path = DocPath::parse(raw)?;
            if !include(&path) {
                return None;
            }
            if let Some(filter) = &query.filter {
                if !filter.matches(data) {
                    return None;
                }
            }
            Some(Document {
                path,
                data: data.clone(),
            })
        });

        match query.limit {
            Some(limit) => matching.take(limit as usize).collect(),
            None => matching.collect(),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>> {
        let docs = self.docs.read().await;
        Ok(docs.get(path.as_str()).map(|data| Document {
            path: path.clone(),
            data: data.clone(),
        }))
    }

    async fn set(&self, path: &DocPath, data: Value, mode: WriteMode) -> Result<()> {
        self.check_writable()?;
        let mut docs = self.docs.write().await;
        Self::apply(
            &mut docs,
            WriteOp::Set {
                path: path.clone(),
                data,
                mode,
            },
        );
        Ok(())
    }

    async fn delete(&self, path: &DocPath) -> Result<()> {
        self.check_writable()?;
        self.docs.write().await.remove(path.as_str());
        Ok(())
    }

    async fn list(&self, collection: &CollectionPath, query: Query) -> Result<Vec<Document>> {
        self.record_query(collection.to_string());
        let docs = self.docs.read().await;
        Ok(Self::select(&docs, &query, |path| {
            path.parent() == *collection
        }))
    }

    async fn collection_group(&self, collection_id: &str, query: Query) -> Result<Vec<Document>> {
        self.record_query(format!("*/{}", collection_id));
        let docs = self.docs.read().await;
        Ok(Self::select(&docs, &query, |path| {
            path.parent().name() == collection_id
        }))
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(AppError::Database("injected commit failure".to_string()));
        }
        self.check_writable()?;

        // One write guard for the whole batch keeps it all-or-nothing.
        let mut docs = self.docs.write().await;
        for op in batch.into_ops() {
            Self::apply(&mut docs, op);
        }
        Ok(())
    }
}
