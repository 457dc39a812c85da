// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed [`DocumentStore`].
//!
//! Paths are translated into the fluent API's `(parent, collection, id)`
//! triples. Batches are committed through a Firestore transaction so every
//! write lands or none does.

use super::{
    CollectionPath, DocPath, Document, DocumentStore, Filter, Query, WriteBatch, WriteMode,
    WriteOp,
};
use crate::error::{AppError, Result};
use ::firestore::{FirestoreDb, FirestoreDbOptions, FirestoreDocument, FirestoreTransaction};
use async_trait::async_trait;
use serde_json::Value;

const DOCUMENTS_MARKER: &str = "/documents/";

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreStore {
    client: FirestoreDb,
}

fn db_err(e: impl std::fmt::Display) -> AppError {
    AppError::Database(e.to_string())
}

impl FirestoreStore {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = FirestoreDbOptions::new(project_id.to_string());

        let client = FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    /// Fully-qualified parent for documents in `collection`.
    fn parent_of(&self, collection: &CollectionPath) -> Result<String> {
        let Some(owner) = collection.parent() else {
            return Ok(self.client.get_documents_path().to_string());
        };

        let segments: Vec<&str> = owner.segments().collect();
        let mut pairs = segments.chunks(2);
        let first = pairs
            .next()
            .ok_or_else(|| AppError::Database(format!("Invalid parent path: {}", owner)))?;

        let mut builder = self
            .client
            .parent_path(first[0], first[1])
            .map_err(db_err)?;
        for pair in pairs {
            builder = builder.at(pair[0], pair[1]).map_err(db_err)?;
        }

        Ok(AsRef::<str>::as_ref(&builder).to_string())
    }

    /// Convert a raw Firestore document into a path-addressed [`Document`].
    fn convert(doc: &FirestoreDocument) -> Result<Document> {
        let relative = doc
            .name
            .split_once(DOCUMENTS_MARKER)
            .map(|(_, rest)| rest)
            .unwrap_or(doc.name.as_str());

        let path = DocPath::parse(relative)
            .ok_or_else(|| AppError::Database(format!("Unexpected document name: {}", doc.name)))?;

        let data: Value = FirestoreDb::deserialize_doc_to(doc).map_err(db_err)?;

        Ok(Document { path, data })
    }

    async fn run_query(
        &self,
        collection_id: &str,
        parent: String,
        all_descendants: bool,
        query: Query,
    ) -> Result<Vec<Document>> {
        let mut select = self
            .client
            .fluent()
            .select()
            .from(collection_id)
            .parent(parent);

        if all_descendants {
            select = select.all_descendants();
        }

        select = match query.filter {
            Some(Filter::Eq { field, value }) => select.filter(move |q| q.field(field).eq(value.clone())),
            Some(Filter::In { field, values }) => {
                select.filter(move |q| q.field(field).is_in(values.clone()))
            }
            Some(Filter::Lt { field, value }) => {
                select.filter(move |q| q.field(field).less_than(value.clone()))
            }
            None => select,
        };

        if let Some(limit) = query.limit {
            select = select.limit(limit);
        }

        let docs: Vec<FirestoreDocument> = select.query().await.map_err(db_err)?;
        docs.iter().map(Self::convert).collect()
    }

    /// Field mask for a merge: every leaf path of `data`, dot-joined.
    fn merge_fields(data: &Value) -> Vec<String> {
        fn walk(prefix: &str, value: &Value, out: &mut Vec<String>) {
            match value {
                Value::Object(map) if !map.is_empty() => {
                    for (key, child) in map {
                        let segment = quote_segment(key);
                        let path = if prefix.is_empty() {
                            segment
                        } else {
                            format!("{}.{}", prefix, segment)
                        };
                        walk(&path, child, out);
                    }
                }
                _ => out.push(prefix.to_string()),
            }
        }

        let mut out = Vec::new();
        walk("", data, &mut out);
        out.retain(|field| !field.is_empty());
        out
    }

    fn add_to_transaction(
        &self,
        op: WriteOp,
        transaction: &mut FirestoreTransaction<'_>,
    ) -> Result<()> {
        match op {
            WriteOp::Set { path, data, mode } => {
                let collection = path.parent();
                let parent = self.parent_of(&collection)?;
                let update = self.client.fluent().update();
                let update = match mode {
                    WriteMode::Replace => update,
                    WriteMode::Merge => update.fields(Self::merge_fields(&data)),
                };
                update
                    .in_col(collection.name())
                    .document_id(path.id())
                    .parent(parent)
                    .object(&data)
                    .add_to_transaction(transaction)
                    .map_err(|e| {
                        AppError::Database(format!("Failed to add {} to transaction: {}", path, e))
                    })?;
            }
            WriteOp::Delete { path } => {
                let collection = path.parent();
                let parent = self.parent_of(&collection)?;
                self.client
                    .fluent()
                    .delete()
                    .from(collection.name())
                    .document_id(path.id())
                    .parent(parent)
                    .add_to_transaction(transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion of {} to transaction: {}",
                            path, e
                        ))
                    })?;
            }
        }
        Ok(())
    }
}

/// Backtick-quote a field path segment unless it is a simple identifier.
fn quote_segment(key: &str) -> String {
    let simple = key
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        key.to_string()
    } else {
        format!("`{}`", key.replace('`', "\\`"))
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>> {
        let collection = path.parent();
        let parent = self.parent_of(&collection)?;

        let data: Option<Value> = self
            .client
            .fluent()
            .select()
            .by_id_in(collection.name())
            .parent(parent)
            .obj()
            .one(path.id())
            .await
            .map_err(db_err)?;

        Ok(data.map(|data| Document {
            path: path.clone(),
            data,
        }))
    }

    async fn set(&self, path: &DocPath, data: Value, mode: WriteMode) -> Result<()> {
        let collection = path.parent();
        let parent = self.parent_of(&collection)?;

        let update = self.client.fluent().update();
        let update = match mode {
            WriteMode::Replace => update,
            WriteMode::Merge => update.fields(Self::merge_fields(&data)),
        };

        let _: Value = update
            .in_col(collection.name())
            .document_id(path.id())
            .parent(parent)
            .object(&data)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn delete(&self, path: &DocPath) -> Result<()> {
        let collection = path.parent();
        let parent = self.parent_of(&collection)?;

        self.client
            .fluent()
            .delete()
            .from(collection.name())
            .document_id(path.id())
            .parent(parent)
            .execute()
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn list(&self, collection: &CollectionPath, query: Query) -> Result<Vec<Document>> {
        let parent = self.parent_of(collection)?;
        self.run_query(collection.name(), parent, false, query).await
    }

    async fn collection_group(&self, collection_id: &str, query: Query) -> Result<Vec<Document>> {
        let parent = self.client.get_documents_path().to_string();
        self.run_query(collection_id, parent, true, query).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let writes = batch.len();

        let mut transaction = self
            .client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        for op in batch.into_ops() {
            self.add_to_transaction(op, &mut transaction)?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::debug!(writes, "Batch committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_fields_lists_leaves() {
        let mut fields = FirestoreStore::merge_fields(
            &json!({"scale": 1, "pan": {"x": 1, "y": 2}, "tags": {}, "build-flags": "x"}),
        );
        fields.sort();
        assert_eq!(fields, vec!["`build-flags`", "pan.x", "pan.y", "scale", "tags"]);
    }
}
