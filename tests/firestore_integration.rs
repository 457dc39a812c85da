// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running and
//! `FIRESTORE_EMULATOR_HOST` pointing at it; otherwise they are skipped.
//!
//! Every test works under a freshly generated project id, so runs do not
//! interfere with each other.

use serde_json::json;
use studio_api::db::{paths, DocumentStore, Filter, Query, WriteBatch, WriteMode};

mod common;
use common::test_db;

fn unique_id(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4())
}

#[tokio::test]
async fn test_merge_set_keeps_existing_fields() {
    require_emulator!();

    let db = test_db().await;
    let project_id = unique_id("p");
    let path = paths::project(&project_id);

    db.set(
        &path,
        json!({"id": project_id, "name": "Old", "meta": {"a": 1}}),
        WriteMode::Replace,
    )
    .await
    .unwrap();
    db.set(&path, json!({"name": "New", "meta": {"b": 2}}), WriteMode::Merge)
        .await
        .unwrap();

    let stored = db.get(&path).await.unwrap().unwrap();
    assert_eq!(stored.data["id"], project_id.as_str());
    assert_eq!(stored.data["name"], "New");
    assert_eq!(stored.data["meta"], json!({"a": 1, "b": 2}));

    db.delete(&path).await.unwrap();
    assert!(db.get(&path).await.unwrap().is_none());
}

#[tokio::test]
async fn test_batch_commit_and_nested_list() {
    require_emulator!();

    let db = test_db().await;
    let project_id = unique_id("p");

    let mut batch = WriteBatch::new();
    batch.set(paths::project(&project_id), json!({"id": project_id}));
    for canvas_id in ["c1", "c2"] {
        batch.set(
            paths::canvas(&project_id, canvas_id),
            json!({"id": canvas_id, "projectId": project_id}),
        );
    }
    db.commit(batch).await.unwrap();

    let canvases = db
        .list(&paths::canvases(&project_id), Query::all())
        .await
        .unwrap();
    let mut ids: Vec<_> = canvases.iter().map(|doc| doc.id().to_string()).collect();
    ids.sort();
    assert_eq!(ids, vec!["c1", "c2"]);

    let first = db
        .list(&paths::canvases(&project_id), Query::all().limit(1))
        .await
        .unwrap();
    assert_eq!(first.len(), 1);
}

#[tokio::test]
async fn test_membership_collection_group_query() {
    require_emulator!();

    let db = test_db().await;
    let project_id = unique_id("p");

    for user_id in ["u1", "u2"] {
        db.set(
            &paths::user_project(&unique_id(user_id), &project_id),
            json!({"projectId": project_id, "userId": user_id, "role": "member"}),
            WriteMode::Replace,
        )
        .await
        .unwrap();
    }

    let members = db
        .collection_group(
            "projects",
            Query::all().filter(Filter::Eq {
                field: "projectId",
                value: project_id.clone(),
            }),
        )
        .await
        .unwrap();

    assert_eq!(members.len(), 2);
    assert!(members.iter().all(|doc| paths::is_user_project(&doc.path)));
}

#[tokio::test]
async fn test_in_and_lt_filters() {
    require_emulator!();

    let db = test_db().await;
    let project_id = unique_id("p");

    for (id, expires_at) in [
        ("old", "2020-01-01T00:00:00Z"),
        ("new", "2999-01-01T00:00:00Z"),
    ] {
        db.set(
            &paths::invitation(&project_id, id),
            json!({"id": id, "projectId": project_id, "expiresAt": expires_at}),
            WriteMode::Replace,
        )
        .await
        .unwrap();
    }

    let expired = db
        .list(
            &paths::invitations(&project_id),
            Query::all().filter(Filter::Lt {
                field: "expiresAt",
                value: "2026-01-01T00:00:00Z".to_string(),
            }),
        )
        .await
        .unwrap();
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].id(), "old");

    let picked = db
        .list(
            &paths::invitations(&project_id),
            Query::all().filter(Filter::In {
                field: "id",
                values: vec!["new".to_string(), "missing".to_string()],
            }),
        )
        .await
        .unwrap();
    assert_eq!(picked.len(), 1);
    assert_eq!(picked[0].id(), "new");
}
