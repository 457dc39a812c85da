// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Project model for storage and API.

use super::{Canvas, Fields, Frame, UserCanvas};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Fields the server owns on a project document.
pub const RESERVED_PROJECT_FIELDS: [&str; 3] = ["id", "createdAt", "updatedAt"];

/// Top-level workspace, stored at `projects/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Document ID
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Sandbox the first frame was seeded from
    #[serde(default)]
    pub sandbox_url: String,
    /// Creation time (RFC 3339)
    #[serde(default)]
    pub created_at: String,
    /// Last update time (RFC 3339)
    #[serde(default)]
    pub updated_at: String,
    /// Client-defined fields
    #[serde(flatten)]
    pub extra: Fields,
}

/// Project as submitted for creation.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(url)]
    pub sandbox_url: String,
    #[serde(flatten)]
    pub extra: Fields,
}

impl NewProject {
    /// Materialize the stored project under a freshly generated id.
    pub fn into_project(self, id: String, now: &str) -> Project {
        let mut extra = self.extra;
        for field in RESERVED_PROJECT_FIELDS {
            extra.remove(field);
        }

        Project {
            id,
            name: self.name,
            sandbox_url: self.sandbox_url,
            created_at: now.to_string(),
            updated_at: now.to_string(),
            extra,
        }
    }
}

/// Everything the editor needs to open a project.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullProject {
    pub project: Project,
    pub canvas: Canvas,
    pub user_canvas: UserCanvas,
    pub frames: Vec<Frame>,
}
