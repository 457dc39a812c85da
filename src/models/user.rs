//! User and membership models.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// User identity record, stored at `users/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Role a user holds on a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum ProjectRole {
    Owner,
    Admin,
    Member,
}

impl ProjectRole {
    fn rank(self) -> u8 {
        match self {
            ProjectRole::Owner => 3,
            ProjectRole::Admin => 2,
            ProjectRole::Member => 1,
        }
    }

    /// Whether this role grants at least the privileges of `required`.
    pub fn at_least(self, required: ProjectRole) -> bool {
        self.rank() >= required.rank()
    }
}

/// Membership join record, stored at `users/{userId}/projects/{projectId}`.
///
/// Its existence is the only membership signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct UserProject {
    pub role: ProjectRole,
    pub project_id: String,
    pub user_id: String,
}

impl UserProject {
    pub fn new(user_id: &str, project_id: &str, role: ProjectRole) -> Self {
        Self {
            role,
            project_id: project_id.to_string(),
            user_id: user_id.to_string(),
        }
    }
}

/// Membership joined with the member's user record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Member {
    #[serde(flatten)]
    pub membership: UserProject,
    pub user: Option<User>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ordering() {
        assert!(ProjectRole::Owner.at_least(ProjectRole::Admin));
        assert!(ProjectRole::Admin.at_least(ProjectRole::Member));
        assert!(!ProjectRole::Member.at_least(ProjectRole::Admin));
        assert!(!ProjectRole::Admin.at_least(ProjectRole::Owner));
    }

    #[test]
    fn user_project_wire_shape() {
        let record = UserProject::new("u1", "p1", ProjectRole::Owner);
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            serde_json::json!({"role": "owner", "projectId": "p1", "userId": "u1"})
        );
    }
}
