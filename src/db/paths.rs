//! Document and collection paths.
//!
//! These are the only places collection names are combined into paths; the
//! layout is shared with other clients of the same database and must not
//! drift.

use super::collections;
use std::fmt;

/// Slash-separated path to a collection (odd number of segments).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath(String);

/// Slash-separated path to a document (even number of segments).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath(String);

impl CollectionPath {
    pub fn root(name: &str) -> Self {
        Self(name.to_string())
    }

    pub fn doc(&self, id: &str) -> DocPath {
        DocPath(format!("{}/{}", self.0, id))
    }

    /// Last segment, i.e. the collection id.
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Owning document, `None` for top-level collections.
    pub fn parent(&self) -> Option<DocPath> {
        self.0
            .rsplit_once('/')
            .map(|(parent, _)| DocPath(parent.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl DocPath {
    /// Parse a relative document path such as `users/u1/projects/p1`.
    pub fn parse(raw: &str) -> Option<Self> {
        let segments: Vec<&str> = raw.split('/').collect();
        if segments.len() % 2 != 0 || segments.iter().any(|s| s.is_empty()) {
            return None;
        }
        Some(Self(raw.to_string()))
    }

    pub fn id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    pub fn collection(&self, name: &str) -> CollectionPath {
        CollectionPath(format!("{}/{}", self.0, name))
    }

    pub fn parent(&self) -> CollectionPath {
        match self.0.rsplit_once('/') {
            Some((parent, _)) => CollectionPath(parent.to_string()),
            None => CollectionPath(String::new()),
        }
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── Users ───────────────────────────────────────────────────

pub fn users() -> CollectionPath {
    CollectionPath::root(collections::USERS)
}

pub fn user(user_id: &str) -> DocPath {
    users().doc(user_id)
}

pub fn user_projects(user_id: &str) -> CollectionPath {
    user(user_id).collection(collections::USER_PROJECTS)
}

pub fn user_project(user_id: &str, project_id: &str) -> DocPath {
    user_projects(user_id).doc(project_id)
}

pub fn user_settings(user_id: &str) -> DocPath {
    CollectionPath::root(collections::USER_SETTINGS).doc(user_id)
}

// ─── Projects ────────────────────────────────────────────────

pub fn projects() -> CollectionPath {
    CollectionPath::root(collections::PROJECTS)
}

pub fn project(project_id: &str) -> DocPath {
    projects().doc(project_id)
}

pub fn canvases(project_id: &str) -> CollectionPath {
    project(project_id).collection(collections::CANVAS)
}

pub fn canvas(project_id: &str, canvas_id: &str) -> DocPath {
    canvases(project_id).doc(canvas_id)
}

pub fn frames(project_id: &str, canvas_id: &str) -> CollectionPath {
    canvas(project_id, canvas_id).collection(collections::FRAMES)
}

pub fn frame(project_id: &str, canvas_id: &str, frame_id: &str) -> DocPath {
    frames(project_id, canvas_id).doc(frame_id)
}

pub fn user_canvases(project_id: &str, canvas_id: &str) -> CollectionPath {
    canvas(project_id, canvas_id).collection(collections::USER_CANVASES)
}

pub fn user_canvas(project_id: &str, canvas_id: &str, user_id: &str) -> DocPath {
    user_canvases(project_id, canvas_id).doc(user_id)
}

pub fn invitations(project_id: &str) -> CollectionPath {
    project(project_id).collection(collections::INVITATIONS)
}

pub fn invitation(project_id: &str, invitation_id: &str) -> DocPath {
    invitations(project_id).doc(invitation_id)
}

/// Whether `path` is a membership record, i.e. `users/{uid}/projects/{pid}`.
pub fn is_user_project(path: &DocPath) -> bool {
    let segments: Vec<&str> = path.segments().collect();
    segments.len() == 4
        && segments[0] == collections::USERS
        && segments[2] == collections::USER_PROJECTS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_match_collection_layout() {
        assert_eq!(user_project("u1", "p1").as_str(), "users/u1/projects/p1");
        assert_eq!(canvases("p1").as_str(), "projects/p1/canvas");
        assert_eq!(
            frame("p1", "c1", "f1").as_str(),
            "projects/p1/canvas/c1/frames/f1"
        );
        assert_eq!(
            user_canvas("p1", "c1", "u1").as_str(),
            "projects/p1/canvas/c1/userCanvases/u1"
        );
        assert_eq!(invitation("p1", "i1").as_str(), "projects/p1/invitations/i1");
        assert_eq!(user_settings("u1").as_str(), "userSettings/u1");
    }

    #[test]
    fn path_navigation() {
        let doc = canvas("p1", "c1");
        assert_eq!(doc.id(), "c1");
        assert_eq!(doc.parent(), canvases("p1"));
        assert_eq!(doc.parent().name(), "canvas");
        assert_eq!(doc.parent().parent(), Some(project("p1")));
        assert_eq!(projects().parent(), None);
    }

    #[test]
    fn user_project_detection() {
        assert!(is_user_project(&user_project("u1", "p1")));
        assert!(!is_user_project(&project("p1")));
        assert!(!is_user_project(&canvas("p1", "c1")));
    }

    #[test]
    fn parse_rejects_collection_paths() {
        assert!(DocPath::parse("users/u1").is_some());
        assert!(DocPath::parse("users").is_none());
        assert!(DocPath::parse("users//projects/p1").is_none());
    }
}
