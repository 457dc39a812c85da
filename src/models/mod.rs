// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod canvas;
pub mod defaults;
pub mod invitation;
pub mod project;
pub mod settings;
pub mod user;

pub use canvas::{Canvas, Frame, FrameType, UserCanvas};
pub use invitation::{Invitation, InvitationWithInviter};
pub use project::{FullProject, NewProject, Project};
pub use settings::{UserSettings, UserSettingsDocument};
pub use user::{Member, ProjectRole, User, UserProject};

use validator::ValidationError;

/// Free-form document fields carried through untouched.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Reject ids that would escape their collection or that Firestore refuses.
pub fn validate_doc_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > 1500 || id.contains('/') || id == "." || id == ".." {
        return Err(ValidationError::new("invalid_document_id"));
    }
    if id.starts_with("__") && id.ends_with("__") {
        return Err(ValidationError::new("reserved_document_id"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_id_validation() {
        assert!(validate_doc_id("abc-123").is_ok());
        assert!(validate_doc_id("").is_err());
        assert!(validate_doc_id("a/b").is_err());
        assert!(validate_doc_id("..").is_err());
        assert!(validate_doc_id("__name__").is_err());
    }
}
