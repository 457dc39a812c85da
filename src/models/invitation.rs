//! Invitation model.

use super::{ProjectRole, User};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Days an invitation stays valid.
pub const INVITATION_TTL_DAYS: i64 = 7;

/// Pending membership grant, stored at `projects/{projectId}/invitations/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: String,
    pub project_id: String,
    pub invitee_email: String,
    pub role: ProjectRole,
    /// Opaque secret carried by the invitation link
    pub token: String,
    pub inviter_id: String,
    /// Expiry (RFC 3339, `Z` suffix)
    pub expires_at: String,
}

impl Invitation {
    /// Whether the invitation is past its expiry at `now`.
    ///
    /// An unparseable expiry counts as expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match DateTime::parse_from_rfc3339(&self.expires_at) {
            Ok(expires_at) => now > expires_at.with_timezone(&Utc),
            Err(_) => true,
        }
    }
}

/// Invitation with the inviter's user record inlined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvitationWithInviter {
    #[serde(flatten)]
    pub invitation: Invitation,
    pub inviter: Option<User>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invitation(expires_at: &str) -> Invitation {
        Invitation {
            id: "i1".to_string(),
            project_id: "p1".to_string(),
            invitee_email: "guest@example.com".to_string(),
            role: ProjectRole::Member,
            token: "t".to_string(),
            inviter_id: "u1".to_string(),
            expires_at: expires_at.to_string(),
        }
    }

    #[test]
    fn expiry_check() {
        let now = DateTime::parse_from_rfc3339("2026-03-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert!(invitation("2026-02-28T23:59:59Z").is_expired(now));
        assert!(!invitation("2026-03-08T00:00:00Z").is_expired(now));
        assert!(invitation("not a date").is_expired(now));
    }
}
