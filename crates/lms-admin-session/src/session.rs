//! Session types: the data that represents "who is signed in".
//!
//! A session is the client's record of an authenticated administrator:
//! - HOW to call the API right now (the short-lived access token)
//! - HOW to get a new access token (the longer-lived refresh token)
//! - WHO is signed in (a cached copy of their public profile)

use std::fmt;

use lms_admin_protocol::{AdminUser, LoginResponse};

// ---------------------------------------------------------------------------
// StorageKeys
// ---------------------------------------------------------------------------

/// The keys under which the three session fields are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub access_token: String,
    pub refresh_token: String,
    pub user: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            access_token: "adminToken".to_string(),
            refresh_token: "adminRefreshToken".to_string(),
            user: "adminUser".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Where the client is in the session lifecycle.
///
/// ```text
///                  login
///  Unauthenticated ─────→ Authenticated ──(401)──→ Refreshing
///        ↑                  │      ↑                  │
///        └──── logout ──────┘      └── token changed ─┤
///        ↑                                            │
///        └──────── refresh failed / token unchanged ──┘
/// ```
///
/// `Unauthenticated` is terminal for a given login; a new login starts a
/// fresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
    Refreshing,
}

impl SessionState {
    /// Returns `true` if moving from `self` to `target` is a legal edge.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Unauthenticated, Self::Authenticated)
                | (Self::Authenticated, Self::Refreshing)
                | (Self::Authenticated, Self::Unauthenticated)
                | (Self::Refreshing, Self::Authenticated)
                | (Self::Refreshing, Self::Unauthenticated)
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "Unauthenticated"),
            Self::Authenticated => write!(f, "Authenticated"),
            Self::Refreshing => write!(f, "Refreshing"),
        }
    }
}

// ---------------------------------------------------------------------------
// AuthSession
// ---------------------------------------------------------------------------

/// A complete session: both tokens plus the cached user.
///
/// A session is either fully present or fully absent. There is no way to
/// build an `AuthSession` with a missing field, and the vault writes all
/// three fields in a single batch.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user: AdminUser,
}

impl From<LoginResponse> for AuthSession {
    fn from(login: LoginResponse) -> Self {
        Self {
            access_token: login.access_token,
            refresh_token: login.refresh_token,
            user: login.user,
        }
    }
}

/// Tokens are credentials: keep them out of `{:?}` output and logs.
impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("user", &self.user.id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> AdminUser {
        AdminUser {
            id: "1".into(),
            name: "Admin".into(),
            email: "admin@lms.com".into(),
            phone: None,
            role: "ADMIN".into(),
            verified: true,
            last_login: None,
            created_at: None,
        }
    }

    #[test]
    fn test_storage_keys_default_names() {
        let keys = StorageKeys::default();
        assert_eq!(keys.access_token, "adminToken");
        assert_eq!(keys.refresh_token, "adminRefreshToken");
        assert_eq!(keys.user, "adminUser");
    }

    #[test]
    fn test_session_state_legal_transitions() {
        use SessionState::*;
        assert!(Unauthenticated.can_transition_to(Authenticated));
        assert!(Authenticated.can_transition_to(Refreshing));
        assert!(Refreshing.can_transition_to(Authenticated));
        assert!(Refreshing.can_transition_to(Unauthenticated));
        assert!(Authenticated.can_transition_to(Unauthenticated));
    }

    #[test]
    fn test_session_state_illegal_transitions() {
        use SessionState::*;
        assert!(!Unauthenticated.can_transition_to(Refreshing));
        assert!(!Unauthenticated.can_transition_to(Unauthenticated));
        assert!(!Refreshing.can_transition_to(Refreshing));
    }

    #[test]
    fn test_session_state_display() {
        assert_eq!(SessionState::Refreshing.to_string(), "Refreshing");
    }

    #[test]
    fn test_auth_session_from_login_response() {
        let session = AuthSession::from(LoginResponse {
            user: user(),
            access_token: "A1".into(),
            refresh_token: "R1".into(),
            expires_at: "2024-01-01T01:00:00Z".into(),
        });
        assert_eq!(session.access_token, "A1");
        assert_eq!(session.refresh_token, "R1");
        assert_eq!(session.user, user());
    }

    #[test]
    fn test_auth_session_debug_redacts_tokens() {
        let session = AuthSession {
            access_token: "secret-access".into(),
            refresh_token: "secret-refresh".into(),
            user: user(),
        };
        let printed = format!("{session:?}");
        assert!(!printed.contains("secret-access"));
        assert!(!printed.contains("secret-refresh"));
        assert!(printed.contains("redacted"));
    }
}
