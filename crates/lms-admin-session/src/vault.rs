//! The session vault: typed access to the three persisted session fields.
//!
//! A [`SessionStore`] deals in raw strings under arbitrary keys. The vault
//! sits on top and knows what those strings mean:
//!
//! ```text
//! adminToken         → access token      (String)
//! adminRefreshToken  → refresh token     (String)
//! adminUser          → cached AdminUser  (JSON)
//! ```
//!
//! Every read goes straight to the store. The vault keeps no copy of its
//! own, so two clients sharing a store always agree on the session.

use std::sync::Arc;

use lms_admin_protocol::AdminUser;
use tracing::{debug, warn};

use crate::{AuthSession, SessionError, SessionStore, StorageKeys};

/// Typed view over a [`SessionStore`].
#[derive(Clone)]
pub struct SessionVault {
    store: Arc<dyn SessionStore>,
    keys: StorageKeys,
}

impl SessionVault {
    pub fn new(store: Arc<dyn SessionStore>, keys: StorageKeys) -> Self {
        Self { store, keys }
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// The current access token. Empty strings count as absent.
    pub fn access_token(&self) -> Option<String> {
        self.load_nonempty(&self.keys.access_token)
    }

    /// The current refresh token. Empty strings count as absent.
    pub fn refresh_token(&self) -> Option<String> {
        self.load_nonempty(&self.keys.refresh_token)
    }

    /// The cached user.
    ///
    /// A stored value that isn't a valid user (hand-edited file, older
    /// format) reads as absent rather than failing the caller.
    pub fn user(&self) -> Option<AdminUser> {
        let raw = self.store.load(&self.keys.user)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "cached user is not valid JSON, treating as absent");
                None
            }
        }
    }

    /// All three fields, if all three are present.
    pub fn session(&self) -> Option<AuthSession> {
        Some(AuthSession {
            access_token: self.access_token()?,
            refresh_token: self.refresh_token()?,
            user: self.user()?,
        })
    }

    /// `true` iff both an access token and a cached user are present.
    ///
    /// The token is not validated: an expired token still counts until a
    /// request proves otherwise.
    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some() && self.user().is_some()
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Persists a whole session in one batch.
    pub fn save(&self, session: &AuthSession) -> Result<(), SessionError> {
        let user = serde_json::to_string(&session.user)?;
        self.store.store_many(&[
            (self.keys.access_token.as_str(), session.access_token.clone()),
            (self.keys.refresh_token.as_str(), session.refresh_token.clone()),
            (self.keys.user.as_str(), user),
        ])?;
        debug!(user_id = %session.user.id, "session saved");
        Ok(())
    }

    /// Persists the result of a token refresh in one batch.
    ///
    /// The refresh token is only replaced when the server rotated it;
    /// otherwise the existing one stays.
    pub fn apply_refresh(
        &self,
        access_token: &str,
        user: &AdminUser,
        refresh_token: Option<&str>,
    ) -> Result<(), SessionError> {
        let user_json = serde_json::to_string(user)?;
        let mut entries = vec![
            (self.keys.access_token.as_str(), access_token.to_string()),
            (self.keys.user.as_str(), user_json),
        ];
        if let Some(refresh) = refresh_token.filter(|t| !t.is_empty()) {
            entries.push((self.keys.refresh_token.as_str(), refresh.to_string()));
        }
        self.store.store_many(&entries)?;
        debug!(user_id = %user.id, rotated = refresh_token.is_some(), "session refreshed");
        Ok(())
    }

    /// Replaces only the cached user (after a profile update).
    pub fn set_user(&self, user: &AdminUser) -> Result<(), SessionError> {
        let json = serde_json::to_string(user)?;
        self.store.store_many(&[(self.keys.user.as_str(), json)])
    }

    /// Removes all three fields.
    ///
    /// Best-effort: a failed removal is logged and otherwise ignored, since
    /// a local logout must always complete.
    pub fn clear(&self) {
        let keys = [
            self.keys.access_token.as_str(),
            self.keys.refresh_token.as_str(),
            self.keys.user.as_str(),
        ];
        match self.store.remove_many(&keys) {
            Ok(()) => debug!("session cleared"),
            Err(e) => warn!(error = %e, "failed to clear session storage"),
        }
    }

    fn load_nonempty(&self, key: &str) -> Option<String> {
        self.store.load(key).filter(|v| !v.is_empty())
    }
}
