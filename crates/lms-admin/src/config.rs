//! Client configuration.
//!
//! Everything has a default that matches a local development backend, so
//! `ClientConfig::default()` works out of the box against
//! `http://localhost:5000`. Production deployments usually only set the
//! API URL, via code or the environment:
//!
//! | Variable                 | Meaning                                   |
//! |--------------------------|-------------------------------------------|
//! | `LMS_ADMIN_API_URL`      | API root, without the `/admin` suffix     |
//! | `LMS_ADMIN_TIMEOUT_SECS` | Per-request timeout in whole seconds      |

use std::time::Duration;

use lms_admin_refresh::RefreshConfig;
use lms_admin_session::StorageKeys;
use tracing::warn;

/// API root used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api/v1";

/// Path segment appended to the API root to reach the admin API.
pub const ADMIN_SEGMENT: &str = "/admin";

pub const ENV_API_URL: &str = "LMS_ADMIN_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "LMS_ADMIN_TIMEOUT_SECS";

/// Full configuration for a [`SessionClient`](crate::SessionClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Admin API base. Endpoint paths (`/auth/login`, ...) are appended.
    pub base_url: String,
    /// Per-request timeout enforced by the transport.
    pub timeout: Duration,
    /// Route handed to the navigator on a forced logout.
    pub login_route: String,
    /// Where the session fields are persisted.
    pub storage_keys: StorageKeys,
    /// Background refresh cadence.
    pub refresh: RefreshConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: format!("{DEFAULT_API_URL}{ADMIN_SEGMENT}"),
            timeout: Self::DEFAULT_TIMEOUT,
            login_route: Self::DEFAULT_LOGIN_ROUTE.to_string(),
            storage_keys: StorageKeys::default(),
            refresh: RefreshConfig::default(),
        }
    }
}

impl ClientConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_LOGIN_ROUTE: &'static str = "/admin/login";

    /// A default config pointed at a different API root.
    ///
    /// `api_url` is the root (`https://lms.example.com/api/v1`); the admin
    /// segment is appended.
    pub fn with_api_url(api_url: &str) -> Self {
        Self {
            base_url: format!("{}{ADMIN_SEGMENT}", api_url.trim_end_matches('/')),
            ..Default::default()
        }
    }

    /// Reads overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads overrides through `lookup` instead of the real environment.
    ///
    /// Unset or empty variables keep their defaults. A timeout that isn't a
    /// whole number of seconds is logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = match lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            Some(url) => Self::with_api_url(url.trim()),
            None => Self::default(),
        };

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS).filter(|v| !v.trim().is_empty()) {
            match raw.trim().parse::<u64>() {
                Ok(secs) => config.timeout = Duration::from_secs(secs),
                Err(e) => warn!(
                    var = ENV_TIMEOUT_SECS,
                    value = %raw,
                    error = %e,
                    "ignoring invalid timeout"
                ),
            }
        }

        config
    }

    /// Clamp and fix any out-of-range values so the config is safe to use.
    ///
    /// Called automatically when the client is built. Rules:
    /// - Trailing slashes are stripped from `base_url`.
    /// - A zero timeout falls back to [`Self::DEFAULT_TIMEOUT`].
    /// - An empty login route falls back to [`Self::DEFAULT_LOGIN_ROUTE`].
    /// - The refresh config is validated (interval below token lifetime).
    pub fn validated(mut self) -> Self {
        let trimmed = self.base_url.trim_end_matches('/');
        if trimmed.len() != self.base_url.len() {
            self.base_url = trimmed.to_string();
        }
        if self.timeout.is_zero() {
            warn!(default_secs = Self::DEFAULT_TIMEOUT.as_secs(), "zero timeout, using default");
            self.timeout = Self::DEFAULT_TIMEOUT;
        }
        if self.login_route.is_empty() {
            self.login_route = Self::DEFAULT_LOGIN_ROUTE.to_string();
        }
        self.refresh = self.refresh.validated();
        self
    }

    /// Absolute URL for an endpoint path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
