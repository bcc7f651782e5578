//! # LMS Admin
//!
//! Session-aware client for the LMS administration API.
//!
//! The crate hides token handling from the code that talks to the backend:
//! sign in once, then call endpoints. Expired access tokens are refreshed
//! and the call retried transparently; a session that can't be refreshed ends
//! in a clean local logout and a redirect to the login screen.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lms_admin::prelude::*;
//!
//! # async fn run() -> Result<(), ClientError> {
//! let client = SessionClient::builder()
//!     .config(ClientConfig::from_env())
//!     .store(std::sync::Arc::new(MemoryStore::new()))
//!     .build_default()?;
//! client.initialize();
//!
//! client.login(&LoginCredentials::new("admin@lms.com", "admin123")).await?;
//! let teachers = client.list_users(&UserQuery::default().role(Role::Teacher)).await?;
//! println!("{} teachers", teachers.data.map_or(0, |d| d.pagination.total_count));
//! client.logout().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Layers
//!
//! ```text
//! lms-admin            ← SessionClient: login, refresh-and-retry, typed endpoints
//!   ├ lms-admin-refresh    ← background refresh timer
//!   ├ lms-admin-session    ← tokens, storage, navigation
//!   ├ lms-admin-protocol   ← envelope, request/response bodies, paths
//!   └ lms-admin-transport  ← HTTP
//! ```

mod client;
mod config;
mod error;
mod users;

pub use client::{RequestOptions, SessionClient, SessionClientBuilder};
pub use config::{ADMIN_SEGMENT, ClientConfig, DEFAULT_API_URL, ENV_API_URL, ENV_TIMEOUT_SECS};
pub use error::ClientError;

pub use lms_admin_protocol as protocol;
pub use lms_admin_refresh as refresh;
pub use lms_admin_session as session;
pub use lms_admin_transport as transport;

/// Everything an application usually needs, in one import.
pub mod prelude {
    pub use crate::{ClientConfig, ClientError, RequestOptions, SessionClient};
    pub use lms_admin_protocol::{
        AdminUser, ApiResponse, BlockUser, ChangePassword, LoginCredentials, NewStudent,
        NewTeacher, Role, UpdateProfile, UserQuery, UserUpdate,
    };
    pub use lms_admin_session::{
        AuthSession, FileStore, MemoryStore, Navigator, NoopNavigator, SessionState, SessionStore,
    };
    pub use lms_admin_transport::Transport;
}
