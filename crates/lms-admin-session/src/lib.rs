//! Session state for the LMS admin client.
//!
//! This crate owns everything about "who is signed in" that doesn't involve
//! talking to the network:
//!
//! 1. **Session data** ([`AuthSession`], [`SessionState`]): the tokens, the
//!    cached user, and the lifecycle they move through
//! 2. **Persistence** ([`SessionStore`] trait, [`SessionVault`]): where the
//!    session lives between requests and between runs
//! 3. **Navigation** ([`Navigator`] trait): how a forced logout reaches the
//!    user interface
//!
//! # How it fits in the stack
//!
//! ```text
//! Session client (above)  ← reads tokens, saves refreshed ones, clears on failure
//!     ↕
//! Session layer (this crate)  ← typed session fields over a pluggable store
//!     ↕
//! Protocol layer (below)  ← provides AdminUser, LoginResponse
//! ```

mod error;
mod navigate;
mod session;
mod store;
mod vault;

pub use error::SessionError;
pub use navigate::{Navigator, NoopNavigator};
pub use session::{AuthSession, SessionState, StorageKeys};
pub use store::{FileStore, MemoryStore, NoopStore, SessionStore};
pub use vault::SessionVault;
