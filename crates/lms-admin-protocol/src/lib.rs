//! Wire protocol for the LMS admin API.
//!
//! This crate defines the "language" the client and the backend speak:
//!
//! - **Envelope** ([`ApiResponse`]): the `{success, message, data, error}`
//!   wrapper around every response.
//! - **Types** ([`LoginCredentials`], [`AdminUser`], [`UserList`], etc.):
//!   the request and response bodies.
//! - **Endpoints** ([`endpoint`]): the paths those bodies travel on.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how bodies become bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong while encoding or
//!   decoding.
//!
//! # Architecture
//!
//! ```text
//! Transport (bytes) → Protocol (ApiResponse<T>) → Session client (tokens, retry)
//! ```

mod codec;
mod envelope;
mod error;
mod types;

pub mod endpoint;

pub use codec::{Codec, JsonCodec};
pub use envelope::{ApiResponse, Pagination};
pub use error::ProtocolError;
pub use types::{
    AdminUser, AuditEntry, AuditNotes, AuditTrail, BlockUser, ChangePassword,
    CreatedStudent, CreatedTeacher, LoginCredentials, LoginResponse, NewStudent,
    NewTeacher, ProfileData, RefreshRequest, RefreshResponse, Role, UpdateProfile,
    UserData, UserItem, UserList, UserQuery, UserUpdate,
};
