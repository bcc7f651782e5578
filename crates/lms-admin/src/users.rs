//! Typed wrappers for the profile and user-management endpoints.
//!
//! Each method is a thin layer over [`SessionClient::request`]: pick the
//! path, pick the method, encode the body, name the response type. Token
//! refresh and forced logout happen underneath, exactly as for a raw
//! `request`.

use lms_admin_protocol::{
    ApiResponse, AuditNotes, AuditTrail, BlockUser, ChangePassword, CreatedStudent,
    CreatedTeacher, NewStudent, NewTeacher, ProfileData, UpdateProfile, UserData, UserList,
    UserQuery, UserUpdate, endpoint,
};
use lms_admin_transport::Transport;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{ClientError, RequestOptions, SessionClient};

impl<T: Transport> SessionClient<T> {
    // -----------------------------------------------------------------------
    // Own profile
    // -----------------------------------------------------------------------

    /// `GET /auth/profile`
    pub async fn get_profile(&self) -> Result<ApiResponse<ProfileData>, ClientError> {
        self.request(endpoint::PROFILE, RequestOptions::get()).await
    }

    /// `PUT /auth/profile`
    ///
    /// On success the cached user is replaced with the server's copy.
    pub async fn update_profile(
        &self,
        update: &UpdateProfile,
    ) -> Result<ApiResponse<ProfileData>, ClientError> {
        let response: ApiResponse<ProfileData> = self
            .request(endpoint::PROFILE, RequestOptions::put().json(update)?)
            .await?;

        if let Some(profile) = response.data.as_ref().filter(|_| response.success) {
            // The server already applied the change; a stale local cache is
            // not worth failing the call over.
            if let Err(e) = self.vault().set_user(&profile.user) {
                warn!(error = %e, "could not cache updated profile");
            } else {
                debug!(user_id = %profile.user.id, "cached profile updated");
            }
        }
        Ok(response)
    }

    /// `PUT /auth/change-password`
    pub async fn change_password(
        &self,
        change: &ChangePassword,
    ) -> Result<ApiResponse<Value>, ClientError> {
        self.request(
            endpoint::CHANGE_PASSWORD,
            RequestOptions::put().json(change)?,
        )
        .await
    }

    // -----------------------------------------------------------------------
    // Account creation
    // -----------------------------------------------------------------------

    /// `POST /users/student`
    pub async fn create_student(
        &self,
        student: &NewStudent,
    ) -> Result<ApiResponse<CreatedStudent>, ClientError> {
        self.request(endpoint::CREATE_STUDENT, RequestOptions::post().json(student)?)
            .await
    }

    /// `POST /users/teacher`
    pub async fn create_teacher(
        &self,
        teacher: &NewTeacher,
    ) -> Result<ApiResponse<CreatedTeacher>, ClientError> {
        self.request(endpoint::CREATE_TEACHER, RequestOptions::post().json(teacher)?)
            .await
    }

    // -----------------------------------------------------------------------
    // User management
    // -----------------------------------------------------------------------

    /// `GET /users?role&page&limit&search`
    pub async fn list_users(&self, query: &UserQuery) -> Result<ApiResponse<UserList>, ClientError> {
        self.request(&endpoint::users(query), RequestOptions::get())
            .await
    }

    /// `PUT /users/:id`
    pub async fn update_user(
        &self,
        id: &str,
        update: &UserUpdate,
    ) -> Result<ApiResponse<UserData>, ClientError> {
        self.request(&endpoint::user(id), RequestOptions::put().json(update)?)
            .await
    }

    /// `POST /users/:id/block`
    pub async fn block_user(
        &self,
        id: &str,
        block: &BlockUser,
    ) -> Result<ApiResponse<UserData>, ClientError> {
        self.request(&endpoint::block_user(id), RequestOptions::post().json(block)?)
            .await
    }

    /// `POST /users/:id/unblock`
    pub async fn unblock_user(
        &self,
        id: &str,
        notes: Option<&str>,
    ) -> Result<ApiResponse<UserData>, ClientError> {
        let body = AuditNotes {
            notes: notes.map(str::to_string),
        };
        self.request(&endpoint::unblock_user(id), RequestOptions::post().json(&body)?)
            .await
    }

    /// `DELETE /users/:id`, with an optional note for the audit trail in
    /// the body.
    pub async fn delete_user(
        &self,
        id: &str,
        notes: Option<&str>,
    ) -> Result<ApiResponse<Value>, ClientError> {
        let body = AuditNotes {
            notes: notes.map(str::to_string),
        };
        self.request(&endpoint::user(id), RequestOptions::delete().json(&body)?)
            .await
    }

    /// `GET /users/:id/audit-trail?page&limit`
    ///
    /// `None` selects the first page and
    /// [`AUDIT_TRAIL_DEFAULT_LIMIT`](endpoint::AUDIT_TRAIL_DEFAULT_LIMIT)
    /// entries.
    pub async fn user_audit_trail(
        &self,
        id: &str,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<ApiResponse<AuditTrail>, ClientError> {
        let path = endpoint::audit_trail(
            id,
            page.unwrap_or(1),
            limit.unwrap_or(endpoint::AUDIT_TRAIL_DEFAULT_LIMIT),
        );
        self.request(&path, RequestOptions::get()).await
    }
}
