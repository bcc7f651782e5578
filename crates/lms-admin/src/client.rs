//! `SessionClient`: the authenticated gateway to the admin API.
//!
//! Every call to the backend goes through here. The client:
//!
//! 1. attaches the stored access token as a bearer header
//! 2. dispatches the request through the [`Transport`]
//! 3. on a 401, refreshes the access token and retries ONCE
//! 4. if that doesn't help, clears the session and asks the
//!    [`Navigator`] to show the login screen
//!
//! # The two-phase request
//!
//! ```text
//! request(path)
//!   │
//!   ├─ attempt(path, current token) ──→ not 401 ──→ decode envelope
//!   │
//!   └─ 401 ──→ recover()
//!                ├─ refresh() failed ─────────────→ expire session
//!                ├─ token unchanged ──────────────→ expire session
//!                └─ attempt(path, new token)
//!                      ├─ not 401 ──→ decode envelope
//!                      └─ 401 ──────→ expire session
//! ```
//!
//! `attempt` is called at most twice per request. There is no loop and no
//! recursion, so a backend that rejects every token can't trap the client.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use lms_admin_protocol::{
    AdminUser, ApiResponse, Codec, JsonCodec, LoginCredentials, LoginResponse, ProtocolError,
    RefreshRequest, RefreshResponse, endpoint,
};
use lms_admin_refresh::{RefreshHandle, RefreshOutcome, spawn_refresh_loop};
use lms_admin_session::{
    AuthSession, Navigator, NoopNavigator, NoopStore, SessionState, SessionStore, SessionVault,
};
use lms_admin_transport::{HttpRequest, HttpResponse, Method, Transport};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::{ClientConfig, ClientError};

// ---------------------------------------------------------------------------
// RequestOptions
// ---------------------------------------------------------------------------

/// Method and body for one API call.
///
/// ```rust
/// use lms_admin::RequestOptions;
/// use lms_admin::protocol::UpdateProfile;
///
/// let options = RequestOptions::put().json(&UpdateProfile {
///     name: Some("Ram".into()),
///     phone: None,
/// })?;
/// # Ok::<(), lms_admin::ClientError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Vec<u8>>,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self { method, body: None }
    }

    pub fn get() -> Self {
        Self::new(Method::Get)
    }

    pub fn post() -> Self {
        Self::new(Method::Post)
    }

    pub fn put() -> Self {
        Self::new(Method::Put)
    }

    pub fn delete() -> Self {
        Self::new(Method::Delete)
    }

    /// Sets a JSON body.
    ///
    /// # Errors
    /// Returns `ClientError::Protocol` if `body` can't be serialized.
    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, ClientError> {
        self.body = Some(JsonCodec.encode(body)?);
        Ok(self)
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::get()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring a [`SessionClient`].
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use lms_admin::prelude::*;
///
/// # fn main() -> Result<(), ClientError> {
/// let client = SessionClient::builder()
///     .config(ClientConfig::from_env())
///     .store(Arc::new(FileStore::new("session.json")))
///     .build_default()?;
/// # Ok(())
/// # }
/// ```
pub struct SessionClientBuilder {
    config: ClientConfig,
    store: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl SessionClientBuilder {
    /// Creates a builder with default config, no storage, and no navigation.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            store: Arc::new(NoopStore),
            navigator: Arc::new(NoopNavigator),
        }
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets where the session is persisted.
    pub fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = store;
        self
    }

    /// Sets what happens on a forced logout.
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    /// Builds the client on top of `transport`.
    ///
    /// Does not start background refresh; call
    /// [`SessionClient::initialize`] once the application is up.
    pub fn build<T: Transport>(self, transport: T) -> SessionClient<T> {
        let config = self.config.validated();
        let vault = SessionVault::new(self.store, config.storage_keys.clone());

        debug!(base_url = %config.base_url, "session client created");

        SessionClient {
            inner: Arc::new(ClientInner {
                config,
                transport,
                codec: JsonCodec,
                vault,
                navigator: self.navigator,
                recovering: AtomicUsize::new(0),
                refresh_task: Mutex::new(None),
            }),
        }
    }

    /// Builds the client on the default HTTP transport, with the
    /// configured timeout and a cookie store.
    #[cfg(feature = "reqwest")]
    pub fn build_default(
        self,
    ) -> Result<SessionClient<lms_admin_transport::ReqwestTransport>, ClientError> {
        let timeout = self.config.clone().validated().timeout;
        let transport = lms_admin_transport::ReqwestTransport::new(timeout)?;
        Ok(self.build(transport))
    }
}

impl Default for SessionClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// State shared by every clone of a client and by its refresh task.
struct ClientInner<T: Transport> {
    config: ClientConfig,
    transport: T,
    codec: JsonCodec,
    vault: SessionVault,
    navigator: Arc<dyn Navigator>,
    /// Requests currently inside `recover()`.
    recovering: AtomicUsize,
    refresh_task: Mutex<Option<RefreshHandle>>,
}

impl<T: Transport> ClientInner<T> {
    fn refresh_task(&self) -> MutexGuard<'_, Option<RefreshHandle>> {
        self.refresh_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Session-aware API client.
///
/// Construct one at application start and hand clones to every caller:
/// clones share tokens, storage, and the background refresh task.
pub struct SessionClient<T: Transport> {
    inner: Arc<ClientInner<T>>,
}

impl<T: Transport> Clone for SessionClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Counts a request as "refreshing" for as long as it's alive.
struct RecoveryGuard<'a>(&'a AtomicUsize);

impl<'a> RecoveryGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for RecoveryGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(feature = "reqwest")]
impl SessionClient<lms_admin_transport::ReqwestTransport> {
    /// Creates a new builder.
    ///
    /// The builder can target any transport; this shortcut lives on the
    /// default one so `SessionClient::builder()` needs no type annotation.
    pub fn builder() -> SessionClientBuilder {
        SessionClientBuilder::new()
    }
}

impl<T: Transport> SessionClient<T> {
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub(crate) fn vault(&self) -> &SessionVault {
        &self.inner.vault
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn access_token(&self) -> Option<String> {
        self.inner.vault.access_token()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.inner.vault.refresh_token()
    }

    /// The cached profile of the signed-in administrator.
    pub fn user(&self) -> Option<AdminUser> {
        self.inner.vault.user()
    }

    /// The whole session, if one is stored.
    pub fn session(&self) -> Option<AuthSession> {
        self.inner.vault.session()
    }

    /// `true` iff an access token and a cached user are both stored.
    ///
    /// Purely local: the token may already be expired server-side.
    pub fn is_authenticated(&self) -> bool {
        self.inner.vault.is_authenticated()
    }

    /// Where the session is in its lifecycle right now.
    pub fn state(&self) -> SessionState {
        if self.inner.recovering.load(Ordering::SeqCst) > 0 {
            SessionState::Refreshing
        } else if self.is_authenticated() {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        }
    }

    // -----------------------------------------------------------------------
    // Login / logout
    // -----------------------------------------------------------------------

    /// Signs in and persists the new session.
    ///
    /// The three session fields are written in one batch, and only after
    /// the server accepted the credentials. On success the background
    /// refresh loop is (re)started.
    ///
    /// # Errors
    /// - `ClientError::AuthFailed` with the server's message when the
    ///   credentials are rejected
    /// - `ClientError::Transport` / `ClientError::Protocol` when no valid
    ///   envelope came back
    /// - `ClientError::Session` if the session couldn't be stored
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthSession, ClientError> {
        let before = self.state();
        let options = RequestOptions::post().json(credentials)?;

        // A 401 here means bad credentials, not an expired session, so
        // there is no refresh-and-retry.
        let response = self.attempt(endpoint::LOGIN, &options, None).await?;
        let envelope: ApiResponse<LoginResponse> = self.decode(endpoint::LOGIN, &response)?;

        if !envelope.has_data() {
            let message = envelope.failure_message("login failed");
            warn!(status = response.status, %message, "login rejected");
            return Err(ClientError::AuthFailed(message));
        }
        let Some(login) = envelope.into_data() else {
            return Err(ClientError::AuthFailed("login failed".into()));
        };

        let session = AuthSession::from(login);
        self.inner.vault.save(&session)?;
        info!(user_id = %session.user.id, "admin signed in");
        note_transition(before, SessionState::Authenticated);

        self.start_background_refresh();
        Ok(session)
    }

    /// Signs out.
    ///
    /// Stops background refresh, tells the server (ignoring any failure),
    /// then clears the local session. Always completes; calling it while
    /// signed out leaves the local state unchanged.
    pub async fn logout(&self) {
        let before = self.state();
        self.cancel_background_refresh();

        // Sent even without an access token: the server may still hold a
        // cookie session for this client.
        let token = self.access_token();
        match self
            .attempt(endpoint::LOGOUT, &RequestOptions::post(), token.as_deref())
            .await
        {
            Ok(response) if response.is_success() => debug!("server acknowledged logout"),
            Ok(response) => debug!(status = response.status, "server refused logout, ignoring"),
            Err(e) => debug!(error = %e, "logout request failed, ignoring"),
        }

        self.inner.vault.clear();
        if before != SessionState::Unauthenticated {
            info!("admin signed out");
        }
        note_transition(before, SessionState::Unauthenticated);
    }

    // -----------------------------------------------------------------------
    // Refresh
    // -----------------------------------------------------------------------

    /// Exchanges the stored refresh token for a new access token.
    ///
    /// Returns `false` without touching the network when no refresh token
    /// is stored. On any failure the stored session is left exactly as it
    /// was; deciding whether to clear it is the caller's business.
    pub async fn refresh(&self) -> bool {
        let Some(refresh_token) = self.refresh_token() else {
            debug!("no refresh token stored, skipping refresh");
            return false;
        };

        let options = match RequestOptions::post().json(&RefreshRequest { refresh_token }) {
            Ok(options) => options,
            Err(e) => {
                warn!(error = %e, "could not encode refresh request");
                return false;
            }
        };

        let response = match self.attempt(endpoint::REFRESH, &options, None).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "token refresh failed");
                return false;
            }
        };
        if !response.is_success() {
            warn!(status = response.status, "token refresh rejected");
            return false;
        }

        let envelope: ApiResponse<RefreshResponse> =
            match self.inner.codec.decode(&response.body) {
                Ok(envelope) => envelope,
                Err(e) => {
                    warn!(error = %e, "token refresh returned a malformed body");
                    return false;
                }
            };
        let Some(data) = envelope.into_data() else {
            warn!("token refresh returned no data");
            return false;
        };

        match self.inner.vault.apply_refresh(
            &data.access_token,
            &data.user,
            data.refresh_token.as_deref(),
        ) {
            Ok(()) => {
                debug!(user_id = %data.user.id, "access token refreshed");
                true
            }
            Err(e) => {
                warn!(error = %e, "could not store refreshed token");
                false
            }
        }
    }

    // -----------------------------------------------------------------------
    // Request pipeline
    // -----------------------------------------------------------------------

    /// Calls an endpoint and decodes its envelope.
    ///
    /// Application-level failures (`success: false`) come back as `Ok`.
    /// An expired access token is refreshed and the call retried once,
    /// invisibly to the caller.
    ///
    /// # Errors
    /// - `ClientError::SessionExpired` when the session couldn't be
    ///   recovered (the session is cleared before returning)
    /// - `ClientError::Transport` when no response came back
    /// - `ClientError::Protocol` when the body isn't a valid envelope
    pub async fn request<R: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse<R>, ClientError> {
        let token = self.access_token();
        let response = self.attempt(path, &options, token.as_deref()).await?;

        let response = if response.is_unauthorized() {
            self.recover(path, &options, token).await?
        } else {
            response
        };

        self.decode(path, &response)
    }

    /// Sends one request. Never retries, never touches the session.
    async fn attempt(
        &self,
        path: &str,
        options: &RequestOptions,
        token: Option<&str>,
    ) -> Result<HttpResponse, ClientError> {
        let content_type = self.inner.codec.content_type();
        let mut request = HttpRequest::new(options.method, self.inner.config.url(path))
            .header("Content-Type", content_type)
            .header("Accept", content_type);
        if let Some(token) = token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        if let Some(body) = &options.body {
            request = request.body(body.clone());
        }

        let id = request.id;
        debug!(%id, method = %options.method, endpoint = path, "dispatching request");

        match self.inner.transport.send(request).await {
            Ok(response) => {
                debug!(%id, status = response.status, endpoint = path, "response received");
                Ok(response)
            }
            Err(e) => {
                error!(%id, endpoint = path, error = %e, "request failed");
                Err(e.into())
            }
        }
    }

    /// The 401 branch: refresh, then at most one more attempt.
    async fn recover(
        &self,
        path: &str,
        options: &RequestOptions,
        rejected: Option<String>,
    ) -> Result<HttpResponse, ClientError> {
        let _recovering = RecoveryGuard::enter(&self.inner.recovering);
        note_transition(SessionState::Authenticated, SessionState::Refreshing);
        debug!(endpoint = path, "access token rejected, refreshing");

        let refreshed = self.refresh().await;
        let current = self.access_token();

        // Another request may have refreshed first, in which case our own
        // refresh can still succeed but hand back the token we already
        // tried. Only a token different from the rejected one is worth a
        // retry.
        let Some(token) = current.filter(|t| refreshed && Some(t) != rejected.as_ref()) else {
            warn!(endpoint = path, refreshed, "session could not be refreshed");
            return Err(self.expire_session());
        };

        let retried = self.attempt(path, options, Some(&token)).await?;
        if retried.is_unauthorized() {
            warn!(endpoint = path, "refreshed token rejected too");
            return Err(self.expire_session());
        }

        note_transition(SessionState::Refreshing, SessionState::Authenticated);
        Ok(retried)
    }

    /// Terminal failure: drop everything and send the user to the login
    /// screen.
    fn expire_session(&self) -> ClientError {
        self.cancel_background_refresh();
        self.inner.vault.clear();
        info!(route = %self.inner.config.login_route, "session expired, redirecting to login");
        note_transition(SessionState::Refreshing, SessionState::Unauthenticated);
        self.inner
            .navigator
            .redirect_to_login(&self.inner.config.login_route);
        ClientError::SessionExpired
    }

    fn decode<R: DeserializeOwned>(
        &self,
        path: &str,
        response: &HttpResponse,
    ) -> Result<ApiResponse<R>, ClientError> {
        // Failed envelopes may carry a payload of any shape; only a
        // successful one has to match `R`.
        self.inner
            .codec
            .decode::<ApiResponse<Value>>(&response.body)
            .and_then(|envelope| envelope.into_typed().map_err(ProtocolError::Decode))
            .map_err(|e| {
                warn!(endpoint = path, status = response.status, error = %e, "malformed response body");
                ClientError::from(e)
            })
    }

    // -----------------------------------------------------------------------
    // Background refresh
    // -----------------------------------------------------------------------

    /// Application start hook: resumes background refresh for a session
    /// that survived from an earlier run.
    pub fn initialize(&self) {
        if self.is_authenticated() {
            info!("existing session found, scheduling background refresh");
            self.start_background_refresh();
        } else {
            debug!("no stored session");
        }
    }

    /// Starts (or restarts) the background refresh loop.
    ///
    /// # Errors
    /// Returns `ClientError::NotAuthenticated` when there is no session to
    /// keep alive.
    pub fn schedule_background_refresh(&self) -> Result<(), ClientError> {
        if !self.is_authenticated() {
            return Err(ClientError::NotAuthenticated);
        }
        self.start_background_refresh();
        Ok(())
    }

    /// Stops the background refresh loop, if one is running.
    pub fn cancel_background_refresh(&self) {
        if let Some(mut handle) = self.inner.refresh_task().take() {
            handle.cancel();
            debug!("background refresh cancelled");
        }
    }

    /// `true` while a background refresh loop is running.
    pub fn is_background_refresh_active(&self) -> bool {
        self.inner
            .refresh_task()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn start_background_refresh(&self) {
        // The loop only holds a weak reference: once every clone of the
        // client is gone the next refresh reports `Stop`.
        let weak = Arc::downgrade(&self.inner);
        let handle = spawn_refresh_loop(self.inner.config.refresh.clone(), move || {
            let weak = weak.clone();
            async move {
                let Some(inner) = weak.upgrade() else {
                    return RefreshOutcome::Stop;
                };
                let client = SessionClient { inner };
                if client.refresh_token().is_none() {
                    return RefreshOutcome::Stop;
                }
                if client.refresh().await {
                    RefreshOutcome::Refreshed
                } else {
                    RefreshOutcome::Failed
                }
            }
        });

        // Replacing an older handle drops it, which aborts its loop.
        self.inner.refresh_task().replace(handle);
    }
}

fn note_transition(from: SessionState, to: SessionState) {
    if from != to {
        debug!(%from, %to, legal = from.can_transition_to(to), "session state changed");
    }
}
