//! Shared fixtures for the client integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use lms_admin::prelude::*;
use lms_admin::transport::{HttpRequest, HttpResponse, ReqwestTransport, TransportError};
use serde_json::{Value, json};
use wiremock::MockServer;

// =========================================================================
// Bodies
// =========================================================================

pub fn admin_json() -> Value {
    json!({
        "id": "1",
        "name": "System Admin",
        "email": "admin@lms.com",
        "phone": "9800000000",
        "role": "ADMIN",
        "verified": true,
        "lastLogin": "2024-05-01T08:00:00.000Z"
    })
}

pub fn admin() -> AdminUser {
    serde_json::from_value(admin_json()).unwrap()
}

pub fn login_body(access: &str, refresh: &str) -> Value {
    json!({
        "success": true,
        "message": "Login successful",
        "data": {
            "user": admin_json(),
            "accessToken": access,
            "refreshToken": refresh,
            "expiresAt": "2024-05-01T09:00:00.000Z"
        }
    })
}

pub fn refresh_body(access: &str) -> Value {
    json!({
        "success": true,
        "message": "Token refreshed",
        "data": { "accessToken": access, "user": admin_json() }
    })
}

pub fn profile_body() -> Value {
    json!({ "success": true, "message": "Profile fetched", "data": { "user": admin_json() } })
}

pub fn expired_body() -> Value {
    json!({ "success": false, "message": "Access token expired" })
}

// =========================================================================
// Stores and navigators
// =========================================================================

/// A memory store that already holds a session.
pub fn signed_in_store(access: &str, refresh: &str) -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with_entries([
        ("adminToken".to_string(), access.to_string()),
        ("adminRefreshToken".to_string(), refresh.to_string()),
        ("adminUser".to_string(), admin_json().to_string()),
    ]))
}

/// Records every login redirect.
#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<String> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect_to_login(&self, route: &str) {
        self.routes.lock().unwrap().push(route.to_string());
    }
}

// =========================================================================
// Clients
// =========================================================================

pub fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::with_api_url(&format!("{}/api/v1", server.uri()))
}

/// A client talking to `server` over real HTTP.
pub fn http_client(
    server: &MockServer,
    store: Arc<MemoryStore>,
    navigator: Arc<RecordingNavigator>,
) -> SessionClient<ReqwestTransport> {
    SessionClient::builder()
        .config(config_for(server))
        .store(store)
        .navigator(navigator)
        .build_default()
        .expect("client should build")
}

/// Full path of an admin endpoint on the mock server.
pub fn admin_path(endpoint: &str) -> String {
    format!("/api/v1/admin{endpoint}")
}

// =========================================================================
// Scripted transport (no network, works under paused time)
// =========================================================================

type Responder = dyn Fn(&HttpRequest) -> HttpResponse + Send + Sync;

/// An in-memory transport that answers from a closure and logs requests.
#[derive(Clone)]
pub struct ScriptedTransport {
    responder: Arc<Responder>,
    log: Arc<Mutex<Vec<HttpRequest>>>,
}

impl ScriptedTransport {
    pub fn new(responder: impl Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static) -> Self {
        Self {
            responder: Arc::new(responder),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of requests sent to URLs ending in `suffix`.
    pub fn count(&self, suffix: &str) -> usize {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url.ends_with(suffix))
            .count()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.log.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let response = (self.responder)(&request);
        self.log.lock().unwrap().push(request);
        Ok(response)
    }
}

pub fn json_response(status: u16, body: &Value) -> HttpResponse {
    HttpResponse::new(status, body.to_string().into_bytes())
}
