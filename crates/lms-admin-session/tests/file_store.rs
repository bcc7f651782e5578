//! Integration tests for the file-backed session store.
//!
//! These go through the public vault API the way the client does, and check
//! what actually lands on disk.

use std::sync::Arc;

use lms_admin_protocol::AdminUser;
use lms_admin_session::{AuthSession, FileStore, SessionStore, SessionVault, StorageKeys};

fn admin() -> AdminUser {
    AdminUser {
        id: "1".into(),
        name: "Admin".into(),
        email: "admin@lms.com".into(),
        phone: Some("9800000000".into()),
        role: "ADMIN".into(),
        verified: true,
        last_login: None,
        created_at: None,
    }
}

fn session() -> AuthSession {
    AuthSession {
        access_token: "A1".into(),
        refresh_token: "R1".into(),
        user: admin(),
    }
}

fn vault_at(path: &std::path::Path) -> SessionVault {
    SessionVault::new(Arc::new(FileStore::new(path)), StorageKeys::default())
}

#[test]
fn test_file_session_survives_new_store_instance() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    vault_at(&path).save(&session()).unwrap();

    // A fresh vault over the same file sees the same session.
    let reopened = vault_at(&path);
    assert_eq!(reopened.session(), Some(session()));
}

#[test]
fn test_file_session_contents_are_keyed_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    vault_at(&path).save(&session()).unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    let map: std::collections::HashMap<String, String> = serde_json::from_str(&raw).unwrap();
    assert_eq!(map["adminToken"], "A1");
    assert_eq!(map["adminRefreshToken"], "R1");

    let user: AdminUser = serde_json::from_str(&map["adminUser"]).unwrap();
    assert_eq!(user, admin());
}

#[test]
fn test_file_session_clear_keeps_unrelated_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let store = Arc::new(FileStore::new(&path));
    store.store_many(&[("theme", "dark".into())]).unwrap();

    let vault = SessionVault::new(store.clone(), StorageKeys::default());
    vault.save(&session()).unwrap();
    vault.clear();

    assert!(!vault.is_authenticated());
    assert_eq!(store.load("theme").as_deref(), Some("dark"));
}

#[test]
fn test_file_session_creates_missing_parent_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("deeper").join("session.json");

    vault_at(&path).save(&session()).unwrap();

    assert!(path.exists());
}

#[test]
fn test_file_session_refresh_rewrites_token_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let vault = vault_at(&path);
    vault.save(&session()).unwrap();

    vault.apply_refresh("A2", &admin(), None).unwrap();

    let reopened = vault_at(&path);
    assert_eq!(reopened.access_token().as_deref(), Some("A2"));
    assert_eq!(reopened.refresh_token().as_deref(), Some("R1"));
}
