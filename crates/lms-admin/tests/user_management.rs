//! Typed endpoint wrappers: paths, methods, bodies, and decoded payloads.

mod common;

use std::sync::Arc;

use common::*;
use lms_admin::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ok(message: &str, data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "success": true,
        "message": message,
        "data": data
    }))
}

fn user_item(id: &str, role: &str) -> Value {
    json!({
        "id": id,
        "name": "Hari Prasad Sharma",
        "firstName": "Hari",
        "middleName": "Prasad",
        "lastName": "Sharma",
        "email": "hari@example.com",
        "phone": "9811111111",
        "symbolNo": "T-0042",
        "role": role,
        "school": null,
        "department": "Mathematics",
        "experience": "5 years",
        "verified": true,
        "isActive": true,
        "isBlocked": false,
        "blockReason": null,
        "blockedAt": null,
        "blockedBy": null,
        "lastLogin": null,
        "createdAt": "2024-04-01T00:00:00.000Z",
        "updatedAt": "2024-04-02T00:00:00.000Z"
    })
}

fn pagination(total: u64) -> Value {
    json!({
        "currentPage": 1,
        "totalPages": 1,
        "totalCount": total,
        "hasNext": false,
        "hasPrev": false
    })
}

fn signed_in(server: &MockServer) -> SessionClient<lms_admin::transport::ReqwestTransport> {
    http_client(server, signed_in_store("A1", "R1"), Arc::default())
}

// =========================================================================
// Profile
// =========================================================================

#[tokio::test]
async fn test_change_password_sends_both_passwords() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(admin_path("/auth/change-password")))
        .and(header("Authorization", "Bearer A1"))
        .and(body_json(json!({
            "currentPassword": "admin123",
            "newPassword": "n3w-Secret"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Password changed successfully"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in(&server);
    let change = ChangePassword {
        current_password: "admin123".into(),
        new_password: "n3w-Secret".into(),
    };

    let response = client.change_password(&change).await.unwrap();

    assert!(response.success);
    assert_eq!(response.message, "Password changed successfully");
}

// =========================================================================
// Account creation
// =========================================================================

#[tokio::test]
async fn test_create_student_returns_generated_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(admin_path("/users/student")))
        .and(body_json(json!({
            "firstName": "Sita",
            "lastName": "Rai",
            "school": "Shree Secondary",
            "email": "sita@example.com"
        })))
        .respond_with(ok(
            "Student created",
            json!({
                "id": "s1",
                "name": "Sita Rai",
                "symbolNo": "S-1001",
                "email": "sita@example.com",
                "phone": null,
                "school": "Shree Secondary",
                "tempPassword": "tmp-4821"
            }),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in(&server);
    let student = NewStudent {
        first_name: "Sita".into(),
        middle_name: None,
        last_name: "Rai".into(),
        school: "Shree Secondary".into(),
        phone: None,
        email: Some("sita@example.com".into()),
    };

    let created = client.create_student(&student).await.unwrap().data.unwrap();

    assert_eq!(created.symbol_no, "S-1001");
    assert_eq!(created.temp_password, "tmp-4821");
    assert_eq!(created.phone, None);
}

#[tokio::test]
async fn test_create_teacher_posts_camel_case_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(admin_path("/users/teacher")))
        .and(body_json(json!({
            "firstName": "Hari",
            "middleName": "Prasad",
            "lastName": "Sharma",
            "department": "Mathematics",
            "phone": "9811111111",
            "email": "hari@example.com",
            "experience": "5 years"
        })))
        .respond_with(ok(
            "Teacher created",
            json!({
                "id": "t1",
                "name": "Hari Prasad Sharma",
                "symbolNo": "T-0042",
                "email": "hari@example.com",
                "phone": "9811111111",
                "department": "Mathematics",
                "experience": "5 years",
                "tempPassword": "tmp-1234"
            }),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in(&server);
    let teacher = NewTeacher {
        first_name: "Hari".into(),
        middle_name: Some("Prasad".into()),
        last_name: "Sharma".into(),
        department: "Mathematics".into(),
        phone: "9811111111".into(),
        email: "hari@example.com".into(),
        experience: Some("5 years".into()),
    };

    let created = client.create_teacher(&teacher).await.unwrap().data.unwrap();

    assert_eq!(created.id, "t1");
    assert_eq!(created.department, "Mathematics");
}

// =========================================================================
// Listing
// =========================================================================

#[tokio::test]
async fn test_list_users_sends_filters_as_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(admin_path("/users")))
        .and(query_param("role", "TEACHER"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "10"))
        .and(query_param("search", "hari sharma"))
        .respond_with(ok(
            "Users fetched",
            json!({ "users": [user_item("t1", "TEACHER")], "pagination": pagination(1) }),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in(&server);
    let query = UserQuery::default()
        .role(Role::Teacher)
        .page(2, 10)
        .search("hari sharma");

    let list = client.list_users(&query).await.unwrap().data.unwrap();

    assert_eq!(list.users.len(), 1);
    assert_eq!(list.users[0].role, Role::Teacher);
    assert_eq!(list.users[0].symbol_no.as_deref(), Some("T-0042"));
    assert_eq!(list.pagination.total_count, 1);
}

#[tokio::test]
async fn test_list_users_without_filters_has_no_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(admin_path("/users")))
        .respond_with(ok(
            "Users fetched",
            json!({ "users": [], "pagination": pagination(0) }),
        ))
        .mount(&server)
        .await;

    let client = signed_in(&server);
    let list = client.list_users(&UserQuery::default()).await.unwrap();

    assert!(list.data.unwrap().users.is_empty());
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), None);
}

// =========================================================================
// Single-user actions
// =========================================================================

#[tokio::test]
async fn test_update_user_sends_only_changed_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(admin_path("/users/t1")))
        .and(body_json(json!({ "department": "Physics" })))
        .respond_with(ok("User updated", json!({ "user": admin_json() })))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in(&server);
    let update = UserUpdate {
        department: Some("Physics".into()),
        ..Default::default()
    };

    let response = client.update_user("t1", &update).await.unwrap();

    assert!(response.success);
    assert!(response.data.is_some());
}

#[tokio::test]
async fn test_block_user_posts_reason_and_notes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(admin_path("/users/s1/block")))
        .and(body_json(json!({ "reason": "Exam misconduct", "notes": "Second warning" })))
        .respond_with(ok("User blocked", json!({ "user": admin_json() })))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in(&server);
    let block = BlockUser {
        reason: "Exam misconduct".into(),
        notes: Some("Second warning".into()),
    };

    assert!(client.block_user("s1", &block).await.unwrap().success);
}

#[tokio::test]
async fn test_unblock_user_without_notes_sends_empty_object() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(admin_path("/users/s1/unblock")))
        .and(body_json(json!({})))
        .respond_with(ok("User unblocked", json!({ "user": admin_json() })))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in(&server);
    assert!(client.unblock_user("s1", None).await.unwrap().success);
}

#[tokio::test]
async fn test_delete_user_sends_notes_in_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(admin_path("/users/s1")))
        .and(body_json(json!({ "notes": "Duplicate account" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "User deleted"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in(&server);
    let response = client
        .delete_user("s1", Some("Duplicate account"))
        .await
        .unwrap();

    assert!(response.success);
    assert!(response.data.is_none());
}

#[tokio::test]
async fn test_user_audit_trail_defaults_to_first_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(admin_path("/users/s1/audit-trail")))
        .and(query_param("page", "1"))
        .and(query_param("limit", "20"))
        .respond_with(ok(
            "Audit trail fetched",
            json!({
                "user": admin_json(),
                "auditTrail": [{
                    "id": "a1",
                    "action": "USER_BLOCKED",
                    "entity": "User",
                    "details": { "reason": "Exam misconduct" },
                    "notes": null,
                    "timestamp": "2024-05-01T10:00:00.000Z",
                    "performedBy": admin_json(),
                    "ipAddress": "10.0.0.7"
                }],
                "pagination": pagination(1)
            }),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in(&server);
    let trail = client
        .user_audit_trail("s1", None, None)
        .await
        .unwrap()
        .data
        .unwrap();

    assert_eq!(trail.audit_trail.len(), 1);
    assert_eq!(trail.audit_trail[0].action, "USER_BLOCKED");
    assert_eq!(trail.audit_trail[0].details["reason"], "Exam misconduct");
}

#[tokio::test]
async fn test_user_audit_trail_passes_explicit_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(admin_path("/users/s1/audit-trail")))
        .and(query_param("page", "3"))
        .and(query_param("limit", "5"))
        .respond_with(ok(
            "Audit trail fetched",
            json!({ "user": admin_json(), "auditTrail": [], "pagination": pagination(0) }),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in(&server);
    let response = client.user_audit_trail("s1", Some(3), Some(5)).await.unwrap();

    assert!(response.success);
}

#[tokio::test]
async fn test_user_audit_trail_encodes_id_as_one_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(admin_path("/users/u1%3Fpage%3D99%26x%3D/audit-trail")))
        .and(query_param("page", "1"))
        .and(query_param("limit", "20"))
        .respond_with(ok(
            "Audit trail fetched",
            json!({ "user": admin_json(), "auditTrail": [], "pagination": pagination(0) }),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in(&server);
    let response = client
        .user_audit_trail("u1?page=99&x=", None, None)
        .await
        .unwrap();

    assert!(response.success);
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), Some("page=1&limit=20"));
}

#[tokio::test]
async fn test_typed_endpoint_recovers_from_expired_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(admin_path("/users/s1/unblock")))
        .and(header("Authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(expired_body()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(admin_path("/users/s1/unblock")))
        .and(header("Authorization", "Bearer A2"))
        .and(body_json(json!({ "notes": "Appeal accepted" })))
        .respond_with(ok("User unblocked", json!({ "user": admin_json() })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(admin_path("/auth/refresh")))
        .respond_with(ResponseTemplate::new(200).set_body_json(refresh_body("A2")))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_in(&server);
    let response = client
        .unblock_user("s1", Some("Appeal accepted"))
        .await
        .unwrap();

    assert!(response.success);
}
