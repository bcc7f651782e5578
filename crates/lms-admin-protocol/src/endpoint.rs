//! Endpoint paths, relative to the admin API base (`.../api/v1/admin`).

use url::form_urlencoded;

use crate::UserQuery;

pub const LOGIN: &str = "/auth/login";
pub const LOGOUT: &str = "/auth/logout";
pub const REFRESH: &str = "/auth/refresh";
pub const PROFILE: &str = "/auth/profile";
pub const CHANGE_PASSWORD: &str = "/auth/change-password";
pub const CREATE_STUDENT: &str = "/users/student";
pub const CREATE_TEACHER: &str = "/users/teacher";
pub const USERS: &str = "/users";

/// Default page size for audit trails.
pub const AUDIT_TRAIL_DEFAULT_LIMIT: u32 = 20;

/// `/users?role=..&page=..&limit=..&search=..`, with unset filters left out.
///
/// Zero page/limit and empty search text count as unset. Without any
/// filter the bare `/users` path is returned.
pub fn users(query: &UserQuery) -> String {
    let mut params = form_urlencoded::Serializer::new(String::new());
    let mut any = false;

    if let Some(role) = query.role {
        params.append_pair("role", role.as_str());
        any = true;
    }
    if let Some(page) = query.page.filter(|p| *p > 0) {
        params.append_pair("page", &page.to_string());
        any = true;
    }
    if let Some(limit) = query.limit.filter(|l| *l > 0) {
        params.append_pair("limit", &limit.to_string());
        any = true;
    }
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        params.append_pair("search", search);
        any = true;
    }

    if any {
        format!("{USERS}?{}", params.finish())
    } else {
        USERS.to_string()
    }
}

/// `/users/:id`
pub fn user(id: &str) -> String {
    format!("{USERS}/{}", segment(id))
}

/// `/users/:id/block`
pub fn block_user(id: &str) -> String {
    format!("{USERS}/{}/block", segment(id))
}

/// `/users/:id/unblock`
pub fn unblock_user(id: &str) -> String {
    format!("{USERS}/{}/unblock", segment(id))
}

/// `/users/:id/audit-trail?page=..&limit=..`
pub fn audit_trail(id: &str, page: u32, limit: u32) -> String {
    format!("{USERS}/{}/audit-trail?page={page}&limit={limit}", segment(id))
}

/// Percent-encodes an id so it stays a single path segment.
///
/// `form_urlencoded` writes a space as `+`, which a path reads literally,
/// so it is rewritten to `%20`. A literal `+` is already `%2B` by then.
fn segment(id: &str) -> String {
    form_urlencoded::byte_serialize(id.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
