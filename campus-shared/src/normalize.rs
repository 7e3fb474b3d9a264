//! # View-Model Normalization
//!
//! The campus API is loosely typed: fields go missing, ids arrive as strings,
//! keys switch between `snake_case` and `camelCase`. Everything that crosses
//! the boundary goes through [`Normalize`], which is total: any JSON value,
//! including `{}` or `null`, yields a fully default-filled shape. The rest of
//! the client core only ever sees the typed result.

use serde_json::{Map, Value};
use tracing::warn;

use crate::models::{
    CurrentUser, DEFAULT_PER_PAGE, DashboardStats, Message, Page, PageLinks, PageMeta,
    ProfileView, Role, Timestamp, UserRef, last_page_for,
};

/// Total conversion from a raw JSON payload into a typed view model.
pub trait Normalize: Sized {
    /// Build `Self` from `raw`, substituting defaults for anything missing or
    /// malformed. Never fails.
    fn normalize(raw: &Value) -> Self;
}

/// Unwrap a `{"data": {...}}` envelope, returning the payload itself otherwise.
#[must_use]
pub fn unwrap_data(raw: &Value) -> &Value {
    match raw.get("data") {
        Some(inner @ Value::Object(_)) => inner,
        _ => raw,
    }
}

/// First non-null value among `keys`.
fn field<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| raw.get(*key))
        .find(|value| !value.is_null())
}

/// Unsigned integer from a number or numeric string; `0` otherwise.
#[must_use]
pub fn read_u64(raw: &Value, keys: &[&str]) -> u64 {
    match field(raw, keys) {
        Some(Value::Number(number)) => number
            .as_u64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|value| value.is_finite() && *value >= 0.0)
                    // Fractional counts truncate.
                    .map(|value| value as u64)
            })
            .unwrap_or_default(),
        Some(Value::String(text)) => text.trim().parse().unwrap_or_default(),
        _ => 0,
    }
}

/// Like [`read_u64`] but narrowed to `u32`, with an explicit default for `0`
/// or missing values.
#[must_use]
pub fn read_u32_or(raw: &Value, keys: &[&str], default: u32) -> u32 {
    match u32::try_from(read_u64(raw, keys)) {
        Ok(0) | Err(_) => default,
        Ok(value) => value,
    }
}

/// String from a string or number; empty otherwise.
#[must_use]
pub fn read_string(raw: &Value, keys: &[&str]) -> String {
    match field(raw, keys) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    }
}

/// Non-blank string, if any.
#[must_use]
pub fn read_opt_string(raw: &Value, keys: &[&str]) -> Option<String> {
    let text = read_string(raw, keys);
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Boolean from `true/false`, `1/0`, or their string forms; `false` otherwise.
#[must_use]
pub fn read_bool(raw: &Value, keys: &[&str]) -> bool {
    match field(raw, keys) {
        Some(Value::Bool(value)) => *value,
        Some(Value::Number(number)) => number.as_i64().is_some_and(|value| value != 0),
        Some(Value::String(text)) => matches!(
            text.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes"
        ),
        _ => false,
    }
}

/// Nested object, or an empty map.
#[must_use]
pub fn read_object(raw: &Value, keys: &[&str]) -> Map<String, Value> {
    match field(raw, keys) {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    }
}

/// Parse a wire timestamp, logging and dropping malformed values.
fn read_timestamp(raw: &Value, keys: &[&str]) -> Option<Timestamp> {
    let text = read_opt_string(raw, keys)?;
    match Timestamp::parse(&text) {
        Ok(timestamp) => Some(timestamp),
        Err(err) => {
            warn!(error = %err, "dropping unparseable timestamp");
            None
        }
    }
}

/// A user reference that is either nested under `nested` or spread over
/// flat `<prefix>_id` / `<prefix>_name` fields.
fn read_user_ref(raw: &Value, nested: &str, id_keys: &[&str], name_keys: &[&str]) -> UserRef {
    match raw.get(nested) {
        Some(inner @ Value::Object(_)) => UserRef::normalize(inner),
        _ => UserRef {
            id: read_u64(raw, id_keys),
            name: read_string(raw, name_keys),
        },
    }
}

impl Normalize for Value {
    fn normalize(raw: &Value) -> Self {
        raw.clone()
    }
}

impl<T: Normalize> Normalize for Vec<T> {
    fn normalize(raw: &Value) -> Self {
        let items = match raw {
            Value::Array(items) => Some(items),
            Value::Object(_) => raw.get("data").and_then(Value::as_array),
            _ => None,
        };
        items
            .map(|items| items.iter().map(T::normalize).collect())
            .unwrap_or_default()
    }
}

impl Normalize for UserRef {
    fn normalize(raw: &Value) -> Self {
        let mut name = read_string(raw, &["name", "full_name", "fullName", "display_name"]);
        if name.trim().is_empty() {
            let first = read_string(raw, &["first_name", "firstName", "prenom"]);
            let last = read_string(raw, &["last_name", "lastName", "nom"]);
            name = format!("{} {}", first.trim(), last.trim()).trim().to_string();
        }
        Self {
            id: read_u64(raw, &["id"]),
            name,
        }
    }
}

impl Normalize for CurrentUser {
    fn normalize(raw: &Value) -> Self {
        let raw = unwrap_data(raw);
        let reference = UserRef::normalize(raw);
        Self {
            id: reference.id,
            name: reference.name,
            role: Role::parse(&read_string(raw, &["role"])),
        }
    }
}

impl Normalize for Message {
    fn normalize(raw: &Value) -> Self {
        Self {
            id: read_u64(raw, &["id"]),
            sender: read_user_ref(
                raw,
                "sender",
                &["sender_id", "senderId", "from"],
                &["sender_name", "senderName"],
            ),
            recipient: read_user_ref(
                raw,
                "recipient",
                &["recipient_id", "recipientId", "receiver_id", "to"],
                &["recipient_name", "recipientName"],
            ),
            content: read_string(raw, &["content", "body"]),
            created_at: read_timestamp(raw, &["created_at", "createdAt"]),
            is_read: read_bool(raw, &["is_read", "isRead", "read"]),
        }
    }
}

impl Normalize for PageMeta {
    fn normalize(raw: &Value) -> Self {
        let per_page = read_u32_or(raw, &["per_page", "perPage"], DEFAULT_PER_PAGE);
        let total = read_u64(raw, &["total"]);
        Self {
            current_page: read_u32_or(raw, &["current_page", "currentPage"], 1),
            per_page,
            total,
            last_page: read_u32_or(
                raw,
                &["last_page", "lastPage"],
                last_page_for(total, per_page),
            ),
        }
    }
}

impl Normalize for PageLinks {
    fn normalize(raw: &Value) -> Self {
        Self {
            first: read_opt_string(raw, &["first"]),
            last: read_opt_string(raw, &["last"]),
            prev: read_opt_string(raw, &["prev"]),
            next: read_opt_string(raw, &["next"]),
        }
    }
}

impl<T: Normalize> Normalize for Page<T> {
    fn normalize(raw: &Value) -> Self {
        // Some endpoints flatten the metadata next to `data` instead of
        // nesting it under `meta`.
        let meta = match raw.get("meta") {
            Some(meta @ Value::Object(_)) => PageMeta::normalize(meta),
            _ => PageMeta::normalize(raw),
        };
        let links = match raw.get("links") {
            Some(links @ Value::Object(_)) => PageLinks::normalize(links),
            _ => PageLinks::default(),
        };
        Self {
            data: Vec::<T>::normalize(raw),
            meta,
            links,
        }
    }
}

impl Normalize for DashboardStats {
    fn normalize(raw: &Value) -> Self {
        let raw = unwrap_data(raw);
        Self {
            students: read_u64(raw, &["students", "students_count", "studentsCount"]),
            teachers: read_u64(raw, &["teachers", "teachers_count", "teachersCount"]),
            courses: read_u64(raw, &["courses", "courses_count", "coursesCount"]),
            classes: read_u64(raw, &["classes", "classes_count", "classesCount"]),
            pending_grades: read_u64(raw, &["pending_grades", "pendingGrades"]),
            unread_messages: read_u64(raw, &["unread_messages", "unreadMessages"]),
        }
    }
}

impl Normalize for ProfileView {
    fn normalize(raw: &Value) -> Self {
        let raw = unwrap_data(raw);
        let reference = UserRef::normalize(raw);
        Self {
            id: reference.id,
            name: reference.name,
            email: read_string(raw, &["email"]),
            role: Role::parse(&read_string(raw, &["role"])),
            phone: read_string(raw, &["phone", "telephone"]),
            avatar_url: read_opt_string(raw, &["avatar_url", "avatarUrl", "avatar"]),
            details: read_object(raw, &["details", "profile"]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_payloads_yield_defaults() {
        for raw in [json!({}), Value::Null, json!([]), json!("garbage"), json!(17)] {
            assert_eq!(Message::normalize(&raw), Message::default());
            assert_eq!(DashboardStats::normalize(&raw), DashboardStats::default());
            assert_eq!(ProfileView::normalize(&raw), ProfileView::default());
            assert_eq!(UserRef::normalize(&raw), UserRef::default());
            let page = Page::<Message>::normalize(&raw);
            assert!(page.data.is_empty());
            assert_eq!(page.meta, PageMeta::default());
        }
    }

    #[test]
    fn profile_details_default_to_empty_object() {
        let profile = ProfileView::normalize(&json!({"id": 3, "name": "Ada"}));
        assert!(profile.details.is_empty());
        assert_eq!(profile.role, Role::Unknown);
        assert_eq!(profile.avatar_url, None);
    }

    #[test]
    fn message_accepts_nested_and_flat_participants() {
        let nested = Message::normalize(&json!({
            "id": "12",
            "sender": {"id": 2, "name": "Bob"},
            "recipient": {"id": "1", "first_name": "Ada", "last_name": "Lovelace"},
            "content": "hi",
            "created_at": "01/01/2024 08:00",
            "is_read": 0
        }));
        assert_eq!(nested.id, 12);
        assert_eq!(nested.sender, UserRef::new(2, "Bob"));
        assert_eq!(nested.recipient, UserRef::new(1, "Ada Lovelace"));
        assert_eq!(nested.created_at, Timestamp::from_parts(2024, 1, 1, 8, 0));
        assert!(!nested.is_read);

        let flat = Message::normalize(&json!({
            "id": 13,
            "senderId": 1,
            "recipientId": 2,
            "recipientName": "Bob",
            "body": "yo",
            "createdAt": "01/01/2024 08:05",
            "isRead": "1"
        }));
        assert_eq!(flat.sender.id, 1);
        assert_eq!(flat.recipient, UserRef::new(2, "Bob"));
        assert_eq!(flat.content, "yo");
        assert!(flat.is_read);
    }

    #[test]
    fn malformed_timestamp_becomes_none() {
        let message = Message::normalize(&json!({"id": 1, "created_at": "2024-01-01T08:00:00Z"}));
        assert_eq!(message.created_at, None);
    }

    #[test]
    fn page_reads_nested_meta_and_links() {
        let page = Page::<Message>::normalize(&json!({
            "data": [{"id": 1}, {"id": 2}],
            "meta": {"current_page": 2, "per_page": "2", "total": 9, "last_page": 5},
            "links": {"next": "/messages?page=3", "prev": null}
        }));
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.meta.current_page, 2);
        assert_eq!(page.meta.per_page, 2);
        assert_eq!(page.meta.total, 9);
        assert_eq!(page.links.next.as_deref(), Some("/messages?page=3"));
        assert_eq!(page.links.prev, None);
    }

    #[test]
    fn page_reads_flattened_meta() {
        let page = Page::<Value>::normalize(&json!({
            "data": [{"id": 1}],
            "current_page": 1,
            "per_page": 10,
            "total": 31
        }));
        assert_eq!(page.meta.total, 31);
        assert_eq!(page.meta.last_page, 4);
    }

    #[test]
    fn list_accepts_bare_array_or_envelope() {
        let bare = Vec::<UserRef>::normalize(&json!([{"id": 1}, {"id": 2}]));
        let wrapped = Vec::<UserRef>::normalize(&json!({"data": [{"id": 1}]}));
        assert_eq!(bare.len(), 2);
        assert_eq!(wrapped.len(), 1);
    }

    #[test]
    fn dashboard_counts_accept_aliases_and_strings() {
        let stats = DashboardStats::normalize(&json!({
            "data": {"students_count": "120", "teachers": 14, "pendingGrades": 3.0}
        }));
        assert_eq!(stats.students, 120);
        assert_eq!(stats.teachers, 14);
        assert_eq!(stats.pending_grades, 3);
        assert_eq!(stats.courses, 0);
    }

    #[test]
    fn current_user_reads_role() {
        let raw = json!({"data": {"id": 5, "name": "Eve", "role": "Admin"}});
        let user = CurrentUser::normalize(&raw);
        assert_eq!(user.id, 5);
        assert_eq!(user.role, Role::Admin);
    }
}
