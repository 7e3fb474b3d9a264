use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Role, UserId};

/// Headline counters shown on the administration dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardStats {
    pub students: u64,
    pub teachers: u64,
    pub courses: u64,
    pub classes: u64,
    pub pending_grades: u64,
    pub unread_messages: u64,
}

/// Profile card for any user, with free-form extra details.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfileView {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: String,
    pub avatar_url: Option<String>,
    /// Role-specific extras (class, speciality, ...). Empty when absent.
    pub details: Map<String, Value>,
}
