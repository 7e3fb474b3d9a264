use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Server-side user identifier.
pub type UserId = u64;

/// A lightweight reference to a user as embedded in other payloads.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct UserRef {
    /// Unique identifier of the user. `0` when the server omitted it.
    pub id: UserId,
    /// Display name as reported by the server, possibly empty.
    pub name: String,
}

impl UserRef {
    /// Create a new user reference.
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Name to show in lists, falling back to the id when the name is blank.
    #[must_use]
    pub fn display_name(&self) -> String {
        let trimmed = self.name.trim();
        if trimmed.is_empty() {
            format!("User #{}", self.id)
        } else {
            trimmed.to_string()
        }
    }
}

/// Role of a user within the institution.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// School administration.
    Admin,
    /// Teaching staff.
    Teacher,
    /// Enrolled student.
    Student,
    /// Non-teaching staff.
    Staff,
    /// Missing or unrecognised role.
    #[default]
    Unknown,
}

impl Role {
    /// Parse a role name case-insensitively. Unknown names map to [`Role::Unknown`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" | "administrator" => Self::Admin,
            "teacher" | "professor" | "enseignant" => Self::Teacher,
            "student" | "etudiant" => Self::Student,
            "staff" => Self::Staff,
            _ => Self::Unknown,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Teacher => write!(f, "teacher"),
            Role::Student => write!(f, "student"),
            Role::Staff => write!(f, "staff"),
            Role::Unknown => write!(f, "unknown"),
        }
    }
}

/// The signed-in user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
    pub name: String,
    pub role: Role,
}

impl CurrentUser {
    /// Copy of this user as a [`UserRef`].
    #[must_use]
    pub fn to_user_ref(&self) -> UserRef {
        UserRef::new(self.id, self.name.clone())
    }
}

/// Client-side session: identity plus the bearer token used for API calls.
///
/// Passed explicitly to every component that needs identity instead of being
/// read from ambient global state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub user: CurrentUser,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Session {
    /// Create a session for the given user.
    #[must_use]
    pub fn new(user: CurrentUser, token: Option<String>) -> Self {
        Self { user, token }
    }

    /// Identifier of the signed-in user.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user.id
    }
}
