use chrono::{DateTime, Utc};
use serde::Serialize;

use super::UserId;

/// Role tag assigned by the authentication layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Anything that is not a plain user is treated as privileged
    pub fn from_db(raw: &str) -> Self {
        match raw {
            "user" => Role::User,
            _ => Role::Admin,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn is_protected(&self) -> bool {
        *self != Role::User
    }
}

/// Account record as exposed to admin listings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Stored fields for a new plain account; the password is already hashed
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
}

/// Account fields to overwrite; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password_hash.is_none()
    }
}

/// Validated sign-up fields as submitted by an admin
pub struct UserCredentials {
    pub email: String,
    pub password: String,
}

/// Validated, possibly partial, credential changes
#[derive(Default)]
pub struct CredentialChanges {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl CredentialChanges {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none()
    }
}

impl std::fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl std::fmt::Debug for CredentialChanges {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialChanges")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
