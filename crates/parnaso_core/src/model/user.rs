//! Writer identity and moderation state.
//!
//! # Invariants
//! - `UserId` is opaque; it is only compared and formatted into keys.
//! - Admin accounts cannot be blocked through moderation APIs.

use crate::model::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Stable identity of one account.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wraps an existing identity value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generates a fresh random identity.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Identity used by the local demo path when nobody is signed in.
    pub fn guest() -> Self {
        Self("guest".to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    #[default]
    User,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Self::Admin),
            "user" => Some(Self::User),
            _ => None,
        }
    }
}

/// Profile of one writer as seen by the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    /// Blocked accounts cannot sign in. Non-admin blocked accounts are
    /// reported as pending approval.
    pub is_blocked: bool,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Case-insensitive substring match on name or e-mail. The term is used
    /// as typed; only an empty term matches everyone.
    pub fn matches_search(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&needle) || self.email.to_lowercase().contains(&needle)
    }
}

/// Normalizes and validates an e-mail address.
pub fn normalize_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim().to_lowercase();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email"));
    }
    if !EMAIL_RE.is_match(&trimmed) {
        return Err(ValidationError::InvalidEmail(trimmed));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::{normalize_email, User, UserId, UserRole};

    fn writer(name: &str, email: &str) -> User {
        User {
            id: UserId::generate(),
            name: name.to_string(),
            email: email.to_string(),
            role: UserRole::User,
            is_blocked: false,
        }
    }

    #[test]
    fn search_matches_name_or_email_case_insensitively() {
        let user = writer("Cecília Meireles", "cecilia@poesia.br");
        assert!(user.matches_search("CECÍLIA"));
        assert!(user.matches_search("poesia"));
        assert!(user.matches_search(""));
        assert!(user.matches_search("a M"));
        assert!(!user.matches_search(" cecília"));
        assert!(!user.matches_search("drummond"));
    }

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(
            normalize_email("  Ana@Example.COM ").unwrap(),
            "ana@example.com"
        );
        assert!(normalize_email("not-an-email").is_err());
        assert!(normalize_email("").is_err());
    }

    #[test]
    fn user_id_serializes_as_plain_string() {
        let id = UserId::new("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }
}
