//! Use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Carry the signed-in account explicitly as a `UserSession` value.
//!
//! # Invariants
//! - Services never bypass repository validation.
//! - Admin use-cases check the acting session's role on every call.

pub mod admin_service;
pub mod auth_service;
pub mod progress;
pub mod stats;
pub mod writing_service;

use crate::model::user::{User, UserId, UserRole};

/// The account a request acts on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSession {
    user: User,
}

impl UserSession {
    pub fn new(user: User) -> Self {
        Self { user }
    }

    /// Anonymous session for the local demo path.
    pub fn guest() -> Self {
        Self {
            user: User {
                id: UserId::guest(),
                name: "Guest".to_string(),
                email: String::new(),
                role: UserRole::User,
                is_blocked: false,
            },
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn user_id(&self) -> &UserId {
        &self.user.id
    }

    pub fn is_admin(&self) -> bool {
        self.user.is_admin()
    }
}
