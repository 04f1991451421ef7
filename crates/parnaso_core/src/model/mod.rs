//! Domain model for writers, projects, sessions and goals.
//!
//! # Responsibility
//! - Define canonical records shared by both persistence backends.
//! - Keep JSON field naming compatible with browser-side backups (camelCase).
//!
//! # Invariants
//! - Every write path calls `validate()` on the record before persisting.
//! - Records are keyed by owner `UserId`; ids are unique per owner.

pub mod project;
pub mod session;
pub mod settings;
pub mod user;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation failure for any domain record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is blank.
    EmptyField(&'static str),
    /// Self-reported score is outside `1..=5`.
    ScoreOutOfRange { field: &'static str, value: u8 },
    /// Clock value is not `HH:MM`.
    InvalidTime { field: &'static str, value: String },
    /// Session ends before it starts.
    EndBeforeStart { start: String, end: String },
    /// Project color is not a hex color literal.
    InvalidColor(String),
    /// E-mail address is not well formed.
    InvalidEmail(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "`{field}` cannot be empty"),
            Self::ScoreOutOfRange { field, value } => {
                write!(f, "`{field}` must be within 1..=5, got {value}")
            }
            Self::InvalidTime { field, value } => {
                write!(f, "`{field}` must be HH:MM, got `{value}`")
            }
            Self::EndBeforeStart { start, end } => {
                write!(f, "session end `{end}` is earlier than start `{start}`")
            }
            Self::InvalidColor(value) => write!(f, "invalid project color `{value}`"),
            Self::InvalidEmail(value) => write!(f, "invalid e-mail address `{value}`"),
        }
    }
}

impl Error for ValidationError {}

/// Returns whether a 1-5 self-report score is in range.
pub(crate) fn check_score(field: &'static str, value: u8) -> Result<(), ValidationError> {
    if (1..=5).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::ScoreOutOfRange { field, value })
    }
}
