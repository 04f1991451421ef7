//! Project domain model.
//!
//! # Responsibility
//! - Group writing sessions under a named project with a word target.
//!
//! # Invariants
//! - `name` is non-empty after trimming; `color` is a `#rgb`/`#rrggbb` hex.
//! - `created_at` is an RFC 3339 timestamp set once at creation.

use crate::model::ValidationError;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static HEX_COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid hex color regex")
});

/// Identifier of a project, unique per owner.
pub type ProjectId = String;

/// Default swatch assigned to new projects.
pub const DEFAULT_PROJECT_COLOR: &str = "#14b8a6";

/// Project lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Paused,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "paused" => Some(Self::Paused),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub target_word_count: u32,
    pub color: String,
    #[serde(default)]
    pub status: ProjectStatus,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

impl Project {
    /// Creates an active project with a generated id and current timestamp.
    pub fn new(name: impl Into<String>, target_word_count: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: String::new(),
            target_word_count,
            color: DEFAULT_PROJECT_COLOR.to_string(),
            status: ProjectStatus::Active,
            created_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyField("id"));
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyField("name"));
        }
        if !HEX_COLOR_RE.is_match(&self.color) {
            return Err(ValidationError::InvalidColor(self.color.clone()));
        }
        Ok(())
    }
}
