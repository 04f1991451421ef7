//! Writing session domain model.
//!
//! # Responsibility
//! - Define one logged writing interval with its self-reported metrics.
//! - Separate the indexed core (`id`, `project_id`, `date`, `word_count`)
//!   from the free-form report (`SessionDetails`) so relational storage
//!   can keep the report as one JSON column.
//!
//! # Invariants
//! - Stress, difficulty and rating scores are within `1..=5`.
//! - `end_time >= start_time` when both are present.
//! - Serialized form is a single flat JSON object (details are flattened).

use crate::model::project::ProjectId;
use crate::model::{check_score, ValidationError};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const CLOCK_FORMAT: &str = "%H:%M";

/// Identifier of a session, unique per owner.
pub type SessionId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WritingSession {
    pub id: SessionId,
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    /// Calendar day the writing happened on (`YYYY-MM-DD`).
    pub date: NaiveDate,
    pub word_count: u32,
    #[serde(flatten)]
    pub details: SessionDetails,
}

/// Self-reported part of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionDetails {
    /// `HH:MM`, local clock.
    pub start_time: Option<String>,
    /// `HH:MM`, local clock.
    pub end_time: Option<String>,
    pub stress_level: u8,
    pub difficulty_level: u8,
    pub was_multitasking: bool,
    pub used_reward: bool,
    pub used_time_strategy: bool,
    pub session_rating: u8,
    pub notes: Option<String>,
}

impl Default for SessionDetails {
    fn default() -> Self {
        Self {
            start_time: None,
            end_time: None,
            stress_level: 3,
            difficulty_level: 3,
            was_multitasking: false,
            used_reward: false,
            used_time_strategy: false,
            session_rating: 3,
            notes: None,
        }
    }
}

impl WritingSession {
    /// Creates a session with a generated id and neutral self-report.
    pub fn new(date: NaiveDate, word_count: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            project_id: None,
            date,
            word_count,
            details: SessionDetails::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyField("id"));
        }
        if matches!(self.project_id.as_deref(), Some(value) if value.trim().is_empty()) {
            return Err(ValidationError::EmptyField("projectId"));
        }
        self.details.validate()
    }
}

impl SessionDetails {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_score("stressLevel", self.stress_level)?;
        check_score("difficultyLevel", self.difficulty_level)?;
        check_score("sessionRating", self.session_rating)?;

        let start = parse_clock("startTime", self.start_time.as_deref())?;
        let end = parse_clock("endTime", self.end_time.as_deref())?;
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                return Err(ValidationError::EndBeforeStart {
                    start: self.start_time.clone().unwrap_or_default(),
                    end: self.end_time.clone().unwrap_or_default(),
                });
            }
        }
        Ok(())
    }

    /// Minutes between start and end, when both are recorded and valid.
    pub fn duration_minutes(&self) -> Option<u32> {
        let start = parse_clock("startTime", self.start_time.as_deref()).ok()??;
        let end = parse_clock("endTime", self.end_time.as_deref()).ok()??;
        let minutes = (end - start).num_minutes();
        u32::try_from(minutes).ok()
    }
}

fn parse_clock(field: &'static str, value: Option<&str>) -> Result<Option<NaiveTime>, ValidationError> {
    match value {
        None => Ok(None),
        Some(text) => NaiveTime::parse_from_str(text.trim(), CLOCK_FORMAT)
            .map(Some)
            .map_err(|_| ValidationError::InvalidTime {
                field,
                value: text.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::{SessionDetails, WritingSession};
    use crate::model::ValidationError;
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 14).unwrap()
    }

    #[test]
    fn validate_rejects_out_of_range_scores() {
        let mut session = WritingSession::new(day(), 300);
        session.details.stress_level = 0;
        assert_eq!(
            session.validate().unwrap_err(),
            ValidationError::ScoreOutOfRange {
                field: "stressLevel",
                value: 0
            }
        );

        session.details.stress_level = 5;
        session.details.session_rating = 6;
        assert!(session.validate().is_err());
    }

    #[test]
    fn validate_rejects_end_before_start_and_bad_clock() {
        let mut session = WritingSession::new(day(), 300);
        session.details.start_time = Some("10:30".to_string());
        session.details.end_time = Some("09:00".to_string());
        assert!(matches!(
            session.validate().unwrap_err(),
            ValidationError::EndBeforeStart { .. }
        ));

        session.details.end_time = Some("late".to_string());
        assert!(matches!(
            session.validate().unwrap_err(),
            ValidationError::InvalidTime { field: "endTime", .. }
        ));
    }

    #[test]
    fn duration_is_derived_from_clock_times() {
        let details = SessionDetails {
            start_time: Some("08:15".to_string()),
            end_time: Some("09:00".to_string()),
            ..SessionDetails::default()
        };
        assert_eq!(details.duration_minutes(), Some(45));
        assert_eq!(SessionDetails::default().duration_minutes(), None);
    }

    #[test]
    fn serializes_as_one_flat_camel_case_object() {
        let mut session = WritingSession::new(day(), 1200);
        session.id = "s1".to_string();
        session.details.was_multitasking = true;

        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["date"], "2024-03-14");
        assert_eq!(value["wordCount"], 1200);
        assert_eq!(value["wasMultitasking"], true);
        assert!(value.get("details").is_none());

        let parsed: WritingSession = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, session);
    }
}
