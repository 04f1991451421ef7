//! Dashboard numbers for one writer.
//!
//! # Invariants
//! - Weeks are ISO weeks (Monday to Sunday) containing `today`.
//! - A streak counts consecutive days with at least one word, ending today
//!   or, when nothing is logged yet today, yesterday.
//! - Percentages are integer, floor-rounded and not capped; a zero target
//!   yields 0.

use crate::model::project::{Project, ProjectId, ProjectStatus};
use crate::model::session::WritingSession;
use crate::model::settings::UserSettings;
use chrono::{Datelike, Days, NaiveDate};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSummary {
    pub today: NaiveDate,
    pub words_today: u64,
    pub words_this_week: u64,
    pub daily_goal: u32,
    pub weekly_goal: u32,
    pub daily_goal_met: bool,
    pub weekly_goal_met: bool,
    pub daily_percent: u32,
    pub weekly_percent: u32,
    pub total_words: u64,
    pub total_sessions: usize,
    /// Sum over sessions with both clock times recorded.
    pub total_minutes: u64,
    pub current_streak_days: u32,
    pub projects: Vec<ProjectProgress>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectProgress {
    pub project_id: ProjectId,
    pub name: String,
    pub status: ProjectStatus,
    pub words: u64,
    pub target_word_count: u32,
    pub percent: u32,
}

pub fn summarize(
    sessions: &[WritingSession],
    projects: &[Project],
    settings: &UserSettings,
    today: NaiveDate,
) -> ProgressSummary {
    let week_start = today - Days::new(u64::from(today.weekday().num_days_from_monday()));
    let week_end = week_start + Days::new(6);

    let mut words_today = 0_u64;
    let mut words_this_week = 0_u64;
    let mut total_words = 0_u64;
    let mut total_minutes = 0_u64;
    let mut words_by_project: HashMap<&str, u64> = HashMap::new();
    let mut active_days = BTreeSet::new();

    for session in sessions {
        let words = u64::from(session.word_count);
        total_words += words;
        if session.date == today {
            words_today += words;
        }
        if (week_start..=week_end).contains(&session.date) {
            words_this_week += words;
        }
        if let Some(minutes) = session.details.duration_minutes() {
            total_minutes += u64::from(minutes);
        }
        if let Some(project_id) = session.project_id.as_deref() {
            *words_by_project.entry(project_id).or_default() += words;
        }
        if words > 0 {
            active_days.insert(session.date);
        }
    }

    let projects = projects
        .iter()
        .map(|project| {
            let words = words_by_project
                .get(project.id.as_str())
                .copied()
                .unwrap_or(0);
            ProjectProgress {
                project_id: project.id.clone(),
                name: project.name.clone(),
                status: project.status,
                words,
                target_word_count: project.target_word_count,
                percent: percent(words, project.target_word_count),
            }
        })
        .collect();

    ProgressSummary {
        today,
        words_today,
        words_this_week,
        daily_goal: settings.daily_word_goal,
        weekly_goal: settings.weekly_word_goal,
        daily_goal_met: words_today >= u64::from(settings.daily_word_goal),
        weekly_goal_met: words_this_week >= u64::from(settings.weekly_word_goal),
        daily_percent: percent(words_today, settings.daily_word_goal),
        weekly_percent: percent(words_this_week, settings.weekly_word_goal),
        total_words,
        total_sessions: sessions.len(),
        total_minutes,
        current_streak_days: streak_ending_at(&active_days, today),
        projects,
    }
}

fn percent(done: u64, target: u32) -> u32 {
    if target == 0 {
        return 0;
    }
    u32::try_from(done * 100 / u64::from(target)).unwrap_or(u32::MAX)
}

fn streak_ending_at(active_days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut cursor = if active_days.contains(&today) {
        today
    } else {
        match today.pred_opt() {
            Some(yesterday) if active_days.contains(&yesterday) => yesterday,
            _ => return 0,
        }
    };

    let mut streak = 0;
    while active_days.contains(&cursor) {
        streak += 1;
        match cursor.pred_opt() {
            Some(previous) => cursor = previous,
            None => break,
        }
    }
    streak
}
