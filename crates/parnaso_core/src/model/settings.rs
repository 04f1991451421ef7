//! Per-user goal settings.
//!
//! # Invariants
//! - A writer without stored settings gets `UserSettings::initial()`
//!   (500 words/day, 2500 words/week).

use serde::{Deserialize, Serialize};

pub const DEFAULT_DAILY_WORD_GOAL: u32 = 500;
pub const DEFAULT_WEEKLY_WORD_GOAL: u32 = 2500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub daily_word_goal: u32,
    pub weekly_word_goal: u32,
}

impl UserSettings {
    /// Settings used when nothing has been stored for a user.
    pub const fn initial() -> Self {
        Self {
            daily_word_goal: DEFAULT_DAILY_WORD_GOAL,
            weekly_word_goal: DEFAULT_WEEKLY_WORD_GOAL,
        }
    }
}

impl Default for UserSettings {
    fn default() -> Self {
        Self::initial()
    }
}
