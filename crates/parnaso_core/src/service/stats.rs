//! Platform-wide aggregation for the admin panel.
//!
//! # Invariants
//! - One unreadable writer never fails the whole aggregate; it is skipped
//!   and counted in `skipped_users`.

use crate::model::user::UserId;
use crate::repo::WritingStore;
use log::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlobalStats {
    pub total_users: usize,
    pub total_words: u64,
    pub total_sessions: usize,
    /// Blocked non-admin accounts.
    pub pending_users: usize,
    /// Users whose sessions could not be read and were left out.
    pub skipped_users: usize,
}

/// Sums sessions and word counts over `user_ids`.
///
/// A user whose sessions fail to load is skipped and logged.
pub fn aggregate_sessions<'a, W: WritingStore + ?Sized>(
    store: &W,
    user_ids: impl IntoIterator<Item = &'a UserId>,
) -> GlobalStats {
    let mut stats = GlobalStats::default();
    for user_id in user_ids {
        stats.total_users += 1;
        match store.list_sessions(user_id) {
            Ok(sessions) => {
                stats.total_sessions += sessions.len();
                stats.total_words += sessions
                    .iter()
                    .map(|session| u64::from(session.word_count))
                    .sum::<u64>();
            }
            Err(err) => {
                stats.skipped_users += 1;
                warn!(
                    "event=stats_aggregate module=stats status=skipped user_id={} error={}",
                    user_id, err
                );
            }
        }
    }
    stats
}
