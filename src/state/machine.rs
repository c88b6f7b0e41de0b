//! Pure transition logic of the progression machine
//!
//! These functions take a snapshot of the user's progression state and
//! decide the next transition without touching storage. The progression
//! service re-reads the ledgers on every call and feeds the fresh values
//! in, so racing callers can never act on stale cached state.

use chrono::{DateTime, Duration, Utc};

/// Outcome of an advance request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceDecision {
    /// The user is browsing an already-unlocked level; move the view
    /// forward without touching `current_level`.
    BrowseForward { to: i32 },
    /// Level 1 carries an implicit auto task; the first advance always
    /// unlocks level 2.
    AutoUnlock { to: i32 },
    /// The ceiling is reached; show the final-level screen.
    FinalLevel,
    /// No completed task for the current level; the user must pick one.
    TaskRequired,
    /// A task is completed; bump the level.
    LevelUp { to: i32 },
}

/// Outcome of a back request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackDecision {
    ToLevel(i32),
    MainMenu,
}

/// Decide what an advance request means for the given snapshot.
///
/// `any_task_completed` must reflect the task ledger for `current_level`
/// at call time; the level bump is only legal when it is true.
pub fn decide_advance(
    current_level: i32,
    viewed_level: i32,
    any_task_completed: bool,
    max_level: i32,
) -> AdvanceDecision {
    if viewed_level < current_level {
        return AdvanceDecision::BrowseForward {
            to: viewed_level + 1,
        };
    }

    if current_level >= max_level {
        return AdvanceDecision::FinalLevel;
    }

    if current_level == 1 {
        return AdvanceDecision::AutoUnlock { to: 2 };
    }

    if !any_task_completed {
        return AdvanceDecision::TaskRequired;
    }

    AdvanceDecision::LevelUp {
        to: current_level + 1,
    }
}

/// Decide what a back request means. Browsing floors at level 1; one more
/// back from there returns to the main menu.
pub fn decide_back(viewed_level: i32) -> BackDecision {
    if viewed_level > 1 {
        BackDecision::ToLevel(viewed_level - 1)
    } else {
        BackDecision::MainMenu
    }
}

/// Remaining wait for a time task, or None once the deadline has passed
pub fn time_task_remaining(
    start_time: DateTime<Utc>,
    duration: Duration,
    now: DateTime<Utc>,
) -> Option<Duration> {
    let deadline = start_time + duration;
    let remaining = deadline - now;
    if remaining > Duration::zero() {
        Some(remaining)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: i32 = 21;

    #[test]
    fn test_browsing_past_levels_is_free() {
        // No task completion is required while the view lags the level.
        let decision = decide_advance(5, 2, false, MAX);
        assert_eq!(decision, AdvanceDecision::BrowseForward { to: 3 });
    }

    #[test]
    fn test_level_one_auto_unlocks() {
        assert_eq!(
            decide_advance(1, 1, false, MAX),
            AdvanceDecision::AutoUnlock { to: 2 }
        );
    }

    #[test]
    fn test_incomplete_task_blocks_advance() {
        assert_eq!(decide_advance(3, 3, false, MAX), AdvanceDecision::TaskRequired);
    }

    #[test]
    fn test_completed_task_bumps_level() {
        assert_eq!(
            decide_advance(3, 3, true, MAX),
            AdvanceDecision::LevelUp { to: 4 }
        );
    }

    #[test]
    fn test_max_level_is_terminal() {
        // Even with a completed task there is nowhere to go.
        assert_eq!(decide_advance(MAX, MAX, true, MAX), AdvanceDecision::FinalLevel);
        assert_eq!(decide_advance(MAX, MAX, false, MAX), AdvanceDecision::FinalLevel);
    }

    #[test]
    fn test_browse_takes_precedence_over_final() {
        // A max-level user browsing level 1 still pages forward.
        assert_eq!(
            decide_advance(MAX, 1, false, MAX),
            AdvanceDecision::BrowseForward { to: 2 }
        );
    }

    #[test]
    fn test_back_navigation() {
        assert_eq!(decide_back(5), BackDecision::ToLevel(4));
        assert_eq!(decide_back(2), BackDecision::ToLevel(1));
        assert_eq!(decide_back(1), BackDecision::MainMenu);
    }

    #[test]
    fn test_time_task_remaining() {
        let start = Utc::now();
        let duration = Duration::hours(24);

        let mid = start + Duration::hours(10);
        let remaining = time_task_remaining(start, duration, mid).unwrap();
        assert_eq!(remaining, Duration::hours(14));

        let after = start + Duration::hours(25);
        assert_eq!(time_task_remaining(start, duration, after), None);

        let exactly = start + duration;
        assert_eq!(time_task_remaining(start, duration, exactly), None);
    }
}
