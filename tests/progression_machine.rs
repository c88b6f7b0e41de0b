//! End-to-end walkthroughs of the progression decision logic.
//!
//! These drive the pure transition functions the way the handlers do,
//! simulating the ledger snapshot between steps, so whole user journeys
//! can be checked without a database.

use std::collections::HashSet;

use chrono::{Duration, Utc};

use AscentBot::state::machine::{
    decide_advance, decide_back, time_task_remaining, AdvanceDecision, BackDecision,
};
use AscentBot::state::EventKind;

const MAX_LEVEL: i32 = 21;

/// In-memory stand-in for the user row and task ledger
struct Player {
    current_level: i32,
    viewed_level: i32,
    completed: HashSet<i32>,
}

impl Player {
    fn new() -> Self {
        Self {
            current_level: 1,
            viewed_level: 1,
            completed: HashSet::new(),
        }
    }

    fn complete_task(&mut self) {
        self.completed.insert(self.current_level);
    }

    /// Apply one advance request the way the progression service does
    fn advance(&mut self) -> AdvanceDecision {
        let decision = decide_advance(
            self.current_level,
            self.viewed_level,
            self.completed.contains(&self.current_level),
            MAX_LEVEL,
        );
        match decision {
            AdvanceDecision::BrowseForward { to } => self.viewed_level = to,
            AdvanceDecision::AutoUnlock { to } | AdvanceDecision::LevelUp { to } => {
                if to > self.current_level && to <= MAX_LEVEL {
                    self.current_level = to;
                }
                self.viewed_level = self.current_level;
            }
            AdvanceDecision::FinalLevel | AdvanceDecision::TaskRequired => {}
        }
        decision
    }

    fn back(&mut self) -> BackDecision {
        let decision = decide_back(self.viewed_level);
        if let BackDecision::ToLevel(to) = decision {
            self.viewed_level = to;
        }
        decision
    }
}

#[test]
fn new_user_walkthrough_to_level_three() {
    let mut player = Player::new();

    // Level 1 opens level 2 for free.
    assert_eq!(player.advance(), AdvanceDecision::AutoUnlock { to: 2 });
    assert_eq!(player.current_level, 2);

    // Level 2 needs a task before it opens level 3.
    assert_eq!(player.advance(), AdvanceDecision::TaskRequired);
    assert_eq!(player.current_level, 2);

    player.complete_task();
    assert_eq!(player.advance(), AdvanceDecision::LevelUp { to: 3 });
    assert_eq!(player.current_level, 3);
    assert_eq!(player.viewed_level, 3);
}

#[test]
fn browsing_back_never_touches_progress() {
    let mut player = Player::new();
    player.advance();
    player.complete_task();
    player.advance();
    player.complete_task();
    player.advance();
    assert_eq!(player.current_level, 4);

    // Page all the way back to level 1, then one more back exits.
    assert_eq!(player.back(), BackDecision::ToLevel(3));
    assert_eq!(player.back(), BackDecision::ToLevel(2));
    assert_eq!(player.back(), BackDecision::ToLevel(1));
    assert_eq!(player.back(), BackDecision::MainMenu);
    assert_eq!(player.current_level, 4);

    // Paging forward through unlocked levels requires no tasks.
    assert_eq!(player.advance(), AdvanceDecision::BrowseForward { to: 2 });
    assert_eq!(player.advance(), AdvanceDecision::BrowseForward { to: 3 });
    assert_eq!(player.advance(), AdvanceDecision::BrowseForward { to: 4 });
    assert_eq!(player.current_level, 4);

    // Caught up with the edge: the task gate applies again.
    assert_eq!(player.advance(), AdvanceDecision::TaskRequired);
}

#[test]
fn full_game_to_final_level() {
    let mut player = Player::new();
    player.advance();
    for _ in 2..MAX_LEVEL {
        player.complete_task();
        player.advance();
    }
    assert_eq!(player.current_level, MAX_LEVEL);

    // Nothing left to unlock, with or without completed tasks.
    assert_eq!(player.advance(), AdvanceDecision::FinalLevel);
    player.complete_task();
    assert_eq!(player.advance(), AdvanceDecision::FinalLevel);
    assert_eq!(player.current_level, MAX_LEVEL);
}

#[test]
fn repeated_advance_without_task_stays_put() {
    let mut player = Player::new();
    player.advance();

    for _ in 0..5 {
        assert_eq!(player.advance(), AdvanceDecision::TaskRequired);
    }
    assert_eq!(player.current_level, 2);
    assert_eq!(player.viewed_level, 2);
}

#[test]
fn waiting_task_claim_window() {
    let start = Utc::now();
    let day = Duration::hours(24);

    // A claim one minute early is rejected with the remaining time.
    let early = start + Duration::hours(23) + Duration::minutes(59);
    let remaining = time_task_remaining(start, day, early).expect("still waiting");
    assert_eq!(remaining, Duration::minutes(1));

    // At and after the deadline the claim goes through.
    assert_eq!(time_task_remaining(start, day, start + day), None);
    assert_eq!(
        time_task_remaining(start, day, start + day + Duration::seconds(1)),
        None
    );
}

#[test]
fn button_texts_round_trip_through_classifier() {
    // The events the walkthrough depends on must come out of the
    // classifier for the exact button labels the keyboards show.
    assert_eq!(EventKind::classify("Next level"), EventKind::NextLevel);
    assert_eq!(EventKind::classify("Back"), EventKind::Back);
    assert_eq!(EventKind::classify("Task done"), EventKind::CompleteTimeTask);
    assert_eq!(EventKind::classify("Donate"), EventKind::SelectDonationTask);
    assert_eq!(EventKind::classify("4 level"), EventKind::LevelJump(4));
}
