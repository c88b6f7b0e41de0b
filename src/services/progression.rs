//! Progression engine
//!
//! Wires the pure transition logic to the ledgers. Every request re-reads
//! the user and task state from the database before deciding, and the
//! level bump itself is guarded in SQL, so concurrent requests for one
//! user settle to a single consistent outcome.

use chrono::{Duration, Utc};
use tracing::debug;

use crate::config::settings::GameConfig;
use crate::database::DatabaseService;
use crate::models::{Task, TaskKind};
use crate::state::machine::{decide_advance, decide_back, time_task_remaining, AdvanceDecision, BackDecision};
use crate::utils::errors::Result;
use crate::utils::logging::log_level_change;

/// What the handler should show after an advance request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Show this level's content
    ShowLevel(i32),
    /// The ceiling is reached
    FinalLevel,
    /// No completed task; the user must pick one
    TaskRequired,
}

/// What the handler should show after a back request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackOutcome {
    ShowLevel(i32),
    MainMenu,
}

/// Result of starting the 24h waiting task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeTaskStart {
    Started { deadline: chrono::DateTime<Utc> },
    AlreadyCompleted,
}

/// Result of a "task done" claim on the waiting task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeTaskClaim {
    /// The task is done and the unlock already applied; show this level.
    Completed { level: i32 },
    StillWaiting { remaining: Duration },
    NotStarted,
}

#[derive(Clone)]
pub struct ProgressionService {
    db: DatabaseService,
    config: GameConfig,
}

impl ProgressionService {
    pub fn new(db: DatabaseService, config: GameConfig) -> Self {
        Self { db, config }
    }

    pub fn max_level(&self) -> i32 {
        self.config.max_level
    }

    /// Handle an advance request ("Next level")
    pub async fn advance(&self, user_id: i64) -> Result<AdvanceOutcome> {
        let user = self.db.users.get_required(user_id).await?;
        let viewed = self.db.users.get_viewed_level(user_id).await?;
        let any_completed = self
            .db
            .tasks
            .is_any_completed(user_id, user.current_level)
            .await?;

        let decision = decide_advance(
            user.current_level,
            viewed,
            any_completed,
            self.config.max_level,
        );
        debug!(user_id, ?decision, "Advance decided");

        match decision {
            AdvanceDecision::BrowseForward { to } => {
                self.db.users.set_viewed_level(user_id, to).await?;
                Ok(AdvanceOutcome::ShowLevel(to))
            }
            AdvanceDecision::FinalLevel => Ok(AdvanceOutcome::FinalLevel),
            AdvanceDecision::TaskRequired => Ok(AdvanceOutcome::TaskRequired),
            AdvanceDecision::AutoUnlock { to } => {
                self.db
                    .tasks
                    .record_completed(user_id, 1, TaskKind::Auto)
                    .await?;
                self.bump_and_view(user_id, user.current_level, to).await
            }
            AdvanceDecision::LevelUp { to } => {
                self.bump_and_view(user_id, user.current_level, to).await
            }
        }
    }

    /// Handle a back request while browsing levels
    pub async fn back(&self, user_id: i64) -> Result<BackOutcome> {
        let viewed = self.db.users.get_viewed_level(user_id).await?;

        match decide_back(viewed) {
            BackDecision::ToLevel(to) => {
                self.db.users.set_viewed_level(user_id, to).await?;
                Ok(BackOutcome::ShowLevel(to))
            }
            BackDecision::MainMenu => Ok(BackOutcome::MainMenu),
        }
    }

    /// Jump directly to an unlocked level from the navigation keyboard.
    /// Jumps past `current_level` are clamped to it.
    pub async fn jump(&self, user_id: i64, target: i32) -> Result<i32> {
        let user = self.db.users.get_required(user_id).await?;
        let target = target.clamp(1, user.current_level);
        self.db.users.set_viewed_level(user_id, target).await?;
        Ok(target)
    }

    /// Start the waiting task for the user's current level
    pub async fn start_time_task(&self, user_id: i64) -> Result<TimeTaskStart> {
        let user = self.db.users.get_required(user_id).await?;
        let duration = Duration::hours(self.config.time_task_hours);
        let now = Utc::now();

        let recorded = self
            .db
            .tasks
            .record(user_id, user.current_level, TaskKind::Time, now, duration)
            .await?;

        if recorded {
            Ok(TimeTaskStart::Started {
                deadline: now + duration,
            })
        } else {
            Ok(TimeTaskStart::AlreadyCompleted)
        }
    }

    /// Handle a "task done" claim: completes the waiting task only once
    /// the deadline has actually passed.
    pub async fn claim_time_task(&self, user_id: i64) -> Result<TimeTaskClaim> {
        let user = self.db.users.get_required(user_id).await?;
        let task = self
            .db
            .tasks
            .get(user_id, user.current_level, TaskKind::Time)
            .await?;

        let task = match task {
            Some(task) => task,
            None => return Ok(TimeTaskClaim::NotStarted),
        };

        if task.completed {
            let level = self.bump_after_time_task(user_id, user.current_level).await?;
            return Ok(TimeTaskClaim::Completed { level });
        }

        let duration = task.end_time - task.start_time;
        match time_task_remaining(task.start_time, duration, Utc::now()) {
            Some(remaining) => Ok(TimeTaskClaim::StillWaiting { remaining }),
            None => {
                self.db
                    .tasks
                    .mark_completed(user_id, user.current_level, TaskKind::Time)
                    .await?;
                let level = self.bump_after_time_task(user_id, user.current_level).await?;
                Ok(TimeTaskClaim::Completed { level })
            }
        }
    }

    /// The waiting task bumps the level inline; the guarded update keeps
    /// this a no-op when the level already moved or sits at the cap.
    async fn bump_after_time_task(&self, user_id: i64, from_level: i32) -> Result<i32> {
        let updated = self
            .db
            .users
            .update_level(user_id, from_level + 1, self.config.max_level)
            .await?;
        if updated {
            log_level_change(user_id, from_level, from_level + 1, "time_task");
        }

        let current = self.db.users.get_required(user_id).await?.current_level;
        self.db.users.set_viewed_level(user_id, current).await?;
        Ok(current)
    }

    /// The user's waiting task for their current level, if any
    pub async fn get_time_task(&self, user_id: i64) -> Result<Option<Task>> {
        let user = self.db.users.get_required(user_id).await?;
        self.db
            .tasks
            .get(user_id, user.current_level, TaskKind::Time)
            .await
    }

    /// Whether any task of the current level is already completed
    pub async fn current_level_unlockable(&self, user_id: i64) -> Result<bool> {
        let user = self.db.users.get_required(user_id).await?;
        self.db.tasks.is_any_completed(user_id, user.current_level).await
    }

    async fn bump_and_view(
        &self,
        user_id: i64,
        from_level: i32,
        to_level: i32,
    ) -> Result<AdvanceOutcome> {
        let updated = self
            .db
            .users
            .update_level(user_id, to_level, self.config.max_level)
            .await?;

        if updated {
            log_level_change(user_id, from_level, to_level, "advance");
        }

        // On a lost race another writer already raised the level; show
        // whatever the row now says rather than failing the request.
        let current = self.db.users.get_required(user_id).await?.current_level;
        let show = to_level.min(current);
        self.db.users.set_viewed_level(user_id, show).await?;
        Ok(AdvanceOutcome::ShowLevel(show))
    }
}
