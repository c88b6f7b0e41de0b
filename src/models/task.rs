//! Task model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// The way a level can be unlocked. Any one completed task of any kind
/// unlocks the level; `Auto` is reserved for the level-1 freebie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_kind", rename_all = "snake_case")]
pub enum TaskKind {
    Time,
    Referral,
    Donation,
    Auto,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskKind::Time => write!(f, "time"),
            TaskKind::Referral => write!(f, "referral"),
            TaskKind::Donation => write!(f, "donation"),
            TaskKind::Auto => write!(f, "auto"),
        }
    }
}

/// One (user, level, kind) task attempt. The storage layer guarantees at
/// most one row per (user_id, level, task_type).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub user_id: i64,
    pub level: i32,
    pub task_type: TaskKind,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub completed: bool,
    pub completion_time: Option<DateTime<Utc>>,
}
