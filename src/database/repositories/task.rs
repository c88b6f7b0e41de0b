//! Task ledger repository
//!
//! One row per (user, level, kind); the UNIQUE constraint makes every
//! recording path idempotent. Completion is sticky: a completed row is
//! never rewound by a later upsert.

use crate::database::DatabasePool;
use crate::models::{Task, TaskKind};
use crate::utils::errors::Result;
use chrono::{DateTime, Duration, Utc};
use sqlx::{Postgres, Transaction};
use tracing::{debug, info};

#[derive(Clone)]
pub struct TaskRepository {
    pool: DatabasePool,
}

impl TaskRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Record a task attempt. When a row for the triple already exists it
    /// is restarted only if still incomplete; a completed row stays
    /// completed and this returns false.
    pub async fn record(
        &self,
        user_id: i64,
        level: i32,
        task_type: TaskKind,
        start_time: DateTime<Utc>,
        duration: Duration,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO tasks (user_id, level, task_type, start_time, end_time)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, level, task_type) DO UPDATE
                SET start_time = EXCLUDED.start_time,
                    end_time = EXCLUDED.end_time
                WHERE tasks.completed = FALSE
            "#,
        )
        .bind(user_id)
        .bind(level)
        .bind(task_type)
        .bind(start_time)
        .bind(start_time + duration)
        .execute(&self.pool)
        .await?;

        let recorded = result.rows_affected() > 0;
        debug!(
            "Task {}/{}/{} recorded: {}",
            user_id, level, task_type, recorded
        );
        Ok(recorded)
    }

    /// Insert a task already marked completed. Idempotent; an existing row
    /// for the triple is left exactly as it is.
    pub async fn record_completed(
        &self,
        user_id: i64,
        level: i32,
        task_type: TaskKind,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tasks
                (user_id, level, task_type, start_time, end_time, completed, completion_time)
            VALUES ($1, $2, $3, NOW(), NOW(), TRUE, NOW())
            ON CONFLICT (user_id, level, task_type) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(level)
        .bind(task_type)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Transaction variant of [`record_completed`](Self::record_completed),
    /// used when the task write must commit atomically with another ledger.
    pub async fn record_completed_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: i64,
        level: i32,
        task_type: TaskKind,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tasks
                (user_id, level, task_type, start_time, end_time, completed, completion_time)
            VALUES ($1, $2, $3, NOW(), NOW(), TRUE, NOW())
            ON CONFLICT (user_id, level, task_type) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(level)
        .bind(task_type)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Mark an existing task completed. Returns false when no incomplete
    /// row matched, which covers both missing and already-completed tasks.
    pub async fn mark_completed(
        &self,
        user_id: i64,
        level: i32,
        task_type: TaskKind,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE tasks SET completed = TRUE, completion_time = NOW()
            WHERE user_id = $1 AND level = $2 AND task_type = $3
              AND completed = FALSE
            "#,
        )
        .bind(user_id)
        .bind(level)
        .bind(task_type)
        .execute(&self.pool)
        .await?;

        let marked = result.rows_affected() > 0;
        if marked {
            info!("User {} completed {} task for level {}", user_id, task_type, level);
        }
        Ok(marked)
    }

    /// Whether any task of any kind is completed for the level. This is
    /// the OR-semantics gate the progression engine checks before a bump.
    pub async fn is_any_completed(&self, user_id: i64, level: i32) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM tasks
                WHERE user_id = $1 AND level = $2 AND completed = TRUE
            )
            "#,
        )
        .bind(user_id)
        .bind(level)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn is_completed(
        &self,
        user_id: i64,
        level: i32,
        task_type: TaskKind,
    ) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM tasks
                WHERE user_id = $1 AND level = $2 AND task_type = $3
                  AND completed = TRUE
            )
            "#,
        )
        .bind(user_id)
        .bind(level)
        .bind(task_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn get(
        &self,
        user_id: i64,
        level: i32,
        task_type: TaskKind,
    ) -> Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, level, task_type, start_time, end_time,
                   completed, completion_time
            FROM tasks
            WHERE user_id = $1 AND level = $2 AND task_type = $3
            "#,
        )
        .bind(user_id)
        .bind(level)
        .bind(task_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    /// Levels the user has at least one completed task for, ascending
    pub async fn completed_levels(&self, user_id: i64) -> Result<Vec<i32>> {
        let levels = sqlx::query_scalar::<_, i32>(
            r#"
            SELECT DISTINCT level FROM tasks
            WHERE user_id = $1 AND completed = TRUE
            ORDER BY level
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(levels)
    }

    /// All tasks the user has recorded for a level, completed or not
    pub async fn get_for_level(&self, user_id: i64, level: i32) -> Result<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, level, task_type, start_time, end_time,
                   completed, completion_time
            FROM tasks
            WHERE user_id = $1 AND level = $2
            ORDER BY start_time
            "#,
        )
        .bind(user_id)
        .bind(level)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }
}
