//! User repository
//!
//! Owns the users and user_profiles tables. The level update here is the
//! single write path for `current_level` and carries the monotonic guard
//! in the SQL itself, so concurrent bumps can never regress a user.

use crate::database::DatabasePool;
use crate::models::{UpdateProfileRequest, User, UserProfile};
use crate::state::BotState;
use crate::utils::errors::{AscentError, Result};
use crate::utils::logging::log_invariant_rejection;
use tracing::{debug, info};

#[derive(Clone)]
pub struct UserRepository {
    pool: DatabasePool,
}

impl UserRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Create the user row if it does not exist yet. Safe to call on every
    /// /start; an existing row is left untouched.
    pub async fn create_if_absent(&self, user_id: i64) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id) VALUES ($1)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            sqlx::query(
                r#"
                INSERT INTO user_profiles (user_id) VALUES ($1)
                ON CONFLICT (user_id) DO NOTHING
                "#,
            )
            .bind(user_id)
            .execute(&self.pool)
            .await?;
            info!("Created user {}", user_id);
        }

        Ok(())
    }

    pub async fn get_by_id(&self, user_id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, registration_complete, current_level, current_state,
                   registration_date
            FROM users WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Fetch a user that must exist
    pub async fn get_required(&self, user_id: i64) -> Result<User> {
        self.get_by_id(user_id)
            .await?
            .ok_or(AscentError::UserNotFound { user_id })
    }

    pub async fn set_state(&self, user_id: i64, state: BotState) -> Result<()> {
        let result = sqlx::query("UPDATE users SET current_state = $2 WHERE id = $1")
            .bind(user_id)
            .bind(state)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AscentError::UserNotFound { user_id });
        }

        debug!("User {} state -> {:?}", user_id, state);
        Ok(())
    }

    pub async fn complete_registration(&self, user_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET registration_complete = TRUE, registration_date = NOW()
            WHERE id = $1 AND registration_complete = FALSE
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Raise the user's level to `new_level`. The WHERE clause rejects
    /// regressions, no-op rewrites and values above the cap; a rejected
    /// update returns false instead of failing, because a concurrent
    /// writer winning the race is a normal outcome.
    pub async fn update_level(&self, user_id: i64, new_level: i32, max_level: i32) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users SET current_level = $2
            WHERE id = $1 AND current_level < $2 AND $2 <= $3
            "#,
        )
        .bind(user_id)
        .bind(new_level)
        .bind(max_level)
        .execute(&self.pool)
        .await?;

        let updated = result.rows_affected() > 0;
        if updated {
            info!("User {} advanced to level {}", user_id, new_level);
        } else {
            log_invariant_rejection(
                user_id,
                "update_level",
                "target not above current level or past the cap",
            );
        }

        Ok(updated)
    }

    pub async fn get_profile(&self, user_id: i64) -> Result<Option<UserProfile>> {
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT user_id, name, birthdate, location, language, viewed_level
            FROM user_profiles WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    pub async fn update_profile(&self, user_id: i64, update: UpdateProfileRequest) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE user_profiles SET
                name = COALESCE($2, name),
                birthdate = COALESCE($3, birthdate),
                location = COALESCE($4, location),
                language = COALESCE($5, language),
                viewed_level = COALESCE($6, viewed_level)
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(update.name)
        .bind(update.birthdate)
        .bind(update.location)
        .bind(update.language)
        .bind(update.viewed_level)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn set_viewed_level(&self, user_id: i64, viewed_level: i32) -> Result<()> {
        sqlx::query("UPDATE user_profiles SET viewed_level = $2 WHERE user_id = $1")
            .bind(user_id)
            .bind(viewed_level)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn get_viewed_level(&self, user_id: i64) -> Result<i32> {
        let viewed = sqlx::query_scalar::<_, i32>(
            "SELECT viewed_level FROM user_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        viewed.ok_or(AscentError::UserNotFound { user_id })
    }
}
