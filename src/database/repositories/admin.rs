//! Admin statistics repository
//!
//! Read-only aggregate queries behind the /admin command.

use crate::database::DatabasePool;
use crate::utils::errors::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

/// Users per level
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LevelStat {
    pub level: i32,
    pub user_count: i64,
}

/// Succeeded donation totals per currency
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DonationStat {
    pub currency: String,
    pub donation_count: i64,
    pub total_amount: Decimal,
}

/// Snapshot handed to the admin view
#[derive(Debug, Clone, Serialize)]
pub struct AdminStatistics {
    pub active_users: i64,
    pub registered_users: i64,
    pub completed_tasks: i64,
    pub charity_donations: i64,
    pub level_distribution: Vec<LevelStat>,
    pub donation_totals: Vec<DonationStat>,
    pub total_referrals: i64,
    pub completed_referrals: i64,
}

#[derive(Clone)]
pub struct AdminRepository {
    pool: DatabasePool,
}

impl AdminRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    pub async fn get_statistics(&self) -> Result<AdminStatistics> {
        let active_users =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
                .fetch_one(&self.pool)
                .await?;

        let registered_users = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE registration_complete = TRUE",
        )
        .fetch_one(&self.pool)
        .await?;

        let completed_tasks = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM tasks WHERE completed = TRUE",
        )
        .fetch_one(&self.pool)
        .await?;

        let charity_donations = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM donations WHERE level = 0 AND status = 'succeeded'",
        )
        .fetch_one(&self.pool)
        .await?;

        let level_distribution = sqlx::query_as::<_, LevelStat>(
            r#"
            SELECT current_level AS level, COUNT(*) AS user_count
            FROM users
            GROUP BY current_level
            ORDER BY current_level
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let donation_totals = sqlx::query_as::<_, DonationStat>(
            r#"
            SELECT currency, COUNT(*) AS donation_count,
                   COALESCE(SUM(amount), 0) AS total_amount
            FROM donations
            WHERE status = 'succeeded'
            GROUP BY currency
            ORDER BY currency
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let (total_referrals, completed_referrals) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE registration_date IS NOT NULL)
            FROM referrals
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(AdminStatistics {
            active_users,
            registered_users,
            completed_tasks,
            charity_donations,
            level_distribution,
            donation_totals,
            total_referrals,
            completed_referrals,
        })
    }
}
