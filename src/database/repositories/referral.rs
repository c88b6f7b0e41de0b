//! Referral ledger repository
//!
//! Edges are unique per (referrer, referee, level) and self-referrals are
//! rejected, both by schema constraints. An edge counts toward the
//! referrer's task only once its `registration_date` is stamped.

use crate::database::DatabasePool;
use crate::models::{CreateEdgeOutcome, ReferralEdge, ReferralStatus};
use crate::utils::errors::Result;
use sqlx::{Postgres, Transaction};
use tracing::{debug, info};

#[derive(Clone)]
pub struct ReferralRepository {
    pool: DatabasePool,
}

impl ReferralRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Record a referrer → referee edge at the referrer's current level.
    /// Duplicates and self-referrals are detected, not errored, because
    /// both arise from ordinary user behavior (clicking a link twice,
    /// clicking one's own link).
    pub async fn create_edge(
        &self,
        referrer_id: i64,
        referee_id: i64,
        level: i32,
    ) -> Result<CreateEdgeOutcome> {
        if referrer_id == referee_id {
            return Ok(CreateEdgeOutcome::SelfReferral);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO referrals (referrer_id, referee_id, level)
            VALUES ($1, $2, $3)
            ON CONFLICT (referrer_id, referee_id, level) DO NOTHING
            "#,
        )
        .bind(referrer_id)
        .bind(referee_id)
        .bind(level)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            info!(
                "Referral edge created: {} -> {} at level {}",
                referrer_id, referee_id, level
            );
            Ok(CreateEdgeOutcome::Created)
        } else {
            debug!(
                "Duplicate referral edge ignored: {} -> {} at level {}",
                referrer_id, referee_id, level
            );
            Ok(CreateEdgeOutcome::Duplicate)
        }
    }

    /// Stamp the registration date on every unstamped edge pointing at the
    /// referee and return the stamped edges, so the caller can credit each
    /// referrer. Runs in the caller's transaction so the credit and the
    /// stamp commit together.
    pub async fn stamp_registration_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        referee_id: i64,
    ) -> Result<Vec<ReferralEdge>> {
        let edges = sqlx::query_as::<_, ReferralEdge>(
            r#"
            UPDATE referrals SET registration_date = NOW()
            WHERE referee_id = $1 AND registration_date IS NULL
            RETURNING id, referrer_id, referee_id, level, referral_date,
                      registration_date
            "#,
        )
        .bind(referee_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(edges)
    }

    /// Referral progress for one (referrer, level)
    pub async fn get_status(&self, referrer_id: i64, level: i32) -> Result<ReferralStatus> {
        let (total, completed) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE registration_date IS NOT NULL)
            FROM referrals
            WHERE referrer_id = $1 AND level = $2
            "#,
        )
        .bind(referrer_id)
        .bind(level)
        .fetch_one(&self.pool)
        .await?;

        Ok(ReferralStatus {
            total,
            completed,
            pending: total - completed,
        })
    }
}
