//! Donation ledger repository
//!
//! Donations track a provider-side payment through its lifecycle. Status
//! writes go through here; the succeeded-is-terminal rule is additionally
//! enforced by a database trigger so no other path can break it either.

use crate::database::DatabasePool;
use crate::models::Donation;
use crate::utils::errors::Result;
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use tracing::info;

#[derive(Clone)]
pub struct DonationRepository {
    pool: DatabasePool,
}

impl DonationRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Record a new payment intent. `level` 0 marks a charity donation.
    pub async fn create(
        &self,
        user_id: i64,
        level: i32,
        amount: Decimal,
        currency: &str,
        payment_id: &str,
    ) -> Result<Donation> {
        let donation = sqlx::query_as::<_, Donation>(
            r#"
            INSERT INTO donations (user_id, level, amount, currency, payment_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, level, amount, currency, status, processed,
                      payment_id, donation_date
            "#,
        )
        .bind(user_id)
        .bind(level)
        .bind(amount)
        .bind(currency)
        .bind(payment_id)
        .fetch_one(&self.pool)
        .await?;

        info!(
            "Donation {} created for user {} (level {}, {} {})",
            donation.id, user_id, level, amount, currency
        );
        Ok(donation)
    }

    /// Latest donation for a (user, level) pair
    pub async fn get_last(&self, user_id: i64, level: i32) -> Result<Option<Donation>> {
        let donation = sqlx::query_as::<_, Donation>(
            r#"
            SELECT id, user_id, level, amount, currency, status, processed,
                   payment_id, donation_date
            FROM donations
            WHERE user_id = $1 AND level = $2
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(level)
        .fetch_optional(&self.pool)
        .await?;

        Ok(donation)
    }

    pub async fn find_by_payment_id(&self, payment_id: &str) -> Result<Option<Donation>> {
        let donation = sqlx::query_as::<_, Donation>(
            r#"
            SELECT id, user_id, level, amount, currency, status, processed,
                   payment_id, donation_date
            FROM donations
            WHERE payment_id = $1
            "#,
        )
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(donation)
    }

    /// Pending donations, newest first per user so the reconciliation pass
    /// can take exactly one per user with DISTINCT ON.
    pub async fn get_pending(&self) -> Result<Vec<Donation>> {
        let donations = sqlx::query_as::<_, Donation>(
            r#"
            SELECT DISTINCT ON (user_id)
                   id, user_id, level, amount, currency, status, processed,
                   payment_id, donation_date
            FROM donations
            WHERE status = 'pending' AND payment_id IS NOT NULL
            ORDER BY user_id, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(donations)
    }

    /// All succeeded charity donations for a user
    pub async fn get_charity_donations(&self, user_id: i64) -> Result<Vec<Donation>> {
        let donations = sqlx::query_as::<_, Donation>(
            r#"
            SELECT id, user_id, level, amount, currency, status, processed,
                   payment_id, donation_date
            FROM donations
            WHERE user_id = $1 AND level = 0 AND status = 'succeeded'
            ORDER BY donation_date
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(donations)
    }

    /// Lock one donation row for the duration of the transaction. The
    /// apply-success commit reads through this so two concurrent appliers
    /// serialize on the row.
    pub async fn lock_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        donation_id: i64,
    ) -> Result<Option<Donation>> {
        let donation = sqlx::query_as::<_, Donation>(
            r#"
            SELECT id, user_id, level, amount, currency, status, processed,
                   payment_id, donation_date
            FROM donations
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(donation_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(donation)
    }

    /// Flip the row to succeeded and processed in the caller's transaction.
    /// The donation date is stamped only if not already set.
    pub async fn mark_succeeded_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        donation_id: i64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE donations
            SET status = 'succeeded', processed = TRUE,
                donation_date = COALESCE(donation_date, NOW())
            WHERE id = $1
            "#,
        )
        .bind(donation_id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Mark a donation canceled. The status trigger rejects this for a
    /// donation that already succeeded.
    pub async fn mark_canceled(&self, donation_id: i64) -> Result<()> {
        sqlx::query("UPDATE donations SET status = 'canceled' WHERE id = $1")
            .bind(donation_id)
            .execute(&self.pool)
            .await?;

        info!("Donation {} canceled", donation_id);
        Ok(())
    }
}
