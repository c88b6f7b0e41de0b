//! Donation service
//!
//! Owns the payment-to-task path. `apply_success` is the only place a
//! succeeded payment becomes a completed task, and it commits the status
//! flip, the processed flag and the task row in one transaction behind a
//! row lock, so the bot handler and the reconciliation loop can both call
//! it for the same donation without double-crediting.

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::config::settings::PaymentConfig;
use crate::database::DatabaseService;
use crate::models::{ApplyOutcome, Donation, DonationStatus, TaskKind};
use crate::services::payment::{Checkout, PaymentService};
use crate::utils::errors::{AscentError, Result};
use crate::utils::logging::log_payment_event;

/// Marker level for charitable donations that do not unlock anything
pub const CHARITY_LEVEL: i32 = 0;

#[derive(Clone)]
pub struct DonationService {
    db: DatabaseService,
    payments: PaymentService,
    config: PaymentConfig,
}

impl DonationService {
    pub fn new(db: DatabaseService, payments: PaymentService, config: PaymentConfig) -> Self {
        Self {
            db,
            payments,
            config,
        }
    }

    /// Create a progression payment intent for the user's level. Returns
    /// the checkout the user must complete.
    pub async fn create_level_intent(&self, user_id: i64, level: i32) -> Result<Checkout> {
        let description = format!("Level {} donation", level);
        let checkout = self
            .payments
            .create_checkout(self.config.level_amount, &description)
            .await?;

        let donation = self
            .db
            .donations
            .create(
                user_id,
                level,
                self.config.level_amount,
                &self.config.currency,
                &checkout.payment_id,
            )
            .await?;

        log_payment_event(user_id, donation.id, "created", Some(&checkout.payment_id));
        Ok(checkout)
    }

    /// Create a charity payment intent for a user-chosen amount
    pub async fn create_charity_intent(&self, user_id: i64, amount: Decimal) -> Result<Checkout> {
        let checkout = self
            .payments
            .create_checkout(amount, "Charity donation")
            .await?;

        let donation = self
            .db
            .donations
            .create(
                user_id,
                CHARITY_LEVEL,
                amount,
                &self.config.currency,
                &checkout.payment_id,
            )
            .await?;

        log_payment_event(user_id, donation.id, "created", Some(&checkout.payment_id));
        Ok(checkout)
    }

    /// Ask the provider for the donation's current status and fold the
    /// answer into the ledger. Returns the resulting status.
    pub async fn check_status(&self, donation: &Donation) -> Result<DonationStatus> {
        if donation.status == DonationStatus::Succeeded {
            return Ok(DonationStatus::Succeeded);
        }

        let payment_id = donation.payment_id.as_deref().ok_or_else(|| {
            AscentError::InvariantViolation(format!(
                "donation {} has no provider payment id",
                donation.id
            ))
        })?;

        let status = self.payments.get_status(payment_id).await?;
        match status {
            DonationStatus::Succeeded => {
                self.apply_success(donation.id).await?;
            }
            DonationStatus::Canceled => {
                self.db.donations.mark_canceled(donation.id).await?;
                log_payment_event(donation.user_id, donation.id, "canceled", Some(payment_id));
            }
            DonationStatus::Pending | DonationStatus::WaitingForCapture => {
                debug!(donation_id = donation.id, status = %status, "Donation still in flight");
            }
        }

        Ok(status)
    }

    /// Convert a succeeded payment into ledger state, exactly once.
    ///
    /// Locks the donation row, short-circuits when a previous caller
    /// already applied it, and otherwise commits the status flip, the
    /// processed flag and the completed donation task atomically. Charity
    /// donations get no task row.
    pub async fn apply_success(&self, donation_id: i64) -> Result<ApplyOutcome> {
        let mut tx = self.db.begin().await?;

        let donation = self
            .db
            .donations
            .lock_tx(&mut tx, donation_id)
            .await?
            .ok_or(AscentError::DonationNotFound { donation_id })?;

        if donation.status == DonationStatus::Succeeded && donation.processed {
            tx.rollback().await?;
            debug!(donation_id, "Donation already applied, skipping");
            return Ok(ApplyOutcome::AlreadyApplied);
        }

        self.db.donations.mark_succeeded_tx(&mut tx, donation_id).await?;

        if donation.is_progression() {
            self.db
                .tasks
                .record_completed_tx(&mut tx, donation.user_id, donation.level, TaskKind::Donation)
                .await?;
        }

        tx.commit().await?;

        info!(
            donation_id,
            user_id = donation.user_id,
            level = donation.level,
            "Donation applied"
        );
        log_payment_event(
            donation.user_id,
            donation.id,
            "succeeded",
            donation.payment_id.as_deref(),
        );

        Ok(ApplyOutcome::Applied)
    }

    /// Pending donations to sweep, at most one per user
    pub async fn pending_for_reconciliation(&self) -> Result<Vec<Donation>> {
        self.db.donations.get_pending().await
    }

    /// Fresh ledger row for a provider payment id
    pub async fn find_by_payment_id(&self, payment_id: &str) -> Result<Option<Donation>> {
        self.db.donations.find_by_payment_id(payment_id).await
    }

    /// Latest progression donation for the user's level, if any
    pub async fn get_last_for_level(&self, user_id: i64, level: i32) -> Result<Option<Donation>> {
        self.db.donations.get_last(user_id, level).await
    }

    /// Latest charity donation for the user, if any
    pub async fn get_last_charity(&self, user_id: i64) -> Result<Option<Donation>> {
        self.db.donations.get_last(user_id, CHARITY_LEVEL).await
    }

    /// Every succeeded charity donation the user has made
    pub async fn charity_donations(&self, user_id: i64) -> Result<Vec<Donation>> {
        self.db.donations.get_charity_donations(user_id).await
    }
}
