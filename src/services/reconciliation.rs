//! Payment reconciliation loop
//!
//! Background task that sweeps pending donations against the provider so
//! users who paid but never returned to the chat still get credited. One
//! donation per user per pass keeps a backlog from starving anyone; the
//! next pass picks up the rest.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::config::settings::GameConfig;
use crate::models::{Donation, DonationStatus};
use crate::services::donation::DonationService;
use crate::services::notification::NotificationService;
use crate::utils::errors::Result;

#[derive(Clone)]
pub struct ReconciliationService {
    donations: DonationService,
    notifications: NotificationService,
    interval: Duration,
}

impl ReconciliationService {
    pub fn new(
        donations: DonationService,
        notifications: NotificationService,
        config: &GameConfig,
    ) -> Self {
        Self {
            donations,
            notifications,
            interval: Duration::from_secs(config.reconcile_interval_seconds),
        }
    }

    /// Spawn the loop on the runtime. Runs until the process exits.
    pub fn start(self: Arc<Self>) {
        let interval = self.interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            info!(interval_secs = interval.as_secs(), "Reconciliation loop started");
            loop {
                ticker.tick().await;
                if let Err(e) = self.run_pass().await {
                    error!(error = %e, "Reconciliation pass failed");
                }
            }
        });
    }

    /// One sweep over pending donations. A failure on one donation is
    /// logged and does not abort the pass.
    pub async fn run_pass(&self) -> Result<()> {
        let pending = self.donations.pending_for_reconciliation().await?;
        if pending.is_empty() {
            return Ok(());
        }

        debug!(count = pending.len(), "Reconciling pending donations");
        for donation in pending {
            if let Err(e) = self.reconcile_one(&donation).await {
                error!(
                    donation_id = donation.id,
                    user_id = donation.user_id,
                    error = %e,
                    "Failed to reconcile donation"
                );
            }
        }

        Ok(())
    }

    async fn reconcile_one(&self, donation: &Donation) -> Result<()> {
        // Re-read the row: the interactive path may have settled this
        // donation since the sweep query ran.
        let fresh = match &donation.payment_id {
            Some(payment_id) => self.donations.find_by_payment_id(payment_id).await?,
            None => None,
        };
        let donation = match &fresh {
            Some(row) if row.status != DonationStatus::Pending => return Ok(()),
            Some(row) => row,
            None => donation,
        };

        match self.donations.check_status(donation).await? {
            DonationStatus::Succeeded => {
                self.notifications
                    .notify_payment_succeeded(donation.user_id, donation.level)
                    .await;
            }
            DonationStatus::Canceled => {
                self.notifications
                    .notify_payment_canceled(donation.user_id)
                    .await;
            }
            DonationStatus::Pending | DonationStatus::WaitingForCapture => {}
        }
        Ok(())
    }
}
