//! Donation model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

/// Provider-side payment status. `Succeeded` is terminal; a database
/// trigger rejects any update that would move a donation away from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "donation_status", rename_all = "snake_case")]
pub enum DonationStatus {
    Pending,
    WaitingForCapture,
    Succeeded,
    Canceled,
}

impl DonationStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, DonationStatus::Succeeded | DonationStatus::Canceled)
    }
}

impl std::fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DonationStatus::Pending => write!(f, "pending"),
            DonationStatus::WaitingForCapture => write!(f, "waiting_for_capture"),
            DonationStatus::Succeeded => write!(f, "succeeded"),
            DonationStatus::Canceled => write!(f, "canceled"),
        }
    }
}

/// A payment intent and its lifecycle. `level` 0 marks a free-standing
/// charitable donation with no progression effect. `processed` flips to
/// true exactly once, when the succeeded payment has been converted into a
/// completed task.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Donation {
    pub id: i64,
    pub user_id: i64,
    pub level: i32,
    pub amount: Decimal,
    pub currency: String,
    pub status: DonationStatus,
    pub processed: bool,
    pub payment_id: Option<String>,
    pub donation_date: Option<DateTime<Utc>>,
}

impl Donation {
    /// Whether this donation funds level progression (as opposed to charity)
    pub fn is_progression(&self) -> bool {
        self.level > 0
    }
}

/// Outcome of the idempotent apply-success commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    AlreadyApplied,
}
