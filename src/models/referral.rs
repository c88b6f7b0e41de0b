//! Referral edge model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A referrer → referee invitation, tagged with the level the referrer was
/// at when the invite was followed. `registration_date` is stamped once,
/// when the referee completes registration.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReferralEdge {
    pub id: i64,
    pub referrer_id: i64,
    pub referee_id: i64,
    pub level: i32,
    pub referral_date: DateTime<Utc>,
    pub registration_date: Option<DateTime<Utc>>,
}

/// Aggregate referral progress for one (referrer, level)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralStatus {
    pub total: i64,
    pub completed: i64,
    pub pending: i64,
}

/// Outcome of an edge creation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateEdgeOutcome {
    Created,
    Duplicate,
    SelfReferral,
}
