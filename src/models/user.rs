//! User and profile models

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use crate::state::BotState;

/// A bot user. `current_level` is monotonic and capped at the configured
/// maximum; both properties are enforced by the user repository.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub registration_complete: bool,
    pub current_level: i32,
    pub current_state: BotState,
    pub registration_date: DateTime<Utc>,
}

/// Free-form registration data plus the level the user is currently
/// browsing, which may lag behind `current_level`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub user_id: i64,
    pub name: Option<String>,
    pub birthdate: Option<String>,
    pub location: Option<String>,
    pub language: String,
    pub viewed_level: i32,
}

/// Partial profile update; None fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub birthdate: Option<String>,
    pub location: Option<String>,
    pub language: Option<String>,
    pub viewed_level: Option<i32>,
}
