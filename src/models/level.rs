//! Level content model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Static content for one level, managed externally and read-only here
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LevelContent {
    pub level_number: i32,
    pub content: String,
    pub rules: Option<String>,
    pub asset: Option<String>,
}
