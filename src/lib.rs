//! AscentBot Telegram Bot
//!
//! A Telegram bot that walks users through 21 sequential levels. Each
//! level unlocks after one completed task: a 24 hour waiting task, a
//! referral, or a donation. Progression state lives entirely in Postgres
//! and a background loop reconciles pending payments with the provider.

#![allow(non_snake_case)]

pub mod config;
pub mod database;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{AscentError, Result};

pub use database::DatabaseService;
pub use services::ServiceFactory;
pub use state::{BotState, EventKind};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
