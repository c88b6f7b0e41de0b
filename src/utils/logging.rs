//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging
//! utilities for the AscentBot application.

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use crate::config::LoggingConfig;
use crate::utils::errors::Result;

/// Initialize logging based on configuration
pub fn init_logging(config: &LoggingConfig) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.file_path, "ascentbot.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
        .init();

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log level transitions with structured data
pub fn log_level_change(user_id: i64, from_level: i32, to_level: i32, trigger: &str) {
    info!(
        user_id = user_id,
        from_level = from_level,
        to_level = to_level,
        trigger = trigger,
        "User level changed"
    );
}

/// Log payment lifecycle events
pub fn log_payment_event(user_id: i64, donation_id: i64, status: &str, details: Option<&str>) {
    info!(
        user_id = user_id,
        donation_id = donation_id,
        status = status,
        details = details,
        "Payment event"
    );
}

/// Log rejected operations that are silently treated as no-ops
pub fn log_invariant_rejection(user_id: i64, operation: &str, reason: &str) {
    warn!(
        user_id = user_id,
        operation = operation,
        reason = reason,
        "Operation rejected to preserve invariant"
    );
}
