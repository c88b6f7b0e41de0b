//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use rust_decimal::Decimal;
use crate::utils::errors::{AscentError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_bot_config(&settings.bot)?;
    validate_database_config(&settings.database)?;
    validate_payment_config(&settings.payment)?;
    validate_game_config(&settings.game)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate bot configuration
fn validate_bot_config(config: &super::BotConfig) -> Result<()> {
    if config.token.is_empty() {
        return Err(AscentError::Config("Bot token is required".to_string()));
    }

    if config.username.is_empty() {
        return Err(AscentError::Config(
            "Bot username is required for referral links".to_string(),
        ));
    }

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(AscentError::Config("Database URL is required".to_string()));
    }

    if config.max_connections == 0 {
        return Err(AscentError::Config(
            "Max connections must be greater than 0".to_string(),
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(AscentError::Config(
            "Min connections cannot be greater than max connections".to_string(),
        ));
    }

    Ok(())
}

/// Validate payment provider configuration
fn validate_payment_config(config: &super::PaymentConfig) -> Result<()> {
    if config.api_url.is_empty() {
        return Err(AscentError::Config(
            "Payment provider API URL is required".to_string(),
        ));
    }

    if config.shop_id.is_empty() || config.secret_key.is_empty() {
        return Err(AscentError::Config(
            "Payment provider credentials are required".to_string(),
        ));
    }

    if config.timeout_seconds == 0 {
        return Err(AscentError::Config(
            "Payment provider timeout must be greater than 0".to_string(),
        ));
    }

    if config.level_amount < Decimal::ONE {
        return Err(AscentError::Config(
            "Level donation amount must be at least 1.00".to_string(),
        ));
    }

    Ok(())
}

/// Validate game configuration
fn validate_game_config(config: &super::GameConfig) -> Result<()> {
    if config.max_level < 2 {
        return Err(AscentError::Config(
            "Max level must be at least 2".to_string(),
        ));
    }

    if config.time_task_hours <= 0 {
        return Err(AscentError::Config(
            "Time task duration must be positive".to_string(),
        ));
    }

    if config.reconcile_interval_seconds == 0 {
        return Err(AscentError::Config(
            "Reconciliation interval must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(AscentError::Config("Log level is required".to_string()));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(AscentError::Config(format!(
            "Invalid log level: {}. Valid levels: {:?}",
            config.level, valid_levels
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> Settings {
        let mut settings = Settings::default();
        settings.bot.token = "123:token".to_string();
        settings.payment.shop_id = "shop".to_string();
        settings.payment.secret_key = "secret".to_string();
        settings
    }

    #[test]
    fn test_valid_settings_pass() {
        assert!(validate_settings(&configured()).is_ok());
    }

    #[test]
    fn test_missing_token_rejected() {
        let mut settings = configured();
        settings.bot.token.clear();
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_zero_amount_rejected() {
        let mut settings = configured();
        settings.payment.level_amount = Decimal::ZERO;
        assert!(validate_settings(&settings).is_err());
    }
}
