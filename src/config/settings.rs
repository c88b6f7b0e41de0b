//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub bot: BotConfig,
    pub database: DatabaseConfig,
    pub payment: PaymentConfig,
    pub game: GameConfig,
    pub content: ContentConfig,
    pub logging: LoggingConfig,
}

/// Telegram bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    pub token: String,
    pub username: String,
    pub admin_ids: Vec<i64>,
    pub community_url: String,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Payment provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentConfig {
    pub api_url: String,
    pub shop_id: String,
    pub secret_key: String,
    pub return_url: String,
    pub timeout_seconds: u64,
    pub level_amount: Decimal,
    pub currency: String,
}

/// Progression game configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GameConfig {
    pub max_level: i32,
    pub time_task_hours: i64,
    pub reconcile_interval_seconds: u64,
}

/// Level content asset configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContentConfig {
    pub assets_dir: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("ASCENTBOT").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::AscentError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                token: String::new(),
                username: "ascent_bot".to_string(),
                admin_ids: vec![],
                community_url: "https://t.me/ascent_community".to_string(),
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/ascentbot".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            payment: PaymentConfig {
                api_url: "https://api.yookassa.ru/v3".to_string(),
                shop_id: String::new(),
                secret_key: String::new(),
                return_url: "https://t.me/ascent_bot".to_string(),
                timeout_seconds: 10,
                level_amount: Decimal::from(500),
                currency: "RUB".to_string(),
            },
            game: GameConfig {
                max_level: 21,
                time_task_hours: 24,
                reconcile_interval_seconds: 60,
            },
            content: ContentConfig {
                assets_dir: "assets/levels".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: "logs".to_string(),
            },
        }
    }
}
