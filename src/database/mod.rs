//! Database module
//!
//! Connection management, migrations and the repositories.

pub mod connection;
pub mod repositories;
pub mod service;

pub use connection::{create_pool, health_check, run_migrations, DatabaseConfig, DatabasePool};
pub use service::DatabaseService;
