//! Database service aggregating all repositories

use crate::database::repositories::{
    AdminRepository, DonationRepository, LevelRepository, ReferralRepository, TaskRepository,
    UserRepository,
};
use crate::database::DatabasePool;
use crate::utils::errors::Result;
use sqlx::{Postgres, Transaction};

/// Holds one repository per ledger over a shared pool. Cross-ledger
/// commits open a transaction here and pass it to the `_tx` repository
/// methods.
#[derive(Clone)]
pub struct DatabaseService {
    pool: DatabasePool,
    pub users: UserRepository,
    pub tasks: TaskRepository,
    pub referrals: ReferralRepository,
    pub donations: DonationRepository,
    pub levels: LevelRepository,
    pub admin: AdminRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            tasks: TaskRepository::new(pool.clone()),
            referrals: ReferralRepository::new(pool.clone()),
            donations: DonationRepository::new(pool.clone()),
            levels: LevelRepository::new(pool.clone()),
            admin: AdminRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
        Ok(self.pool.begin().await?)
    }

    pub async fn health_check(&self) -> Result<()> {
        crate::database::connection::health_check(&self.pool).await?;
        Ok(())
    }
}
