//! Level content repository

use crate::database::DatabasePool;
use crate::models::LevelContent;
use crate::utils::errors::Result;

#[derive(Clone)]
pub struct LevelRepository {
    pool: DatabasePool,
}

impl LevelRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, level_number: i32) -> Result<Option<LevelContent>> {
        let level = sqlx::query_as::<_, LevelContent>(
            r#"
            SELECT level_number, content, rules, asset
            FROM levels WHERE level_number = $1
            "#,
        )
        .bind(level_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(level)
    }
}
