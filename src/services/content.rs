//! Level content service
//!
//! Reads level copy from the database and resolves optional media assets
//! against a single configured directory. All asset lookups go through
//! the resolver so the path convention lives in exactly one place.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::settings::ContentConfig;
use crate::database::DatabaseService;
use crate::models::LevelContent;
use crate::utils::errors::{AscentError, Result};

/// Resolves level asset names to files under the configured assets
/// directory. Missing assets degrade to text-only content.
#[derive(Clone, Debug)]
pub struct AssetResolver {
    assets_dir: PathBuf,
}

impl AssetResolver {
    pub fn new(assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            assets_dir: assets_dir.into(),
        }
    }

    /// Full path for an asset name, or None when the file does not exist.
    /// Names with path separators are rejected so content rows cannot
    /// reach outside the assets directory.
    pub fn resolve(&self, asset: &str) -> Option<PathBuf> {
        if Path::new(asset).components().count() != 1 {
            warn!(asset, "Rejected asset name with path components");
            return None;
        }

        let path = self.assets_dir.join(asset);
        if path.is_file() {
            Some(path)
        } else {
            warn!(asset, "Level asset missing, sending text only");
            None
        }
    }
}

#[derive(Clone)]
pub struct ContentService {
    db: DatabaseService,
    resolver: AssetResolver,
}

impl ContentService {
    pub fn new(db: DatabaseService, config: &ContentConfig) -> Self {
        Self {
            db,
            resolver: AssetResolver::new(&config.assets_dir),
        }
    }

    pub async fn get_level(&self, level_number: i32) -> Result<LevelContent> {
        self.db.levels.get(level_number).await?.ok_or_else(|| {
            AscentError::InvariantViolation(format!("no content for level {}", level_number))
        })
    }

    /// Resolved asset path for a level, if the level names one and the
    /// file is present.
    pub fn asset_path(&self, level: &LevelContent) -> Option<PathBuf> {
        level.asset.as_deref().and_then(|a| self.resolver.resolve(a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolver_rejects_traversal() {
        let resolver = AssetResolver::new("/tmp/assets");
        assert_eq!(resolver.resolve("../etc/passwd"), None);
        assert_eq!(resolver.resolve("a/b.png"), None);
    }

    #[test]
    fn test_resolver_misses_absent_file() {
        let resolver = AssetResolver::new("/nonexistent-assets-dir");
        assert_eq!(resolver.resolve("level1.png"), None);
    }
}
