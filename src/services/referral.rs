//! Referral service
//!
//! Records invite edges when a referee follows a deep link and credits
//! referrers once the referee completes registration.

use tracing::{debug, info};

use crate::database::DatabaseService;
use crate::models::{CreateEdgeOutcome, ReferralStatus, TaskKind};
use crate::utils::errors::Result;

#[derive(Clone)]
pub struct ReferralService {
    db: DatabaseService,
    bot_username: String,
}

impl ReferralService {
    pub fn new(db: DatabaseService, bot_username: String) -> Self {
        Self { db, bot_username }
    }

    /// Deep link the referrer shares to invite friends
    pub fn invite_link(&self, referrer_id: i64) -> String {
        format!("https://t.me/{}?start=ref{}", self.bot_username, referrer_id)
    }

    /// Record that `referee_id` arrived via `referrer_id`'s link. The edge
    /// is tagged with the referrer's current level; it only counts toward
    /// that level's task. The referrer must already exist, otherwise the
    /// link is stale and the click is ignored.
    pub async fn record_invite(
        &self,
        referrer_id: i64,
        referee_id: i64,
    ) -> Result<CreateEdgeOutcome> {
        let referrer = match self.db.users.get_by_id(referrer_id).await? {
            Some(user) => user,
            None => {
                debug!(referrer_id, referee_id, "Ignoring referral link for unknown referrer");
                return Ok(CreateEdgeOutcome::Duplicate);
            }
        };

        self.db
            .referrals
            .create_edge(referrer_id, referee_id, referrer.current_level)
            .await
    }

    /// Called when a referee finishes registration: stamp every edge
    /// pointing at them and record a completed referral task for each
    /// referrer at the edge's level, all in one transaction.
    pub async fn complete_for_referee(&self, referee_id: i64) -> Result<()> {
        let mut tx = self.db.begin().await?;

        let edges = self
            .db
            .referrals
            .stamp_registration_tx(&mut tx, referee_id)
            .await?;

        for edge in &edges {
            self.db
                .tasks
                .record_completed_tx(&mut tx, edge.referrer_id, edge.level, TaskKind::Referral)
                .await?;
        }

        tx.commit().await?;

        if !edges.is_empty() {
            info!(
                referee_id,
                credited = edges.len(),
                "Referral registration credited"
            );
        }
        Ok(())
    }

    /// Referral progress for the referrer at one level
    pub async fn get_status(&self, referrer_id: i64, level: i32) -> Result<ReferralStatus> {
        self.db.referrals.get_status(referrer_id, level).await
    }
}
