//! Admin command handler

use std::fmt::Write as _;
use std::sync::Arc;

use teloxide::prelude::*;
use tracing::warn;

use crate::config::settings::Settings;
use crate::database::repositories::AdminStatistics;
use crate::database::DatabaseService;
use crate::utils::errors::{AscentError, Result};

/// Handle /admin: render the aggregate statistics for configured admins
pub async fn handle_admin(
    bot: Bot,
    msg: Message,
    db: DatabaseService,
    settings: Arc<Settings>,
) -> Result<()> {
    let user = msg
        .from
        .as_ref()
        .ok_or_else(|| AscentError::InvalidInput("No user in message".to_string()))?;
    let user_id = user.id.0 as i64;

    if !settings.bot.admin_ids.contains(&user_id) {
        warn!(user_id, "Rejected /admin from non-admin");
        return Ok(());
    }

    let stats = db.admin.get_statistics().await?;
    bot.send_message(msg.chat.id, format_statistics(&stats))
        .await?;

    Ok(())
}

fn format_statistics(stats: &AdminStatistics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Bot statistics\n");
    let _ = writeln!(out, "Users: {}", stats.active_users);
    let _ = writeln!(out, "Registered: {}", stats.registered_users);
    let _ = writeln!(out, "Completed tasks: {}", stats.completed_tasks);
    let _ = writeln!(out, "Charity donations: {}", stats.charity_donations);
    let _ = writeln!(
        out,
        "Referrals: {} total, {} completed",
        stats.total_referrals, stats.completed_referrals
    );

    let _ = writeln!(out, "\nUsers per level:");
    for level in &stats.level_distribution {
        let _ = writeln!(out, "  level {}: {}", level.level, level.user_count);
    }

    let _ = writeln!(out, "\nDonations:");
    if stats.donation_totals.is_empty() {
        let _ = writeln!(out, "  none yet");
    }
    for total in &stats.donation_totals {
        let _ = writeln!(
            out,
            "  {} {} across {} payments",
            total.total_amount, total.currency, total.donation_count
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repositories::{DonationStat, LevelStat};
    use rust_decimal::Decimal;

    #[test]
    fn test_format_statistics() {
        let stats = AdminStatistics {
            active_users: 10,
            registered_users: 8,
            completed_tasks: 14,
            charity_donations: 2,
            level_distribution: vec![LevelStat { level: 1, user_count: 6 }],
            donation_totals: vec![DonationStat {
                currency: "RUB".to_string(),
                donation_count: 3,
                total_amount: Decimal::from(1500),
            }],
            total_referrals: 5,
            completed_referrals: 4,
        };

        let text = format_statistics(&stats);
        assert!(text.contains("Users: 10"));
        assert!(text.contains("level 1: 6"));
        assert!(text.contains("1500 RUB across 3 payments"));
        assert!(text.contains("5 total, 4 completed"));
    }
}
