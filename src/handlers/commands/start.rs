//! Start command handler
//!
//! Entry point for every user. Parses the optional referral deep-link
//! payload, creates the user row if needed and routes into either
//! registration or the main menu.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{debug, info};

use crate::config::settings::Settings;
use crate::database::DatabaseService;
use crate::handlers::keyboards;
use crate::models::CreateEdgeOutcome;
use crate::services::ServiceFactory;
use crate::state::BotState;
use crate::utils::errors::{AscentError, Result};
use crate::utils::helpers::parse_referral_payload;

/// Handle /start, optionally carrying a "ref<id>" payload
pub async fn handle_start(
    bot: Bot,
    msg: Message,
    payload: String,
    services: ServiceFactory,
    db: DatabaseService,
    _settings: Arc<Settings>,
) -> Result<()> {
    let user = msg
        .from
        .as_ref()
        .ok_or_else(|| AscentError::InvalidInput("No user in message".to_string()))?;
    let user_id = user.id.0 as i64;
    let chat_id = msg.chat.id;

    if !chat_id.is_user() {
        return Ok(());
    }

    debug!(user_id, "Processing /start");
    db.users.create_if_absent(user_id).await?;

    // A referral payload only counts on the first contact; later /start
    // clicks on someone's link are deduplicated by the edge constraint.
    if let Some(referrer_id) = parse_referral_payload(&payload) {
        match services.referrals.record_invite(referrer_id, user_id).await? {
            CreateEdgeOutcome::Created => {
                info!(user_id, referrer_id, "User arrived via referral link");
            }
            CreateEdgeOutcome::SelfReferral => {
                bot.send_message(chat_id, "You cannot use your own invite link.")
                    .await?;
            }
            CreateEdgeOutcome::Duplicate => {}
        }
    }

    let user_row = db.users.get_required(user_id).await?;
    if user_row.registration_complete {
        db.users.set_state(user_id, BotState::MainMenu).await?;
        bot.send_message(chat_id, "Welcome back! Choose an option below.")
            .reply_markup(keyboards::main_menu_keyboard())
            .await?;
    } else {
        db.users.set_state(user_id, BotState::LanguageSelection).await?;
        bot.send_message(
            chat_id,
            "Welcome to the Ascent game! Please choose your language.",
        )
        .reply_markup(keyboards::language_keyboard())
        .await?;
    }

    Ok(())
}
