//! Message handlers module
//!
//! Every non-command message lands here. The text is classified into an
//! event exactly once, the user's conversation state is read fresh from
//! the database, and the (state, event) pair picks the transition. State
//! is never cached between messages.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::InputFile;
use tracing::{debug, warn};

use rust_decimal::Decimal;

use crate::config::settings::Settings;
use crate::database::DatabaseService;
use crate::handlers::keyboards;
use crate::models::{DonationStatus, ReferralStatus, TaskKind, UpdateProfileRequest};
use crate::services::progression::{AdvanceOutcome, BackOutcome, TimeTaskClaim, TimeTaskStart};
use crate::services::ServiceFactory;
use crate::state::{BotState, EventKind};
use crate::utils::errors::{AscentError, Result};
use crate::utils::helpers::{
    format_deadline, format_remaining, parse_amount, validate_birthdate, validate_location,
    validate_name,
};

/// Handle an incoming text message against the user's stored state
pub async fn handle_message(
    bot: Bot,
    msg: Message,
    services: ServiceFactory,
    db: DatabaseService,
    settings: Arc<Settings>,
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

    let text = match msg.text() {
        Some(text) => text,
        None => return Ok(()),
    };

    let user_row = match db.users.get_by_id(user_id).await? {
        Some(row) => row,
        None => {
            // Message before any /start; nothing to route against.
            bot.send_message(chat_id, "Press /start to begin.").await?;
            return Ok(());
        }
    };

    let event = EventKind::classify(text);
    debug!(user_id, state = ?user_row.current_state, ?event, "Routing message");

    let ctx = HandlerContext {
        bot,
        chat_id,
        user_id,
        services,
        db,
        settings,
    };

    match (user_row.current_state, event) {
        // Registration flow
        (BotState::LanguageSelection, EventKind::FreeText(text)) => {
            ctx.handle_language_choice(&text).await
        }
        (BotState::LanguageSelection, EventKind::AcceptRules) => ctx.handle_rules_accepted().await,
        (BotState::RegistrationName, EventKind::FreeText(text)) => {
            ctx.handle_name_input(&text).await
        }
        (BotState::RegistrationBirthdate, EventKind::FreeText(text)) => {
            ctx.handle_birthdate_input(&text).await
        }
        (BotState::RegistrationLocation, EventKind::FreeText(text)) => {
            ctx.handle_location_input(&text).await
        }

        // Main menu
        (BotState::MainMenu, EventKind::StartGame) => ctx.enter_game().await,
        (BotState::MainMenu, EventKind::Rules) => ctx.show_game_rules().await,
        (BotState::MainMenu, EventKind::About) => ctx.show_about().await,
        (BotState::MainMenu, EventKind::Faq) => ctx.show_faq().await,
        (BotState::MainMenu, EventKind::Charity) => ctx.enter_charity().await,

        (BotState::Faq, EventKind::Back) => ctx.show_main_menu().await,

        // Level browsing
        (BotState::LevelContent, EventKind::NextLevel | EventKind::Next) => ctx.advance().await,
        (BotState::LevelContent, EventKind::Back) => ctx.go_back().await,
        (BotState::LevelContent, EventKind::LevelJump(target)) => ctx.jump(target).await,
        (BotState::LevelContent, EventKind::LevelRules) => ctx.show_level_rules().await,

        // Task selection
        (BotState::TaskSelection, EventKind::SelectTimeTask) => ctx.enter_time_task().await,
        (BotState::TaskSelection, EventKind::SelectReferralTask) => {
            ctx.enter_referral_task().await
        }
        (BotState::TaskSelection, EventKind::SelectDonationTask) => {
            ctx.enter_donation_task().await
        }
        (BotState::TaskSelection, EventKind::Back) => ctx.show_current_level().await,

        // Waiting task
        (BotState::TimeTask, EventKind::StartTimeTask) => ctx.start_time_task().await,
        (BotState::TimeTask, EventKind::CompleteTimeTask) => ctx.claim_time_task().await,
        (BotState::TimeTask, EventKind::Back) => ctx.show_task_selection().await,

        // Referral task
        (BotState::ReferralTask, EventKind::CheckStatus) => ctx.check_referral_status().await,
        (BotState::ReferralTask, EventKind::Back) => ctx.show_task_selection().await,

        // Donation task
        (BotState::DonationTask, EventKind::CheckStatus) => ctx.check_donation_status().await,
        (BotState::DonationTask, EventKind::Back) => ctx.show_task_selection().await,

        // Charity
        (BotState::CharityInput, EventKind::CharityStatus) => ctx.check_charity_status().await,
        (BotState::CharityInput, EventKind::Back) => ctx.show_main_menu().await,
        (BotState::CharityInput, EventKind::FreeText(text)) => {
            ctx.handle_charity_amount(&text).await
        }

        // Final level
        (BotState::FinalLevel, EventKind::CommunityLink) => ctx.show_community_link().await,
        (BotState::FinalLevel, EventKind::Charity) => ctx.enter_charity().await,
        (BotState::FinalLevel, EventKind::Back) => ctx.show_current_level().await,

        (state, event) => {
            warn!(user_id, ?state, ?event, "Unhandled event for state");
            ctx.bot
                .send_message(chat_id, "Please use the buttons below.")
                .await?;
            Ok(())
        }
    }
}

struct HandlerContext {
    bot: Bot,
    chat_id: ChatId,
    user_id: i64,
    services: ServiceFactory,
    db: DatabaseService,
    settings: Arc<Settings>,
}

impl HandlerContext {
    // Registration

    async fn handle_language_choice(&self, text: &str) -> Result<()> {
        let language = match text {
            keyboards::LANG_RUSSIAN => "ru",
            keyboards::LANG_ENGLISH => "en",
            _ => {
                self.bot
                    .send_message(self.chat_id, "Please pick a language from the keyboard.")
                    .reply_markup(keyboards::language_keyboard())
                    .await?;
                return Ok(());
            }
        };

        self.db
            .users
            .update_profile(
                self.user_id,
                UpdateProfileRequest {
                    language: Some(language.to_string()),
                    ..Default::default()
                },
            )
            .await?;
        self.bot
            .send_message(
                self.chat_id,
                "The game has 21 levels, one small action each. Press \
                 \"Accept\" to agree with the rules and register.",
            )
            .reply_markup(keyboards::accept_keyboard())
            .await?;
        Ok(())
    }

    async fn handle_rules_accepted(&self) -> Result<()> {
        self.db
            .users
            .set_state(self.user_id, BotState::RegistrationName)
            .await?;
        self.bot
            .send_message(self.chat_id, "What is your name?")
            .await?;
        Ok(())
    }

    async fn handle_name_input(&self, text: &str) -> Result<()> {
        if !validate_name(text) {
            self.bot
                .send_message(
                    self.chat_id,
                    "Please send your name: letters only, 2 to 50 characters.",
                )
                .await?;
            return Ok(());
        }

        self.db
            .users
            .update_profile(
                self.user_id,
                UpdateProfileRequest {
                    name: Some(text.trim().to_string()),
                    ..Default::default()
                },
            )
            .await?;
        self.db
            .users
            .set_state(self.user_id, BotState::RegistrationBirthdate)
            .await?;
        self.bot
            .send_message(self.chat_id, "Your birthdate? (DD.MM.YYYY)")
            .await?;
        Ok(())
    }

    async fn handle_birthdate_input(&self, text: &str) -> Result<()> {
        if !validate_birthdate(text) {
            self.bot
                .send_message(self.chat_id, "Please use the DD.MM.YYYY format.")
                .await?;
            return Ok(());
        }

        self.db
            .users
            .update_profile(
                self.user_id,
                UpdateProfileRequest {
                    birthdate: Some(text.trim().to_string()),
                    ..Default::default()
                },
            )
            .await?;
        self.db
            .users
            .set_state(self.user_id, BotState::RegistrationLocation)
            .await?;
        self.bot
            .send_message(self.chat_id, "Which city are you from?")
            .await?;
        Ok(())
    }

    async fn handle_location_input(&self, text: &str) -> Result<()> {
        if !validate_location(text) {
            self.bot
                .send_message(self.chat_id, "Please send your city.")
                .await?;
            return Ok(());
        }

        self.db
            .users
            .update_profile(
                self.user_id,
                UpdateProfileRequest {
                    location: Some(text.trim().to_string()),
                    ..Default::default()
                },
            )
            .await?;
        self.db.users.complete_registration(self.user_id).await?;

        // Anyone whose link brought this user here gets credited now.
        self.services
            .referrals
            .complete_for_referee(self.user_id)
            .await?;

        self.show_main_menu().await
    }

    // Menus and static screens

    async fn show_main_menu(&self) -> Result<()> {
        self.db.users.set_state(self.user_id, BotState::MainMenu).await?;
        self.bot
            .send_message(self.chat_id, "Main menu. Choose an option below.")
            .reply_markup(keyboards::main_menu_keyboard())
            .await?;
        Ok(())
    }

    async fn show_game_rules(&self) -> Result<()> {
        self.bot
            .send_message(
                self.chat_id,
                "The game has 21 levels. Each level opens after you complete \
                 one of its tasks: wait 24 hours, invite a friend, or make a \
                 donation. Any one task is enough.",
            )
            .await?;
        Ok(())
    }

    async fn show_about(&self) -> Result<()> {
        self.bot
            .send_message(
                self.chat_id,
                "Ascent is a step-by-step practice game. One level per day, \
                 one small action at a time.",
            )
            .await?;
        Ok(())
    }

    async fn show_faq(&self) -> Result<()> {
        self.db.users.set_state(self.user_id, BotState::Faq).await?;
        self.bot
            .send_message(
                self.chat_id,
                "FAQ\n\n\
                 Q: Can I skip a level?\nA: No, levels open strictly in order.\n\
                 Q: I paid but nothing happened.\nA: Payments are re-checked \
                 every minute; you will get a message once it is confirmed.",
            )
            .reply_markup(keyboards::faq_keyboard())
            .await?;
        Ok(())
    }

    async fn show_community_link(&self) -> Result<()> {
        self.bot
            .send_message(
                self.chat_id,
                format!("Join the community: {}", self.settings.bot.community_url),
            )
            .await?;
        Ok(())
    }

    // Level browsing

    async fn enter_game(&self) -> Result<()> {
        let viewed = self.db.users.get_viewed_level(self.user_id).await?;
        self.show_level(viewed).await
    }

    async fn show_current_level(&self) -> Result<()> {
        let viewed = self.db.users.get_viewed_level(self.user_id).await?;
        self.show_level(viewed).await
    }

    async fn show_level(&self, level: i32) -> Result<()> {
        let user = self.db.users.get_required(self.user_id).await?;
        let content = self.services.content.get_level(level).await?;

        self.db
            .users
            .set_state(self.user_id, BotState::LevelContent)
            .await?;

        let keyboard = keyboards::level_keyboard(user.current_level);
        match self.services.content.asset_path(&content) {
            Some(path) => {
                self.bot
                    .send_photo(self.chat_id, InputFile::file(path))
                    .caption(content.content)
                    .reply_markup(keyboard)
                    .await?;
            }
            None => {
                self.bot
                    .send_message(self.chat_id, content.content)
                    .reply_markup(keyboard)
                    .await?;
            }
        }
        Ok(())
    }

    async fn show_level_rules(&self) -> Result<()> {
        let viewed = self.db.users.get_viewed_level(self.user_id).await?;
        let content = self.services.content.get_level(viewed).await?;
        let text = content
            .rules
            .unwrap_or_else(|| "This level has no special rules.".to_string());
        self.bot.send_message(self.chat_id, text).await?;
        Ok(())
    }

    async fn advance(&self) -> Result<()> {
        match self.services.progression.advance(self.user_id).await? {
            AdvanceOutcome::ShowLevel(level) => self.show_level(level).await,
            AdvanceOutcome::FinalLevel => self.show_final_level().await,
            AdvanceOutcome::TaskRequired => self.show_task_selection().await,
        }
    }

    async fn go_back(&self) -> Result<()> {
        match self.services.progression.back(self.user_id).await? {
            BackOutcome::ShowLevel(level) => self.show_level(level).await,
            BackOutcome::MainMenu => self.show_main_menu().await,
        }
    }

    async fn jump(&self, target: i32) -> Result<()> {
        let level = self.services.progression.jump(self.user_id, target).await?;
        self.show_level(level).await
    }

    async fn show_final_level(&self) -> Result<()> {
        self.db
            .users
            .set_state(self.user_id, BotState::FinalLevel)
            .await?;
        let completed = self.db.tasks.completed_levels(self.user_id).await?;
        self.bot
            .send_message(
                self.chat_id,
                format!(
                    "You have reached the final level with {} completed tasks \
                     behind you. Congratulations! Join the community or support \
                     the charity below.",
                    completed.len()
                ),
            )
            .reply_markup(keyboards::final_level_keyboard())
            .await?;
        Ok(())
    }

    // Task selection and tasks

    async fn show_task_selection(&self) -> Result<()> {
        let user = self.db.users.get_required(self.user_id).await?;
        self.db
            .users
            .set_state(self.user_id, BotState::TaskSelection)
            .await?;

        let mut text =
            "To open the next level, complete one of the tasks below.".to_string();
        let started = self
            .db
            .tasks
            .get_for_level(self.user_id, user.current_level)
            .await?;
        if !started.is_empty() {
            text.push_str("\n\nIn progress:");
            for task in &started {
                let line = if task.completed {
                    format!("\n• {} task: completed", task.task_type)
                } else {
                    format!(
                        "\n• {} task: running until {}",
                        task.task_type,
                        format_deadline(task.end_time)
                    )
                };
                text.push_str(&line);
            }
        }

        self.bot
            .send_message(self.chat_id, text)
            .reply_markup(keyboards::task_selection_keyboard())
            .await?;
        Ok(())
    }

    async fn enter_time_task(&self) -> Result<()> {
        self.db
            .users
            .set_state(self.user_id, BotState::TimeTask)
            .await?;

        let text = match self.services.progression.get_time_task(self.user_id).await? {
            Some(task) if !task.completed => format!(
                "Your waiting task is running until {}.",
                format_deadline(task.end_time)
            ),
            Some(_) => "Your waiting task is already completed. Press \"Task done\".".to_string(),
            None => format!(
                "The waiting task: hold your practice for {} hours, then press \
                 \"Task done\".",
                self.settings.game.time_task_hours
            ),
        };

        self.bot
            .send_message(self.chat_id, text)
            .reply_markup(keyboards::time_task_keyboard())
            .await?;
        Ok(())
    }

    async fn start_time_task(&self) -> Result<()> {
        let text = match self.services.progression.start_time_task(self.user_id).await? {
            TimeTaskStart::Started { deadline } => format!(
                "Task started. Come back after {} and press \"Task done\".",
                format_deadline(deadline)
            ),
            TimeTaskStart::AlreadyCompleted => {
                "This task is already completed. Press \"Task done\".".to_string()
            }
        };

        self.bot.send_message(self.chat_id, text).await?;
        Ok(())
    }

    async fn claim_time_task(&self) -> Result<()> {
        match self.services.progression.claim_time_task(self.user_id).await? {
            TimeTaskClaim::Completed { level } => {
                self.bot
                    .send_message(
                        self.chat_id,
                        format!("Task completed! Level {} is now open.", level),
                    )
                    .await?;
                self.show_level(level).await?;
            }
            TimeTaskClaim::StillWaiting { remaining } => {
                self.bot
                    .send_message(
                        self.chat_id,
                        format!("Not yet. {} remaining.", format_remaining(remaining)),
                    )
                    .await?;
            }
            TimeTaskClaim::NotStarted => {
                self.bot
                    .send_message(self.chat_id, "Press \"Start task\" first.")
                    .await?;
            }
        }
        Ok(())
    }

    async fn enter_referral_task(&self) -> Result<()> {
        self.db
            .users
            .set_state(self.user_id, BotState::ReferralTask)
            .await?;

        let link = self.services.referrals.invite_link(self.user_id);
        self.bot
            .send_message(
                self.chat_id,
                format!(
                    "Invite a friend with your personal link:\n{}\n\n\
                     The task completes when your friend finishes registration.",
                    link
                ),
            )
            .reply_markup(keyboards::referral_task_keyboard())
            .await?;
        Ok(())
    }

    async fn check_referral_status(&self) -> Result<()> {
        let user = self.db.users.get_required(self.user_id).await?;
        let status = self
            .services
            .referrals
            .get_status(self.user_id, user.current_level)
            .await?;

        let completed = self
            .services
            .progression
            .current_level_unlockable(self.user_id)
            .await?;

        if completed {
            self.db
                .users
                .set_state(self.user_id, BotState::LevelContent)
                .await?;
        }
        let text = referral_status_line(completed, &status);

        let keyboard = if completed {
            keyboards::level_keyboard(user.current_level)
        } else {
            keyboards::referral_task_keyboard()
        };
        self.bot
            .send_message(self.chat_id, text)
            .reply_markup(keyboard)
            .await?;
        Ok(())
    }

    async fn enter_donation_task(&self) -> Result<()> {
        let user = self.db.users.get_required(self.user_id).await?;

        if self
            .db
            .tasks
            .is_completed(self.user_id, user.current_level, TaskKind::Donation)
            .await?
        {
            self.db
                .users
                .set_state(self.user_id, BotState::LevelContent)
                .await?;
            self.bot
                .send_message(
                    self.chat_id,
                    "You already donated for this level. Press \"Next level\" to continue.",
                )
                .reply_markup(keyboards::level_keyboard(user.current_level))
                .await?;
            return Ok(());
        }

        self.db
            .users
            .set_state(self.user_id, BotState::DonationTask)
            .await?;

        // Reuse an in-flight payment instead of stacking new intents.
        if let Some(donation) = self
            .services
            .donations
            .get_last_for_level(self.user_id, user.current_level)
            .await?
        {
            if donation.status == DonationStatus::Pending {
                self.bot
                    .send_message(
                        self.chat_id,
                        "You already have a pending payment. Press \"Check status\" \
                         once you have paid.",
                    )
                    .reply_markup(keyboards::donation_task_keyboard())
                    .await?;
                return Ok(());
            }
        }

        let checkout = self
            .services
            .donations
            .create_level_intent(self.user_id, user.current_level)
            .await?;

        self.bot
            .send_message(
                self.chat_id,
                format!(
                    "Donate {} {} to open the next level:\n{}",
                    self.settings.payment.level_amount,
                    self.settings.payment.currency,
                    checkout.confirmation_url
                ),
            )
            .reply_markup(keyboards::donation_task_keyboard())
            .await?;
        Ok(())
    }

    async fn check_donation_status(&self) -> Result<()> {
        let user = self.db.users.get_required(self.user_id).await?;
        let donation = self
            .services
            .donations
            .get_last_for_level(self.user_id, user.current_level)
            .await?;

        let donation = match donation {
            Some(donation) => donation,
            None => {
                self.bot
                    .send_message(self.chat_id, "No payment found. Press \"Donate\" first.")
                    .await?;
                return Ok(());
            }
        };

        match self.services.donations.check_status(&donation).await? {
            DonationStatus::Succeeded => {
                self.db
                    .users
                    .set_state(self.user_id, BotState::LevelContent)
                    .await?;
                self.bot
                    .send_message(
                        self.chat_id,
                        "Payment confirmed! Press \"Next level\" to continue.",
                    )
                    .reply_markup(keyboards::level_keyboard(user.current_level))
                    .await?;
            }
            DonationStatus::Canceled => {
                self.bot
                    .send_message(
                        self.chat_id,
                        "The payment was canceled. Press \"Donate\" to create a new one.",
                    )
                    .reply_markup(keyboards::task_selection_keyboard())
                    .await?;
                self.db
                    .users
                    .set_state(self.user_id, BotState::TaskSelection)
                    .await?;
            }
            DonationStatus::Pending | DonationStatus::WaitingForCapture => {
                self.bot
                    .send_message(
                        self.chat_id,
                        "The payment is still processing. Try again in a minute.",
                    )
                    .await?;
            }
        }
        Ok(())
    }

    // Charity

    async fn enter_charity(&self) -> Result<()> {
        self.db
            .users
            .set_state(self.user_id, BotState::CharityInput)
            .await?;
        self.bot
            .send_message(
                self.chat_id,
                "How much would you like to donate to charity? Send an amount.",
            )
            .reply_markup(keyboards::charity_keyboard())
            .await?;
        Ok(())
    }

    async fn handle_charity_amount(&self, text: &str) -> Result<()> {
        let amount = match parse_amount(text) {
            Some(amount) => amount,
            None => {
                self.bot
                    .send_message(
                        self.chat_id,
                        "Please send a positive amount, for example 100 or 99.50.",
                    )
                    .await?;
                return Ok(());
            }
        };

        let checkout = self
            .services
            .donations
            .create_charity_intent(self.user_id, amount)
            .await?;

        self.bot
            .send_message(
                self.chat_id,
                format!(
                    "Thank you! Complete the donation here:\n{}",
                    checkout.confirmation_url
                ),
            )
            .reply_markup(keyboards::charity_keyboard())
            .await?;
        Ok(())
    }

    async fn check_charity_status(&self) -> Result<()> {
        let donation = self.services.donations.get_last_charity(self.user_id).await?;

        let donation = match donation {
            Some(donation) => donation,
            None => {
                self.bot
                    .send_message(self.chat_id, "No charity donation found yet.")
                    .await?;
                return Ok(());
            }
        };

        let text = match self.services.donations.check_status(&donation).await? {
            DonationStatus::Succeeded => {
                let total: Decimal = self
                    .services
                    .donations
                    .charity_donations(self.user_id)
                    .await?
                    .iter()
                    .map(|d| d.amount)
                    .sum();
                format!(
                    "Your donation was received. You have given {} {} to charity in total. Thank you!",
                    total, self.settings.payment.currency
                )
            }
            DonationStatus::Canceled => "The donation was canceled.".to_string(),
            DonationStatus::Pending | DonationStatus::WaitingForCapture => {
                "The donation is still processing.".to_string()
            }
        };
        self.bot.send_message(self.chat_id, text).await?;
        Ok(())
    }
}

/// Status line for the referral task screen. The level can be unlocked by
/// a different task while this screen is open, so a registered friend is
/// only claimed when the referral ledger actually shows one.
fn referral_status_line(unlocked: bool, status: &ReferralStatus) -> String {
    if unlocked {
        if status.completed > 0 {
            "A friend has registered. Press \"Next level\" to continue.".to_string()
        } else {
            "This level is already unlocked. Press \"Next level\" to continue.".to_string()
        }
    } else if status.pending > 0 {
        format!(
            "{} invited, {} still registering. Hang on!",
            status.total, status.pending
        )
    } else {
        "No one has followed your link for this level yet.".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_referral_line_credits_friend_only_when_one_registered() {
        let status = ReferralStatus {
            total: 1,
            completed: 1,
            pending: 0,
        };
        assert!(referral_status_line(true, &status).contains("A friend has registered"));

        // Unlocked by a donation applied in the background, no registration
        let status = ReferralStatus {
            total: 1,
            completed: 0,
            pending: 1,
        };
        let line = referral_status_line(true, &status);
        assert!(line.contains("already unlocked"));
        assert!(!line.contains("friend"));
    }

    #[test]
    fn test_referral_line_reports_pending_invites() {
        let status = ReferralStatus {
            total: 2,
            completed: 0,
            pending: 2,
        };
        assert_eq!(
            referral_status_line(false, &status),
            "2 invited, 2 still registering. Hang on!"
        );

        let status = ReferralStatus {
            total: 0,
            completed: 0,
            pending: 0,
        };
        assert!(referral_status_line(false, &status).contains("No one"));
    }
}
