//! Conversation state module
//!
//! Defines the per-user conversation state persisted in the users table,
//! the event classification done once at the dispatch boundary, and the
//! pure transition logic of the progression machine.

pub mod machine;

use serde::{Deserialize, Serialize};

pub use machine::{decide_advance, decide_back, time_task_remaining, AdvanceDecision, BackDecision};

/// Conversation state of a user. Stored in the database so that every
/// inbound event is routed against the freshly read state, never a cached
/// one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "bot_state", rename_all = "snake_case")]
pub enum BotState {
    LanguageSelection,
    MainMenu,
    RegistrationName,
    RegistrationBirthdate,
    RegistrationLocation,
    LevelContent,
    TaskSelection,
    TimeTask,
    ReferralTask,
    DonationTask,
    FinalLevel,
    CharityInput,
    Faq,
}

/// Button labels shown on reply keyboards. Classification and keyboard
/// construction share these so the two can never drift apart.
pub mod labels {
    pub const NEXT: &str = "Next";
    pub const NEXT_LEVEL: &str = "Next level";
    pub const BACK: &str = "Back";
    pub const RULES: &str = "Game rules";
    pub const LEVEL_RULES: &str = "Level rules";
    pub const ABOUT: &str = "About";
    pub const FAQ: &str = "FAQ";
    pub const ACCEPT: &str = "Accept";
    pub const START_GAME: &str = "Start game";
    pub const TIME_TASK: &str = "Time";
    pub const START_TASK: &str = "Start task";
    pub const TASK_DONE: &str = "Task done";
    pub const INVITE_FRIEND: &str = "Invite a friend";
    pub const CHECK_STATUS: &str = "Check status";
    pub const DONATE: &str = "Donate";
    pub const CHARITY: &str = "Charity";
    pub const CHARITY_STATUS: &str = "Check donation status";
    pub const COMMUNITY_LINK: &str = "Community link";
}

/// What an inbound message means, derived from its text exactly once at
/// the dispatch boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Next,
    NextLevel,
    Back,
    Rules,
    LevelRules,
    About,
    Faq,
    AcceptRules,
    StartGame,
    SelectTimeTask,
    StartTimeTask,
    CompleteTimeTask,
    SelectReferralTask,
    CheckStatus,
    SelectDonationTask,
    Charity,
    CharityStatus,
    CommunityLink,
    /// "N level" navigation button
    LevelJump(i32),
    /// Anything else; consumed by registration and charity-amount states
    FreeText(String),
}

impl EventKind {
    /// Classify raw message text into an event
    pub fn classify(text: &str) -> EventKind {
        match text.trim() {
            labels::NEXT => EventKind::Next,
            labels::NEXT_LEVEL => EventKind::NextLevel,
            labels::BACK => EventKind::Back,
            labels::RULES => EventKind::Rules,
            labels::LEVEL_RULES => EventKind::LevelRules,
            labels::ABOUT => EventKind::About,
            labels::FAQ => EventKind::Faq,
            labels::ACCEPT => EventKind::AcceptRules,
            labels::START_GAME => EventKind::StartGame,
            labels::TIME_TASK => EventKind::SelectTimeTask,
            labels::START_TASK => EventKind::StartTimeTask,
            labels::TASK_DONE => EventKind::CompleteTimeTask,
            labels::INVITE_FRIEND => EventKind::SelectReferralTask,
            labels::CHECK_STATUS => EventKind::CheckStatus,
            labels::DONATE => EventKind::SelectDonationTask,
            labels::CHARITY => EventKind::Charity,
            labels::CHARITY_STATUS => EventKind::CharityStatus,
            labels::COMMUNITY_LINK => EventKind::CommunityLink,
            other => {
                if let Some(level) = parse_level_jump(other) {
                    EventKind::LevelJump(level)
                } else {
                    EventKind::FreeText(other.to_string())
                }
            }
        }
    }
}

fn parse_level_jump(text: &str) -> Option<i32> {
    let rest = text.strip_suffix(" level")?;
    rest.parse::<i32>().ok().filter(|n| *n >= 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_buttons() {
        assert_eq!(EventKind::classify("Next"), EventKind::Next);
        assert_eq!(EventKind::classify("  Back "), EventKind::Back);
        assert_eq!(EventKind::classify("Invite a friend"), EventKind::SelectReferralTask);
    }

    #[test]
    fn test_classify_level_jump() {
        assert_eq!(EventKind::classify("3 level"), EventKind::LevelJump(3));
        assert_eq!(EventKind::classify("21 level"), EventKind::LevelJump(21));
        assert_eq!(
            EventKind::classify("0 level"),
            EventKind::FreeText("0 level".to_string())
        );
    }

    #[test]
    fn test_classify_free_text() {
        assert_eq!(
            EventKind::classify("Anna"),
            EventKind::FreeText("Anna".to_string())
        );
    }
}
