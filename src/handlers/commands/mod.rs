//! Command handlers

pub mod admin;
pub mod start;

use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "start the game")]
    Start(String),
    #[command(description = "bot statistics (admins only)")]
    Admin,
}

pub use admin::handle_admin;
pub use start::handle_start;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_command_carries_referral_payload() {
        let cmd = Command::parse("/start ref123456", "ascent_bot").unwrap();
        assert_eq!(cmd, Command::Start("ref123456".to_string()));
    }

    #[test]
    fn test_bare_start_command_has_empty_payload() {
        let cmd = Command::parse("/start", "ascent_bot").unwrap();
        assert_eq!(cmd, Command::Start(String::new()));
    }
}
