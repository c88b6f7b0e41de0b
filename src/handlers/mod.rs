//! Bot handlers module
//!
//! Command handlers for /start and /admin, the message router for
//! everything else, and the reply keyboard builders they share.

pub mod commands;
pub mod keyboards;
pub mod messages;

pub use commands::{handle_admin, handle_start, Command};
pub use messages::handle_message;
