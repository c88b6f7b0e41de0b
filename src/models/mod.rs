//! Data models module
//!
//! This module contains all data structures persisted by the bot

pub mod donation;
pub mod level;
pub mod referral;
pub mod task;
pub mod user;

pub use donation::{ApplyOutcome, Donation, DonationStatus};
pub use level::LevelContent;
pub use referral::{CreateEdgeOutcome, ReferralEdge, ReferralStatus};
pub use task::{Task, TaskKind};
pub use user::{UpdateProfileRequest, User, UserProfile};
