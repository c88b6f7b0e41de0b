//! Database repositories
//!
//! One repository per ledger, each owning the SQL for its tables.

pub mod admin;
pub mod donation;
pub mod level;
pub mod referral;
pub mod task;
pub mod user;

pub use admin::{AdminRepository, AdminStatistics, DonationStat, LevelStat};
pub use donation::DonationRepository;
pub use level::LevelRepository;
pub use referral::ReferralRepository;
pub use task::TaskRepository;
pub use user::UserRepository;
