//! Business logic services
//!
//! Each service owns one concern and borrows the shared database service.
//! The factory wires them up once at startup.

pub mod content;
pub mod donation;
pub mod notification;
pub mod payment;
pub mod progression;
pub mod reconciliation;
pub mod referral;

pub use content::{AssetResolver, ContentService};
pub use donation::DonationService;
pub use notification::NotificationService;
pub use payment::PaymentService;
pub use progression::ProgressionService;
pub use reconciliation::ReconciliationService;
pub use referral::ReferralService;

use teloxide::Bot;

use crate::config::settings::Settings;
use crate::database::DatabaseService;
use crate::utils::errors::Result;

/// Creates and holds all services over the shared database handle
#[derive(Clone)]
pub struct ServiceFactory {
    pub content: ContentService,
    pub donations: DonationService,
    pub notifications: NotificationService,
    pub progression: ProgressionService,
    pub referrals: ReferralService,
}

impl ServiceFactory {
    pub fn new(db: DatabaseService, bot: Bot, settings: &Settings) -> Result<Self> {
        let payments = PaymentService::new(settings.payment.clone())?;
        let notifications = NotificationService::new(bot);

        Ok(Self {
            content: ContentService::new(db.clone(), &settings.content),
            donations: DonationService::new(db.clone(), payments, settings.payment.clone()),
            notifications,
            progression: ProgressionService::new(db.clone(), settings.game.clone()),
            referrals: ReferralService::new(db, settings.bot.username.clone()),
        })
    }
}
