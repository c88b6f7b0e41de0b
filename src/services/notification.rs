//! Notification service
//!
//! Best-effort messages pushed to users outside a request context, mainly
//! from the reconciliation loop. Delivery failures are logged and
//! swallowed; a blocked bot must not stall ledger processing.

use teloxide::prelude::*;
use tracing::warn;

#[derive(Clone)]
pub struct NotificationService {
    bot: Bot,
}

impl NotificationService {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub async fn notify(&self, user_id: i64, text: &str) {
        if let Err(e) = self
            .bot
            .send_message(ChatId(user_id), text)
            .await
        {
            warn!(user_id, error = %e, "Failed to deliver notification");
        }
    }

    pub async fn notify_payment_succeeded(&self, user_id: i64, level: i32) {
        let text = if level > 0 {
            format!(
                "Your donation was received. Level {} is unlocked, press \"Next level\" to continue.",
                level + 1
            )
        } else {
            "Your charity donation was received. Thank you!".to_string()
        };
        self.notify(user_id, &text).await;
    }

    pub async fn notify_payment_canceled(&self, user_id: i64) {
        self.notify(
            user_id,
            "Your payment was canceled. You can create a new one from the level menu.",
        )
        .await;
    }
}
