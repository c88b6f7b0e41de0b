//! AscentBot Telegram Bot
//!
//! Main application entry point

use std::sync::Arc;

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Update;
use tracing::{error, info, warn};

use AscentBot::{
    config::Settings,
    database::{connection, DatabaseService},
    handlers::{handle_admin, handle_message, handle_start, Command},
    services::{ReconciliationService, ServiceFactory},
    utils::errors::AscentError,
    utils::logging,
};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let settings = Settings::new()?;
    settings.validate()?;

    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting AscentBot...");

    info!("Connecting to database...");
    let db_config = connection::DatabaseConfig {
        url: settings.database.url.clone(),
        max_connections: settings.database.max_connections,
        min_connections: settings.database.min_connections,
        ..Default::default()
    };
    let db_pool = connection::create_pool(&db_config).await?;

    connection::run_migrations(&db_pool).await?;

    let database_service = DatabaseService::new(db_pool);

    let bot = Bot::new(&settings.bot.token);

    info!("Initializing services...");
    let settings_arc = Arc::new(settings);
    let services = ServiceFactory::new(database_service.clone(), bot.clone(), &settings_arc)?;

    // Background payment reconciliation
    let reconciliation = Arc::new(ReconciliationService::new(
        services.donations.clone(),
        services.notifications.clone(),
        &settings_arc.game,
    ));
    reconciliation.start();

    let handler = create_handler();

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![
            Arc::new(services),
            database_service,
            settings_arc
        ])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd);
        })
        .enable_ctrlc_handler()
        .build();

    info!("AscentBot is ready!");
    dispatcher.dispatch().await;

    info!("AscentBot has been shut down.");
    Ok(())
}

/// Create the main update handler
fn create_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    dptree::entry().branch(
        Update::filter_message()
            .branch(
                dptree::entry()
                    .filter_command::<Command>()
                    .endpoint(handle_commands),
            )
            .branch(dptree::endpoint(handle_messages)),
    )
}

async fn handle_commands(
    bot: Bot,
    msg: Message,
    cmd: Command,
    services: Arc<ServiceFactory>,
    db: DatabaseService,
    settings: Arc<Settings>,
) -> HandlerResult {
    let services = (*services).clone();
    let chat_id = msg.chat.id;

    let result = match cmd {
        Command::Start(payload) => {
            handle_start(bot.clone(), msg, payload, services, db, settings).await
        }
        Command::Admin => handle_admin(bot.clone(), msg, db, settings).await,
    };

    if let Err(e) = result {
        error!(error = %e, "Error handling command");
        notify_failure(&bot, chat_id, &e).await;
        return Err(e.into());
    }

    Ok(())
}

async fn handle_messages(
    bot: Bot,
    msg: Message,
    services: Arc<ServiceFactory>,
    db: DatabaseService,
    settings: Arc<Settings>,
) -> HandlerResult {
    let services = (*services).clone();
    let chat_id = msg.chat.id;

    if let Err(e) = handle_message(bot.clone(), msg, services, db, settings).await {
        error!(error = %e, "Error handling message");
        notify_failure(&bot, chat_id, &e).await;
        return Err(e.into());
    }

    Ok(())
}

/// Tell the user to retry after a transient failure. The notice is
/// uniform and carries no error internals; delivery itself is best-effort.
async fn notify_failure(bot: &Bot, chat_id: ChatId, error: &AscentError) {
    if let Some(notice) = error.user_notice() {
        if let Err(e) = bot.send_message(chat_id, notice).await {
            warn!(error = %e, "Failed to deliver failure notice");
        }
    }
}
