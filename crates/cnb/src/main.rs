use std::sync::Arc;

use cnb_core::{
    auth::AuthPolicy,
    commands::CommandRouter,
    config::Config,
    domain::ChatId,
    notify::NotificationDispatcher,
    registry::file::FileRegistry,
    transport::ChatTransport,
};
use cnb_telegram::TelegramTransport;

#[tokio::main]
async fn main() -> Result<(), cnb_core::Error> {
    cnb_core::logging::init("cnb")?;

    let cfg = Arc::new(Config::load()?);

    let store = Arc::new(FileRegistry::open(cfg.registry_file.clone())?);
    let telegram = Arc::new(TelegramTransport::from_token(&cfg.telegram_bot_token));
    let transport: Arc<dyn ChatTransport> = telegram.clone();

    let router = Arc::new(CommandRouter::new(
        AuthPolicy::new(cfg.admin_id.clone()),
        store.clone(),
        transport.clone(),
    ));
    let dispatcher = Arc::new(NotificationDispatcher::new(
        store,
        transport,
        ChatId(cfg.group_id.clone()),
    ));

    // The ingest server and the Telegram poller share the dispatcher's
    // registries but otherwise run independently.
    let addr = cfg.ingest_listen_addr.clone();
    tokio::spawn(async move {
        if let Err(e) = cnb_ingest::serve(&addr, dispatcher).await {
            tracing::error!("ingest server failed: {e}");
        }
    });

    cnb_telegram::polling::run_polling(telegram, cfg, router)
        .await
        .map_err(|e| cnb_core::Error::Transport(format!("telegram bot failed: {e}")))?;

    Ok(())
}
