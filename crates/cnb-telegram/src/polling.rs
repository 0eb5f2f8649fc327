use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::{info, warn};

use cnb_core::{
    commands::CommandRouter,
    config::Config,
    domain::{ChatId, InboundMessage, UserId},
};

use crate::TelegramTransport;

/// Long-poll Telegram for updates and feed every text message through the
/// command router. Runs until the process is stopped.
pub async fn run_polling(
    transport: Arc<TelegramTransport>,
    cfg: Arc<Config>,
    router: Arc<CommandRouter>,
) -> anyhow::Result<()> {
    let bot = transport.bot();

    // Basic startup info.
    if let Ok(me) = bot.get_me().await {
        info!("{} started: @{}", cfg.bot_name, me.username());
    }

    let handler = Update::filter_message().endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![router])
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_message(msg: Message, router: Arc<CommandRouter>) -> ResponseResult<()> {
    // Non-text updates and messages without an author are ignored.
    let (Some(user), Some(text)) = (msg.from(), msg.text()) else {
        return Ok(());
    };

    let inbound = InboundMessage {
        chat: ChatId(msg.chat.id.0.to_string()),
        sender: UserId(user.id.0.to_string()),
        text: text.to_string(),
    };
    if let Err(err) = router.handle(&inbound).await {
        warn!("command handling failed: {err}");
    }
    Ok(())
}
