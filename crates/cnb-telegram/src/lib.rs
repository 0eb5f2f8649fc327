//! Telegram adapter (teloxide).
//!
//! This crate implements the `cnb-core` ChatTransport over the Telegram Bot
//! API and hosts the long-polling update loop.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{ParseMode, Recipient},
};

use tokio::time::sleep;

pub mod polling;

use cnb_core::{domain::ChatId, errors::Error, transport::ChatTransport, Result};

#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn from_token(token: &str) -> Self {
        Self::new(Bot::new(token.to_string()))
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    /// Recipients are kept as strings in the core; Telegram wants either a
    /// numeric chat id or an `@channel` username.
    fn tg_recipient(chat: &ChatId) -> Result<Recipient> {
        if let Ok(id) = chat.0.parse::<i64>() {
            return Ok(Recipient::Id(teloxide::types::ChatId(id)));
        }
        if chat.0.starts_with('@') {
            return Ok(Recipient::ChannelUsername(chat.0.clone()));
        }
        Err(Error::Transport(format!(
            "unusable chat recipient: {}",
            chat.0
        )))
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::Transport(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_text(&self, recipient: &ChatId, text: &str) -> Result<()> {
        let to = Self::tg_recipient(recipient)?;
        self.with_retry(|| {
            self.bot
                .send_message(to.clone(), text.to_string())
                .parse_mode(ParseMode::MarkdownV2)
                .disable_web_page_preview(true)
        })
        .await?;
        Ok(())
    }
}
