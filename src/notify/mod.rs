//! Notification sinks that receive newly discovered posts.

pub mod desktop;
pub mod telegram;

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::config::{Config, SinkConfig};
use crate::post::Post;

pub use desktop::DesktopNotifier;
pub use telegram::TelegramNotifier;

/// A channel that delivers one post at a time.
///
/// Sinks report success or failure only; whether a post is recorded as seen
/// is decided by the caller.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Deliver a single post.
    async fn send(&self, post: &Post) -> Result<()>;
}

/// Build the sink selected in the configuration.
///
/// The Telegram backend checks its token against the API before returning.
///
/// # Errors
///
/// Returns an error if the Telegram token is rejected or the API is unreachable.
pub async fn from_config(config: &Config, client: reqwest::Client) -> Result<Arc<dyn Notifier>> {
    match &config.sink {
        SinkConfig::Telegram(telegram) => {
            let notifier = TelegramNotifier::new(client, telegram.clone());
            let me = notifier
                .get_me()
                .await
                .context("Failed to authorize Telegram bot")?;
            tracing::info!(
                bot = me.username.as_deref().unwrap_or("unknown"),
                chat_id = telegram.chat_id,
                "Telegram bot authorized"
            );
            Ok(Arc::new(notifier))
        }
        SinkConfig::Desktop(desktop) => {
            tracing::info!(command = %desktop.command, "Desktop notifications enabled");
            Ok(Arc::new(DesktopNotifier::new(desktop.clone())))
        }
    }
}
