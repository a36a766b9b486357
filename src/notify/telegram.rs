//! Telegram Bot API delivery: one HTML message per post with a link button.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::Notifier;
use crate::config::TelegramConfig;
use crate::constants::READ_ON_SITE_LABEL;
use crate::post::Post;

pub struct TelegramNotifier {
    client: reqwest::Client,
    config: TelegramConfig,
}

impl TelegramNotifier {
    #[must_use]
    pub fn new(client: reqwest::Client, config: TelegramConfig) -> Self {
        Self { client, config }
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.bot_token,
            method
        )
    }

    /// Fetch the bot's own account, verifying the token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API rejects the token.
    pub async fn get_me(&self) -> Result<TelegramUser> {
        let response = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .context("getMe request failed")?;

        let body: TelegramApiResponse<TelegramUser> = response
            .json()
            .await
            .context("Invalid getMe response")?;

        body.into_result()
    }

    /// Send a post to the configured chat.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or when Telegram answers `ok: false`.
    pub async fn send_message(&self, post: &Post) -> Result<()> {
        let payload = message_payload(self.config.chat_id, post);

        let response = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&payload)
            .send()
            .await
            .context("sendMessage request failed")?;

        let status = response.status();
        let body: TelegramApiResponse<serde_json::Value> = response
            .json()
            .await
            .with_context(|| format!("Invalid sendMessage response (status {status})"))?;

        body.into_result()?;
        debug!(post_id = post.id, "Telegram message sent");
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn send(&self, post: &Post) -> Result<()> {
        self.send_message(post).await
    }
}

/// Build the `sendMessage` request body for a post.
#[must_use]
pub fn message_payload(chat_id: i64, post: &Post) -> serde_json::Value {
    let mut payload = json!({
        "chat_id": chat_id,
        "text": format_message(post),
        "parse_mode": "HTML",
    });

    // Telegram rejects buttons with an empty URL.
    if !post.url.is_empty() {
        payload["reply_markup"] = json!({
            "inline_keyboard": [[{ "text": READ_ON_SITE_LABEL, "url": post.url }]],
        });
    }

    payload
}

/// `<b>author:</b> preview`, escaped for Telegram's HTML parse mode.
#[must_use]
pub fn format_message(post: &Post) -> String {
    format!(
        "<b>{}:</b> {}",
        escape_html(&post.author),
        escape_html(&post.preview)
    )
}

/// Escape the three characters Telegram's HTML mode treats specially.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

// --- Telegram API Types ---

#[derive(Debug, Deserialize)]
pub struct TelegramApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

impl<T> TelegramApiResponse<T> {
    fn into_result(self) -> Result<T> {
        if !self.ok {
            anyhow::bail!(
                "Telegram API error {}: {}",
                self.error_code.unwrap_or_default(),
                self.description.unwrap_or_default()
            );
        }
        self.result.context("Telegram API returned no result")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}
