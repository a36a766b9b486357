//! Desktop popups through a `notify-send` compatible command.

use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::telegram::escape_html;
use super::Notifier;
use crate::config::DesktopConfig;
use crate::post::{word_preview, Post};

pub struct DesktopNotifier {
    config: DesktopConfig,
}

impl DesktopNotifier {
    #[must_use]
    pub fn new(config: DesktopConfig) -> Self {
        Self { config }
    }

    /// Arguments passed to the notification command for a post.
    #[must_use]
    pub fn command_args(&self, post: &Post) -> Vec<String> {
        let mut args = vec!["--app-name".to_string(), self.config.app_name.clone()];
        if let Some(icon) = &self.config.icon_path {
            args.push("--icon".to_string());
            args.push(icon.display().to_string());
        }
        args.push(notification_title(post));
        args.push(notification_body(post, self.config.preview_words));
        args
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    fn name(&self) -> &'static str {
        "desktop"
    }

    async fn send(&self, post: &Post) -> Result<()> {
        let output = Command::new(&self.config.command)
            .args(self.command_args(post))
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn {}", self.config.command))?
            .wait_with_output()
            .await
            .with_context(|| format!("Failed to wait for {}", self.config.command))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("{} failed ({}): {stderr}", self.config.command, output.status);
        }

        debug!(post_id = post.id, "Desktop notification shown");
        Ok(())
    }
}

fn notification_title(post: &Post) -> String {
    if post.author.is_empty() {
        "New diary post".to_string()
    } else {
        post.author.clone()
    }
}

/// Short word preview; with a URL the preview becomes a link.
///
/// Notification servers render a small HTML subset in the body, so the text
/// is escaped either way.
fn notification_body(post: &Post, words: usize) -> String {
    let preview = escape_html(&word_preview(&post.content, words));
    if post.url.is_empty() {
        preview
    } else {
        format!("<a href=\"{}\">{preview}</a>", escape_html(&post.url))
    }
}
