//! Shared constants used across the application.

/// Diary page polled when `SOURCE_URL` is not set.
pub const DEFAULT_SOURCE_URL: &str = "https://dofamin.org/index.php?v=Diary";

/// Base URL of the Telegram Bot API.
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// User agent sent with page fetches.
pub const USER_AGENT: &str = concat!("diary-notifier/", env!("CARGO_PKG_VERSION"));

/// Label of the inline button linking a chat message back to the forum.
pub const READ_ON_SITE_LABEL: &str = "Read on site";
