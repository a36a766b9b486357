//! Diary notifier library.
//!
//! A service that polls a forum's diary page, remembers which posts it has
//! already announced, and pushes new ones to Telegram or the desktop in the
//! order they were published.

// Allow raw string hashes for safety - they're harmless and prevent issues if content changes
#![allow(clippy::needless_raw_string_hashes)]

pub mod config;
pub mod constants;
pub mod db;
pub mod diary;
pub mod notify;
pub mod post;
pub mod store;
