use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::post::Post;

/// A post that has already been delivered, as stored in the `posts` table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SeenPost {
    pub id: i64,
    pub time: Option<NaiveDateTime>,
    pub preview: Option<String>,
    pub content: Option<String>,
    pub url: Option<String>,
    pub author: Option<String>,
    pub notified_at: Option<String>,
}

impl From<SeenPost> for Post {
    fn from(row: SeenPost) -> Self {
        Self {
            id: row.id,
            post_date: row.time,
            url: row.url.unwrap_or_default(),
            author: row.author.unwrap_or_default(),
            content: row.content.unwrap_or_default(),
            preview: row.preview.unwrap_or_default(),
        }
    }
}
