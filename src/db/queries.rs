use anyhow::{Context, Result};
use sqlx::SqlitePool;

use super::models::SeenPost;
use crate::post::Post;

// ========== Posts ==========

/// Check whether a post id has been recorded as delivered.
pub async fn post_exists(pool: &SqlitePool, id: i64) -> Result<bool> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await
        .with_context(|| format!("Failed to look up post {id}"))?;

    Ok(row.0 > 0)
}

/// Record a delivered post. Replaces any existing row with the same id.
pub async fn insert_post(pool: &SqlitePool, post: &Post) -> Result<()> {
    sqlx::query(
        r"
        INSERT OR REPLACE INTO posts (id, time, preview, content, url, author, notified_at)
        VALUES (?, ?, ?, ?, ?, ?, datetime('now'))
        ",
    )
    .bind(post.id)
    .bind(post.post_date)
    .bind(&post.preview)
    .bind(&post.content)
    .bind(&post.url)
    .bind(&post.author)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to insert post {}", post.id))?;

    Ok(())
}

/// Get a stored post by id.
pub async fn get_post(pool: &SqlitePool, id: i64) -> Result<Option<SeenPost>> {
    sqlx::query_as("SELECT * FROM posts WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch post by id")
}

/// Count stored posts.
pub async fn count_posts(pool: &SqlitePool) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts")
        .fetch_one(pool)
        .await
        .context("Failed to count posts")?;

    Ok(row.0)
}

/// Most recently published stored posts, newest first.
pub async fn get_recent_posts(pool: &SqlitePool, limit: i64) -> Result<Vec<SeenPost>> {
    sqlx::query_as("SELECT * FROM posts ORDER BY time DESC, id DESC LIMIT ?")
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to fetch recent posts")
}
