//! SQLite backend for the seen-post store.

mod migrations;
mod models;
mod queries;

pub use models::*;
pub use queries::*;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::post::Post;
use crate::store::SeenStore;

/// Delivered posts, one row per forum post id.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the posts database and bring its schema up to date.
    ///
    /// Files left by earlier deployments without schema versioning are
    /// migrated in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, migrated or written.
    pub async fn new(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(10));

        // One cycle at a time touches the store, so a small pool is enough.
        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open posts database {}", path.display()))?;

        let db = Self { pool };
        migrations::run(&db.pool).await?;
        db.verify_writable(path).await?;

        info!(path = %path.display(), "Posts database ready");
        Ok(db)
    }

    async fn verify_writable(&self, path: &Path) -> Result<()> {
        // A read-only file would otherwise only show up after the first
        // delivery, when recording it fails and the process has to stop.
        let tx = self.pool.begin().await.with_context(|| {
            format!(
                "Posts database is not writable (path: {}). Check file permissions",
                path.display()
            )
        })?;

        tx.commit()
            .await
            .context("Failed to commit posts database writability check")?;
        Ok(())
    }

    /// The most recently published post that was delivered, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn last_delivered(&self) -> Result<Option<Post>> {
        let mut recent = get_recent_posts(&self.pool, 1).await?;
        Ok(recent.pop().map(Post::from))
    }

    /// Get a reference to the connection pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl SeenStore for Database {
    async fn exists(&self, id: i64) -> Result<bool> {
        post_exists(&self.pool, id).await
    }

    async fn store(&self, post: &Post) -> Result<()> {
        insert_post(&self.pool, post).await
    }
}
