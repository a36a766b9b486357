use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::debug;

/// Run all pending migrations.
pub async fn run(pool: &SqlitePool) -> Result<()> {
    create_migration_table(pool).await?;
    let current_version = get_schema_version(pool).await?;

    if current_version < 1 {
        debug!("Running migration v1");
        run_migration_v1(pool).await?;
        set_schema_version(pool, 1).await?;
    }

    if current_version < 2 {
        debug!("Running migration v2");
        run_migration_v2(pool).await?;
        set_schema_version(pool, 2).await?;
    }

    Ok(())
}

async fn create_migration_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS _schema_version (
            version INTEGER PRIMARY KEY
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create schema version table")?;

    Ok(())
}

async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let row: Option<(i32,)> = sqlx::query_as("SELECT version FROM _schema_version LIMIT 1")
        .fetch_optional(pool)
        .await
        .context("Failed to get schema version")?;

    Ok(row.map_or(0, |(v,)| v))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("DELETE FROM _schema_version")
        .execute(pool)
        .await?;
    sqlx::query("INSERT INTO _schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

async fn run_migration_v1(pool: &SqlitePool) -> Result<()> {
    debug!("Running migration v1: creating posts table");

    // Keyed by the forum's own post id, not a rowid of ours.
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS posts (
            id INTEGER NOT NULL PRIMARY KEY,
            time TIMESTAMP,
            preview TEXT,
            content TEXT,
            url TEXT,
            author TEXT
        )
        ",
    )
    .execute(pool)
    .await
    .context("Failed to create posts table")?;

    Ok(())
}

async fn run_migration_v2(pool: &SqlitePool) -> Result<()> {
    debug!("Running migration v2: adding notified_at to posts");

    // SQLite refuses non-constant defaults in ALTER TABLE ADD COLUMN, so the
    // column is filled by inserts and backfilled here for existing rows.
    let has_column: Option<(String,)> =
        sqlx::query_as("SELECT name FROM pragma_table_info('posts') WHERE name = 'notified_at'")
            .fetch_optional(pool)
            .await
            .context("Failed to inspect posts table")?;

    if has_column.is_none() {
        sqlx::query("ALTER TABLE posts ADD COLUMN notified_at TEXT")
            .execute(pool)
            .await
            .context("Failed to add notified_at column")?;
    }

    sqlx::query("UPDATE posts SET notified_at = datetime('now') WHERE notified_at IS NULL")
        .execute(pool)
        .await
        .context("Failed to backfill notified_at")?;

    Ok(())
}
