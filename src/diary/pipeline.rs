use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Context;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Config;
use crate::constants::USER_AGENT;
use crate::diary::extractor::{extract_posts, ExtractOptions};
use crate::notify::Notifier;
use crate::post::Post;
use crate::store::SeenStore;

/// Why a cycle stopped early.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("failed to fetch diary page: {0:#}")]
    Fetch(anyhow::Error),
    #[error("failed to check whether post {id} was seen: {cause:#}")]
    Lookup { id: i64, cause: anyhow::Error },
    #[error("post {id} was delivered but could not be recorded: {cause:#}")]
    Persist { id: i64, cause: anyhow::Error },
}

impl CycleError {
    /// Fatal errors mean the store no longer matches what was delivered.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Persist { .. })
    }
}

/// Outcome of one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Posts found on the page.
    pub extracted: usize,
    /// Posts not seen before.
    pub novel: usize,
    /// Posts delivered and recorded.
    pub delivered: usize,
    /// Posts the sink rejected; retried next cycle.
    pub failed: usize,
}

/// Settings for a [`Pipeline`].
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub source_url: String,
    pub extract: ExtractOptions,
}

impl PipelineOptions {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            source_url: config.source_url.clone(),
            extract: ExtractOptions {
                preview_len: config.preview_len,
                limit: config.scan_limit,
                base_url: Url::parse(&config.source_url).ok(),
            },
        }
    }
}

/// Fetch, extract, dedupe, order and deliver diary posts.
pub struct Pipeline {
    client: reqwest::Client,
    options: PipelineOptions,
    store: Arc<dyn SeenStore>,
    notifier: Arc<dyn Notifier>,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        options: PipelineOptions,
        store: Arc<dyn SeenStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            client,
            options,
            store,
            notifier,
        }
    }

    /// Run one full cycle against the source page.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::Fetch`] when the page cannot be retrieved,
    /// [`CycleError::Lookup`] when the store cannot answer, and
    /// [`CycleError::Persist`] when a delivered post could not be recorded.
    pub async fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        let html = self.fetch_page().await.map_err(CycleError::Fetch)?;
        self.process_page(&html).await
    }

    /// Run a cycle on an already fetched page body.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::run_cycle`]; fetch errors cannot occur here.
    pub async fn process_page(&self, html: &str) -> Result<CycleReport, CycleError> {
        let posts = extract_posts(html, &self.options.extract);
        let extracted = posts.len();

        let mut batch = self.filter_unseen(posts).await?;
        if batch.is_empty() {
            debug!(extracted, "No new posts");
            return Ok(CycleReport {
                extracted,
                ..CycleReport::default()
            });
        }

        order_chronologically(&mut batch);
        let (delivered, failed) = self.deliver(&batch).await?;

        Ok(CycleReport {
            extracted,
            novel: batch.len(),
            delivered,
            failed,
        })
    }

    async fn fetch_page(&self) -> anyhow::Result<String> {
        let response = self
            .client
            .get(&self.options.source_url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .context("Failed to fetch diary page")?;

        if !response.status().is_success() {
            anyhow::bail!("Diary fetch failed with status {}", response.status());
        }

        response.text().await.context("Failed to read diary body")
    }

    /// Keep posts the store has not seen, preserving their order.
    ///
    /// An id repeated on the page is kept only at its first occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::Lookup`] on the first failed lookup.
    pub async fn filter_unseen(&self, posts: Vec<Post>) -> Result<Vec<Post>, CycleError> {
        let mut unseen = Vec::with_capacity(posts.len());
        let mut kept = HashSet::with_capacity(posts.len());
        for post in posts {
            if kept.contains(&post.id) {
                debug!(post_id = post.id, "Post repeated on page, skipping");
                continue;
            }

            let seen = self
                .store
                .exists(post.id)
                .await
                .map_err(|cause| CycleError::Lookup { id: post.id, cause })?;

            if seen {
                debug!(post_id = post.id, "Post already delivered, skipping");
            } else {
                info!(post_id = post.id, author = %post.author, "New post found");
                kept.insert(post.id);
                unseen.push(post);
            }
        }
        Ok(unseen)
    }

    /// Send each post once; record it only after the sink accepted it.
    async fn deliver(&self, batch: &[Post]) -> Result<(usize, usize), CycleError> {
        let mut delivered = 0;
        let mut failed = 0;

        for post in batch {
            if let Err(e) = self.notifier.send(post).await {
                warn!(
                    post_id = post.id,
                    sink = self.notifier.name(),
                    preview = %post.preview,
                    "Failed to deliver post, will retry next cycle: {e:#}"
                );
                failed += 1;
                continue;
            }

            self.store
                .store(post)
                .await
                .map_err(|cause| CycleError::Persist { id: post.id, cause })?;
            delivered += 1;
        }

        Ok((delivered, failed))
    }
}

/// Sort posts oldest first. Undated posts come first; ties keep their order.
pub fn order_chronologically(posts: &mut [Post]) {
    posts.sort_by_key(|post| post.post_date);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dated(id: i64, day: u32) -> Post {
        Post {
            id,
            post_date: NaiveDate::from_ymd_opt(2024, 1, day)
                .and_then(|d| d.and_hms_opt(12, 0, 0)),
            ..Post::default()
        }
    }

    #[test]
    fn test_order_chronologically() {
        let mut posts = vec![dated(2, 2), dated(1, 1), dated(3, 3)];
        order_chronologically(&mut posts);
        let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_order_undated_first_and_stable() {
        let undated = |id| Post {
            id,
            ..Post::default()
        };
        let mut posts = vec![dated(10, 5), undated(20), dated(30, 5), undated(40)];
        order_chronologically(&mut posts);
        let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![20, 40, 10, 30]);
    }

    #[test]
    fn test_only_persist_is_fatal() {
        let persist = CycleError::Persist {
            id: 1,
            cause: anyhow::anyhow!("disk full"),
        };
        let lookup = CycleError::Lookup {
            id: 1,
            cause: anyhow::anyhow!("locked"),
        };
        let fetch = CycleError::Fetch(anyhow::anyhow!("timeout"));
        assert!(persist.is_fatal());
        assert!(!lookup.is_fatal());
        assert!(!fetch.is_fatal());
    }
}
