//! Seen-post storage: which post ids have already been delivered.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use crate::post::Post;

/// Durable set of delivered posts, keyed by post id.
///
/// The SQLite implementation lives on [`crate::db::Database`].
#[async_trait]
pub trait SeenStore: Send + Sync {
    /// Whether a post with this id has been recorded.
    ///
    /// A failed lookup is an `Err`, never `Ok(false)`.
    async fn exists(&self, id: i64) -> Result<bool>;

    /// Record a delivered post. After this returns `Ok`, `exists(post.id)` is true.
    async fn store(&self, post: &Post) -> Result<()>;
}

/// Process-local store. Everything is forgotten on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    posts: Mutex<HashMap<i64, Post>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with already delivered ids.
    #[must_use]
    pub fn with_ids(ids: impl IntoIterator<Item = i64>) -> Self {
        let posts = ids
            .into_iter()
            .map(|id| {
                (
                    id,
                    Post {
                        id,
                        ..Post::default()
                    },
                )
            })
            .collect();
        Self {
            posts: Mutex::new(posts),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<i64, Post>> {
        // A poisoned map is still a valid map; nothing mutates it partially.
        self.posts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl SeenStore for MemoryStore {
    async fn exists(&self, id: i64) -> Result<bool> {
        Ok(self.lock().contains_key(&id))
    }

    async fn store(&self, post: &Post) -> Result<()> {
        self.lock().insert(post.id, post.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(!store.exists(42).await.unwrap());

        let post = Post {
            id: 42,
            ..Post::default()
        };
        store.store(&post).await.unwrap();
        assert!(store.exists(42).await.unwrap());

        // Upsert keeps a single entry.
        store.store(&post).await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_seeded() {
        let store = MemoryStore::with_ids([1, 2]);
        assert!(store.exists(1).await.unwrap());
        assert!(store.exists(2).await.unwrap());
        assert!(!store.exists(3).await.unwrap());
    }
}
