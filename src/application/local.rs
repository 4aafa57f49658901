//! Typed JSON collections on top of a [`KeyValueStore`].

use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};
use tracing::warn;

use crate::application::repos::{KeyValueStore, StoreError};

pub const USER_POSTS_KEY: &str = "user-posts";
pub const USER_COMMENTS_KEY: &str = "user-comments";
pub const BOOKMARKS_KEY: &str = "blog-bookmarks";
pub const LIKES_KEY: &str = "blog-likes";
pub const POST_COMMENTS_KEY: &str = "blog-comments";
pub const RECENTLY_VIEWED_KEY: &str = "blog-recently-viewed";
pub const SESSION_USER_KEY: &str = "user";
pub const SESSION_TOKEN_KEY: &str = "token";

#[derive(Clone)]
pub struct LocalCollections {
    store: Arc<dyn KeyValueStore>,
}

impl LocalCollections {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Load a collection. Missing or malformed content reads as empty;
    /// only storage failures are reported.
    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, StoreError> {
        Ok(self.load_value(key).await?.unwrap_or_default())
    }

    /// Rewrite a whole collection.
    pub async fn save<T: Serialize>(&self, key: &str, records: &[T]) -> Result<(), StoreError> {
        self.save_value(key, records).await
    }

    pub async fn load_value<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, StoreError> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(key, error = %err, "Discarding malformed stored document");
                Ok(None)
            }
        }
    }

    pub async fn save_value<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(value).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.store.put(key, encoded).await
    }

    pub async fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.store.get(key).await
    }

    pub async fn put_raw(&self, key: &str, value: impl Into<String>) -> Result<(), StoreError> {
        self.store.put(key, value.into()).await
    }

    pub async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.store.remove(key).await
    }
}
