//! Ports describing storage and content-source adapters, plus the write
//! parameters accepted by the aggregation service.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{
    AuthorSnapshot, CategoryRecord, CommentRecord, PostRecord, UserRecord,
};
use crate::domain::types::{PostOrigin, PostStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("failed to encode `{key}`: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Persisted string key-value storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn put(&self, key: &str, value: String) -> Result<(), StoreError>;

    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// A content source failed; readers drop its contribution.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request to `{url}` failed: {message}")]
    Transport { url: String, message: String },
    #[error("`{url}` responded with status {status}")]
    Status { url: String, status: u16 },
    #[error("`{url}` returned non-JSON content type `{content_type}`")]
    ContentType { url: String, content_type: String },
    #[error("failed to decode `{location}`: {message}")]
    Decode { location: String, message: String },
    #[error("failed to read `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid source location: {0}")]
    Location(String),
}

#[async_trait]
pub trait PostSource: Send + Sync {
    fn origin(&self) -> PostOrigin;

    async fn list_posts(&self) -> Result<Vec<PostRecord>, SourceError>;

    async fn list_comments(&self, post_id: &str) -> Result<Vec<CommentRecord>, SourceError>;
}

#[async_trait]
pub trait CategorySource: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, SourceError>;
}

/// A user entry from the static directory, with its mock password.
#[derive(Debug, Clone)]
pub struct StoredAccount {
    pub user: UserRecord,
    pub password: String,
}

#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn list_accounts(&self) -> Result<Vec<StoredAccount>, SourceError>;
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub title: String,
    pub content: String,
    /// Derived from the content when absent or blank.
    pub excerpt: Option<String>,
    pub author: AuthorSnapshot,
    pub category: String,
    pub tags: Vec<String>,
    pub featured_image: Option<String>,
    pub status: PostStatus,
}

#[derive(Debug, Clone, Default)]
pub struct UpdatePostParams {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub featured_image: Option<String>,
    pub status: Option<PostStatus>,
    pub is_featured: Option<bool>,
}

impl UpdatePostParams {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.excerpt.is_none()
            && self.category.is_none()
            && self.tags.is_none()
            && self.featured_image.is_none()
            && self.status.is_none()
            && self.is_featured.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct CreateCommentParams {
    pub post_id: String,
    pub author: String,
    /// Generated from the author name when absent.
    pub avatar: Option<String>,
    pub content: String,
    pub is_verified: Option<bool>,
}
