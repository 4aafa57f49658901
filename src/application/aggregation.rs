//! Hybrid post aggregation.
//!
//! Reads merge three sources in precedence order (local store, fixture,
//! remote demo API) and never fail: a source that errors is logged and simply
//! contributes nothing. Writes go to the local store only; posts owned by a
//! read-only source cannot be updated or deleted.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::application::clock::{Clock, IdSequence, SystemClock, strictly_after};
use crate::application::local::{LocalCollections, USER_COMMENTS_KEY, USER_POSTS_KEY};
use crate::application::repos::{
    CreateCommentParams, CreatePostParams, KeyValueStore, PostSource, SourceError, StoreError,
    UpdatePostParams,
};
use crate::domain::entities::{CommentRecord, PostRecord};
use crate::domain::error::DomainError;
use crate::domain::posts::{
    LOCAL_COMMENT_PREFIX, LOCAL_POST_PREFIX, avatar_url, generate_excerpt, read_time_minutes,
    remote_post_number, sort_comments_newest_first, sort_posts_newest_first,
};
use crate::domain::types::PostOrigin;

#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("post `{id}` not found")]
    NotFound { id: String },
    #[error("post `{id}` belongs to the read-only {origin} source")]
    Forbidden { id: String, origin: PostOrigin },
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct AggregationService {
    local: LocalCollections,
    fixture: Arc<dyn PostSource>,
    remote: Option<Arc<dyn PostSource>>,
    clock: Arc<dyn Clock>,
    ids: Arc<IdSequence>,
    writes: Arc<Mutex<()>>,
}

impl AggregationService {
    pub fn new(store: Arc<dyn KeyValueStore>, fixture: Arc<dyn PostSource>) -> Self {
        Self {
            local: LocalCollections::new(store),
            fixture,
            remote: None,
            clock: Arc::new(SystemClock),
            ids: Arc::new(IdSequence::new()),
            writes: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_remote(mut self, remote: Arc<dyn PostSource>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn local(&self) -> &LocalCollections {
        &self.local
    }

    /// Every post from every reachable source, newest first. Equal timestamps
    /// keep local, fixture, remote order.
    pub async fn list_all_posts(&self) -> Vec<PostRecord> {
        let (local, fixture, remote) = futures::join!(
            self.local.load::<PostRecord>(USER_POSTS_KEY),
            self.fixture.list_posts(),
            self.remote_posts(),
        );

        let mut posts = Vec::new();
        posts.extend(settle(PostOrigin::Local, local));
        posts.extend(settle(PostOrigin::Fixture, fixture));
        posts.extend(settle(PostOrigin::Remote, remote));
        sort_posts_newest_first(&mut posts);

        debug!(count = posts.len(), "Merged post sources");
        posts
    }

    pub async fn get_post(&self, id: &str) -> Option<PostRecord> {
        self.list_all_posts()
            .await
            .into_iter()
            .find(|post| post.id == id)
    }

    pub async fn list_posts_by_author(&self, author_id: &str) -> Vec<PostRecord> {
        self.list_all_posts()
            .await
            .into_iter()
            .filter(|post| post.author_id == author_id)
            .collect()
    }

    /// Comments for one post, newest first. Remote comments are only requested
    /// for posts that came from the remote source.
    pub async fn list_comments(&self, post_id: &str) -> Vec<CommentRecord> {
        let (local, fixture, remote) = futures::join!(
            self.local.load::<CommentRecord>(USER_COMMENTS_KEY),
            self.fixture.list_comments(post_id),
            self.remote_comments(post_id),
        );

        let local = local.map(|comments| {
            comments
                .into_iter()
                .filter(|comment| comment.post_id == post_id)
                .collect::<Vec<_>>()
        });

        let mut comments = Vec::new();
        comments.extend(settle_comments(PostOrigin::Local, post_id, local));
        comments.extend(settle_comments(PostOrigin::Fixture, post_id, fixture));
        comments.extend(settle_comments(PostOrigin::Remote, post_id, remote));
        sort_comments_newest_first(&mut comments);

        debug!(post_id, count = comments.len(), "Merged comment sources");
        comments
    }

    pub async fn create_post(
        &self,
        params: CreatePostParams,
    ) -> Result<PostRecord, AggregationError> {
        require_text("title", &params.title)?;
        require_text("content", &params.content)?;

        let _guard = self.writes.lock().await;
        let mut posts = self.local.load::<PostRecord>(USER_POSTS_KEY).await?;

        let now = self.clock.now();
        let id = self.ids.next_id(LOCAL_POST_PREFIX, now, |candidate| {
            posts.iter().any(|post| post.id == candidate)
        });

        let excerpt = params
            .excerpt
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| generate_excerpt(&params.content));

        let post = PostRecord {
            id,
            origin: PostOrigin::Local,
            read_time: read_time_minutes(&params.content),
            title: params.title,
            content: params.content,
            excerpt,
            author_id: params.author.id.clone(),
            author: params.author,
            category: params.category,
            tags: params.tags,
            published_at: now,
            updated_at: now,
            likes: 0,
            bookmarks: 0,
            views: 0,
            featured_image: params.featured_image,
            is_featured: false,
            status: params.status,
        };

        posts.push(post.clone());
        self.local.save(USER_POSTS_KEY, &posts).await?;

        info!(post_id = %post.id, status = ?post.status, "Local post created");
        Ok(post)
    }

    pub async fn update_post(
        &self,
        id: &str,
        patch: UpdatePostParams,
    ) -> Result<PostRecord, AggregationError> {
        if let Some(title) = patch.title.as_deref() {
            require_text("title", title)?;
        }
        if let Some(content) = patch.content.as_deref() {
            require_text("content", content)?;
        }

        let guard = self.writes.lock().await;
        let mut posts = self.local.load::<PostRecord>(USER_POSTS_KEY).await?;
        let Some(post) = posts.iter_mut().find(|post| post.id == id) else {
            drop(guard);
            return Err(self.missing_post(id).await);
        };

        apply_patch(post, patch);
        post.origin = PostOrigin::Local;
        post.updated_at = strictly_after(self.clock.now(), post.updated_at);
        let updated = post.clone();

        self.local.save(USER_POSTS_KEY, &posts).await?;

        info!(post_id = %updated.id, "Local post updated");
        Ok(updated)
    }

    /// Remove a local post together with the comments stored for it.
    pub async fn delete_post(&self, id: &str) -> Result<(), AggregationError> {
        let guard = self.writes.lock().await;
        let posts = self.local.load::<PostRecord>(USER_POSTS_KEY).await?;
        if !posts.iter().any(|post| post.id == id) {
            drop(guard);
            return Err(self.missing_post(id).await);
        }
        let comments = self.local.load::<CommentRecord>(USER_COMMENTS_KEY).await?;

        let kept_posts: Vec<&PostRecord> = posts.iter().filter(|post| post.id != id).collect();
        let kept_comments: Vec<&CommentRecord> = comments
            .iter()
            .filter(|comment| comment.post_id != id)
            .collect();
        let removed_comments = comments.len() - kept_comments.len();

        self.local.save(USER_POSTS_KEY, &kept_posts).await?;
        if removed_comments > 0 {
            if let Err(err) = self.local.save(USER_COMMENTS_KEY, &kept_comments).await {
                // Undo the post removal.
                if let Err(restore) = self.local.save(USER_POSTS_KEY, &posts).await {
                    warn!(
                        post_id = id,
                        error = %restore,
                        "Failed to restore posts after aborted delete"
                    );
                }
                return Err(err.into());
            }
        }

        info!(post_id = id, removed_comments, "Local post deleted");
        Ok(())
    }

    pub async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, AggregationError> {
        require_text("post id", &params.post_id)?;
        require_text("author", &params.author)?;
        require_text("content", &params.content)?;

        let _guard = self.writes.lock().await;
        let mut comments = self.local.load::<CommentRecord>(USER_COMMENTS_KEY).await?;

        let now = self.clock.now();
        let id = self.ids.next_id(LOCAL_COMMENT_PREFIX, now, |candidate| {
            comments.iter().any(|comment| comment.id == candidate)
        });

        let comment = CommentRecord {
            id,
            avatar: params.avatar.unwrap_or_else(|| avatar_url(&params.author)),
            post_id: params.post_id,
            author: params.author,
            content: params.content,
            created_at: now,
            likes: 0,
            is_verified: params.is_verified,
        };

        comments.push(comment.clone());
        self.local.save(USER_COMMENTS_KEY, &comments).await?;

        info!(comment_id = %comment.id, post_id = %comment.post_id, "Local comment created");
        Ok(comment)
    }

    async fn remote_posts(&self) -> Result<Vec<PostRecord>, SourceError> {
        match &self.remote {
            Some(remote) => remote.list_posts().await,
            None => Ok(Vec::new()),
        }
    }

    async fn remote_comments(&self, post_id: &str) -> Result<Vec<CommentRecord>, SourceError> {
        match (&self.remote, remote_post_number(post_id)) {
            (Some(remote), Some(_)) => remote.list_comments(post_id).await,
            _ => Ok(Vec::new()),
        }
    }

    /// Classify an id that is absent from the local store.
    async fn missing_post(&self, id: &str) -> AggregationError {
        match self.get_post(id).await {
            Some(post) if !post.origin.is_writable() => {
                warn!(post_id = id, origin = %post.origin, "Rejected write to read-only post");
                AggregationError::Forbidden {
                    id: id.to_string(),
                    origin: post.origin,
                }
            }
            _ => AggregationError::NotFound { id: id.to_string() },
        }
    }
}

fn settle<E: std::fmt::Display>(
    origin: PostOrigin,
    result: Result<Vec<PostRecord>, E>,
) -> Vec<PostRecord> {
    match result {
        Ok(mut posts) => {
            for post in &mut posts {
                post.origin = origin;
            }
            posts
        }
        Err(err) => {
            warn!(source = %origin, error = %err, "Post source unavailable");
            record_source_failure(origin);
            Vec::new()
        }
    }
}

fn settle_comments<E: std::fmt::Display>(
    origin: PostOrigin,
    post_id: &str,
    result: Result<Vec<CommentRecord>, E>,
) -> Vec<CommentRecord> {
    match result {
        Ok(comments) => comments,
        Err(err) => {
            warn!(source = %origin, post_id, error = %err, "Comment source unavailable");
            record_source_failure(origin);
            Vec::new()
        }
    }
}

fn record_source_failure(origin: PostOrigin) {
    metrics::counter!("mosaico_source_failure_total", "source" => origin.as_str()).increment(1);
}

fn require_text(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

fn apply_patch(post: &mut PostRecord, patch: UpdatePostParams) {
    if let Some(title) = patch.title {
        post.title = title;
    }
    if let Some(content) = patch.content {
        post.read_time = read_time_minutes(&content);
        post.content = content;
    }
    if let Some(excerpt) = patch.excerpt {
        post.excerpt = excerpt;
    }
    if let Some(category) = patch.category {
        post.category = category;
    }
    if let Some(tags) = patch.tags {
        post.tags = tags;
    }
    if let Some(image) = patch.featured_image {
        post.featured_image = (!image.trim().is_empty()).then_some(image);
    }
    if let Some(status) = patch.status {
        post.status = status;
    }
    if let Some(featured) = patch.is_featured {
        post.is_featured = featured;
    }
}
