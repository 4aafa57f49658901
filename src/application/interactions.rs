//! Per-reader interaction state: bookmarks, likes, the per-post comment map
//! and the recently viewed list.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::application::clock::{Clock, IdSequence, SystemClock};
use crate::application::local::{
    BOOKMARKS_KEY, LIKES_KEY, LocalCollections, POST_COMMENTS_KEY, RECENTLY_VIEWED_KEY,
};
use crate::application::repos::{CreateCommentParams, StoreError};
use crate::domain::entities::CommentRecord;
use crate::domain::posts::avatar_url;

pub const RECENTLY_VIEWED_LIMIT: usize = 10;
const USER_COMMENT_PREFIX: &str = "user-";

type CommentMap = BTreeMap<String, Vec<CommentRecord>>;

#[derive(Clone)]
pub struct InteractionService {
    local: LocalCollections,
    clock: Arc<dyn Clock>,
    ids: Arc<IdSequence>,
    writes: Arc<Mutex<()>>,
}

impl InteractionService {
    pub fn new(local: LocalCollections) -> Self {
        Self {
            local,
            clock: Arc::new(SystemClock),
            ids: Arc::new(IdSequence::new()),
            writes: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Flip the bookmark for `post_id`; returns whether it is now bookmarked.
    pub async fn toggle_bookmark(&self, post_id: &str) -> Result<bool, StoreError> {
        self.toggle(BOOKMARKS_KEY, post_id).await
    }

    pub async fn bookmarks(&self) -> Result<Vec<String>, StoreError> {
        self.local.load(BOOKMARKS_KEY).await
    }

    pub async fn is_bookmarked(&self, post_id: &str) -> Result<bool, StoreError> {
        Ok(self.bookmarks().await?.iter().any(|id| id == post_id))
    }

    /// Flip the like for `post_id`; returns whether it is now liked.
    pub async fn toggle_like(&self, post_id: &str) -> Result<bool, StoreError> {
        self.toggle(LIKES_KEY, post_id).await
    }

    pub async fn likes(&self) -> Result<Vec<String>, StoreError> {
        self.local.load(LIKES_KEY).await
    }

    pub async fn is_liked(&self, post_id: &str) -> Result<bool, StoreError> {
        Ok(self.likes().await?.iter().any(|id| id == post_id))
    }

    pub async fn add_user_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, StoreError> {
        let _guard = self.writes.lock().await;
        let mut map = self.comment_map().await?;

        let now = self.clock.now();
        let id = self.ids.next_id(USER_COMMENT_PREFIX, now, |candidate| {
            map.values().flatten().any(|comment| comment.id == candidate)
        });
        let comment = CommentRecord {
            id,
            avatar: params
                .avatar
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| avatar_url(&params.author)),
            post_id: params.post_id.clone(),
            author: params.author,
            content: params.content,
            created_at: now,
            likes: 0,
            is_verified: params.is_verified,
        };

        map.entry(params.post_id).or_default().push(comment.clone());
        self.local.save_value(POST_COMMENTS_KEY, &map).await?;
        Ok(comment)
    }

    pub async fn user_comments(&self, post_id: &str) -> Result<Vec<CommentRecord>, StoreError> {
        Ok(self
            .comment_map()
            .await?
            .remove(post_id)
            .unwrap_or_default())
    }

    /// Move `post_id` to the front of the recently viewed list.
    pub async fn record_view(&self, post_id: &str) -> Result<Vec<String>, StoreError> {
        let _guard = self.writes.lock().await;
        let mut viewed: Vec<String> = self.local.load(RECENTLY_VIEWED_KEY).await?;
        viewed.retain(|id| id != post_id);
        viewed.insert(0, post_id.to_string());
        viewed.truncate(RECENTLY_VIEWED_LIMIT);
        self.local.save(RECENTLY_VIEWED_KEY, &viewed).await?;
        Ok(viewed)
    }

    pub async fn recently_viewed(&self) -> Result<Vec<String>, StoreError> {
        self.local.load(RECENTLY_VIEWED_KEY).await
    }

    pub async fn clear_user_data(&self) -> Result<(), StoreError> {
        let _guard = self.writes.lock().await;
        for key in [BOOKMARKS_KEY, LIKES_KEY, POST_COMMENTS_KEY, RECENTLY_VIEWED_KEY] {
            self.local.remove(key).await?;
        }
        info!("Cleared reader interaction state");
        Ok(())
    }

    async fn toggle(&self, key: &str, post_id: &str) -> Result<bool, StoreError> {
        let _guard = self.writes.lock().await;
        let mut ids: Vec<String> = self.local.load(key).await?;
        let enabled = match ids.iter().position(|id| id == post_id) {
            Some(index) => {
                ids.remove(index);
                false
            }
            None => {
                ids.push(post_id.to_string());
                true
            }
        };
        self.local.save(key, &ids).await?;
        Ok(enabled)
    }

    async fn comment_map(&self) -> Result<CommentMap, StoreError> {
        Ok(self
            .local
            .load_value::<CommentMap>(POST_COMMENTS_KEY)
            .await?
            .unwrap_or_default())
    }
}
