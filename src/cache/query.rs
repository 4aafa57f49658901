//! Cached, deduplicated reads over the aggregation service.
//!
//! Each read is keyed by [`QueryKey`]. Concurrent readers of the same key
//! share one in-flight fetch. Mutations go through the client so it can drop
//! the entries they affect and advance the invalidation epoch; a fetch that
//! started under an older epoch still answers its callers but is not stored.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::{debug, warn};

use crate::application::aggregation::{AggregationError, AggregationService};
use crate::application::repos::{
    CategorySource, CreateCommentParams, CreatePostParams, UpdatePostParams,
};
use crate::domain::entities::{CategoryRecord, CommentRecord, PostRecord};
use crate::domain::posts::PostFilter;

use super::config::QueryCacheConfig;
use super::keys::{QueryKey, QueryValue};
use super::lock::mutex_lock;
use super::store::QueryStore;

const SOURCE: &str = "cache::query";

/// Invalidation generation. Bumped by every mutation.
pub type Epoch = u64;

type SharedFetch = Shared<BoxFuture<'static, QueryValue>>;

struct InFlight {
    fetch: SharedFetch,
    epoch: Epoch,
}

#[derive(Clone)]
pub struct QueryClient {
    service: AggregationService,
    categories: Arc<dyn CategorySource>,
    config: QueryCacheConfig,
    store: Arc<QueryStore>,
    in_flight: Arc<Mutex<HashMap<QueryKey, InFlight>>>,
    epoch: Arc<AtomicU64>,
}

impl QueryClient {
    pub fn new(
        service: AggregationService,
        categories: Arc<dyn CategorySource>,
        config: QueryCacheConfig,
    ) -> Self {
        Self {
            service,
            categories,
            store: Arc::new(QueryStore::new(&config)),
            config,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn service(&self) -> &AggregationService {
        &self.service
    }

    pub fn store(&self) -> &QueryStore {
        &self.store
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch.load(Ordering::SeqCst)
    }

    /// All posts, newest first, narrowed by `filter`.
    pub async fn posts(&self, filter: &PostFilter) -> Vec<PostRecord> {
        let posts = self.fetch(QueryKey::AllPosts).await.into_posts();
        filter.apply(&posts)
    }

    pub async fn post(&self, id: &str) -> Option<PostRecord> {
        self.fetch(QueryKey::Post(id.to_string()))
            .await
            .into_post()
    }

    pub async fn posts_by_author(&self, author_id: &str) -> Vec<PostRecord> {
        self.fetch(QueryKey::AuthorPosts(author_id.to_string()))
            .await
            .into_posts()
            .to_vec()
    }

    pub async fn comments(&self, post_id: &str) -> Vec<CommentRecord> {
        self.fetch(QueryKey::Comments(post_id.to_string()))
            .await
            .into_comments()
            .to_vec()
    }

    /// Category list; a failing source yields the catch-all category.
    pub async fn categories(&self) -> Vec<CategoryRecord> {
        self.fetch(QueryKey::Categories)
            .await
            .into_categories()
            .to_vec()
    }

    pub async fn create_post(
        &self,
        params: CreatePostParams,
    ) -> Result<PostRecord, AggregationError> {
        let post = self.service.create_post(params).await?;
        let created = post.id.clone();
        self.invalidate(|key| match key {
            QueryKey::Post(post_id) => *post_id == created,
            other => other.is_post_list(),
        });
        Ok(post)
    }

    pub async fn update_post(
        &self,
        id: &str,
        patch: UpdatePostParams,
    ) -> Result<PostRecord, AggregationError> {
        let post = self.service.update_post(id, patch).await?;
        self.invalidate(|key| match key {
            QueryKey::Post(post_id) => post_id == id,
            other => other.is_post_list(),
        });
        Ok(post)
    }

    pub async fn delete_post(&self, id: &str) -> Result<(), AggregationError> {
        let result = self.service.delete_post(id).await;
        // Storage failures may follow a partial write.
        if matches!(result, Ok(()) | Err(AggregationError::Store(_))) {
            self.invalidate(|key| match key {
                QueryKey::Post(post_id) | QueryKey::Comments(post_id) => post_id == id,
                other => other.is_post_list(),
            });
        }
        result
    }

    pub async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, AggregationError> {
        let comment = self.service.create_comment(params).await?;
        let post_id = comment.post_id.clone();
        self.invalidate(|key| matches!(key, QueryKey::Comments(id) if *id == post_id));
        Ok(comment)
    }

    /// Drop every cached entry.
    pub fn invalidate_all(&self) {
        self.invalidate(|_| true);
    }

    fn invalidate<F>(&self, matches: F)
    where
        F: Fn(&QueryKey) -> bool,
    {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let removed = self.store.invalidate(matches);
        debug!(epoch, removed, "Query cache invalidated");
    }

    async fn fetch(&self, key: QueryKey) -> QueryValue {
        if self.config.enabled {
            if let Some(value) = self.store.get_fresh(&key) {
                return value;
            }
        }

        let (fetch, started_at) = self.join_or_start(&key);
        let value = fetch.clone().await;

        {
            let mut in_flight = mutex_lock(&self.in_flight, SOURCE, "fetch.complete");
            let finished = in_flight
                .get(&key)
                .is_some_and(|entry| entry.fetch.ptr_eq(&fetch));
            if finished {
                in_flight.remove(&key);
            }
        }

        if self.config.enabled {
            if started_at == self.epoch() {
                self.store.put(key, value.clone());
            } else {
                debug!(query = key.kind(), started_at, "Discarded result fetched before invalidation");
            }
        }
        value
    }

    fn join_or_start(&self, key: &QueryKey) -> (SharedFetch, Epoch) {
        let mut in_flight = mutex_lock(&self.in_flight, SOURCE, "fetch.join");
        let epoch = self.epoch();
        if let Some(entry) = in_flight.get(key) {
            if entry.epoch == epoch {
                debug!(query = key.kind(), "Joined in-flight query");
                return (entry.fetch.clone(), epoch);
            }
        }

        let fetch = self.load(key.clone()).boxed().shared();
        in_flight.insert(
            key.clone(),
            InFlight {
                fetch: fetch.clone(),
                epoch,
            },
        );
        (fetch, epoch)
    }

    fn load(&self, key: QueryKey) -> impl Future<Output = QueryValue> + Send + 'static {
        let service = self.service.clone();
        let categories = Arc::clone(&self.categories);
        async move {
            match key {
                QueryKey::AllPosts => QueryValue::Posts(Arc::new(service.list_all_posts().await)),
                QueryKey::Post(id) => QueryValue::Post(service.get_post(&id).await),
                QueryKey::AuthorPosts(author_id) => QueryValue::Posts(Arc::new(
                    service.list_posts_by_author(&author_id).await,
                )),
                QueryKey::Comments(post_id) => {
                    QueryValue::Comments(Arc::new(service.list_comments(&post_id).await))
                }
                QueryKey::Categories => {
                    let list = match categories.list_categories().await {
                        Ok(list) => list,
                        Err(err) => {
                            warn!(error = %err, "Category source unavailable");
                            metrics::counter!("mosaico_source_failure_total", "source" => "categories")
                                .increment(1);
                            vec![CategoryRecord::all()]
                        }
                    };
                    QueryValue::Categories(Arc::new(list))
                }
            }
        }
    }
}
