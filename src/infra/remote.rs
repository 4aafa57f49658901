//! JSONPlaceholder-style demo API.
//!
//! [`RemoteClient`] mirrors the public REST surface. [`RemoteSource`] reads
//! through it and converts the demo records into blog posts and comments.
//! Engagement numbers the demo API does not have are derived from a SHA-256
//! digest of the record id, so repeated reads agree with each other.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use time::macros::datetime;
use tracing::debug;
use url::Url;

use crate::application::repos::{PostSource, SourceError};
use crate::domain::entities::{AuthorSnapshot, CommentRecord, PostRecord, SocialLinks};
use crate::domain::posts::{
    REMOTE_COMMENT_PREFIX, REMOTE_USER_PREFIX, avatar_url, clipped_excerpt, remote_post_id,
    remote_post_number,
};
use crate::domain::types::{PostOrigin, PostStatus};
use crate::infra::http_json::JsonClient;

pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";
pub const DEFAULT_POST_LIMIT: usize = 10;
pub const DEFAULT_COMMENT_LIMIT: usize = 5;

const CATEGORIES: [&str; 3] = ["General", "Technology", "Programming"];
const TAGS: [&str; 4] = ["jsonplaceholder", "api", "demo", "data"];
const AUTHOR_ROLE: &str = "Author";
const CHARS_PER_MINUTE: usize = 1000;
const EPOCH: OffsetDateTime = datetime!(2024-01-01 0:00 UTC);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePost {
    pub id: u64,
    pub user_id: u64,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRemotePost {
    pub user_id: u64,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePostPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteComment {
    pub id: u64,
    pub post_id: u64,
    pub name: String,
    pub email: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRemoteComment {
    pub post_id: u64,
    pub name: String,
    pub email: String,
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteUser {
    pub id: u64,
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub address: RemoteAddress,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub company: RemoteCompany,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAddress {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub suite: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub zipcode: String,
    #[serde(default)]
    pub geo: RemoteGeo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteGeo {
    #[serde(default)]
    pub lat: String,
    #[serde(default)]
    pub lng: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCompany {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub catch_phrase: String,
    #[serde(default)]
    pub bs: String,
}

#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: JsonClient,
}

impl RemoteClient {
    pub fn new(base: &Url, timeout: Option<Duration>) -> Result<Self, SourceError> {
        Ok(Self {
            http: JsonClient::new(base, timeout)?,
        })
    }

    pub async fn get_posts(&self) -> Result<Vec<RemotePost>, SourceError> {
        self.http.get("posts").await
    }

    pub async fn get_post(&self, id: u64) -> Result<RemotePost, SourceError> {
        self.http.get(&format!("posts/{id}")).await
    }

    pub async fn create_post(&self, post: &NewRemotePost) -> Result<RemotePost, SourceError> {
        self.http.send(Method::POST, "posts", post).await
    }

    pub async fn update_post(
        &self,
        id: u64,
        patch: &RemotePostPatch,
    ) -> Result<RemotePost, SourceError> {
        self.http.send(Method::PUT, &format!("posts/{id}"), patch).await
    }

    pub async fn delete_post(&self, id: u64) -> Result<(), SourceError> {
        self.http.delete(&format!("posts/{id}")).await
    }

    pub async fn get_comments(&self, post_id: u64) -> Result<Vec<RemoteComment>, SourceError> {
        self.http.get(&format!("posts/{post_id}/comments")).await
    }

    pub async fn create_comment(
        &self,
        comment: &NewRemoteComment,
    ) -> Result<RemoteComment, SourceError> {
        self.http.send(Method::POST, "comments", comment).await
    }

    pub async fn get_users(&self) -> Result<Vec<RemoteUser>, SourceError> {
        self.http.get("users").await
    }

    pub async fn get_user(&self, id: u64) -> Result<RemoteUser, SourceError> {
        self.http.get(&format!("users/{id}")).await
    }
}

/// Read-only post source backed by the demo API.
#[derive(Debug, Clone)]
pub struct RemoteSource {
    client: RemoteClient,
    post_limit: usize,
    comment_limit: usize,
}

impl RemoteSource {
    pub fn new(client: RemoteClient) -> Self {
        Self {
            client,
            post_limit: DEFAULT_POST_LIMIT,
            comment_limit: DEFAULT_COMMENT_LIMIT,
        }
    }

    pub fn with_limits(mut self, post_limit: usize, comment_limit: usize) -> Self {
        self.post_limit = post_limit;
        self.comment_limit = comment_limit;
        self
    }

    pub fn client(&self) -> &RemoteClient {
        &self.client
    }
}

#[async_trait]
impl PostSource for RemoteSource {
    fn origin(&self) -> PostOrigin {
        PostOrigin::Remote
    }

    async fn list_posts(&self) -> Result<Vec<PostRecord>, SourceError> {
        let (posts, users) = futures::join!(self.client.get_posts(), self.client.get_users());
        let (posts, users) = (posts?, users?);

        let posts: Vec<PostRecord> = posts
            .into_iter()
            .take(self.post_limit)
            .map(|post| {
                let user = users
                    .iter()
                    .find(|user| user.id == post.user_id)
                    .or_else(|| users.first());
                convert_post(post, user)
            })
            .collect();
        debug!(count = posts.len(), "Converted remote posts");
        Ok(posts)
    }

    async fn list_comments(&self, post_id: &str) -> Result<Vec<CommentRecord>, SourceError> {
        let Some(number) = remote_post_number(post_id) else {
            return Ok(Vec::new());
        };

        let comments = self
            .client
            .get_comments(number)
            .await?
            .into_iter()
            .take(self.comment_limit)
            .map(|comment| convert_comment(comment, post_id))
            .collect();
        Ok(comments)
    }
}

fn convert_post(post: RemotePost, user: Option<&RemoteUser>) -> PostRecord {
    let author = match user {
        Some(user) => remote_author(user),
        None => AuthorSnapshot {
            id: remote_user_id(post.user_id),
            name: format!("User {}", post.user_id),
            avatar: avatar_url(&remote_user_id(post.user_id)),
            bio: String::new(),
            role: AUTHOR_ROLE.to_string(),
            social: None,
        },
    };

    let id = remote_post_id(post.id);
    let digest = Sha256::digest(id.as_bytes());
    let published_at = day_offset(post.id);
    let read_time = post.body.chars().count().div_ceil(CHARS_PER_MINUTE);
    let category_index = usize::try_from(post.user_id % 3).unwrap_or_default();

    PostRecord {
        origin: PostOrigin::Remote,
        excerpt: clipped_excerpt(&post.body),
        read_time: u32::try_from(read_time).unwrap_or(u32::MAX),
        title: post.title,
        content: post.body,
        author_id: author.id.clone(),
        author,
        category: CATEGORIES[category_index].to_string(),
        tags: TAGS.iter().map(|tag| (*tag).to_string()).collect(),
        published_at,
        updated_at: published_at,
        likes: digest_word(digest.as_slice(), 0) % 1000,
        bookmarks: digest_word(digest.as_slice(), 1) % 100,
        views: digest_word(digest.as_slice(), 2) % 10_000,
        featured_image: None,
        is_featured: false,
        status: PostStatus::Published,
        id,
    }
}

fn convert_comment(comment: RemoteComment, post_id: &str) -> CommentRecord {
    let id = format!("{REMOTE_COMMENT_PREFIX}{}", comment.id);
    let digest = Sha256::digest(id.as_bytes());

    CommentRecord {
        post_id: post_id.to_string(),
        avatar: avatar_url(&comment.email),
        author: comment.name,
        content: comment.body,
        created_at: day_offset(comment.id),
        likes: digest_word(digest.as_slice(), 0) % 50,
        is_verified: Some(digest_word(digest.as_slice(), 1) % 2 == 1),
        id,
    }
}

fn remote_author(user: &RemoteUser) -> AuthorSnapshot {
    AuthorSnapshot {
        id: remote_user_id(user.id),
        name: user.name.clone(),
        avatar: avatar_url(&user.username),
        bio: format!("{}. {}", user.company.catch_phrase, user.company.bs),
        role: AUTHOR_ROLE.to_string(),
        social: Some(SocialLinks {
            website: Some(user.website.clone()),
            ..SocialLinks::default()
        }),
    }
}

fn remote_user_id(id: u64) -> String {
    format!("{REMOTE_USER_PREFIX}{id}")
}

/// Day `n` of January 2024 and onwards; `1` maps to 2024-01-01.
fn day_offset(n: u64) -> OffsetDateTime {
    let days = i64::try_from(n.saturating_sub(1)).unwrap_or(i64::MAX);
    EPOCH
        .checked_add(time::Duration::days(days))
        .unwrap_or(EPOCH)
}

/// Big-endian `u64` made from the `index`-th 8-byte window of `digest`.
fn digest_word(digest: &[u8], index: usize) -> u64 {
    digest
        .iter()
        .skip(index * 8)
        .take(8)
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte))
}
