//! Static JSON fixture documents served from a URL or read from a directory.
//!
//! Fixture records are loosely shaped: optional fields are filled in here so
//! the rest of the crate only ever sees complete records.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use time::OffsetDateTime;
use tracing::{debug, warn};
use url::Url;

use crate::application::repos::{
    AccountDirectory, CategorySource, PostSource, SourceError, StoredAccount,
};
use crate::domain::entities::{AuthorSnapshot, CategoryRecord, CommentRecord, PostRecord, UserRecord};
use crate::domain::posts::{avatar_url, clipped_excerpt, read_time_minutes, unprefixed_post_id};
use crate::domain::types::{PostOrigin, PostStatus};
use crate::infra::http_json::JsonClient;

pub const POSTS_DOCUMENT: &str = "posts.json";
pub const AUTHORS_DOCUMENT: &str = "authors.json";
pub const COMMENTS_DOCUMENT: &str = "comments.json";
pub const CATEGORIES_DOCUMENT: &str = "categories.json";
pub const USERS_DOCUMENT: &str = "users.json";

const UNKNOWN_AUTHOR_NAME: &str = "Unknown Author";
const UNKNOWN_AUTHOR_SEED: &str = "unknown";
const UNKNOWN_AUTHOR_ROLE: &str = "Writer";

#[derive(Debug, Clone)]
pub enum FixtureLocation {
    Http(JsonClient),
    Directory(PathBuf),
}

#[derive(Debug, Clone)]
pub struct FixtureSource {
    location: FixtureLocation,
}

impl FixtureSource {
    pub fn new(location: FixtureLocation) -> Self {
        Self { location }
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self::new(FixtureLocation::Directory(path.into()))
    }

    /// `http://` and `https://` locations are fetched, anything else is a path.
    pub fn from_location(location: &str, timeout: Option<Duration>) -> Result<Self, SourceError> {
        if location.starts_with("http://") || location.starts_with("https://") {
            let base = Url::parse(location)
                .map_err(|err| SourceError::Location(format!("{location}: {err}")))?;
            return Ok(Self::new(FixtureLocation::Http(JsonClient::new(
                &base, timeout,
            )?)));
        }
        Ok(Self::directory(location))
    }

    pub fn location(&self) -> &FixtureLocation {
        &self.location
    }

    async fn read<T: DeserializeOwned>(&self, document: &str) -> Result<T, SourceError> {
        match &self.location {
            FixtureLocation::Http(client) => client.get(document).await,
            FixtureLocation::Directory(root) => {
                let path = root.join(document);
                let bytes = tokio::fs::read(&path)
                    .await
                    .map_err(|source| SourceError::Io {
                        path: path.display().to_string(),
                        source,
                    })?;
                serde_json::from_slice(&bytes).map_err(|err| SourceError::Decode {
                    location: path.display().to_string(),
                    message: err.to_string(),
                })
            }
        }
    }

    pub async fn list_users(&self) -> Result<Vec<UserRecord>, SourceError> {
        Ok(self
            .list_accounts()
            .await?
            .into_iter()
            .map(|account| account.user)
            .collect())
    }
}

#[async_trait]
impl PostSource for FixtureSource {
    fn origin(&self) -> PostOrigin {
        PostOrigin::Fixture
    }

    async fn list_posts(&self) -> Result<Vec<PostRecord>, SourceError> {
        let (posts, authors) = futures::join!(
            self.read::<Vec<FixturePost>>(POSTS_DOCUMENT),
            self.read::<Vec<AuthorSnapshot>>(AUTHORS_DOCUMENT),
        );
        let posts = posts?;
        let authors = authors.unwrap_or_else(|err| {
            warn!(error = %err, "Fixture authors unavailable; posts keep their own author data");
            Vec::new()
        });

        let posts: Vec<PostRecord> = posts
            .into_iter()
            .map(|post| post.normalize(&authors))
            .collect();
        debug!(count = posts.len(), "Loaded fixture posts");
        Ok(posts)
    }

    async fn list_comments(&self, post_id: &str) -> Result<Vec<CommentRecord>, SourceError> {
        let bare_id = unprefixed_post_id(post_id);
        let comments = self
            .read::<Vec<FixtureComment>>(COMMENTS_DOCUMENT)
            .await?
            .into_iter()
            .filter(|comment| comment.post_id == post_id || comment.post_id == bare_id)
            .map(|comment| comment.normalize(post_id))
            .collect();
        Ok(comments)
    }
}

#[async_trait]
impl CategorySource for FixtureSource {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, SourceError> {
        self.read(CATEGORIES_DOCUMENT).await
    }
}

#[async_trait]
impl AccountDirectory for FixtureSource {
    async fn list_accounts(&self) -> Result<Vec<StoredAccount>, SourceError> {
        let accounts = self
            .read::<Vec<FixtureAccount>>(USERS_DOCUMENT)
            .await?
            .into_iter()
            .map(|account| StoredAccount {
                user: account.user,
                password: account.password,
            })
            .collect();
        Ok(accounts)
    }
}

fn unknown_author(author_id: &str) -> AuthorSnapshot {
    AuthorSnapshot {
        id: author_id.to_string(),
        name: UNKNOWN_AUTHOR_NAME.to_string(),
        avatar: avatar_url(UNKNOWN_AUTHOR_SEED),
        bio: String::new(),
        role: UNKNOWN_AUTHOR_ROLE.to_string(),
        social: None,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FixturePost {
    id: String,
    title: String,
    content: String,
    #[serde(default)]
    excerpt: Option<String>,
    #[serde(default)]
    author_id: Option<String>,
    #[serde(default)]
    author: Option<AuthorSnapshot>,
    #[serde(default)]
    category: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    published_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    updated_at: Option<OffsetDateTime>,
    #[serde(default)]
    read_time: Option<u32>,
    #[serde(default)]
    likes: u64,
    #[serde(default)]
    bookmarks: u64,
    #[serde(default)]
    views: u64,
    #[serde(default)]
    featured_image: Option<String>,
    #[serde(default)]
    is_featured: bool,
    #[serde(default)]
    status: Option<PostStatus>,
}

impl FixturePost {
    fn normalize(self, authors: &[AuthorSnapshot]) -> PostRecord {
        let author_id = self
            .author_id
            .or_else(|| self.author.as_ref().map(|author| author.id.clone()))
            .unwrap_or_default();
        let author = authors
            .iter()
            .find(|author| author.id == author_id)
            .cloned()
            .or(self.author)
            .unwrap_or_else(|| unknown_author(&author_id));

        let excerpt = match self.excerpt {
            Some(excerpt) if !excerpt.trim().is_empty() => excerpt,
            _ => clipped_excerpt(&self.content),
        };

        PostRecord {
            id: self.id,
            origin: PostOrigin::Fixture,
            title: self.title,
            excerpt,
            read_time: self
                .read_time
                .unwrap_or_else(|| read_time_minutes(&self.content)),
            content: self.content,
            author_id,
            author,
            category: self.category,
            tags: self.tags,
            published_at: self.published_at,
            updated_at: self.updated_at.unwrap_or(self.published_at),
            likes: self.likes,
            bookmarks: self.bookmarks,
            views: self.views,
            featured_image: self.featured_image,
            is_featured: self.is_featured,
            status: self.status.unwrap_or(PostStatus::Published),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FixtureComment {
    id: String,
    post_id: String,
    author: String,
    #[serde(default)]
    avatar: Option<String>,
    content: String,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    #[serde(default)]
    likes: u64,
    #[serde(default)]
    is_verified: Option<bool>,
}

impl FixtureComment {
    fn normalize(self, post_id: &str) -> CommentRecord {
        CommentRecord {
            avatar: self
                .avatar
                .filter(|avatar| !avatar.trim().is_empty())
                .unwrap_or_else(|| avatar_url(&self.author)),
            id: self.id,
            post_id: post_id.to_string(),
            author: self.author,
            content: self.content,
            created_at: self.created_at,
            likes: self.likes,
            is_verified: self.is_verified,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FixtureAccount {
    #[serde(flatten)]
    user: UserRecord,
    password: String,
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) {
        fs::write(dir.path().join(name), contents).expect("write fixture");
    }

    #[tokio::test]
    async fn posts_resolve_authors_and_fill_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(
            &dir,
            POSTS_DOCUMENT,
            r#"[
                {"id": "1", "title": "Known", "content": "body", "authorId": "a1",
                 "category": "Rust", "publishedAt": "2024-02-01T00:00:00Z"},
                {"id": "2", "title": "Orphan", "content": "text", "authorId": "ghost",
                 "publishedAt": "2024-02-02T00:00:00Z", "readTime": 7}
            ]"#,
        );
        write(
            &dir,
            AUTHORS_DOCUMENT,
            r#"[{"id": "a1", "name": "Ada", "avatar": "a.svg", "role": "Editor"}]"#,
        );

        let posts = FixtureSource::directory(dir.path())
            .list_posts()
            .await
            .expect("posts");

        assert_eq!(posts[0].author.name, "Ada");
        assert_eq!(posts[0].excerpt, "body...");
        assert_eq!(posts[0].read_time, 1);
        assert_eq!(posts[0].updated_at, posts[0].published_at);
        assert_eq!(posts[0].status, PostStatus::Published);
        assert_eq!(posts[1].author.name, UNKNOWN_AUTHOR_NAME);
        assert_eq!(posts[1].author.role, UNKNOWN_AUTHOR_ROLE);
        assert!(posts[1].author.avatar.ends_with("seed=unknown"));
        assert_eq!(posts[1].read_time, 7);
    }

    #[tokio::test]
    async fn comments_match_bare_and_prefixed_ids() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(
            &dir,
            COMMENTS_DOCUMENT,
            r#"[
                {"id": "c1", "postId": "3", "author": "Bo", "content": "hi",
                 "createdAt": "2024-02-01T00:00:00Z"},
                {"id": "c2", "postId": "4", "author": "Cy", "content": "yo",
                 "createdAt": "2024-02-01T00:00:00Z"}
            ]"#,
        );

        let comments = FixtureSource::directory(dir.path())
            .list_comments("json-3")
            .await
            .expect("comments");

        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].id, "c1");
        assert_eq!(comments[0].post_id, "json-3");
        assert!(comments[0].avatar.ends_with("seed=Bo"));
    }

    #[tokio::test]
    async fn missing_directory_is_a_source_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = FixtureSource::directory(dir.path().join("absent"));
        let err = source.list_posts().await.expect_err("missing");
        assert!(matches!(err, SourceError::Io { .. }));
    }

    #[tokio::test]
    async fn accounts_keep_passwords_out_of_user_records() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(
            &dir,
            USERS_DOCUMENT,
            r#"[{"id": "1", "email": "ada@example.com", "name": "Ada", "avatar": "",
                 "role": "admin", "password": "engine",
                 "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "2024-01-01T00:00:00Z"}]"#,
        );

        let source = FixtureSource::directory(dir.path());
        let accounts = source.list_accounts().await.expect("accounts");
        assert_eq!(accounts[0].password, "engine");

        let users = source.list_users().await.expect("users");
        let encoded = serde_json::to_string(&users[0]).expect("encode");
        assert!(!encoded.contains("engine"));
    }

    #[test]
    fn http_locations_are_detected() {
        let source =
            FixtureSource::from_location("http://localhost:3000/mock-api", None).expect("source");
        assert!(matches!(source.location(), FixtureLocation::Http(_)));

        let source = FixtureSource::from_location("./mock-api", None).expect("source");
        assert!(matches!(source.location(), FixtureLocation::Directory(_)));
    }
}
