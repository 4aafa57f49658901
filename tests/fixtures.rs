use std::fs;
use std::path::PathBuf;

use httpmock::MockServer;
use serde_json::json;

use mosaico::application::repos::{AccountDirectory, CategorySource, PostSource, SourceError};
use mosaico::domain::types::{PostOrigin, PostStatus};
use mosaico::infra::fixtures::{FixtureLocation, FixtureSource};

fn bundled() -> FixtureSource {
    FixtureSource::directory(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("mock-api"))
}

#[tokio::test]
async fn bundled_documents_parse() {
    let source = bundled();

    let posts = source.list_posts().await.expect("posts");
    assert!(!posts.is_empty());
    assert!(posts.iter().all(|post| post.origin == PostOrigin::Fixture));
    assert!(posts.iter().all(|post| !post.excerpt.is_empty()));
    assert!(posts.iter().all(|post| post.author.name != "Unknown Author"));

    let categories = source.list_categories().await.expect("categories");
    assert!(categories.iter().any(|category| category.slug == "all"));

    let accounts = source.list_accounts().await.expect("accounts");
    assert!(accounts.iter().any(|account| account.user.email == "demo@example.com"));

    let comments = source.list_comments("post-1").await.expect("comments");
    assert_eq!(comments.len(), 2);
}

#[tokio::test]
async fn sparse_posts_are_completed_from_authors() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("posts.json"),
        json!([
            {
                "id": "post-7",
                "title": "Sparse",
                "content": "Only the required fields.",
                "authorId": "author-9",
                "publishedAt": "2024-02-02T08:00:00Z"
            }
        ])
        .to_string(),
    )
    .expect("write posts");
    fs::write(
        dir.path().join("authors.json"),
        json!([
            {
                "id": "author-9",
                "name": "Katherine Johnson",
                "avatar": "https://avatars.test/kj",
                "role": "Analyst"
            }
        ])
        .to_string(),
    )
    .expect("write authors");

    let posts = FixtureSource::directory(dir.path())
        .list_posts()
        .await
        .expect("posts");

    assert_eq!(posts.len(), 1);
    let post = &posts[0];
    assert_eq!(post.author.name, "Katherine Johnson");
    assert_eq!(post.excerpt, "Only the required fields.");
    assert_eq!(post.updated_at, post.published_at);
    assert_eq!(post.status, PostStatus::Published);
    assert_eq!(post.read_time, 1);
}

#[tokio::test]
async fn missing_posts_document_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");

    let err = FixtureSource::directory(dir.path())
        .list_posts()
        .await
        .expect_err("no posts.json");
    assert!(matches!(err, SourceError::Io { .. }));
}

#[tokio::test]
async fn http_location_fetches_documents_relative_to_the_base() {
    let server = MockServer::start();
    let categories = server.mock(|when, then| {
        when.method("GET").path("/mock-api/categories.json");
        then.status(200).json_body(json!([
            { "id": "technology", "name": "Technology", "slug": "technology" }
        ]));
    });

    let source = FixtureSource::from_location(&server.url("/mock-api"), None).expect("source");
    assert!(matches!(source.location(), FixtureLocation::Http(_)));

    let listed = source.list_categories().await.expect("categories");
    categories.assert();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].description, "");
}

#[tokio::test]
async fn http_fixture_comments_match_bare_ids() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/comments.json");
        then.status(200).json_body(json!([
            {
                "id": "comment-1",
                "postId": "3",
                "author": "Dana",
                "content": "Matches json-3",
                "createdAt": "2024-01-05T10:00:00Z"
            },
            {
                "id": "comment-2",
                "postId": "4",
                "author": "Eli",
                "content": "Other post",
                "createdAt": "2024-01-06T10:00:00Z"
            }
        ]));
    });

    let source = FixtureSource::from_location(&server.base_url(), None).expect("source");
    let comments = source.list_comments("json-3").await.expect("comments");

    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].post_id, "json-3");
    assert!(comments[0].avatar.contains("seed=Dana"));
}
