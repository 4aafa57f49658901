use httpmock::MockServer;
use serde_json::json;
use url::Url;

use mosaico::application::repos::{PostSource, SourceError};
use mosaico::domain::types::PostOrigin;
use mosaico::infra::remote::{NewRemotePost, RemoteClient, RemotePostPatch, RemoteSource};

fn client(server: &MockServer) -> RemoteClient {
    let base = Url::parse(&server.base_url()).expect("mock url");
    RemoteClient::new(&base, None).expect("client")
}

fn mock_users(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method("GET").path("/users");
        then.status(200).json_body(json!([
            {
                "id": 1,
                "name": "Leanne Graham",
                "username": "Bret",
                "email": "sincere@april.biz",
                "website": "hildegard.org",
                "company": {
                    "name": "Romaguera-Crona",
                    "catchPhrase": "Multi-layered client-server neural-net",
                    "bs": "harness real-time e-markets"
                }
            }
        ]));
    })
}

#[tokio::test]
async fn posts_are_limited_and_joined_with_users() {
    let server = MockServer::start();
    let posts = server.mock(|when, then| {
        when.method("GET").path("/posts");
        then.status(200).json_body(json!([
            { "id": 1, "userId": 1, "title": "first", "body": "alpha" },
            { "id": 2, "userId": 9, "title": "second", "body": "beta" },
            { "id": 3, "userId": 1, "title": "third", "body": "gamma" }
        ]));
    });
    let users = mock_users(&server);

    let source = RemoteSource::new(client(&server)).with_limits(2, 5);
    let converted = source.list_posts().await.expect("posts");

    posts.assert();
    users.assert();
    assert_eq!(converted.len(), 2);
    assert_eq!(converted[0].id, "json-1");
    assert_eq!(converted[0].origin, PostOrigin::Remote);
    assert_eq!(converted[0].author.name, "Leanne Graham");
    // Unknown user ids fall back to the first listed user.
    assert_eq!(converted[1].author_id, "json-user-1");
    assert_eq!(source.origin(), PostOrigin::Remote);
}

#[tokio::test]
async fn repeated_reads_yield_identical_counters() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/posts");
        then.status(200)
            .json_body(json!([{ "id": 4, "userId": 1, "title": "t", "body": "b" }]));
    });
    mock_users(&server);

    let source = RemoteSource::new(client(&server));
    let first = source.list_posts().await.expect("first read");
    let second = source.list_posts().await.expect("second read");

    assert_eq!(first, second);
}

#[tokio::test]
async fn comments_use_the_numeric_post_id_and_limit() {
    let server = MockServer::start();
    let comments = server.mock(|when, then| {
        when.method("GET").path("/posts/7/comments");
        then.status(200).json_body(json!([
            { "id": 31, "postId": 7, "name": "a", "email": "a@example.com", "body": "one" },
            { "id": 32, "postId": 7, "name": "b", "email": "b@example.com", "body": "two" },
            { "id": 33, "postId": 7, "name": "c", "email": "c@example.com", "body": "three" }
        ]));
    });

    let source = RemoteSource::new(client(&server)).with_limits(10, 2);
    let converted = source.list_comments("json-7").await.expect("comments");

    comments.assert();
    assert_eq!(converted.len(), 2);
    assert_eq!(converted[0].id, "json-comment-31");
    assert!(converted.iter().all(|comment| comment.post_id == "json-7"));
    assert!(converted[0].avatar.contains("seed=a%40example.com"));
}

#[tokio::test]
async fn non_remote_ids_skip_the_network() {
    let server = MockServer::start();
    // Any request would fail the read.
    server.mock(|when, then| {
        when.method("GET");
        then.status(500);
    });

    let source = RemoteSource::new(client(&server));
    let converted = source.list_comments("post-1700000000000").await.expect("empty");

    assert!(converted.is_empty());
}

#[tokio::test]
async fn error_status_is_reported() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/posts");
        then.status(503).body("maintenance");
    });
    mock_users(&server);

    let err = RemoteSource::new(client(&server))
        .list_posts()
        .await
        .expect_err("status error");

    assert!(matches!(err, SourceError::Status { status: 503, .. }));
}

#[tokio::test]
async fn non_json_content_type_is_rejected() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/users/1");
        then.status(200)
            .header("content-type", "text/html")
            .body("<html></html>");
    });

    let err = client(&server).get_user(1).await.expect_err("html body");

    match err {
        SourceError::ContentType { content_type, .. } => assert_eq!(content_type, "text/html"),
        other => panic!("expected content type error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_json_is_a_decode_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/posts/1");
        then.status(200)
            .header("content-type", "application/json; charset=utf-8")
            .body("{\"id\":");
    });

    let err = client(&server).get_post(1).await.expect_err("truncated body");
    assert!(matches!(err, SourceError::Decode { .. }));
}

#[tokio::test]
async fn unreachable_host_is_a_transport_error() {
    let base = Url::parse("http://127.0.0.1:9/").expect("url");
    let client = RemoteClient::new(&base, Some(std::time::Duration::from_secs(2))).expect("client");

    let err = client.get_posts().await.expect_err("nothing listens on port 9");
    assert!(matches!(err, SourceError::Transport { .. }));
}

#[tokio::test]
async fn write_wrappers_send_json_bodies() {
    let server = MockServer::start();
    let created = server.mock(|when, then| {
        when.method("POST")
            .path("/posts")
            .header("content-type", "application/json")
            .json_body(json!({ "userId": 1, "title": "hello", "body": "world" }));
        then.status(201)
            .json_body(json!({ "id": 101, "userId": 1, "title": "hello", "body": "world" }));
    });
    let updated = server.mock(|when, then| {
        when.method("PUT")
            .path("/posts/1")
            .json_body(json!({ "title": "renamed" }));
        then.status(200)
            .json_body(json!({ "id": 1, "userId": 1, "title": "renamed", "body": "world" }));
    });
    let deleted = server.mock(|when, then| {
        when.method("DELETE").path("/posts/1");
        then.status(200).body("{}");
    });

    let client = client(&server);
    let post = client
        .create_post(&NewRemotePost {
            user_id: 1,
            title: "hello".to_string(),
            body: "world".to_string(),
        })
        .await
        .expect("create");
    assert_eq!(post.id, 101);

    let post = client
        .update_post(
            1,
            &RemotePostPatch {
                title: Some("renamed".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("update");
    assert_eq!(post.title, "renamed");

    client.delete_post(1).await.expect("delete");

    created.assert();
    updated.assert();
    deleted.assert();
}
