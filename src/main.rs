use std::{path::Path, process, sync::Arc};

use mosaico::{
    application::{
        aggregation::AggregationService,
        auth::{AuthService, LoginCredentials, ProfilePatch, RegisterRequest},
        error::AppError,
        interactions::InteractionService,
        local::LocalCollections,
        repos::{CreateCommentParams, CreatePostParams, KeyValueStore, UpdatePostParams},
    },
    cache::{QueryCacheConfig, QueryClient},
    config::{
        self, AddCommentArgs, AuthCommand, CommentsCommand, CreatePostArgs, MarkCommand,
        PostsCommand, StorageBackend, UpdatePostArgs,
    },
    domain::{
        entities::{CommentRecord, PostRecord},
        posts::{PostFilter, sort_comments_newest_first},
    },
    infra::{
        error::InfraError,
        fixtures::FixtureSource,
        remote::{RemoteClient, RemoteSource},
        storage::{FileStore, MemoryStore},
        telemetry,
    },
};
use serde::Serialize;
use serde_json::json;
use tracing::{Dispatch, Level, debug, dispatcher, error};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, summary = error.presentation_message(), "command failed");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, summary = error.presentation_message(), "command failed");
    });
}

struct AppContext {
    queries: QueryClient,
    interactions: InteractionService,
    auth: AuthService,
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;
    let app = build_application_context(&settings)?;

    match cli_args.command {
        config::Command::Posts(args) => run_posts(&app, args.command).await,
        config::Command::Comments(args) => run_comments(&app, args.command).await,
        config::Command::Categories => print_json(&app.queries.categories().await),
        config::Command::Bookmarks(args) => match args.command {
            MarkCommand::Toggle(target) => {
                let bookmarked = app.interactions.toggle_bookmark(&target.id).await?;
                print_json(&json!({ "postId": target.id, "bookmarked": bookmarked }))
            }
            MarkCommand::List => print_json(&app.interactions.bookmarks().await?),
        },
        config::Command::Likes(args) => match args.command {
            MarkCommand::Toggle(target) => {
                let liked = app.interactions.toggle_like(&target.id).await?;
                print_json(&json!({ "postId": target.id, "liked": liked }))
            }
            MarkCommand::List => print_json(&app.interactions.likes().await?),
        },
        config::Command::Recent => print_json(&app.interactions.recently_viewed().await?),
        config::Command::Reset => {
            app.interactions.clear_user_data().await?;
            print_json(&json!({ "cleared": true }))
        }
        config::Command::Auth(args) => run_auth(&app, args.command).await,
    }
}

fn build_application_context(settings: &config::Settings) -> Result<AppContext, AppError> {
    let store: Arc<dyn KeyValueStore> = match settings.storage.backend {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::File => {
            let directory = &settings.storage.directory;
            Arc::new(
                FileStore::new(directory).map_err(|source| InfraError::StoreOpen {
                    path: directory.clone(),
                    source,
                })?,
            )
        }
    };

    let fixtures = Arc::new(
        FixtureSource::from_location(&settings.fixtures.location, settings.remote.timeout)
            .map_err(InfraError::Fixtures)?,
    );

    let mut service = AggregationService::new(Arc::clone(&store), fixtures.clone());
    if settings.remote.enabled {
        let client = RemoteClient::new(&settings.remote.base_url, settings.remote.timeout)
            .map_err(InfraError::RemoteClient)?;
        let remote = RemoteSource::new(client)
            .with_limits(settings.remote.post_limit, settings.remote.comment_limit);
        service = service.with_remote(Arc::new(remote));
    }
    debug!(
        remote = settings.remote.enabled,
        fixtures = %settings.fixtures.location,
        "Aggregation sources configured"
    );

    let local = LocalCollections::new(store);
    Ok(AppContext {
        queries: QueryClient::new(
            service,
            fixtures.clone(),
            QueryCacheConfig::from(&settings.query),
        ),
        interactions: InteractionService::new(local.clone()),
        auth: AuthService::new(fixtures, local),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PostDetail {
    post: PostRecord,
    comments: Vec<CommentRecord>,
    bookmarked: bool,
    liked: bool,
}

async fn run_posts(app: &AppContext, command: PostsCommand) -> Result<(), AppError> {
    match command {
        PostsCommand::List(args) => {
            let filter = PostFilter {
                category: args.category,
                search: args.search,
            };
            print_json(&app.queries.posts(&filter).await)
        }
        PostsCommand::Show(target) => {
            let post = app
                .queries
                .post(&target.id)
                .await
                .ok_or_else(|| AppError::not_found(format!("post `{}`", target.id)))?;
            app.interactions.record_view(&post.id).await?;

            let detail = PostDetail {
                comments: merged_comments(app, &post.id).await?,
                bookmarked: app.interactions.is_bookmarked(&post.id).await?,
                liked: app.interactions.is_liked(&post.id).await?,
                post,
            };
            print_json(&detail)
        }
        PostsCommand::ByAuthor(target) => {
            print_json(&app.queries.posts_by_author(&target.author_id).await)
        }
        PostsCommand::Create(args) => {
            let post = create_post(app, args).await?;
            print_json(&post)
        }
        PostsCommand::Update(args) => {
            let post = update_post(app, args).await?;
            print_json(&post)
        }
        PostsCommand::Delete(target) => {
            app.auth.require_session().await?;
            app.queries.delete_post(&target.id).await?;
            print_json(&json!({ "deleted": target.id }))
        }
    }
}

async fn create_post(app: &AppContext, args: CreatePostArgs) -> Result<PostRecord, AppError> {
    let session = app.auth.require_session().await?;
    let content = resolve_content(args.content, args.content_file.as_deref())
        .await?
        .unwrap_or_default();

    let params = CreatePostParams {
        title: args.title,
        content,
        excerpt: args.excerpt,
        author: session.user.author_snapshot(),
        category: args.category,
        tags: args.tags,
        featured_image: args.featured_image,
        status: args.status.into(),
    };
    Ok(app.queries.create_post(params).await?)
}

async fn update_post(app: &AppContext, args: UpdatePostArgs) -> Result<PostRecord, AppError> {
    app.auth.require_session().await?;
    let patch = UpdatePostParams {
        title: args.title,
        content: resolve_content(args.content, args.content_file.as_deref()).await?,
        excerpt: args.excerpt,
        category: args.category,
        tags: args.tags,
        featured_image: args.featured_image,
        status: args.status.map(Into::into),
        is_featured: args.featured,
    };
    if patch.is_empty() {
        return Err(AppError::validation("no fields to update"));
    }
    Ok(app.queries.update_post(&args.id, patch).await?)
}

async fn resolve_content(
    inline: Option<String>,
    file: Option<&Path>,
) -> Result<Option<String>, AppError> {
    match (inline, file) {
        (Some(content), _) => Ok(Some(content)),
        (None, Some(path)) => {
            let content = tokio::fs::read_to_string(path).await.map_err(|source| {
                InfraError::ReadFile {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
            Ok(Some(content))
        }
        (None, None) => Ok(None),
    }
}

async fn run_comments(app: &AppContext, command: CommentsCommand) -> Result<(), AppError> {
    match command {
        CommentsCommand::List(target) => print_json(&merged_comments(app, &target.id).await?),
        CommentsCommand::Add(args) => {
            let comment = add_comment(app, args).await?;
            print_json(&comment)
        }
    }
}

/// Aggregated comments plus the reader's own per-post comments, newest first.
async fn merged_comments(app: &AppContext, post_id: &str) -> Result<Vec<CommentRecord>, AppError> {
    let mut comments = app.queries.comments(post_id).await;
    comments.extend(app.interactions.user_comments(post_id).await?);
    sort_comments_newest_first(&mut comments);
    Ok(comments)
}

async fn add_comment(app: &AppContext, args: AddCommentArgs) -> Result<CommentRecord, AppError> {
    let session = app.auth.current_session().await?;
    let (author, avatar) = match (args.author, session) {
        (Some(author), _) => (author, None),
        (None, Some(session)) => (session.user.name, Some(session.user.avatar)),
        (None, None) => {
            return Err(AppError::validation(
                "--author is required when nobody is signed in",
            ));
        }
    };

    if args.content.trim().is_empty() {
        return Err(AppError::validation("comment content must not be empty"));
    }

    let params = CreateCommentParams {
        post_id: args.post_id,
        author,
        avatar: avatar.filter(|value| !value.trim().is_empty()),
        content: args.content,
        is_verified: None,
    };
    if args.reader {
        return Ok(app.interactions.add_user_comment(params).await?);
    }
    Ok(app.queries.create_comment(params).await?)
}

async fn run_auth(app: &AppContext, command: AuthCommand) -> Result<(), AppError> {
    match command {
        AuthCommand::Login(args) => {
            let session = app
                .auth
                .login(LoginCredentials {
                    email: args.email,
                    password: args.password,
                })
                .await?;
            print_json(&session)
        }
        AuthCommand::Register(args) => {
            let session = app
                .auth
                .register(RegisterRequest {
                    name: args.name,
                    email: args.email,
                    password: args.password,
                    confirm_password: args.confirm_password,
                })
                .await?;
            print_json(&session)
        }
        AuthCommand::Logout => {
            app.auth.logout().await?;
            print_json(&json!({ "signedOut": true }))
        }
        AuthCommand::Whoami => print_json(&app.auth.require_session().await?.user),
        AuthCommand::Profile(args) => {
            let user = app
                .auth
                .update_profile(ProfilePatch {
                    name: args.name,
                    bio: args.bio,
                    avatar: args.avatar,
                })
                .await?;
            print_json(&user)
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to encode output: {err}")))?;
    println!("{rendered}");
    Ok(())
}
