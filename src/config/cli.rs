use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint, builder::BoolishValueParser};

use crate::domain::types::PostStatus;

/// Command-line arguments for the mosaico binary.
#[derive(Debug, Parser)]
#[command(
    name = "mosaico",
    version,
    about = "Browse and author blog posts merged from local, fixture and demo API sources"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "MOSAICO_CONFIG_FILE", value_name = "PATH", global = true)]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

/// Settings overrides accepted by every subcommand.
#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the storage backend (file|memory).
    #[arg(long = "storage-backend", value_name = "BACKEND", global = true)]
    pub storage_backend: Option<String>,

    /// Override the directory holding persisted local state.
    #[arg(long = "storage-directory", value_name = "PATH", value_hint = ValueHint::DirPath, global = true)]
    pub storage_directory: Option<PathBuf>,

    /// Override the fixture location (directory or http(s) URL).
    #[arg(long = "fixtures-location", value_name = "LOCATION", global = true)]
    pub fixtures_location: Option<String>,

    /// Toggle the remote demo API source.
    #[arg(
        long = "remote-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub remote_enabled: Option<bool>,

    /// Override the remote demo API base URL.
    #[arg(long = "remote-base-url", value_name = "URL", global = true)]
    pub remote_base_url: Option<String>,

    /// Bound every remote request to this many seconds.
    #[arg(long = "remote-timeout-seconds", value_name = "SECONDS", global = true)]
    pub remote_timeout_seconds: Option<u64>,

    /// Toggle the query cache.
    #[arg(
        long = "query-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub query_enabled: Option<bool>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Read and write posts.
    Posts(PostsArgs),
    /// Read and write comments.
    Comments(CommentsArgs),
    /// List categories.
    Categories,
    /// Manage bookmarked posts.
    Bookmarks(MarkArgs),
    /// Manage liked posts.
    Likes(MarkArgs),
    /// Show recently viewed post ids, most recent first.
    Recent,
    /// Clear bookmarks, likes, reader comments and view history.
    Reset,
    /// Mock authentication.
    Auth(AuthArgs),
}

#[derive(Debug, Args, Clone)]
pub struct PostsArgs {
    #[command(subcommand)]
    pub command: PostsCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum PostsCommand {
    /// List posts from every source, newest first.
    List(ListPostsArgs),
    /// Show one post and record it as viewed.
    Show(PostIdArg),
    /// List posts written by an author.
    #[command(name = "by-author")]
    ByAuthor(AuthorIdArg),
    /// Create a local post authored by the signed-in user.
    Create(CreatePostArgs),
    /// Update a local post.
    Update(UpdatePostArgs),
    /// Delete a local post and its local comments.
    Delete(PostIdArg),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ListPostsArgs {
    /// Only posts in this category; `all` disables the filter.
    #[arg(long, value_name = "CATEGORY")]
    pub category: Option<String>,

    /// Case-insensitive text search.
    #[arg(long, value_name = "TEXT")]
    pub search: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct PostIdArg {
    #[arg(value_name = "POST_ID")]
    pub id: String,
}

#[derive(Debug, Args, Clone)]
pub struct AuthorIdArg {
    #[arg(value_name = "AUTHOR_ID")]
    pub author_id: String,
}

#[derive(Debug, Args, Clone)]
pub struct CreatePostArgs {
    #[arg(long)]
    pub title: String,

    /// Inline body text.
    #[arg(long, conflicts_with = "content_file", required_unless_present = "content_file")]
    pub content: Option<String>,

    /// Read the body from a file.
    #[arg(long = "content-file", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub content_file: Option<PathBuf>,

    /// Derived from the content when omitted.
    #[arg(long)]
    pub excerpt: Option<String>,

    #[arg(long, default_value = "General")]
    pub category: String,

    /// Repeat for multiple tags.
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    #[arg(long = "featured-image", value_name = "URL")]
    pub featured_image: Option<String>,

    #[arg(long, value_enum, default_value_t = StatusArg::Published)]
    pub status: StatusArg,
}

#[derive(Debug, Args, Clone)]
pub struct UpdatePostArgs {
    #[arg(value_name = "POST_ID")]
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long, conflicts_with = "content_file")]
    pub content: Option<String>,

    #[arg(long = "content-file", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub content_file: Option<PathBuf>,

    #[arg(long)]
    pub excerpt: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    /// Replaces the tag list; repeat for multiple tags.
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Option<Vec<String>>,

    /// An empty value removes the image.
    #[arg(long = "featured-image", value_name = "URL")]
    pub featured_image: Option<String>,

    #[arg(long, value_enum)]
    pub status: Option<StatusArg>,

    #[arg(long, value_name = "BOOL", value_parser = BoolishValueParser::new())]
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Draft,
    Published,
}

impl From<StatusArg> for PostStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Draft => PostStatus::Draft,
            StatusArg::Published => PostStatus::Published,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct CommentsArgs {
    #[command(subcommand)]
    pub command: CommentsCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum CommentsCommand {
    /// List comments for a post, newest first.
    List(PostIdArg),
    /// Add a comment to a post.
    Add(AddCommentArgs),
}

#[derive(Debug, Args, Clone)]
pub struct AddCommentArgs {
    #[arg(value_name = "POST_ID")]
    pub post_id: String,

    #[arg(long)]
    pub content: String,

    /// Display name; defaults to the signed-in user.
    #[arg(long)]
    pub author: Option<String>,

    /// Keep the comment in the reader's own per-post list.
    #[arg(long)]
    pub reader: bool,
}

#[derive(Debug, Args, Clone)]
pub struct MarkArgs {
    #[command(subcommand)]
    pub command: MarkCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum MarkCommand {
    /// Flip the mark for a post.
    Toggle(PostIdArg),
    /// List marked post ids.
    List,
}

#[derive(Debug, Args, Clone)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum AuthCommand {
    /// Sign in against the fixture user directory.
    Login(LoginArgs),
    /// Create an account and sign in.
    Register(RegisterArgs),
    /// End the current session.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Edit the signed-in user's profile.
    Profile(ProfileArgs),
}

#[derive(Debug, Args, Clone)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long, env = "MOSAICO_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Debug, Args, Clone)]
pub struct RegisterArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long, env = "MOSAICO_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[arg(long = "confirm-password")]
    pub confirm_password: String,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ProfileArgs {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub bio: Option<String>,

    #[arg(long)]
    pub avatar: Option<String>,
}
