//! Query keys and the values cached under them.

use std::sync::Arc;

use crate::domain::entities::{CategoryRecord, CommentRecord, PostRecord};

/// Identifies one cached read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// Every post from every source.
    AllPosts,
    /// A single post by id.
    Post(String),
    /// Comments attached to a post.
    Comments(String),
    /// Posts written by one author.
    AuthorPosts(String),
    Categories,
}

impl QueryKey {
    /// Short label used in logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryKey::AllPosts => "all_posts",
            QueryKey::Post(_) => "post",
            QueryKey::Comments(_) => "comments",
            QueryKey::AuthorPosts(_) => "author_posts",
            QueryKey::Categories => "categories",
        }
    }

    /// Keys holding post collections; any post write invalidates them.
    pub fn is_post_list(&self) -> bool {
        matches!(self, QueryKey::AllPosts | QueryKey::AuthorPosts(_))
    }
}

#[derive(Debug, Clone)]
pub enum QueryValue {
    Posts(Arc<Vec<PostRecord>>),
    Post(Option<PostRecord>),
    Comments(Arc<Vec<CommentRecord>>),
    Categories(Arc<Vec<CategoryRecord>>),
}

impl QueryValue {
    pub fn into_posts(self) -> Arc<Vec<PostRecord>> {
        match self {
            QueryValue::Posts(posts) => posts,
            _ => Arc::default(),
        }
    }

    pub fn into_post(self) -> Option<PostRecord> {
        match self {
            QueryValue::Post(post) => post,
            _ => None,
        }
    }

    pub fn into_comments(self) -> Arc<Vec<CommentRecord>> {
        match self {
            QueryValue::Comments(comments) => comments,
            _ => Arc::default(),
        }
    }

    pub fn into_categories(self) -> Arc<Vec<CategoryRecord>> {
        match self {
            QueryValue::Categories(categories) => categories,
            _ => Arc::default(),
        }
    }
}
