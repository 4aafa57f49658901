//! Post helpers: id conventions, derived fields, ordering and filtering.

use crate::domain::entities::{CommentRecord, PostRecord};

pub const LOCAL_POST_PREFIX: &str = "post-";
pub const LOCAL_COMMENT_PREFIX: &str = "comment-";
pub const REMOTE_POST_PREFIX: &str = "json-";
pub const REMOTE_COMMENT_PREFIX: &str = "json-comment-";
pub const REMOTE_USER_PREFIX: &str = "json-user-";

pub const EXCERPT_LENGTH: usize = 150;
pub const WORDS_PER_MINUTE: usize = 200;
const ELLIPSIS: &str = "...";
const AVATAR_BASE: &str = "https://api.dicebear.com/7.x/avataaars/svg";

/// Truncate `text` to `max_chars` characters, appending an ellipsis when cut.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}{ELLIPSIS}", &text[..byte_index]),
        None => text.to_string(),
    }
}

/// First [`EXCERPT_LENGTH`] characters followed by an ellipsis, always.
pub fn clipped_excerpt(text: &str) -> String {
    let end = text
        .char_indices()
        .nth(EXCERPT_LENGTH)
        .map_or(text.len(), |(index, _)| index);
    format!("{}{ELLIPSIS}", &text[..end])
}

pub fn generate_excerpt(content: &str) -> String {
    truncate_text(content.trim(), EXCERPT_LENGTH)
}

/// Estimated reading time in whole minutes, never below one.
pub fn read_time_minutes(content: &str) -> u32 {
    let words = content.split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

pub fn avatar_url(seed: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(seed.as_bytes()).collect();
    format!("{AVATAR_BASE}?seed={encoded}")
}

/// Numeric remote id carried by a `json-<n>` post id.
pub fn remote_post_number(id: &str) -> Option<u64> {
    id.strip_prefix(REMOTE_POST_PREFIX)?.parse().ok()
}

pub fn remote_post_id(number: u64) -> String {
    format!("{REMOTE_POST_PREFIX}{number}")
}

/// Strip the remote prefix so fixture comments keyed by the bare id still match.
pub fn unprefixed_post_id(id: &str) -> &str {
    id.strip_prefix(REMOTE_POST_PREFIX).unwrap_or(id)
}

/// Newest first. The sort is stable, so equal timestamps keep source order.
pub fn sort_posts_newest_first(posts: &mut [PostRecord]) {
    posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
}

pub fn sort_comments_newest_first(comments: &mut [CommentRecord]) {
    comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Category and free-text filter applied to merged post lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PostFilter {
    pub category: Option<String>,
    pub search: Option<String>,
}

impl PostFilter {
    pub fn is_empty(&self) -> bool {
        self.category_filter().is_none() && self.search_filter().is_none()
    }

    fn category_filter(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case("all"))
    }

    fn search_filter(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, post: &PostRecord) -> bool {
        if let Some(category) = self.category_filter() {
            if post.category != category {
                return false;
            }
        }

        let Some(needle) = self.search_filter() else {
            return true;
        };

        post.title.to_lowercase().contains(&needle)
            || post.excerpt.to_lowercase().contains(&needle)
            || post.content.to_lowercase().contains(&needle)
            || post
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(&needle))
            || post.author.name.to_lowercase().contains(&needle)
    }

    pub fn apply(&self, posts: &[PostRecord]) -> Vec<PostRecord> {
        posts
            .iter()
            .filter(|post| self.matches(post))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::domain::entities::AuthorSnapshot;
    use crate::domain::types::{PostOrigin, PostStatus};

    fn post(id: &str, category: &str, title: &str) -> PostRecord {
        PostRecord {
            id: id.to_string(),
            origin: PostOrigin::Fixture,
            title: title.to_string(),
            content: "Ownership and borrowing in practice".to_string(),
            excerpt: String::new(),
            author_id: "a1".to_string(),
            author: AuthorSnapshot {
                id: "a1".to_string(),
                name: "Ada Lovelace".to_string(),
                avatar: String::new(),
                bio: String::new(),
                role: "Writer".to_string(),
                social: None,
            },
            category: category.to_string(),
            tags: vec!["Systems".to_string()],
            published_at: datetime!(2024-01-01 0:00 UTC),
            updated_at: datetime!(2024-01-01 0:00 UTC),
            read_time: 1,
            likes: 0,
            bookmarks: 0,
            views: 0,
            featured_image: None,
            is_featured: false,
            status: PostStatus::Published,
        }
    }

    #[test]
    fn truncate_only_appends_when_cut() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("abcdef", 3), "abc...");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_text("héllo wörld", 4), "héll...");
    }

    #[test]
    fn clipped_excerpt_always_has_ellipsis() {
        assert_eq!(clipped_excerpt("tiny"), "tiny...");
        let long = "x".repeat(200);
        assert_eq!(clipped_excerpt(&long).len(), EXCERPT_LENGTH + 3);
    }

    #[test]
    fn read_time_rounds_up_and_has_floor() {
        assert_eq!(read_time_minutes(""), 1);
        assert_eq!(read_time_minutes(&"word ".repeat(200)), 1);
        assert_eq!(read_time_minutes(&"word ".repeat(201)), 2);
    }

    #[test]
    fn remote_ids_parse() {
        assert_eq!(remote_post_number("json-7"), Some(7));
        assert_eq!(remote_post_number("json-comment-7"), None);
        assert_eq!(remote_post_number("post-7"), None);
        assert_eq!(unprefixed_post_id("json-7"), "7");
        assert_eq!(unprefixed_post_id("1"), "1");
    }

    #[test]
    fn avatar_seed_is_encoded() {
        assert_eq!(
            avatar_url("Ada Lovelace"),
            "https://api.dicebear.com/7.x/avataaars/svg?seed=Ada+Lovelace"
        );
    }

    #[test]
    fn filter_treats_all_as_no_category() {
        let filter = PostFilter {
            category: Some("all".to_string()),
            search: None,
        };
        assert!(filter.is_empty());
        assert!(filter.matches(&post("1", "Rust", "Hello")));
    }

    #[test]
    fn filter_matches_category_and_search_fields() {
        let posts = vec![
            post("1", "Rust", "Lifetimes"),
            post("2", "Go", "Goroutines"),
        ];

        let by_category = PostFilter {
            category: Some("Rust".to_string()),
            search: None,
        };
        assert_eq!(by_category.apply(&posts).len(), 1);

        let by_tag = PostFilter {
            category: None,
            search: Some("systems".to_string()),
        };
        assert_eq!(by_tag.apply(&posts).len(), 2);

        let by_author = PostFilter {
            category: Some("Go".to_string()),
            search: Some("LOVELACE".to_string()),
        };
        let matched = by_author.apply(&posts);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, "2");
    }
}
