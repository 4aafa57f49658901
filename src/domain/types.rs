//! Shared domain enumerations.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Draft,
    Published,
}

/// Source a post or comment was read from.
///
/// Only [`PostOrigin::Local`] records may be edited or deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostOrigin {
    #[default]
    Local,
    Fixture,
    Remote,
}

impl PostOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            PostOrigin::Local => "local",
            PostOrigin::Fixture => "fixture",
            PostOrigin::Remote => "remote",
        }
    }

    pub fn is_writable(self) -> bool {
        matches!(self, PostOrigin::Local)
    }
}

impl std::fmt::Display for PostOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}
