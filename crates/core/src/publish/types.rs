//! Post types and data structures.

use chrono::{DateTime, Utc};
use driftwood_shared::types::{ResourceId, UserId};
use serde::{Deserialize, Serialize};

use crate::asset::TargetKind;

/// Kind of rich-text resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostKind {
    /// Community post.
    Community,
    /// Notice published by staff.
    Notice,
}

impl PostKind {
    /// Convert to database string value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Community => "community",
            Self::Notice => "notice",
        }
    }

    /// Parse from database string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "community" => Some(Self::Community),
            "notice" => Some(Self::Notice),
            _ => None,
        }
    }

    /// The asset target kind this post kind stages under.
    #[must_use]
    pub fn target_kind(self) -> TargetKind {
        match self {
            Self::Community => TargetKind::Community,
            Self::Notice => TargetKind::Notice,
        }
    }
}

impl std::fmt::Display for PostKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted rich-text post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Unique identifier.
    pub id: ResourceId,
    /// Post kind.
    pub kind: PostKind,
    /// Authoring user.
    pub author_id: UserId,
    /// Title.
    pub title: String,
    /// Rendered content embedding public asset URLs.
    pub content: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Fields for a post about to be finalized.
#[derive(Debug, Clone)]
pub struct NewPost {
    /// Post kind.
    pub kind: PostKind,
    /// Authoring user.
    pub author_id: UserId,
    /// Title.
    pub title: String,
    /// Rendered content.
    pub content: String,
}
