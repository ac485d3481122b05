//! Asset types and data structures.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use driftwood_shared::types::{AssetId, TargetRef};
use serde::{Deserialize, Serialize};

/// Kind of resource an asset attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// Community post (gallery-style, any number of images).
    Community,
    /// Notice post (gallery-style).
    Notice,
    /// User profile image (at most one).
    Profile,
    /// Trip cover image (at most one).
    Trip,
    /// Site banner (at most one).
    Banner,
    /// City thumbnail (at most one).
    City,
    /// Continent thumbnail (at most one).
    Continent,
}

impl TargetKind {
    /// Convert to database string value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Community => "community",
            Self::Notice => "notice",
            Self::Profile => "profile",
            Self::Trip => "trip",
            Self::Banner => "banner",
            Self::City => "city",
            Self::Continent => "continent",
        }
    }

    /// Parse from database string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "community" => Some(Self::Community),
            "notice" => Some(Self::Notice),
            "profile" => Some(Self::Profile),
            "trip" => Some(Self::Trip),
            "banner" => Some(Self::Banner),
            "city" => Some(Self::City),
            "continent" => Some(Self::Continent),
            _ => None,
        }
    }

    /// True for kinds that expect at most one asset per target; uploading to
    /// such a target replaces whatever was there.
    #[must_use]
    pub fn is_singular(self) -> bool {
        !matches!(self, Self::Community | Self::Notice)
    }
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Asset domain model: one metadata row backed by exactly one blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Unique identifier.
    pub id: AssetId,
    /// Kind of resource the asset attaches to.
    pub target_kind: TargetKind,
    /// Owning resource: draft handle until finalize, real id after.
    pub target: TargetRef,
    /// Opaque, globally unique storage key.
    pub blob_key: String,
    /// Email of the uploading user.
    pub owner_email: String,
    /// Original filename as uploaded.
    pub file_name: String,
    /// MIME type.
    pub content_type: String,
    /// File size in bytes.
    pub file_size: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Input for uploading a new asset.
#[derive(Debug, Clone)]
pub struct UploadInput {
    /// Kind of resource the asset attaches to.
    pub target_kind: TargetKind,
    /// Owning resource reference (draft handle or real id).
    pub target: TargetRef,
    /// Email of the uploading user.
    pub owner_email: String,
    /// Original filename.
    pub file_name: String,
    /// MIME type.
    pub content_type: String,
    /// File contents.
    pub bytes: Bytes,
}

/// Input for creating an asset metadata row after the blob write succeeded.
#[derive(Debug, Clone)]
pub struct NewAssetRecord {
    /// Kind of resource the asset attaches to.
    pub target_kind: TargetKind,
    /// Owning resource reference.
    pub target: TargetRef,
    /// Storage key of the already-written blob.
    pub blob_key: String,
    /// Email of the uploading user.
    pub owner_email: String,
    /// Original filename.
    pub file_name: String,
    /// MIME type.
    pub content_type: String,
    /// File size in bytes.
    pub file_size: i64,
}

/// Result of a successful upload.
#[derive(Debug, Clone)]
pub struct StoredAsset {
    /// The persisted asset row.
    pub asset: Asset,
    /// Full public URL the blob is served under.
    pub public_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_kind_roundtrip() {
        let kinds = [
            TargetKind::Community,
            TargetKind::Notice,
            TargetKind::Profile,
            TargetKind::Trip,
            TargetKind::Banner,
            TargetKind::City,
            TargetKind::Continent,
        ];

        for kind in kinds {
            assert_eq!(TargetKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_target_kind_unknown() {
        assert_eq!(TargetKind::parse("garage"), None);
    }

    #[test]
    fn test_target_kind_arity() {
        assert!(!TargetKind::Community.is_singular());
        assert!(!TargetKind::Notice.is_singular());
        assert!(TargetKind::Profile.is_singular());
        assert!(TargetKind::Banner.is_singular());
    }
}
