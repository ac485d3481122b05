//! Typed IDs for type-safe entity references.
//!
//! Posts, assets, and draft handles all live in the same signed 64-bit id
//! space (draft handles are negative, persisted ids positive), so every id is
//! wrapped in its own newtype to keep one from silently flowing into code
//! that expects another.

use serde::{Deserialize, Serialize};

/// Macro to generate typed ID wrappers over the numeric id space.
macro_rules! entity_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Wraps a raw database id.
            #[must_use]
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the inner numeric value.
            #[must_use]
            pub const fn into_inner(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

entity_id!(UserId, "Unique identifier for a user.");
entity_id!(ResourceId, "Unique identifier for a persisted post or notice.");
entity_id!(AssetId, "Unique identifier for a stored asset row.");

/// Placeholder identifier standing in for a not-yet-persisted resource.
///
/// Handles are always negative so they can share the resource id column with
/// persisted ids without ever colliding. They exist only in process memory
/// and are never written durably except as the transient `target_id` of a
/// staged asset row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct DraftHandle(i64);

impl DraftHandle {
    /// Wraps a raw handle value; returns `None` unless the value is negative.
    #[must_use]
    pub const fn from_raw(value: i64) -> Option<Self> {
        if value < 0 { Some(Self(value)) } else { None }
    }

    /// Returns the inner (negative) numeric value.
    #[must_use]
    pub const fn into_inner(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for DraftHandle {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_raw(value).ok_or_else(|| format!("draft handle must be negative, got {value}"))
    }
}

impl From<DraftHandle> for i64 {
    fn from(handle: DraftHandle) -> Self {
        handle.0
    }
}

impl std::fmt::Display for DraftHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A reference to the resource an asset belongs to: either a draft handle
/// (the resource is not persisted yet) or the real resource id.
///
/// The sign of the raw column value carries the tag at the database edge;
/// everywhere else the variants keep the two id kinds apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetRef {
    /// The owning resource is still a draft.
    Draft(DraftHandle),
    /// The owning resource has been persisted.
    Persisted(ResourceId),
}

impl TargetRef {
    /// Encodes the reference into the shared numeric column value.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        match self {
            Self::Draft(handle) => handle.into_inner(),
            Self::Persisted(id) => id.into_inner(),
        }
    }

    /// Decodes a raw column value; negative values are draft handles.
    #[must_use]
    pub const fn from_i64(raw: i64) -> Self {
        if raw < 0 {
            Self::Draft(DraftHandle(raw))
        } else {
            Self::Persisted(ResourceId(raw))
        }
    }

    /// Returns true when the reference is a draft handle.
    #[must_use]
    pub const fn is_draft(self) -> bool {
        matches!(self, Self::Draft(_))
    }
}

impl std::fmt::Display for TargetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_i64())
    }
}
