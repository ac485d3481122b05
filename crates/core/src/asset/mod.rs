//! Attachment metadata and blob composition.
//!
//! An asset is one stored binary (an editor-embedded image) plus its
//! metadata row. Rows are created independently of resource existence:
//! while the owning post is still a draft they carry the draft handle as
//! their target, and finalization bulk-retargets them onto the real id.

mod error;
mod reclaim;
mod service;
mod types;

pub use error::AssetError;
pub use reclaim::ReclaimQueue;
pub use service::{AssetRepository, AssetStore};
pub use types::{Asset, NewAssetRecord, StoredAsset, TargetKind, UploadInput};
