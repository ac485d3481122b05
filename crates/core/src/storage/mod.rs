//! Blob storage backend.
//!
//! Wraps Apache OpenDAL so the rest of the system sees one capability:
//! put/delete/exists plus the public URL a blob is served under.

mod config;
mod error;
mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use service::{BlobStore, OpendalStore, generate_blob_key};
