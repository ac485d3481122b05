//! Draft finalization and resource lifecycle.
//!
//! Composes the draft registry, asset store, and content reconciliation into
//! the draft-to-real lifecycle: a handle is consumed exactly once, the post
//! row and its asset claim commit together, and blob cleanup runs strictly
//! after the commit through the committed-resource event.

mod error;
mod scheduler;
mod service;
mod sweeper;
mod types;


pub use error::PublishError;
pub use scheduler::{
    ChannelScheduler, CommittedResource, ReconcileScheduler, spawn_reconcile_worker,
};
pub use service::{PostRepository, Publisher};
pub use sweeper::DraftSweeper;
pub use types::{NewPost, Post, PostKind};
