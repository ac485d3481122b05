//! Request middleware.

pub mod identity;

pub use identity::{CurrentUser, Identity, identity_middleware};
