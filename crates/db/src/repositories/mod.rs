//! Repository implementations for data access.
//!
//! Repositories implement the persistence traits declared in the core crate,
//! hiding the `SeaORM` implementation details from the rest of the
//! application.

pub mod asset;
pub mod post;

pub use asset::AssetRepository;
pub use post::PostRepository;
