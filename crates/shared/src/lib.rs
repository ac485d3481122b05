//! Shared types, errors, and configuration for Driftwood.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - The draft/persisted target reference union
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
