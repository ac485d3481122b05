//! `SeaORM` entity definitions.

pub mod assets;
pub mod posts;
