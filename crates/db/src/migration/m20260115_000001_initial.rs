//! Initial schema: posts and assets.
//!
//! Creates the rich-text posts table and the asset metadata table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(INITIAL_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS assets; DROP TABLE IF EXISTS posts;")
            .await?;
        Ok(())
    }
}

const INITIAL_SQL: &str = r"
-- Rich-text posts (community posts and notices)
CREATE TABLE posts (
    id BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
    kind VARCHAR(16) NOT NULL CHECK (kind IN ('community', 'notice')),
    author_id BIGINT NOT NULL,
    title VARCHAR(255) NOT NULL,
    content TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_posts_kind_created ON posts(kind, created_at DESC);
CREATE INDEX idx_posts_author ON posts(author_id, created_at DESC);

-- Asset metadata rows; exactly one blob per row.
-- target_id deliberately carries no foreign key: while the owning resource
-- is a draft it holds a negative in-memory handle.
CREATE TABLE assets (
    id BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
    target_kind VARCHAR(16) NOT NULL,
    target_id BIGINT NOT NULL,
    blob_key VARCHAR(255) NOT NULL UNIQUE,
    owner_email VARCHAR(255) NOT NULL,
    file_name VARCHAR(255) NOT NULL,
    content_type VARCHAR(127) NOT NULL,
    file_size BIGINT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Lookup and bulk-retarget both hit (target_kind, target_id)
CREATE INDEX idx_assets_target ON assets(target_kind, target_id);

-- Sweeper lookup for staged assets under a draft handle
CREATE INDEX idx_assets_staged ON assets(target_id) WHERE target_id < 0;
";
