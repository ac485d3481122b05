//! Post repository for database operations.
//!
//! `create_with_claim` is the transactional heart of finalization: inserting
//! the post row and claiming its staged assets happen in one database
//! transaction, so a crash can never leave a committed post whose assets
//! still carry the released draft handle.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};

use crate::entities::{assets, posts};
use driftwood_core::publish::{
    NewPost, Post, PostKind, PostRepository as PostRepoTrait, PublishError,
};
use driftwood_shared::types::{DraftHandle, ResourceId, UserId};

/// Post repository implementation.
#[derive(Debug, Clone)]
pub struct PostRepository {
    db: DatabaseConnection,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl PostRepoTrait for PostRepository {
    async fn create_with_claim(
        &self,
        post: NewPost,
        handle: DraftHandle,
    ) -> Result<Post, PublishError> {
        let target_kind = post.kind.target_kind().as_str();
        let handle_raw = handle.into_inner();

        let model = self
            .db
            .transaction::<_, posts::Model, DbErr>(|txn| {
                Box::pin(async move {
                    let now = Utc::now();
                    let active_model = posts::ActiveModel {
                        id: ActiveValue::NotSet,
                        kind: Set(post.kind.as_str().to_string()),
                        author_id: Set(post.author_id.into_inner()),
                        title: Set(post.title),
                        content: Set(post.content),
                        created_at: Set(now.into()),
                        updated_at: Set(now.into()),
                    };
                    let model = active_model.insert(txn).await?;

                    // Claim every asset staged under the draft handle.
                    assets::Entity::update_many()
                        .col_expr(assets::Column::TargetId, Expr::value(model.id))
                        .filter(assets::Column::TargetKind.eq(target_kind))
                        .filter(assets::Column::TargetId.eq(handle_raw))
                        .exec(txn)
                        .await?;

                    Ok(model)
                })
            })
            .await
            .map_err(|e| PublishError::repository(e.to_string()))?;

        to_domain(model)
    }

    async fn find_by_id(&self, id: ResourceId) -> Result<Option<Post>, PublishError> {
        let model = posts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(|e| PublishError::repository(e.to_string()))?;

        model.map(to_domain).transpose()
    }

    async fn update_content(
        &self,
        id: ResourceId,
        content: String,
    ) -> Result<Option<Post>, PublishError> {
        let Some(model) = posts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(|e| PublishError::repository(e.to_string()))?
        else {
            return Ok(None);
        };

        let mut active_model: posts::ActiveModel = model.into();
        active_model.content = Set(content);
        active_model.updated_at = Set(Utc::now().into());

        let updated = active_model
            .update(&self.db)
            .await
            .map_err(|e| PublishError::repository(e.to_string()))?;

        to_domain(updated).map(Some)
    }

    async fn delete(&self, id: ResourceId) -> Result<bool, PublishError> {
        let result = posts::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await
            .map_err(|e| PublishError::repository(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }
}

/// Convert database model to domain model.
fn to_domain(model: posts::Model) -> Result<Post, PublishError> {
    let kind = PostKind::parse(&model.kind)
        .ok_or_else(|| PublishError::repository(format!("unknown post kind: {}", model.kind)))?;

    Ok(Post {
        id: ResourceId::new(model.id),
        kind,
        author_id: UserId::new(model.author_id),
        title: model.title,
        content: model.content,
        created_at: model.created_at.with_timezone(&chrono::Utc),
        updated_at: model.updated_at.with_timezone(&chrono::Utc),
    })
}
