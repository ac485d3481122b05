//! Asset repository for database operations.
//!
//! Implements asset CRUD and bulk retargeting using SeaORM.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::assets;
use driftwood_core::asset::{
    Asset, AssetError, AssetRepository as AssetRepoTrait, NewAssetRecord, TargetKind,
};
use driftwood_shared::types::{AssetId, DraftHandle, TargetRef};

/// Asset repository implementation.
#[derive(Debug, Clone)]
pub struct AssetRepository {
    db: DatabaseConnection,
}

impl AssetRepository {
    /// Create a new asset repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl AssetRepoTrait for AssetRepository {
    async fn insert(&self, record: NewAssetRecord) -> Result<Asset, AssetError> {
        let active_model = assets::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            target_kind: Set(record.target_kind.as_str().to_string()),
            target_id: Set(record.target.as_i64()),
            blob_key: Set(record.blob_key.clone()),
            owner_email: Set(record.owner_email.clone()),
            file_name: Set(record.file_name.clone()),
            content_type: Set(record.content_type.clone()),
            file_size: Set(record.file_size),
            created_at: Set(Utc::now().into()),
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| AssetError::repository(e.to_string()))?;

        to_domain(model)
    }

    async fn find_by_id(&self, id: AssetId) -> Result<Option<Asset>, AssetError> {
        let model = assets::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(|e| AssetError::repository(e.to_string()))?;

        model.map(to_domain).transpose()
    }

    async fn list_by_target(
        &self,
        kind: TargetKind,
        target: TargetRef,
    ) -> Result<Vec<Asset>, AssetError> {
        let models = assets::Entity::find()
            .filter(assets::Column::TargetKind.eq(kind.as_str()))
            .filter(assets::Column::TargetId.eq(target.as_i64()))
            .order_by_asc(assets::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| AssetError::repository(e.to_string()))?;

        models.into_iter().map(to_domain).collect()
    }

    async fn list_staged(&self, handle: DraftHandle) -> Result<Vec<Asset>, AssetError> {
        let models = assets::Entity::find()
            .filter(assets::Column::TargetId.eq(handle.into_inner()))
            .all(&self.db)
            .await
            .map_err(|e| AssetError::repository(e.to_string()))?;

        models.into_iter().map(to_domain).collect()
    }

    async fn retarget(
        &self,
        kind: TargetKind,
        from: TargetRef,
        to: TargetRef,
    ) -> Result<u64, AssetError> {
        let result = assets::Entity::update_many()
            .col_expr(assets::Column::TargetId, Expr::value(to.as_i64()))
            .filter(assets::Column::TargetKind.eq(kind.as_str()))
            .filter(assets::Column::TargetId.eq(from.as_i64()))
            .exec(&self.db)
            .await
            .map_err(|e| AssetError::repository(e.to_string()))?;

        Ok(result.rows_affected)
    }

    async fn delete_row(&self, id: AssetId) -> Result<bool, AssetError> {
        let result = assets::Entity::delete_many()
            .filter(assets::Column::Id.eq(id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(|e| AssetError::repository(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }
}

/// Convert database model to domain model.
pub(crate) fn to_domain(model: assets::Model) -> Result<Asset, AssetError> {
    let target_kind = TargetKind::parse(&model.target_kind)
        .ok_or_else(|| AssetError::UnknownTargetKind(model.target_kind.clone()))?;

    Ok(Asset {
        id: AssetId::new(model.id),
        target_kind,
        target: TargetRef::from_i64(model.target_id),
        blob_key: model.blob_key,
        owner_email: model.owner_email,
        file_name: model.file_name,
        content_type: model.content_type,
        file_size: model.file_size,
        created_at: model.created_at.with_timezone(&chrono::Utc),
    })
}
