//! Item store: conflict-keyed upserts and the watermark soft-delete used by
//! catalog reconciliation.

use chrono::{NaiveDateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::{items, prelude::*};
use crate::error::AppError;

/// One catalog item as mapped from a provider payload.
#[derive(Debug, Clone)]
pub struct ItemInput {
    pub merchant_id: i64,
    pub provider: String,
    pub provider_item_id: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub is_deleted: bool,
    pub is_available: bool,
    pub provider_version: Option<i64>,
    pub provider_updated_at: Option<NaiveDateTime>,
    pub last_seen_at: Option<NaiveDateTime>,
    pub raw: Option<serde_json::Value>,
}

/// Insert or update keyed on (merchant_id, provider, provider_item_id).
pub async fn upsert_item(db: &DatabaseConnection, input: ItemInput) -> Result<(), AppError> {
    let now = Utc::now().naive_utc();

    let model = items::ActiveModel {
        merchant_id: Set(input.merchant_id),
        provider: Set(input.provider),
        provider_item_id: Set(input.provider_item_id),
        name: Set(input.name),
        description: Set(input.description),
        category_id: Set(input.category_id),
        category_name: Set(input.category_name),
        is_deleted: Set(input.is_deleted),
        is_available: Set(input.is_available),
        provider_version: Set(input.provider_version),
        provider_updated_at: Set(input.provider_updated_at),
        last_seen_at: Set(input.last_seen_at),
        raw: Set(input.raw),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    Items::insert(model)
        .on_conflict(
            OnConflict::columns([
                items::Column::MerchantId,
                items::Column::Provider,
                items::Column::ProviderItemId,
            ])
            .update_columns([
                items::Column::Name,
                items::Column::Description,
                items::Column::CategoryId,
                items::Column::CategoryName,
                items::Column::IsDeleted,
                items::Column::IsAvailable,
                items::Column::ProviderVersion,
                items::Column::ProviderUpdatedAt,
                items::Column::LastSeenAt,
                items::Column::Raw,
                items::Column::UpdatedAt,
            ])
            .to_owned(),
        )
        .exec(db)
        .await?;

    Ok(())
}

/// Soft-delete every item of the merchant not seen since `cutoff`.
/// This is how items dropped upstream disappear: they are simply never
/// visited by the sync pass. Returns the number of rows affected.
pub async fn mark_items_not_seen_as_deleted(
    db: &DatabaseConnection,
    merchant_id: i64,
    cutoff: NaiveDateTime,
) -> Result<u64, AppError> {
    let result = Items::update_many()
        .col_expr(items::Column::IsDeleted, Expr::value(true))
        .col_expr(items::Column::UpdatedAt, Expr::value(Utc::now().naive_utc()))
        .filter(items::Column::MerchantId.eq(merchant_id))
        .filter(items::Column::IsDeleted.eq(false))
        .filter(
            Condition::any()
                .add(items::Column::LastSeenAt.is_null())
                .add(items::Column::LastSeenAt.lt(cutoff)),
        )
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

pub async fn get_item_by_provider_id(
    db: &DatabaseConnection,
    merchant_id: i64,
    provider: &str,
    provider_item_id: &str,
) -> Result<Option<items::Model>, AppError> {
    Ok(Items::find()
        .filter(items::Column::MerchantId.eq(merchant_id))
        .filter(items::Column::Provider.eq(provider))
        .filter(items::Column::ProviderItemId.eq(provider_item_id))
        .one(db)
        .await?)
}

pub async fn get_items_by_merchant(
    db: &DatabaseConnection,
    merchant_id: i64,
) -> Result<Vec<items::Model>, AppError> {
    Ok(Items::find()
        .filter(items::Column::MerchantId.eq(merchant_id))
        .order_by_asc(items::Column::Name)
        .all(db)
        .await?)
}
