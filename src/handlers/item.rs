//! Item endpoints for the authenticated web client.

use axum::Json;
use axum::extract::State;

use crate::AppState;
use crate::error::AppError;
use crate::handlers::merchant::merchant_for_user;
use crate::models::item::{ItemResponse, SyncResponse};
use crate::services::auth::AuthUser;
use crate::services::{catalog_sync, items};

/// GET /api/items — the caller's live (non-deleted) items.
pub async fn list_items(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<ItemResponse>>, AppError> {
    let merchant = merchant_for_user(&state, &user_id).await?;

    let items = items::get_items_by_merchant(&state.db, merchant.id)
        .await?
        .into_iter()
        .filter(|item| !item.is_deleted)
        .map(ItemResponse::from)
        .collect();

    Ok(Json(items))
}

/// POST /api/items/sync — reconcile the caller's catalog on demand.
pub async fn sync_items(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<SyncResponse>, AppError> {
    let merchant = merchant_for_user(&state, &user_id).await?;

    let summary = catalog_sync::sync_merchant_items(&state.db, &state.square, merchant.id).await?;

    Ok(Json(SyncResponse {
        processed: summary.processed,
        errors: summary.errors,
        deleted: summary.deleted,
        skipped: summary.skipped,
    }))
}
