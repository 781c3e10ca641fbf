//! Merchant endpoints for the authenticated web client.

use axum::Json;
use axum::extract::State;

use crate::AppState;
use crate::entities::merchants;
use crate::error::AppError;
use crate::models::merchant::MerchantResponse;
use crate::services::auth::AuthUser;
use crate::services::merchants::{self as merchant_store, MerchantUpdate};
use crate::services::users;

/// Resolve the caller's merchant.
pub(crate) async fn merchant_for_user(
    state: &AppState,
    user_id: &str,
) -> Result<merchants::Model, AppError> {
    let user = users::get_user(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))?;

    merchant_store::get_merchant(&state.db, user.merchant_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("merchant {}", user.merchant_id)))
}

/// GET /api/merchant
pub async fn get_merchant(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MerchantResponse>, AppError> {
    let merchant = merchant_for_user(&state, &user_id).await?;
    Ok(Json(merchant.into()))
}

/// POST /api/merchant/onboarding-complete
pub async fn complete_onboarding(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MerchantResponse>, AppError> {
    let merchant = merchant_for_user(&state, &user_id).await?;

    merchant_store::update_merchant(
        &state.db,
        merchant.id,
        MerchantUpdate {
            onboarding_completed: Some(true),
            ..Default::default()
        },
    )
    .await?;

    let merchant = merchant_store::get_merchant(&state.db, merchant.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("merchant {}", merchant.id)))?;

    Ok(Json(merchant.into()))
}
