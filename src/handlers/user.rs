//! User account endpoints.

use axum::Json;
use axum::extract::State;
use chrono::Utc;

use crate::AppState;
use crate::error::AppError;
use crate::models::user::{SetEmailRequest, UserResponse};
use crate::services::auth::AuthUser;
use crate::services::users::{self, UserUpdate};

/// GET /api/user
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserResponse>, AppError> {
    let user = users::get_user(&state.db, &user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))?;

    Ok(Json(user.into()))
}

/// PUT /api/user/email
pub async fn set_email(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(request): Json<SetEmailRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let email = request.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::BadRequest("invalid email address".to_string()));
    }

    let user = users::update_user(
        &state.db,
        &user_id,
        UserUpdate {
            email: Some(email.to_string()),
            email_verification_sent_at: Some(Utc::now().naive_utc()),
            ..Default::default()
        },
    )
    .await?;

    Ok(Json(user.into()))
}
