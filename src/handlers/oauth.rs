//! Square OAuth endpoints: authorize redirect and callback handling for the
//! install and login flows.

use std::collections::HashSet;

use axum::extract::{Query, State};
use axum::response::Redirect;
use chrono::Utc;
use uuid::Uuid;

use crate::AppState;
use crate::error::AppError;
use crate::models::oauth::{AuthorizeParams, CallbackParams, OAuthFlow};
use crate::models::user::roles;
use crate::services::merchants::{self, MerchantInput, MerchantUpdate};
use crate::services::square::{CatalogProvider, PROVIDER_SQUARE, REQUIRED_SCOPES, TokenResponse};
use crate::services::users::{self, CreateUser};
use crate::services::{auth, oauth_state, telemetry};

/// GET /oauth/square/authorize?flow=install|login
///
/// Issues a one-time state and redirects the browser to the provider's
/// consent screen.
pub async fn authorize(
    State(state): State<AppState>,
    Query(params): Query<AuthorizeParams>,
) -> Result<Redirect, AppError> {
    let flow = match params.flow.as_deref() {
        None => OAuthFlow::Install,
        Some(raw) => OAuthFlow::parse(raw)
            .ok_or_else(|| AppError::BadRequest(format!("unknown flow: {raw}")))?,
    };

    let csrf = oauth_state::issue(&state.oauth_states, flow).await;
    Ok(Redirect::temporary(&state.square.authorize_url(&csrf)))
}

/// GET /oauth/square/callback?code=...&state=...
///
/// Errors never surface as API responses here — the browser is mid-redirect,
/// so failures bounce back to the frontend with a safe message.
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    match handle_callback(&state, params).await {
        Ok(redirect) => redirect,
        Err(e) => {
            telemetry::capture("oauth_callback_failed", &e);
            let message = safe_message(&e);
            Redirect::temporary(&format!(
                "{}?error={}",
                state.config.web_url,
                urlencoding::encode(&message)
            ))
        }
    }
}

async fn handle_callback(state: &AppState, params: CallbackParams) -> Result<Redirect, AppError> {
    if let Some(error) = params.error {
        return Err(AppError::BadRequest(format!(
            "provider returned an error: {error}"
        )));
    }

    let csrf = params
        .state
        .ok_or_else(|| AppError::BadRequest("missing state".to_string()))?;
    let code = params
        .code
        .ok_or_else(|| AppError::BadRequest("missing code".to_string()))?;

    let flow = oauth_state::consume(&state.oauth_states, &csrf)
        .await
        .ok_or_else(|| AppError::BadRequest("invalid or expired state".to_string()))?;

    let tokens = state.square.exchange_code(&code).await?;

    let (merchant, user) = match flow {
        OAuthFlow::Login => login_merchant(state, &tokens).await?,
        OAuthFlow::Install => install_merchant(state, &tokens).await?,
    };

    let session = auth::issue_session_token(&state.config.jwt_signing_key, &user.id)?;

    let dest_page = if merchant.onboarding_completed {
        "settings"
    } else {
        "welcome"
    };

    Ok(Redirect::temporary(&format!(
        "{}/{}?token={}",
        state.config.web_url, dest_page, session
    )))
}

/// Login flow: the merchant must already be installed; refresh its tokens
/// and find the user who connected it.
async fn login_merchant(
    state: &AppState,
    tokens: &TokenResponse,
) -> Result<(crate::entities::merchants::Model, crate::entities::users::Model), AppError> {
    let merchant =
        merchants::get_merchant_by_provider_id(&state.db, PROVIDER_SQUARE, &tokens.merchant_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(
                    "No merchant found for this Square account. Please install the app first."
                        .to_string(),
                )
            })?;

    tracing::info!(merchant_id = merchant.id, "logging in existing merchant");

    merchants::update_merchant(
        &state.db,
        merchant.id,
        MerchantUpdate {
            access_token: Some(tokens.access_token.clone()),
            refresh_token: Some(tokens.refresh_token.clone()),
            token_expires_at: Some(tokens.expires_at),
            token_scopes: Some(tokens.scopes.clone()),
            last_refreshed_at: Some(Utc::now().naive_utc()),
            ..Default::default()
        },
    )
    .await?;

    let user =
        users::get_user_by_merchant_and_provider(&state.db, merchant.id, &tokens.merchant_id)
            .await?
            .ok_or_else(|| {
                // Connected merchant without its user is corrupted state
                telemetry::capture("oauth_login_user_missing", merchant.id);
                AppError::NotFound("No user found for this account.".to_string())
            })?;

    Ok((merchant, user))
}

/// Install flow: resolve the merchant's profile, create or reconnect the
/// merchant row, and make sure an owner user exists.
async fn install_merchant(
    state: &AppState,
    tokens: &TokenResponse,
) -> Result<(crate::entities::merchants::Model, crate::entities::users::Model), AppError> {
    let info = state.square.fetch_merchant_info(&tokens.access_token).await?;

    let merchant = merchants::upsert_merchant(
        &state.db,
        MerchantInput {
            name: info.name,
            provider: PROVIDER_SQUARE.to_string(),
            provider_merchant_id: info.id,
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            token_expires_at: tokens.expires_at,
            token_scopes: tokens.scopes.clone(),
            locations: info.locations,
        },
    )
    .await?;

    if scopes_mismatch(&tokens.scopes) {
        telemetry::capture("oauth_install_scopes_mismatch", merchant.id);
        merchants::update_merchant(
            &state.db,
            merchant.id,
            MerchantUpdate {
                scopes_mismatch: Some(true),
                ..Default::default()
            },
        )
        .await?;
    }

    let user =
        match users::get_user_by_merchant_and_provider(&state.db, merchant.id, &tokens.merchant_id)
            .await?
        {
            Some(user) => user,
            // First OAuth user is the business owner
            None => {
                users::create_user(
                    &state.db,
                    CreateUser {
                        id: Uuid::new_v4().to_string(),
                        merchant_id: merchant.id,
                        provider_user_id: Some(tokens.merchant_id.clone()),
                        role: roles::OWNER.to_string(),
                    },
                )
                .await?
            }
        };

    Ok((merchant, user))
}

/// A grant missing any required scope can't be synced reliably.
fn scopes_mismatch(granted: &[String]) -> bool {
    if granted.is_empty() {
        // Provider omitted the scope list; nothing to compare against
        return false;
    }

    let granted: HashSet<&str> = granted.iter().map(String::as_str).collect();
    REQUIRED_SCOPES.iter().any(|scope| !granted.contains(scope))
}

fn safe_message(error: &AppError) -> String {
    match error {
        AppError::BadRequest(msg) | AppError::NotFound(msg) => msg.clone(),
        _ => "Internal Server Error".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scopes_mismatch_detects_missing_scope() {
        assert!(scopes_mismatch(&["MERCHANT_PROFILE_READ".to_string()]));
        assert!(!scopes_mismatch(&[
            "MERCHANT_PROFILE_READ".to_string(),
            "ITEMS_READ".to_string(),
        ]));
        assert!(!scopes_mismatch(&[]));
    }

    #[test]
    fn internal_errors_are_not_leaked() {
        let error = AppError::Database("connection reset by peer".to_string());
        assert_eq!(safe_message(&error), "Internal Server Error");

        let error = AppError::BadRequest("missing code".to_string());
        assert_eq!(safe_message(&error), "missing code");
    }
}
