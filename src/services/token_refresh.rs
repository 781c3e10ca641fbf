//! Token refresh engine.
//!
//! Renews one merchant's OAuth tokens with bounded retries. Repeated
//! exhausted attempts escalate to revocation, after which the merchant is
//! never selected for refresh or sync again (manual un-revocation only).

use std::time::Duration;

use chrono::Utc;
use sea_orm::DatabaseConnection;

use crate::error::AppError;
use crate::services::merchants::{self, MerchantUpdate};
use crate::services::square::CatalogProvider;
use crate::services::telemetry;

/// Maximum number of attempts per refresh call
const MAX_RETRIES: u32 = 3;

/// Consecutive exhausted calls before the merchant is revoked
const MAX_CONSECUTIVE_FAILURES: i32 = 3;

/// Fixed delay between attempts; no backoff growth, no jitter
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Refresh a merchant's token and persist the rotated pair.
///
/// Returns `true` on success. Expected failures come back as `false` — the
/// scheduler counts them without unwinding the batch; everything reportable
/// goes through telemetry first.
pub async fn refresh_merchant_token<P: CatalogProvider + ?Sized>(
    db: &DatabaseConnection,
    provider: &P,
    merchant_id: i64,
    refresh_token: &str,
) -> bool {
    let mut last_error = String::new();

    for attempt in 1..=MAX_RETRIES {
        tracing::info!(
            merchant_id,
            attempt,
            max_retries = MAX_RETRIES,
            "refreshing merchant token"
        );

        match try_refresh_once(db, provider, merchant_id, refresh_token).await {
            Ok(()) => {
                tracing::info!(merchant_id, "token refresh succeeded");
                return true;
            }
            Err(e) => {
                tracing::warn!(merchant_id, attempt, error = %e, "token refresh attempt failed");
                last_error = e.to_string();

                // No wait after the final attempt
                if attempt < MAX_RETRIES {
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
    }

    telemetry::capture(
        "token_refresh_retries_exhausted",
        format!("merchant {merchant_id}: {last_error}"),
    );

    // Re-read current state: the failure count may have moved underneath us.
    let merchant = match merchants::get_merchant(db, merchant_id).await {
        Ok(Some(merchant)) => merchant,
        Ok(None) => {
            telemetry::capture("token_refresh_merchant_not_found", merchant_id);
            return false;
        }
        Err(e) => {
            telemetry::capture(
                "token_refresh_state_read_failed",
                format!("merchant {merchant_id}: {e}"),
            );
            return false;
        }
    };

    let new_failure_count = merchant.refresh_failure_count + 1;
    let should_revoke = new_failure_count >= MAX_CONSECUTIVE_FAILURES;

    let update = MerchantUpdate {
        refresh_failure_count: Some(new_failure_count),
        last_refreshed_at: Some(Utc::now().naive_utc()),
        revoked: should_revoke.then_some(true),
        ..Default::default()
    };

    if let Err(e) = merchants::update_merchant(db, merchant_id, update).await {
        telemetry::capture(
            "token_refresh_state_update_failed",
            format!("merchant {merchant_id}: {e}"),
        );
        return false;
    }

    if should_revoke {
        telemetry::capture("token_refresh_merchant_revoked", merchant_id);
    }

    false
}

/// One attempt: call the provider and persist the rotated tokens.
async fn try_refresh_once<P: CatalogProvider + ?Sized>(
    db: &DatabaseConnection,
    provider: &P,
    merchant_id: i64,
    refresh_token: &str,
) -> Result<(), AppError> {
    let token = provider.refresh_access_token(refresh_token).await?;

    merchants::update_merchant(
        db,
        merchant_id,
        MerchantUpdate {
            access_token: Some(token.access_token),
            refresh_token: Some(token.refresh_token),
            token_expires_at: Some(token.expires_at),
            last_refreshed_at: Some(Utc::now().naive_utc()),
            refresh_failure_count: Some(0),
            ..Default::default()
        },
    )
    .await
}
