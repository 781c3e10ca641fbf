//! Daily token refresh job.
//!
//! Proactively refreshes OAuth tokens for every eligible merchant before
//! expiry, in sequential batches with settle-all semantics inside each
//! batch: one merchant's failure never aborts the batch or the run.

use futures_util::future::join_all;
use sea_orm::DatabaseConnection;
use tokio::time::{Duration, interval};

use crate::error::AppError;
use crate::services::square::{CatalogProvider, SquareService};
use crate::services::sync_status::{self, jobs};
use crate::services::{merchants, telemetry, token_refresh};

/// Merchants refreshed concurrently per batch
const BATCH_SIZE: usize = 50;

/// Eligibility re-check cadence; actual runs are gated to daily
const CHECK_INTERVAL_SECS: u64 = 3600;

/// Start the background loop. The first tick fires immediately; the
/// sync_status gate keeps restarts from re-running inside the daily window.
pub async fn start_token_refresh_job(db: DatabaseConnection, square: SquareService) {
    tokio::spawn(async move {
        let mut interval = interval(Duration::from_secs(CHECK_INTERVAL_SECS));

        loop {
            interval.tick().await;

            match sync_status::should_sync(&db, jobs::TOKEN_REFRESH).await {
                Ok(true) => {
                    tracing::info!("starting scheduled token refresh");
                    match run_token_refresh(&db, &square).await {
                        Ok(()) => {
                            if let Err(e) = sync_status::record_success(&db, jobs::TOKEN_REFRESH).await {
                                tracing::warn!(error = %e, "failed to record run success");
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "scheduled token refresh failed");
                            if let Err(e2) =
                                sync_status::record_failure(&db, jobs::TOKEN_REFRESH, &e.to_string())
                                    .await
                            {
                                tracing::warn!(error = %e2, "failed to record run failure");
                            }
                        }
                    }
                }
                Ok(false) => {
                    tracing::debug!("skipping token refresh (recently run)");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to check sync status");
                }
            }
        }
    });
}

/// One full refresh run over all eligible merchants.
///
/// Only a failure of the selection query itself aborts the run; per-merchant
/// failures are counted and reported by the engine.
pub async fn run_token_refresh<P: CatalogProvider + ?Sized>(
    db: &DatabaseConnection,
    provider: &P,
) -> Result<(), AppError> {
    let eligible = merchants::list_merchants_needing_refresh(db)
        .await
        .map_err(|e| {
            telemetry::capture("token_refresh_selection_failed", &e);
            e
        })?;

    tracing::info!(count = eligible.len(), "merchants needing token refresh");

    for (batch_idx, batch) in eligible.chunks(BATCH_SIZE).enumerate() {
        let results = join_all(batch.iter().map(|merchant| {
            token_refresh::refresh_merchant_token(db, provider, merchant.id, &merchant.refresh_token)
        }))
        .await;

        let succeeded = results.iter().filter(|&&ok| ok).count();
        tracing::info!(
            batch = batch_idx + 1,
            succeeded,
            failed = results.len() - succeeded,
            "token refresh batch completed"
        );
    }

    tracing::info!("token refresh run completed");
    Ok(())
}
