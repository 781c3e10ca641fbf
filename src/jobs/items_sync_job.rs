//! Daily catalog sync job.
//!
//! Reconciles every eligible merchant's item mirror against the provider.
//! Smaller batches than token refresh since a full catalog sync is much
//! heavier per merchant.

use futures_util::future::join_all;
use sea_orm::DatabaseConnection;
use tokio::time::{Duration, interval};

use crate::error::AppError;
use crate::services::square::{CatalogProvider, SquareService};
use crate::services::sync_status::{self, jobs};
use crate::services::{catalog_sync, merchants, telemetry};

/// Merchants synced concurrently per batch
const BATCH_SIZE: usize = 10;

/// Eligibility re-check cadence; actual runs are gated to daily
const CHECK_INTERVAL_SECS: u64 = 3600;

pub async fn start_items_sync_job(db: DatabaseConnection, square: SquareService) {
    tokio::spawn(async move {
        let mut interval = interval(Duration::from_secs(CHECK_INTERVAL_SECS));

        loop {
            interval.tick().await;

            match sync_status::should_sync(&db, jobs::ITEMS_SYNC).await {
                Ok(true) => {
                    tracing::info!("starting scheduled items sync");
                    match run_items_sync(&db, &square).await {
                        Ok(()) => {
                            if let Err(e) = sync_status::record_success(&db, jobs::ITEMS_SYNC).await
                            {
                                tracing::warn!(error = %e, "failed to record run success");
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "scheduled items sync failed");
                            if let Err(e2) =
                                sync_status::record_failure(&db, jobs::ITEMS_SYNC, &e.to_string())
                                    .await
                            {
                                tracing::warn!(error = %e2, "failed to record run failure");
                            }
                        }
                    }
                }
                Ok(false) => {
                    tracing::debug!("skipping items sync (recently run)");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to check sync status");
                }
            }
        }
    });
}

/// One full sync run over all eligible merchants. Shares the refresh job's
/// eligibility query; a revoked merchant never appears, and the engine skips
/// one revoked mid-run.
pub async fn run_items_sync<P: CatalogProvider + ?Sized>(
    db: &DatabaseConnection,
    provider: &P,
) -> Result<(), AppError> {
    let eligible = merchants::list_merchants_needing_refresh(db)
        .await
        .map_err(|e| {
            telemetry::capture("items_sync_selection_failed", &e);
            e
        })?;

    tracing::info!(count = eligible.len(), "active merchants for items sync");

    for (batch_idx, batch) in eligible.chunks(BATCH_SIZE).enumerate() {
        let results = join_all(
            batch
                .iter()
                .map(|merchant| catalog_sync::sync_merchant_items(db, provider, merchant.id)),
        )
        .await;

        let succeeded = results.iter().filter(|result| result.is_ok()).count();
        tracing::info!(
            batch = batch_idx + 1,
            succeeded,
            failed = results.len() - succeeded,
            "items sync batch completed"
        );
    }

    tracing::info!("items sync run completed");
    Ok(())
}
