//! Per-job sync bookkeeping.
//!
//! The daily jobs check here before running so a process restart inside the
//! window doesn't trigger a redundant pass, and record each run's outcome.

use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::sync_status::{self, Entity as SyncStatus};
use crate::error::AppError;

/// Job names for tracking sync status
pub mod jobs {
    pub const TOKEN_REFRESH: &str = "token_refresh";
    pub const ITEMS_SYNC: &str = "items_sync";
}

/// Minimum interval between runs (both jobs are daily)
pub const DAILY_SECS: i32 = 86400;

/// Whether a job should run now: true on first sight, on a never-succeeded
/// record, or once the record's own min interval has elapsed since the last
/// success.
pub async fn should_sync(db: &DatabaseConnection, job_name: &str) -> Result<bool, AppError> {
    let status = SyncStatus::find()
        .filter(sync_status::Column::JobName.eq(job_name))
        .one(db)
        .await?;

    let Some(record) = status else {
        tracing::info!(job = job_name, "first run detected, will sync");
        return Ok(true);
    };

    let Some(last_success) = record.last_success_at else {
        tracing::info!(job = job_name, "no previous successful run, will sync");
        return Ok(true);
    };

    let elapsed = Utc::now().naive_utc().signed_duration_since(last_success);
    let min_interval = Duration::seconds(record.min_interval_secs as i64);

    if elapsed >= min_interval {
        Ok(true)
    } else {
        tracing::debug!(
            job = job_name,
            elapsed_secs = elapsed.num_seconds(),
            next_in_secs = (min_interval - elapsed).num_seconds(),
            "skipping run"
        );
        Ok(false)
    }
}

/// Record a successful run.
pub async fn record_success(db: &DatabaseConnection, job_name: &str) -> Result<(), AppError> {
    record_outcome(db, job_name, None).await
}

/// Record a failed run with its error message.
pub async fn record_failure(
    db: &DatabaseConnection,
    job_name: &str,
    error: &str,
) -> Result<(), AppError> {
    record_outcome(db, job_name, Some(error)).await
}

async fn record_outcome(
    db: &DatabaseConnection,
    job_name: &str,
    error: Option<&str>,
) -> Result<(), AppError> {
    let now = Utc::now().naive_utc();

    let existing = SyncStatus::find()
        .filter(sync_status::Column::JobName.eq(job_name))
        .one(db)
        .await?;

    match existing {
        Some(record) => {
            let success_count = record.success_count;
            let error_count = record.error_count;
            let mut model: sync_status::ActiveModel = record.into();
            model.last_attempt_at = Set(Some(now));
            match error {
                None => {
                    model.last_success_at = Set(Some(now));
                    model.last_error = Set(None);
                    model.success_count = Set(success_count + 1);
                }
                Some(message) => {
                    model.last_error = Set(Some(message.to_string()));
                    model.error_count = Set(error_count + 1);
                }
            }
            model.update(db).await?;
        }
        None => {
            let model = sync_status::ActiveModel {
                job_name: Set(job_name.to_string()),
                last_success_at: Set(error.is_none().then_some(now)),
                last_attempt_at: Set(Some(now)),
                last_error: Set(error.map(String::from)),
                success_count: Set(if error.is_none() { 1 } else { 0 }),
                error_count: Set(if error.is_some() { 1 } else { 0 }),
                min_interval_secs: Set(DAILY_SECS),
                ..Default::default()
            };
            model.insert(db).await?;
        }
    }

    Ok(())
}
