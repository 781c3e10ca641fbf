//! Catalog reconciliation engine.
//!
//! Full per-merchant sync: fetch the complete catalog, upsert everything in
//! concurrent batches with per-item failure isolation, then soft-delete
//! whatever the provider no longer returned. Deletion is driven purely by a
//! watermark comparison — items dropped upstream are never visited, they
//! just stop being seen.

use chrono::{NaiveDateTime, Utc};
use futures_util::future::join_all;
use sea_orm::DatabaseConnection;
use serde_json::Value;

use crate::error::AppError;
use crate::services::items::{self, ItemInput};
use crate::services::merchants;
use crate::services::square::CatalogProvider;
use crate::services::telemetry;

/// Items upserted concurrently per batch
const BATCH_SIZE: usize = 20;

/// Integers wider than this lose precision in JSON consumers; the raw
/// payload stores them as decimal strings instead.
const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// Outcome of one merchant's sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub processed: usize,
    pub errors: usize,
    pub deleted: u64,
    pub skipped: bool,
}

/// Sync one merchant's catalog into the item store.
///
/// A revoked merchant is skipped successfully. A missing merchant or a
/// failed catalog fetch is fatal to this merchant's sync and surfaces as an
/// error after being reported; individual item failures are isolated and
/// only counted.
pub async fn sync_merchant_items<P: CatalogProvider + ?Sized>(
    db: &DatabaseConnection,
    provider: &P,
    merchant_id: i64,
) -> Result<SyncSummary, AppError> {
    match run_sync(db, provider, merchant_id).await {
        Ok(summary) => Ok(summary),
        Err(e) => {
            telemetry::capture("items_sync_failed", format!("merchant {merchant_id}: {e}"));
            Err(e)
        }
    }
}

async fn run_sync<P: CatalogProvider + ?Sized>(
    db: &DatabaseConnection,
    provider: &P,
    merchant_id: i64,
) -> Result<SyncSummary, AppError> {
    tracing::info!(merchant_id, "starting item sync");

    let merchant = merchants::get_merchant(db, merchant_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("merchant {merchant_id}")))?;

    if merchant.revoked {
        tracing::info!(merchant_id, "skipping sync for revoked merchant");
        return Ok(SyncSummary {
            skipped: true,
            ..Default::default()
        });
    }

    // Reconciliation watermark: captured before the fetch so anything the
    // provider still has gets a later last_seen_at.
    let sync_start = Utc::now().naive_utc();

    let catalog = provider.fetch_catalog_items(&merchant.access_token).await?;
    tracing::info!(merchant_id, count = catalog.len(), "fetched catalog items");

    let mut processed = 0usize;
    let mut errors = 0usize;

    for batch in catalog.chunks(BATCH_SIZE) {
        let results = join_all(batch.iter().map(|object| async move {
            let input = map_catalog_object(merchant_id, object)?;
            items::upsert_item(db, input).await
        }))
        .await;

        for (object, result) in batch.iter().zip(results) {
            match result {
                Ok(()) => processed += 1,
                Err(e) => {
                    errors += 1;
                    let object_id = object
                        .get("id")
                        .and_then(Value::as_str)
                        .unwrap_or("<unknown>");
                    telemetry::capture(
                        "items_sync_item_failed",
                        format!("merchant {merchant_id} object {object_id}: {e}"),
                    );
                }
            }
        }
    }

    let deleted = items::mark_items_not_seen_as_deleted(db, merchant_id, sync_start).await?;

    tracing::info!(
        merchant_id,
        processed,
        errors,
        deleted,
        "item sync completed"
    );

    Ok(SyncSummary {
        processed,
        errors,
        deleted,
        skipped: false,
    })
}

/// Map one provider catalog object to an item upsert.
fn map_catalog_object(merchant_id: i64, object: &Value) -> Result<ItemInput, AppError> {
    let object_id = object.get("id").and_then(Value::as_str);
    let object_type = object.get("type").and_then(Value::as_str);
    let item_data = object.get("item_data").filter(|data| data.is_object());

    let (Some(object_id), Some("ITEM"), Some(item_data)) = (object_id, object_type, item_data)
    else {
        return Err(AppError::Mapping(format!(
            "object {} is not an ITEM with item data",
            object_id.unwrap_or("<unknown>")
        )));
    };

    let name = item_data
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let description = item_data
        .get("description")
        .and_then(Value::as_str)
        .map(String::from);
    let category_id = item_data
        .get("category_id")
        .and_then(Value::as_str)
        .map(String::from);

    // Archived on the provider side means hidden from sale, not deleted
    let is_available = item_data.get("is_archived").and_then(Value::as_bool) != Some(true);
    // The provider's own deletion flag, distinct from the watermark mechanism
    let is_deleted = object
        .get("is_deleted")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let provider_version = object.get("version").and_then(Value::as_i64);
    let provider_updated_at = object
        .get("updated_at")
        .and_then(Value::as_str)
        .and_then(parse_instant);

    let mut raw = object.clone();
    coerce_wide_integers(&mut raw);

    Ok(ItemInput {
        merchant_id,
        provider: crate::services::square::PROVIDER_SQUARE.to_string(),
        provider_item_id: object_id.to_string(),
        name,
        description,
        category_id,
        category_name: None,
        is_deleted,
        is_available,
        provider_version,
        provider_updated_at,
        last_seen_at: Some(Utc::now().naive_utc()),
        raw: Some(raw),
    })
}

fn parse_instant(value: &str) -> Option<NaiveDateTime> {
    chrono::DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.naive_utc())
}

/// Recursively replace integers wider than 2^53 with decimal strings.
fn coerce_wide_integers(value: &mut Value) {
    match value {
        Value::Number(number) => {
            let wide = if let Some(i) = number.as_i64() {
                !(-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&i)
            } else if let Some(u) = number.as_u64() {
                u > MAX_SAFE_INTEGER as u64
            } else {
                false
            };

            if wide {
                *value = Value::String(number.to_string());
            }
        }
        Value::Array(entries) => entries.iter_mut().for_each(coerce_wide_integers),
        Value::Object(map) => map.values_mut().for_each(coerce_wide_integers),
        _ => {}
    }
}
