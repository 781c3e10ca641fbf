mod common;

use chrono::{Duration, Utc};

use stockroom_backend::error::AppError;
use stockroom_backend::models::merchant::Location;
use stockroom_backend::services::merchants::{
    self, MerchantInput, MerchantUpdate, get_merchant, get_merchant_by_provider_id,
    list_merchants_needing_refresh, revoke_merchant, update_merchant, upsert_merchant,
};

use crate::common::{MerchantSeed, seed_merchant, setup_test_db};

fn sample_input(provider_merchant_id: &str) -> MerchantInput {
    MerchantInput {
        name: "Corner Bakery".to_string(),
        provider: "square".to_string(),
        provider_merchant_id: provider_merchant_id.to_string(),
        access_token: "fresh-access".to_string(),
        refresh_token: "fresh-refresh".to_string(),
        token_expires_at: Utc::now().naive_utc() + Duration::days(30),
        token_scopes: vec!["ITEMS_READ".to_string()],
        locations: vec![Location {
            id: "LOC-1".to_string(),
            name: "Main St".to_string(),
            address: Some("1 Main St, Springfield".to_string()),
            timezone: Some("America/Los_Angeles".to_string()),
            capabilities: None,
        }],
    }
}

#[tokio::test]
async fn eligibility_query_boundary_and_ordering() {
    let db = setup_test_db().await;
    let now = Utc::now().naive_utc();

    // Never refreshed: always eligible, sorted first
    let never = seed_merchant(
        &db,
        MerchantSeed {
            provider_merchant_id: "PM-NEVER".to_string(),
            last_refreshed_at: None,
            ..Default::default()
        },
    )
    .await;

    // Refreshed 25 hours ago: eligible
    let stale = seed_merchant(
        &db,
        MerchantSeed {
            provider_merchant_id: "PM-STALE".to_string(),
            last_refreshed_at: Some(now - Duration::hours(25)),
            ..Default::default()
        },
    )
    .await;

    // Exactly 24 hours ago: eligible
    let boundary = seed_merchant(
        &db,
        MerchantSeed {
            provider_merchant_id: "PM-BOUNDARY".to_string(),
            last_refreshed_at: Some(now - Duration::hours(24)),
            ..Default::default()
        },
    )
    .await;

    // 23h59m ago: not eligible yet
    seed_merchant(
        &db,
        MerchantSeed {
            provider_merchant_id: "PM-FRESH".to_string(),
            last_refreshed_at: Some(now - Duration::hours(24) + Duration::minutes(1)),
            ..Default::default()
        },
    )
    .await;

    // Revoked, never selected regardless of staleness
    seed_merchant(
        &db,
        MerchantSeed {
            provider_merchant_id: "PM-REVOKED".to_string(),
            last_refreshed_at: Some(now - Duration::hours(48)),
            revoked: true,
            ..Default::default()
        },
    )
    .await;

    let eligible = list_merchants_needing_refresh(&db).await.unwrap();
    let ids: Vec<i64> = eligible.iter().map(|m| m.id).collect();

    // Null first, then oldest-first
    assert_eq!(ids, vec![never.id, stale.id, boundary.id]);
}

#[tokio::test]
async fn revoke_marks_merchant_and_rejects_missing_id() {
    let db = setup_test_db().await;
    let merchant = seed_merchant(&db, MerchantSeed::default()).await;

    revoke_merchant(&db, merchant.id).await.unwrap();

    let reloaded = get_merchant(&db, merchant.id).await.unwrap().unwrap();
    assert!(reloaded.revoked);
    assert!(reloaded.last_refreshed_at.is_some());

    let missing = revoke_merchant(&db, 99_999).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn empty_update_is_a_noop() {
    let db = setup_test_db().await;
    let merchant = seed_merchant(&db, MerchantSeed::default()).await;

    update_merchant(&db, merchant.id, MerchantUpdate::default())
        .await
        .unwrap();

    let reloaded = get_merchant(&db, merchant.id).await.unwrap().unwrap();
    assert_eq!(reloaded.updated_at, merchant.updated_at);
    assert_eq!(reloaded.access_token, merchant.access_token);
}

#[tokio::test]
async fn partial_update_touches_only_named_fields() {
    let db = setup_test_db().await;
    let merchant = seed_merchant(&db, MerchantSeed::default()).await;

    update_merchant(
        &db,
        merchant.id,
        MerchantUpdate {
            refresh_failure_count: Some(2),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let reloaded = get_merchant(&db, merchant.id).await.unwrap().unwrap();
    assert_eq!(reloaded.refresh_failure_count, 2);
    assert_eq!(reloaded.access_token, merchant.access_token);
    assert_eq!(reloaded.name, merchant.name);
}

#[tokio::test]
async fn upsert_creates_then_reconnects() {
    let db = setup_test_db().await;

    let created = upsert_merchant(&db, sample_input("PM-UP")).await.unwrap();
    assert_eq!(created.provider_merchant_id, "PM-UP");

    // Simulate a revoked merchant reconnecting via the install flow
    merchants::update_merchant(
        &db,
        created.id,
        MerchantUpdate {
            revoked: Some(true),
            scopes_mismatch: Some(true),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let mut input = sample_input("PM-UP");
    input.access_token = "reconnected-access".to_string();
    let reconnected = upsert_merchant(&db, input).await.unwrap();

    assert_eq!(reconnected.id, created.id);
    assert_eq!(reconnected.access_token, "reconnected-access");
    assert!(!reconnected.revoked);
    assert!(!reconnected.scopes_mismatch);

    let by_provider = get_merchant_by_provider_id(&db, "square", "PM-UP")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_provider.id, created.id);
}
