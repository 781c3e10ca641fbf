mod common;

use chrono::{Duration, Utc};
use serde_json::json;

use stockroom_backend::services::items::{
    ItemInput, get_item_by_provider_id, get_items_by_merchant, mark_items_not_seen_as_deleted,
    upsert_item,
};

use crate::common::{MerchantSeed, seed_merchant, setup_test_db};

fn sample_item(merchant_id: i64, provider_item_id: &str) -> ItemInput {
    ItemInput {
        merchant_id,
        provider: "square".to_string(),
        provider_item_id: provider_item_id.to_string(),
        name: "Espresso".to_string(),
        description: Some("Double shot".to_string()),
        category_id: Some("CAT-1".to_string()),
        category_name: None,
        is_deleted: false,
        is_available: true,
        provider_version: Some(3),
        provider_updated_at: None,
        last_seen_at: Some(Utc::now().naive_utc()),
        raw: Some(json!({"id": provider_item_id, "type": "ITEM"})),
    }
}

#[tokio::test]
async fn upsert_is_idempotent() {
    let db = setup_test_db().await;
    let merchant = seed_merchant(&db, MerchantSeed::default()).await;

    let input = sample_item(merchant.id, "SQ-1");
    upsert_item(&db, input.clone()).await.unwrap();
    upsert_item(&db, input).await.unwrap();

    let items = get_items_by_merchant(&db, merchant.id).await.unwrap();
    assert_eq!(items.len(), 1);

    let item = &items[0];
    assert_eq!(item.provider_item_id, "SQ-1");
    assert_eq!(item.name, "Espresso");
    assert_eq!(item.provider_version, Some(3));
}

#[tokio::test]
async fn upsert_updates_in_place() {
    let db = setup_test_db().await;
    let merchant = seed_merchant(&db, MerchantSeed::default()).await;

    upsert_item(&db, sample_item(merchant.id, "SQ-1"))
        .await
        .unwrap();

    let first = get_item_by_provider_id(&db, merchant.id, "square", "SQ-1")
        .await
        .unwrap()
        .unwrap();

    let mut changed = sample_item(merchant.id, "SQ-1");
    changed.name = "Espresso Doppio".to_string();
    changed.provider_version = Some(4);
    upsert_item(&db, changed).await.unwrap();

    let items = get_items_by_merchant(&db, merchant.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, first.id);
    assert_eq!(items[0].name, "Espresso Doppio");
    assert_eq!(items[0].provider_version, Some(4));
}

#[tokio::test]
async fn items_are_scoped_to_their_merchant() {
    let db = setup_test_db().await;
    let merchant_a = seed_merchant(
        &db,
        MerchantSeed {
            provider_merchant_id: "PM-A".to_string(),
            ..Default::default()
        },
    )
    .await;
    let merchant_b = seed_merchant(
        &db,
        MerchantSeed {
            provider_merchant_id: "PM-B".to_string(),
            ..Default::default()
        },
    )
    .await;

    // Same provider item id, different merchants: two distinct rows
    upsert_item(&db, sample_item(merchant_a.id, "SQ-1"))
        .await
        .unwrap();
    upsert_item(&db, sample_item(merchant_b.id, "SQ-1"))
        .await
        .unwrap();

    assert_eq!(
        get_items_by_merchant(&db, merchant_a.id).await.unwrap().len(),
        1
    );
    assert_eq!(
        get_items_by_merchant(&db, merchant_b.id).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn watermark_soft_delete_only_touches_unseen_live_items() {
    let db = setup_test_db().await;
    let merchant = seed_merchant(&db, MerchantSeed::default()).await;
    let now = Utc::now().naive_utc();

    // Seen before the watermark: should be soft-deleted
    let mut unseen = sample_item(merchant.id, "SQ-OLD");
    unseen.last_seen_at = Some(now - Duration::hours(2));
    upsert_item(&db, unseen).await.unwrap();

    // Never seen at all: should be soft-deleted
    let mut never_seen = sample_item(merchant.id, "SQ-NEVER");
    never_seen.last_seen_at = None;
    upsert_item(&db, never_seen).await.unwrap();

    // Seen after the watermark: untouched
    let mut fresh = sample_item(merchant.id, "SQ-FRESH");
    fresh.last_seen_at = Some(now + Duration::minutes(5));
    upsert_item(&db, fresh).await.unwrap();

    // Already deleted: not counted again
    let mut gone = sample_item(merchant.id, "SQ-GONE");
    gone.last_seen_at = Some(now - Duration::hours(2));
    gone.is_deleted = true;
    upsert_item(&db, gone).await.unwrap();

    let affected = mark_items_not_seen_as_deleted(&db, merchant.id, now)
        .await
        .unwrap();
    assert_eq!(affected, 2);

    let fresh_row = get_item_by_provider_id(&db, merchant.id, "square", "SQ-FRESH")
        .await
        .unwrap()
        .unwrap();
    assert!(!fresh_row.is_deleted);

    let old_row = get_item_by_provider_id(&db, merchant.id, "square", "SQ-OLD")
        .await
        .unwrap()
        .unwrap();
    assert!(old_row.is_deleted);
}
