#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, Utc};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use serde_json::{Value, json};

use stockroom_backend::entities::merchants;
use stockroom_backend::error::AppError;
use stockroom_backend::services::square::{CatalogProvider, MerchantInfo, TokenResponse};

/// In-memory SQLite database with the full schema applied.
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory database");

    migration::Migrator::up(&db, None)
        .await
        .expect("failed to run migrations");

    db
}

pub struct MerchantSeed {
    pub provider_merchant_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub last_refreshed_at: Option<NaiveDateTime>,
    pub refresh_failure_count: i32,
    pub revoked: bool,
}

impl Default for MerchantSeed {
    fn default() -> Self {
        Self {
            provider_merchant_id: "PM-1".to_string(),
            access_token: "access-token".to_string(),
            refresh_token: "refresh-token".to_string(),
            last_refreshed_at: None,
            refresh_failure_count: 0,
            revoked: false,
        }
    }
}

pub async fn seed_merchant(db: &DatabaseConnection, seed: MerchantSeed) -> merchants::Model {
    let now = Utc::now().naive_utc();

    let model = merchants::ActiveModel {
        name: Set("Test Coffee Roasters".to_string()),
        provider: Set("square".to_string()),
        provider_merchant_id: Set(seed.provider_merchant_id),
        access_token: Set(seed.access_token),
        refresh_token: Set(seed.refresh_token),
        token_expires_at: Set(now + Duration::days(30)),
        token_scopes: Set(json!(["MERCHANT_PROFILE_READ", "ITEMS_READ"])),
        locations: Set(json!([])),
        connected_at: Set(now),
        last_refreshed_at: Set(seed.last_refreshed_at),
        refresh_failure_count: Set(seed.refresh_failure_count),
        revoked: Set(seed.revoked),
        scopes_mismatch: Set(false),
        onboarding_completed: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    model.insert(db).await.expect("failed to seed merchant")
}

/// A minimal, well-formed provider catalog object.
pub fn catalog_object(id: &str, name: &str) -> Value {
    json!({
        "type": "ITEM",
        "id": id,
        "version": 1,
        "is_deleted": false,
        "updated_at": "2026-07-01T12:00:00Z",
        "item_data": {
            "name": name,
            "is_archived": false
        }
    })
}

/// Scriptable provider stub for driving the engines without HTTP.
pub struct StubProvider {
    pub catalog: Vec<Value>,
    pub fail_catalog: bool,
    /// Fail catalog fetches for this access token only
    pub fail_catalog_for_token: Option<String>,
    pub fail_refresh: bool,
    pub fetch_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
}

impl StubProvider {
    pub fn with_catalog(catalog: Vec<Value>) -> Self {
        Self {
            catalog,
            ..Self::empty()
        }
    }

    pub fn failing_refresh() -> Self {
        Self {
            fail_refresh: true,
            ..Self::empty()
        }
    }

    pub fn empty() -> Self {
        Self {
            catalog: Vec::new(),
            fail_catalog: false,
            fail_catalog_for_token: None,
            fail_refresh: false,
            fetch_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogProvider for StubProvider {
    async fn fetch_merchant_info(&self, _access_token: &str) -> Result<MerchantInfo, AppError> {
        Err(AppError::Provider("not scripted in stub".to_string()))
    }

    async fn fetch_catalog_items(&self, access_token: &str) -> Result<Vec<Value>, AppError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        let token_fails = self
            .fail_catalog_for_token
            .as_deref()
            .is_some_and(|token| token == access_token);

        if self.fail_catalog || token_fails {
            return Err(AppError::Provider("simulated catalog failure".to_string()));
        }

        Ok(self.catalog.clone())
    }

    async fn refresh_access_token(&self, _refresh_token: &str) -> Result<TokenResponse, AppError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_refresh {
            return Err(AppError::Provider("simulated refresh failure".to_string()));
        }

        Ok(TokenResponse {
            merchant_id: "PM-1".to_string(),
            access_token: "rotated-access".to_string(),
            refresh_token: "rotated-refresh".to_string(),
            expires_at: Utc::now().naive_utc() + Duration::days(30),
            scopes: vec![
                "MERCHANT_PROFILE_READ".to_string(),
                "ITEMS_READ".to_string(),
            ],
        })
    }

    async fn exchange_code(&self, _code: &str) -> Result<TokenResponse, AppError> {
        Err(AppError::Provider("not scripted in stub".to_string()))
    }
}
