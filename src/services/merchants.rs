//! Merchant store: lookups, creation, typed partial updates, revocation,
//! and the refresh-eligibility query used by the daily jobs.

use chrono::{Duration, NaiveDateTime, Utc};
use sea_orm::sea_query::{Expr, NullOrdering};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    Order, QueryFilter, QueryOrder, Set,
};

use crate::entities::{merchants, prelude::*};
use crate::error::AppError;
use crate::models::merchant::Location;

/// Merchants refreshed within this window are left alone by the daily jobs.
const REFRESH_WINDOW_HOURS: i64 = 24;

/// Data required to create or reconnect a merchant.
#[derive(Debug, Clone)]
pub struct MerchantInput {
    pub name: String,
    pub provider: String,
    pub provider_merchant_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub token_expires_at: NaiveDateTime,
    pub token_scopes: Vec<String>,
    pub locations: Vec<Location>,
}

/// Typed partial update over the merchant's mutable columns.
///
/// Every settable column is enumerated here; unset fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct MerchantUpdate {
    pub name: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<NaiveDateTime>,
    pub token_scopes: Option<Vec<String>>,
    pub locations: Option<Vec<Location>>,
    pub last_refreshed_at: Option<NaiveDateTime>,
    pub refresh_failure_count: Option<i32>,
    pub revoked: Option<bool>,
    pub scopes_mismatch: Option<bool>,
    pub onboarding_completed: Option<bool>,
}

impl MerchantUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.access_token.is_none()
            && self.refresh_token.is_none()
            && self.token_expires_at.is_none()
            && self.token_scopes.is_none()
            && self.locations.is_none()
            && self.last_refreshed_at.is_none()
            && self.refresh_failure_count.is_none()
            && self.revoked.is_none()
            && self.scopes_mismatch.is_none()
            && self.onboarding_completed.is_none()
    }
}

pub async fn get_merchant(
    db: &DatabaseConnection,
    id: i64,
) -> Result<Option<merchants::Model>, AppError> {
    Ok(Merchants::find_by_id(id).one(db).await?)
}

pub async fn get_merchant_by_provider_id(
    db: &DatabaseConnection,
    provider: &str,
    provider_merchant_id: &str,
) -> Result<Option<merchants::Model>, AppError> {
    Ok(Merchants::find()
        .filter(merchants::Column::Provider.eq(provider))
        .filter(merchants::Column::ProviderMerchantId.eq(provider_merchant_id))
        .one(db)
        .await?)
}

pub async fn create_merchant(
    db: &DatabaseConnection,
    input: MerchantInput,
) -> Result<merchants::Model, AppError> {
    let now = Utc::now().naive_utc();

    let model = merchants::ActiveModel {
        name: Set(input.name),
        provider: Set(input.provider),
        provider_merchant_id: Set(input.provider_merchant_id),
        access_token: Set(input.access_token),
        refresh_token: Set(input.refresh_token),
        token_expires_at: Set(input.token_expires_at),
        token_scopes: Set(serde_json::to_value(&input.token_scopes)?),
        locations: Set(serde_json::to_value(&input.locations)?),
        connected_at: Set(now),
        last_refreshed_at: Set(Some(now)),
        refresh_failure_count: Set(0),
        revoked: Set(false),
        scopes_mismatch: Set(false),
        onboarding_completed: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    Ok(model.insert(db).await?)
}

/// Apply a partial update. An empty update is a no-op, not an error.
pub async fn update_merchant(
    db: &DatabaseConnection,
    id: i64,
    update: MerchantUpdate,
) -> Result<(), AppError> {
    if update.is_empty() {
        return Ok(());
    }

    let merchant = get_merchant(db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("merchant {id}")))?;

    let mut model = merchant.into_active_model();

    if let Some(name) = update.name {
        model.name = Set(name);
    }
    if let Some(access_token) = update.access_token {
        model.access_token = Set(access_token);
    }
    if let Some(refresh_token) = update.refresh_token {
        model.refresh_token = Set(refresh_token);
    }
    if let Some(token_expires_at) = update.token_expires_at {
        model.token_expires_at = Set(token_expires_at);
    }
    if let Some(token_scopes) = update.token_scopes {
        model.token_scopes = Set(serde_json::to_value(&token_scopes)?);
    }
    if let Some(locations) = update.locations {
        model.locations = Set(serde_json::to_value(&locations)?);
    }
    if let Some(last_refreshed_at) = update.last_refreshed_at {
        model.last_refreshed_at = Set(Some(last_refreshed_at));
    }
    if let Some(refresh_failure_count) = update.refresh_failure_count {
        model.refresh_failure_count = Set(refresh_failure_count);
    }
    if let Some(revoked) = update.revoked {
        model.revoked = Set(revoked);
    }
    if let Some(scopes_mismatch) = update.scopes_mismatch {
        model.scopes_mismatch = Set(scopes_mismatch);
    }
    if let Some(onboarding_completed) = update.onboarding_completed {
        model.onboarding_completed = Set(onboarding_completed);
    }

    model.updated_at = Set(Utc::now().naive_utc());
    model.update(db).await?;

    Ok(())
}

/// Mark a merchant as revoked. Manual un-revocation only; no automated path.
pub async fn revoke_merchant(db: &DatabaseConnection, id: i64) -> Result<(), AppError> {
    let now = Utc::now().naive_utc();

    let result = Merchants::update_many()
        .col_expr(merchants::Column::Revoked, Expr::value(true))
        .col_expr(merchants::Column::LastRefreshedAt, Expr::value(now))
        .col_expr(merchants::Column::UpdatedAt, Expr::value(now))
        .filter(merchants::Column::Id.eq(id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound(format!("merchant {id}")));
    }

    Ok(())
}

/// Merchants eligible for token refresh and catalog sync:
/// not revoked, and last refreshed more than 24 hours ago (or never).
/// Oldest first, never-refreshed merchants at the front.
pub async fn list_merchants_needing_refresh(
    db: &DatabaseConnection,
) -> Result<Vec<merchants::Model>, AppError> {
    let cutoff = Utc::now().naive_utc() - Duration::hours(REFRESH_WINDOW_HOURS);

    Ok(Merchants::find()
        .filter(merchants::Column::Revoked.eq(false))
        .filter(
            Condition::any()
                .add(merchants::Column::LastRefreshedAt.is_null())
                .add(merchants::Column::LastRefreshedAt.lt(cutoff)),
        )
        .order_by_with_nulls(
            merchants::Column::LastRefreshedAt,
            Order::Asc,
            NullOrdering::First,
        )
        .all(db)
        .await?)
}

/// Create or reconnect a merchant keyed on (provider, provider merchant id).
/// Reconnection refreshes tokens and locations and clears the revoked and
/// scopes-mismatch flags.
pub async fn upsert_merchant(
    db: &DatabaseConnection,
    input: MerchantInput,
) -> Result<merchants::Model, AppError> {
    let existing =
        get_merchant_by_provider_id(db, &input.provider, &input.provider_merchant_id).await?;

    let Some(existing) = existing else {
        return create_merchant(db, input).await;
    };

    update_merchant(
        db,
        existing.id,
        MerchantUpdate {
            name: Some(input.name),
            access_token: Some(input.access_token),
            refresh_token: Some(input.refresh_token),
            token_expires_at: Some(input.token_expires_at),
            token_scopes: Some(input.token_scopes),
            locations: Some(input.locations),
            last_refreshed_at: Some(Utc::now().naive_utc()),
            revoked: Some(false),
            scopes_mismatch: Some(false),
            ..Default::default()
        },
    )
    .await?;

    get_merchant(db, existing.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("merchant {}", existing.id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_update_is_detected() {
        assert!(MerchantUpdate::default().is_empty());

        let update = MerchantUpdate {
            revoked: Some(true),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
