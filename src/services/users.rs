//! User store. Users are identified by the external auth provider's UID and
//! belong to exactly one merchant.

use chrono::{NaiveDateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};

use crate::entities::{prelude::*, users};
use crate::error::AppError;

/// Data required to create a new user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub id: String,
    pub merchant_id: i64,
    pub provider_user_id: Option<String>,
    pub role: String,
}

/// Partial update over a user's mutable fields.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub account_setup_complete: Option<bool>,
    pub role: Option<String>,
    pub email: Option<String>,
    pub email_verified_at: Option<NaiveDateTime>,
    pub email_verification_sent_at: Option<NaiveDateTime>,
    pub password_set_at: Option<NaiveDateTime>,
}

pub async fn get_user(db: &DatabaseConnection, id: &str) -> Result<Option<users::Model>, AppError> {
    Ok(Users::find_by_id(id).one(db).await?)
}

/// Find the user who previously connected this provider account to the
/// merchant. Used by the OAuth login flow.
pub async fn get_user_by_merchant_and_provider(
    db: &DatabaseConnection,
    merchant_id: i64,
    provider_user_id: &str,
) -> Result<Option<users::Model>, AppError> {
    Ok(Users::find()
        .filter(users::Column::MerchantId.eq(merchant_id))
        .filter(users::Column::ProviderUserId.eq(provider_user_id))
        .one(db)
        .await?)
}

pub async fn create_user(
    db: &DatabaseConnection,
    input: CreateUser,
) -> Result<users::Model, AppError> {
    let now = Utc::now().naive_utc();

    let model = users::ActiveModel {
        id: Set(input.id),
        merchant_id: Set(input.merchant_id),
        account_setup_complete: Set(false),
        provider_user_id: Set(input.provider_user_id),
        role: Set(input.role),
        email: Set(None),
        email_verified_at: Set(None),
        email_verification_sent_at: Set(None),
        password_set_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    Ok(model.insert(db).await?)
}

pub async fn update_user(
    db: &DatabaseConnection,
    id: &str,
    update: UserUpdate,
) -> Result<users::Model, AppError> {
    let user = get_user(db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;

    let mut model = user.into_active_model();

    if let Some(account_setup_complete) = update.account_setup_complete {
        model.account_setup_complete = Set(account_setup_complete);
    }
    if let Some(role) = update.role {
        model.role = Set(role);
    }
    if let Some(email) = update.email {
        model.email = Set(Some(email));
    }
    if let Some(email_verified_at) = update.email_verified_at {
        model.email_verified_at = Set(Some(email_verified_at));
    }
    if let Some(email_verification_sent_at) = update.email_verification_sent_at {
        model.email_verification_sent_at = Set(Some(email_verification_sent_at));
    }
    if let Some(password_set_at) = update.password_set_at {
        model.password_set_at = Set(Some(password_set_at));
    }

    model.updated_at = Set(Utc::now().naive_utc());

    Ok(model.update(db).await?)
}
