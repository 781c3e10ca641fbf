//! `SeaORM` Entity for merchants table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "merchants")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub provider: String,
    pub provider_merchant_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub token_expires_at: DateTime,
    /// JSON array of granted OAuth scope strings
    pub token_scopes: Json,
    /// JSON array of provider locations
    pub locations: Json,
    pub connected_at: DateTime,
    pub last_refreshed_at: Option<DateTime>,
    pub refresh_failure_count: i32,
    pub revoked: bool,
    pub scopes_mismatch: bool,
    pub onboarding_completed: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
