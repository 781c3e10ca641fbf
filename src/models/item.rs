use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::entities::items;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResponse {
    pub id: i64,
    pub provider_item_id: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub is_available: bool,
    pub provider_updated_at: Option<NaiveDateTime>,
    pub updated_at: NaiveDateTime,
}

impl From<items::Model> for ItemResponse {
    fn from(model: items::Model) -> Self {
        Self {
            id: model.id,
            provider_item_id: model.provider_item_id,
            name: model.name,
            description: model.description,
            category_id: model.category_id,
            category_name: model.category_name,
            is_available: model.is_available,
            provider_updated_at: model.provider_updated_at,
            updated_at: model.updated_at,
        }
    }
}

/// Outcome of a manual catalog sync request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResponse {
    pub processed: usize,
    pub errors: usize,
    pub deleted: u64,
    pub skipped: bool,
}
