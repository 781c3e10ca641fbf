use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::entities::merchants;

/// Business location as reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Vec<String>>,
}

/// Merchant profile returned to the web client. Tokens never leave the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantResponse {
    pub id: i64,
    pub name: String,
    pub provider: String,
    pub locations: Vec<Location>,
    pub onboarding_completed: bool,
    pub scopes_mismatch: bool,
    pub connected_at: NaiveDateTime,
}

impl From<merchants::Model> for MerchantResponse {
    fn from(model: merchants::Model) -> Self {
        let locations = serde_json::from_value(model.locations).unwrap_or_default();

        Self {
            id: model.id,
            name: model.name,
            provider: model.provider,
            locations,
            onboarding_completed: model.onboarding_completed,
            scopes_mismatch: model.scopes_mismatch,
            connected_at: model.connected_at,
        }
    }
}
