use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::entities::users;

/// User roles for role-based access control.
pub mod roles {
    pub const OWNER: &str = "owner";
    pub const ADMIN: &str = "admin";
    pub const MANAGER: &str = "manager";
    pub const STAFF: &str = "staff";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub merchant_id: i64,
    pub role: String,
    pub email: Option<String>,
    pub account_setup_complete: bool,
    pub email_verified_at: Option<NaiveDateTime>,
    pub password_set_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl From<users::Model> for UserResponse {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            merchant_id: model.merchant_id,
            role: model.role,
            email: model.email,
            account_setup_complete: model.account_setup_complete,
            email_verified_at: model.email_verified_at,
            password_set_at: model.password_set_at,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetEmailRequest {
    pub email: String,
}
