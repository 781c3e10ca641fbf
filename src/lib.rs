// src/lib.rs

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::Config;
use crate::services::oauth_state::StateStore;
use crate::services::square::SquareService;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub square: SquareService,
    pub config: Arc<Config>,
    /// One-time CSRF states for in-flight OAuth flows
    pub oauth_states: StateStore,
}

pub mod config;
pub mod error;

pub mod entities {
    pub mod prelude;

    pub mod items;
    pub mod merchants;
    pub mod sync_status;
    pub mod users;
}

pub mod services {
    pub mod auth;
    pub mod catalog_sync;
    pub mod items;
    pub mod merchants;
    pub mod oauth_state;
    pub mod square;
    pub mod sync_status;
    pub mod telemetry;
    pub mod token_refresh;
    pub mod users;
}

pub mod models {
    pub mod item;
    pub mod merchant;
    pub mod oauth;
    pub mod user;
}

pub mod handlers {
    pub mod item;
    pub mod merchant;
    pub mod oauth;
    pub mod user;
}

pub mod jobs {
    pub mod items_sync_job;
    pub mod token_refresh_job;
}
