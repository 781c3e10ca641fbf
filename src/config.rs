//! Application configuration loaded once from environment variables.

use std::env;

use crate::error::AppError;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string
    pub database_url: String,
    /// Square OAuth application ID (public)
    pub square_client_id: String,
    /// Square OAuth application secret
    pub square_client_secret: String,
    /// Square API base URL (sandbox or production)
    pub square_base_url: String,
    /// Frontend URL for OAuth redirects
    pub web_url: String,
    /// HS256 signing key for session tokens
    pub jwt_signing_key: Vec<u8>,
    /// Server port
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables (`.env` honored).
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: require("DATABASE_URL")?,
            square_client_id: require("SQUARE_CLIENT_ID")?,
            square_client_secret: require("SQUARE_CLIENT_SECRET")?,
            square_base_url: env::var("SQUARE_BASE_URL")
                .unwrap_or_else(|_| "https://connect.squareup.com".to_string()),
            web_url: env::var("WEB_URL").unwrap_or_else(|_| "http://localhost:5173".to_string()),
            jwt_signing_key: require("JWT_SIGNING_KEY")?.into_bytes(),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
        })
    }
}

fn require(name: &'static str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Config(format!("{name} must be set")))
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            square_client_id: "test_client_id".to_string(),
            square_client_secret: "test_client_secret".to_string(),
            square_base_url: "https://connect.squareupsandbox.com".to_string(),
            web_url: "http://localhost:5173".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!!".to_vec(),
            port: 8080,
        }
    }
}
