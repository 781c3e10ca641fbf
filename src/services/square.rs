//! Square API client.
//!
//! Handles:
//! - Merchant profile and location lookup
//! - Full catalog listing with cursor pagination
//! - OAuth code exchange and refresh-token rotation

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::error::AppError;
use crate::models::merchant::Location;

/// Provider discriminator stored on merchants and items.
pub const PROVIDER_SQUARE: &str = "square";

/// OAuth scopes requested at install time.
pub const REQUIRED_SCOPES: &[&str] = &["MERCHANT_PROFILE_READ", "ITEMS_READ"];

/// A hung provider call fails the merchant instead of stalling its batch.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Merchant profile as resolved from the provider.
#[derive(Debug, Clone)]
pub struct MerchantInfo {
    pub id: String,
    pub name: String,
    pub locations: Vec<Location>,
}

/// OAuth token grant, from either code exchange or refresh.
///
/// The provider rotates refresh tokens: the one returned here must replace
/// the stored one.
#[derive(Debug, Clone)]
pub struct TokenResponse {
    pub merchant_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: NaiveDateTime,
    pub scopes: Vec<String>,
}

/// Seam between the sync/refresh engines and the concrete provider client.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Resolve the authenticated merchant's profile and locations.
    async fn fetch_merchant_info(&self, access_token: &str) -> Result<MerchantInfo, AppError>;

    /// Fetch the complete catalog, following pagination to exhaustion.
    /// All-or-nothing: a failed page loses the whole fetch.
    async fn fetch_catalog_items(&self, access_token: &str) -> Result<Vec<Value>, AppError>;

    /// Exchange a refresh token for a fresh token pair.
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenResponse, AppError>;

    /// Exchange an authorization code for the initial token pair.
    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AppError>;
}

#[derive(Clone)]
pub struct SquareService {
    client: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
}

impl SquareService {
    pub fn new(client_id: String, client_secret: String, base_url: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            base_url,
            client_id,
            client_secret,
        }
    }

    /// Authorize URL the browser is redirected to at the start of a flow.
    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}/oauth2/authorize?client_id={}&scope={}&session=false&state={}",
            self.base_url,
            self.client_id,
            REQUIRED_SCOPES.join("+"),
            state
        )
    }

    async fn token_request(&self, grant: &[(&str, &str)]) -> Result<TokenResponse, AppError> {
        let mut body = std::collections::HashMap::from([
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ]);
        for (key, value) in grant.iter().copied() {
            body.insert(key, value);
        }

        let response = self
            .client
            .post(format!("{}/oauth2/token", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("token request failed: {e}")))?;

        let body: TokenResponseBody = check_response_json(response).await?;

        let expires_at = chrono::DateTime::parse_from_rfc3339(&body.expires_at)
            .map_err(|e| AppError::Provider(format!("unparseable token expiry: {e}")))?
            .naive_utc();

        Ok(TokenResponse {
            merchant_id: body.merchant_id,
            access_token: body.access_token,
            refresh_token: body.refresh_token,
            expires_at,
            scopes: body.scopes,
        })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        access_token: &str,
        query: &[(&str, &str)],
    ) -> Result<T, AppError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::Provider(e.to_string()))?;

        check_response_json(response).await
    }
}

#[async_trait]
impl CatalogProvider for SquareService {
    async fn fetch_merchant_info(&self, access_token: &str) -> Result<MerchantInfo, AppError> {
        let merchants: ListMerchantsResponse =
            self.get_json("/v2/merchants", access_token, &[]).await?;

        let merchant = merchants
            .merchant
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Provider("no merchant on account".to_string()))?;

        let locations: ListLocationsResponse =
            self.get_json("/v2/locations", access_token, &[]).await?;

        let locations = locations
            .locations
            .into_iter()
            .map(|loc| Location {
                id: loc.id.unwrap_or_default(),
                name: loc.name.unwrap_or_default(),
                address: loc.address.as_ref().and_then(display_address),
                timezone: loc.timezone,
                capabilities: loc.capabilities,
            })
            .collect();

        Ok(MerchantInfo {
            id: merchant.id.unwrap_or_default(),
            name: merchant.business_name.unwrap_or_default(),
            locations,
        })
    }

    async fn fetch_catalog_items(&self, access_token: &str) -> Result<Vec<Value>, AppError> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut query = vec![("types", "ITEM")];
            if let Some(c) = cursor.as_deref() {
                query.push(("cursor", c));
            }

            let page: ListCatalogResponse =
                self.get_json("/v2/catalog/list", access_token, &query).await?;

            items.extend(page.objects);

            match page.cursor {
                Some(c) if !c.is_empty() => cursor = Some(c),
                _ => break,
            }
        }

        tracing::debug!(count = items.len(), "fetched full catalog");
        Ok(items)
    }

    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenResponse, AppError> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AppError> {
        self.token_request(&[("grant_type", "authorization_code"), ("code", code)])
            .await
    }
}

/// Join the non-empty address components into one display string.
fn display_address(addr: &SquareAddress) -> Option<String> {
    let parts: Vec<&str> = [
        addr.address_line_1.as_deref(),
        addr.address_line_2.as_deref(),
        addr.locality.as_deref(),
        addr.administrative_district_level_1.as_deref(),
        addr.postal_code.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|part| !part.is_empty())
    .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Provider(format!("HTTP {status}: {body}")));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::Provider(format!("JSON parse error: {e}")))
}

#[derive(Debug, Deserialize)]
struct TokenResponseBody {
    access_token: String,
    refresh_token: String,
    expires_at: String,
    merchant_id: String,
    #[serde(default)]
    scopes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ListCatalogResponse {
    #[serde(default)]
    objects: Vec<Value>,
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListMerchantsResponse {
    #[serde(default)]
    merchant: Vec<SquareMerchant>,
}

#[derive(Debug, Deserialize)]
struct SquareMerchant {
    id: Option<String>,
    business_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListLocationsResponse {
    #[serde(default)]
    locations: Vec<SquareLocation>,
}

#[derive(Debug, Deserialize)]
struct SquareLocation {
    id: Option<String>,
    name: Option<String>,
    address: Option<SquareAddress>,
    timezone: Option<String>,
    capabilities: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct SquareAddress {
    address_line_1: Option<String>,
    address_line_2: Option<String>,
    locality: Option<String>,
    administrative_district_level_1: Option<String>,
    postal_code: Option<String>,
}
