//! One-time CSRF states for OAuth flows.
//!
//! States live in an in-memory TTL cache and are consumed on first use, so a
//! replayed callback fails validation.

use std::time::Duration;

use moka::future::Cache;
use uuid::Uuid;

use crate::models::oauth::OAuthFlow;

/// States expire if the user abandons the provider's consent screen.
const STATE_TTL: Duration = Duration::from_secs(600);

pub type StateStore = Cache<String, OAuthFlow>;

pub fn new_state_store() -> StateStore {
    Cache::builder()
        .max_capacity(10_000)
        .time_to_live(STATE_TTL)
        .build()
}

/// Issue a fresh state bound to the requested flow.
pub async fn issue(store: &StateStore, flow: OAuthFlow) -> String {
    let state = Uuid::new_v4().to_string();
    store.insert(state.clone(), flow).await;
    state
}

/// Validate and consume a state. Returns the flow it was issued for, or
/// `None` if the state is unknown, expired, or already used.
pub async fn consume(store: &StateStore, state: &str) -> Option<OAuthFlow> {
    let flow = store.get(state).await?;
    store.invalidate(state).await;
    Some(flow)
}
