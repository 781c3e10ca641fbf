use serde::{Deserialize, Serialize};

/// Which OAuth journey the state was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthFlow {
    /// First-time connection of a provider account
    Install,
    /// Returning merchant signing back in
    Login,
}

impl OAuthFlow {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "install" => Some(Self::Install),
            "login" => Some(Self::Login),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeParams {
    pub flow: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}
