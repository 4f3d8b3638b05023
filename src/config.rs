//! Credential settings resolved from the environment.

use crate::error::{Result, VideoGenError};
use crate::types::Provider;

/// Environment variable holding the Replicate API token.
pub const REPLICATE_API_TOKEN_ENV: &str = "REPLICATE_API_TOKEN";

/// Environment variable holding the Google API key.
pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Fallback environment variable for the Google API key.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Vendor secrets needed to construct clients.
#[derive(Clone, Default)]
pub struct Settings {
    /// Replicate API token.
    pub replicate_api_token: Option<String>,
    /// Google (Gemini API) key.
    pub google_api_key: Option<String>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("replicate_api_token", &self.replicate_api_token.as_ref().map(|_| "***"))
            .field("google_api_key", &self.google_api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Settings {
    /// Reads settings from the process environment. Empty values count as unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings through `lookup`, treating blank values as unset.
    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            replicate_api_token: non_empty(REPLICATE_API_TOKEN_ENV),
            google_api_key: non_empty(GOOGLE_API_KEY_ENV)
                .or_else(|| non_empty(GEMINI_API_KEY_ENV)),
        }
    }

    /// Sets the Replicate token.
    pub fn with_replicate_api_token(mut self, token: impl Into<String>) -> Self {
        self.replicate_api_token = Some(token.into());
        self
    }

    /// Sets the Google API key.
    pub fn with_google_api_key(mut self, key: impl Into<String>) -> Self {
        self.google_api_key = Some(key.into());
        self
    }

    /// Checks that the secrets `provider` needs are present.
    ///
    /// Providers that need no secrets handled here pass unconditionally.
    pub fn validate_for_provider(&self, provider: &str) -> Result<()> {
        let provider: Provider = provider.parse()?;
        let (value, env) = match provider {
            Provider::Replicate => (&self.replicate_api_token, REPLICATE_API_TOKEN_ENV),
            Provider::Google => (&self.google_api_key, GOOGLE_API_KEY_ENV),
            _ => return Ok(()),
        };
        match value {
            Some(v) if !v.trim().is_empty() => Ok(()),
            _ => Err(VideoGenError::Credential(format!(
                "{env} is required for provider '{provider}'"
            ))),
        }
    }
}
