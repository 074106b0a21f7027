//! Service credentials, read from the process environment only
//!
//! | Variable                | Used by          |
//! |-------------------------|------------------|
//! | `OPENAI_API_KEY`        | fact generation  |
//! | `X_CONSUMER_KEY`        | publishing       |
//! | `X_CONSUMER_SECRET`     | publishing       |
//! | `X_ACCESS_TOKEN`        | publishing       |
//! | `X_ACCESS_TOKEN_SECRET` | publishing       |
//! | `SLACK_BOT_TOKEN`       | notification     |
//!
//! Values are wrapped in `SecretString` so they are zeroed on drop and never
//! show up in `Debug` output or logs.

use secrecy::SecretString;

use crate::error::{ConfigError, Result};

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const X_CONSUMER_KEY: &str = "X_CONSUMER_KEY";
pub const X_CONSUMER_SECRET: &str = "X_CONSUMER_SECRET";
pub const X_ACCESS_TOKEN: &str = "X_ACCESS_TOKEN";
pub const X_ACCESS_TOKEN_SECRET: &str = "X_ACCESS_TOKEN_SECRET";
pub const SLACK_BOT_TOKEN: &str = "SLACK_BOT_TOKEN";

/// The four OAuth 1.0a components for the posting API
#[derive(Debug)]
pub struct OAuthCredentials {
    pub consumer_key: SecretString,
    pub consumer_secret: SecretString,
    pub access_token: SecretString,
    pub access_token_secret: SecretString,
}

impl OAuthCredentials {
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        access_token: impl Into<String>,
        access_token_secret: impl Into<String>,
    ) -> Self {
        Self {
            consumer_key: SecretString::from(consumer_key.into()),
            consumer_secret: SecretString::from(consumer_secret.into()),
            access_token: SecretString::from(access_token.into()),
            access_token_secret: SecretString::from(access_token_secret.into()),
        }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self {
            consumer_key: require(X_CONSUMER_KEY)?,
            consumer_secret: require(X_CONSUMER_SECRET)?,
            access_token: require(X_ACCESS_TOKEN)?,
            access_token_secret: require(X_ACCESS_TOKEN_SECRET)?,
        })
    }
}

/// Everything the daily routine needs
#[derive(Debug)]
pub struct Credentials {
    pub openai_api_key: SecretString,
    pub oauth: OAuthCredentials,
    pub slack_bot_token: SecretString,
}

impl Credentials {
    /// Read all credentials, failing on the first missing one
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            openai_api_key: require(OPENAI_API_KEY)?,
            oauth: OAuthCredentials::from_env()?,
            slack_bot_token: require(SLACK_BOT_TOKEN)?,
        })
    }
}

/// Read a non-empty environment variable as a secret
pub fn require(name: &str) -> Result<SecretString> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(SecretString::from(value)),
        _ => Err(ConfigError::MissingCredential(name.to_string()).into()),
    }
}
