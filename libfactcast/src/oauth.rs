//! OAuth 1.0a request signing (HMAC-SHA1)
//!
//! Only the `Authorization` header is produced. Parameters come from the
//! request URL's query string plus any form parameters the caller passes;
//! a JSON body is never part of the signature.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::Url;
use secrecy::ExposeSecret;
use sha1::Sha1;

use crate::credentials::OAuthCredentials;
use crate::error::PublishError;

/// RFC 3986 unreserved characters stay literal, everything else is escaped
const RFC3986: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const VERSION: &str = "1.0";
const NONCE_LEN: usize = 32;

pub fn encode(value: &str) -> String {
    utf8_percent_encode(value, RFC3986).to_string()
}

pub fn generate_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}

pub struct OAuthSigner<'a> {
    credentials: &'a OAuthCredentials,
}

impl<'a> OAuthSigner<'a> {
    pub fn new(credentials: &'a OAuthCredentials) -> Self {
        Self { credentials }
    }

    /// `Authorization` header value with a fresh nonce and the current time
    pub fn authorization(&self, method: &str, url: &str) -> Result<String, PublishError> {
        self.authorization_with(
            method,
            url,
            &[],
            &generate_nonce(),
            chrono::Utc::now().timestamp(),
        )
    }

    /// `Authorization` header value for fixed nonce and timestamp
    pub fn authorization_with(
        &self,
        method: &str,
        url: &str,
        form_params: &[(&str, &str)],
        nonce: &str,
        timestamp: i64,
    ) -> Result<String, PublishError> {
        let timestamp = timestamp.to_string();
        let mut oauth_params = vec![
            (
                "oauth_consumer_key",
                self.credentials.consumer_key.expose_secret().to_string(),
            ),
            ("oauth_nonce", nonce.to_string()),
            ("oauth_signature_method", SIGNATURE_METHOD.to_string()),
            ("oauth_timestamp", timestamp),
            (
                "oauth_token",
                self.credentials.access_token.expose_secret().to_string(),
            ),
            ("oauth_version", VERSION.to_string()),
        ];

        let signature = self.signature(method, url, &oauth_params, form_params)?;
        oauth_params.push(("oauth_signature", signature));
        oauth_params.sort();

        let fields: Vec<String> = oauth_params
            .iter()
            .map(|(name, value)| format!("{}=\"{}\"", encode(name), encode(value)))
            .collect();

        Ok(format!("OAuth {}", fields.join(", ")))
    }

    fn signature(
        &self,
        method: &str,
        url: &str,
        oauth_params: &[(&str, String)],
        form_params: &[(&str, &str)],
    ) -> Result<String, PublishError> {
        let base = signature_base_string(method, url, oauth_params, form_params)?;
        let key = format!(
            "{}&{}",
            encode(self.credentials.consumer_secret.expose_secret()),
            encode(self.credentials.access_token_secret.expose_secret())
        );

        let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes())
            .map_err(|e| PublishError::Signing(e.to_string()))?;
        mac.update(base.as_bytes());

        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

/// `METHOD&enc(base url)&enc(sorted, encoded parameters)`
pub fn signature_base_string(
    method: &str,
    url: &str,
    oauth_params: &[(&str, String)],
    form_params: &[(&str, &str)],
) -> Result<String, PublishError> {
    let parsed = Url::parse(url).map_err(|_| PublishError::InvalidEndpoint(url.to_string()))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| PublishError::InvalidEndpoint(url.to_string()))?;
    let base_url = match parsed.port() {
        Some(port) => format!("{}://{}:{}{}", parsed.scheme(), host, port, parsed.path()),
        None => format!("{}://{}{}", parsed.scheme(), host, parsed.path()),
    };

    let mut params: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(name, value)| (encode(&name), encode(&value)))
        .collect();
    params.extend(
        oauth_params
            .iter()
            .map(|(name, value)| (encode(name), encode(value))),
    );
    params.extend(
        form_params
            .iter()
            .map(|(name, value)| (encode(name), encode(value))),
    );
    params.sort();

    let joined: Vec<String> = params
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect();

    Ok(format!(
        "{}&{}&{}",
        method.to_uppercase(),
        encode(&base_url),
        encode(&joined.join("&"))
    ))
}
