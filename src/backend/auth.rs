// SPDX-License-Identifier: GPL-3.0-only

//! Service-account authentication (OAuth 2.0 JWT bearer grant).

use super::error::{AnalyticsError, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub const ANALYTICS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/analytics.readonly";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Re-mint the token this long before Google would reject it.
const EXPIRY_BUFFER_SECS: i64 = 60;

/// The fields of a service-account JSON key that the grant needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| AnalyticsError::KeyFile {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|e| AnalyticsError::InvalidKey(e.to_string()))
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(EXPIRY_BUFFER_SECS) > now
    }
}

/// Authenticated handle shared by every request of the process.
///
/// Cloning is cheap; clones share the cached bearer token.
#[derive(Clone)]
pub struct Session {
    http: reqwest::Client,
    key: Arc<ServiceAccountKey>,
    scopes: Arc<str>,
    token: Arc<Mutex<Option<AccessToken>>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("client_email", &self.key.client_email)
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

/// Load the key file and exchange a signed assertion for the first token.
pub async fn authenticate(http: reqwest::Client, key_file: &Path, scopes: &[&str]) -> Result<Session> {
    let key = ServiceAccountKey::from_file(key_file)?;
    let session = Session::new(http, key, scopes);
    session.bearer().await?;
    info!(account = %session.key.client_email, "Authenticated service account");
    Ok(session)
}

impl Session {
    pub fn new(http: reqwest::Client, key: ServiceAccountKey, scopes: &[&str]) -> Self {
        Self {
            http,
            key: Arc::new(key),
            scopes: Arc::from(scopes.join(" ")),
            token: Arc::new(Mutex::new(None)),
        }
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Current bearer token, minting a new one when the cached token is about to expire.
    pub async fn bearer(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        let now = Utc::now();

        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        let token = self.exchange(now).await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    fn assertion(&self, now: DateTime<Utc>) -> Result<String> {
        let iat = now.timestamp();
        let claims = Claims {
            iss: &self.key.client_email,
            scope: &self.scopes,
            aud: &self.key.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        let signing_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| AnalyticsError::InvalidKey(e.to_string()))?;
        jsonwebtoken::encode(&header, &claims, &signing_key).map_err(|e| AnalyticsError::Signing(e.to_string()))
    }

    async fn exchange(&self, now: DateTime<Utc>) -> Result<AccessToken> {
        debug!(token_uri = %self.key.token_uri, "Requesting access token");
        let assertion = self.assertion(now)?;

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalyticsError::Auth(format!("token endpoint returned HTTP {}", status.as_u16())));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AnalyticsError::Parse(e.to_string()))?;

        Ok(AccessToken {
            value: body.access_token,
            expires_at: now + Duration::seconds(body.expires_in),
        })
    }
}
