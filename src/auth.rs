use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::error::SheetsError;

pub const DRIVE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Upper bound on how long one authenticated session is reused.
pub const SESSION_TTL: Duration = Duration::from_secs(300);
/// Tokens are dropped this long before the server-side expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Service account key file, as downloaded from the cloud console.
#[derive(Clone, Deserialize, Serialize)]
pub struct ServiceAccountKey {
    #[serde(default, rename = "type")]
    pub key_type: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub private_key: String,
    #[serde(default)]
    pub client_email: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

impl ServiceAccountKey {
    pub fn from_json(raw: &str) -> Result<Self, SheetsError> {
        serde_json::from_str(raw).map_err(|err| SheetsError::InvalidCredentials(err.to_string()))
    }

    pub fn validate(&self) -> Result<(), SheetsError> {
        if self.client_email.trim().is_empty() {
            return Err(SheetsError::InvalidCredentials(
                "client_email is missing".to_string(),
            ));
        }
        if self.private_key.trim().is_empty() {
            return Err(SheetsError::InvalidCredentials(
                "private_key is missing".to_string(),
            ));
        }
        if let Some(kind) = &self.key_type {
            if kind != "service_account" {
                return Err(SheetsError::InvalidCredentials(format!(
                    "expected a service_account key, got {kind}"
                )));
            }
        }
        Ok(())
    }

    pub fn token_uri(&self) -> &str {
        self.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI)
    }
}

/// Anything able to hand out a bearer token for Drive requests.
pub trait TokenSource: Send + Sync {
    fn access_token(&self) -> Result<String, SheetsError>;
}

/// A fixed token, for tests and for tokens minted outside this tool.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl TokenSource for StaticToken {
    fn access_token(&self) -> Result<String, SheetsError> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    valid_until: Instant,
}

/// Service account session: signs a JWT assertion, trades it for an access
/// token and reuses that token for at most [`SESSION_TTL`]. Refreshing is
/// idempotent, so two callers racing past an expired entry both succeed.
pub struct ServiceAccountAuth {
    key: ServiceAccountKey,
    client: Client,
    ttl: Duration,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub fn new(key: ServiceAccountKey, client: Client) -> Result<Self, SheetsError> {
        key.validate()?;
        Ok(Self {
            key,
            client,
            ttl: SESSION_TTL,
            cached: Mutex::new(None),
        })
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Forgets the cached token; the next request re-authenticates.
    pub fn invalidate(&self) {
        if let Ok(mut guard) = self.cached.lock() {
            *guard = None;
        }
    }

    fn signed_assertion(&self) -> Result<String, SheetsError> {
        let now = chrono::Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: DRIVE_READONLY_SCOPE,
            aud: self.key.token_uri(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();
        let encoding_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|err| SheetsError::InvalidCredentials(err.to_string()))?;
        jsonwebtoken::encode(&header, &claims, &encoding_key)
            .map_err(|err| SheetsError::Auth(err.to_string()))
    }

    fn request_token(&self) -> Result<CachedToken, SheetsError> {
        let assertion = self.signed_assertion()?;
        tracing::debug!(token_uri = self.key.token_uri(), "requesting access token");
        let response = self
            .client
            .post(self.key.token_uri())
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .map_err(|err| SheetsError::Auth(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "token request failed".to_string());
            return Err(SheetsError::Auth(format!("status {status}: {message}")));
        }
        let token: TokenResponse = response
            .json()
            .map_err(|err| SheetsError::Auth(err.to_string()))?;

        let lifetime = token
            .expires_in
            .map(|secs| Duration::from_secs(secs).saturating_sub(EXPIRY_MARGIN))
            .map(|server| server.min(self.ttl))
            .unwrap_or(self.ttl);
        Ok(CachedToken {
            value: token.access_token,
            valid_until: Instant::now() + lifetime,
        })
    }
}

impl TokenSource for ServiceAccountAuth {
    fn access_token(&self) -> Result<String, SheetsError> {
        if let Ok(guard) = self.cached.lock() {
            if let Some(token) = guard.as_ref() {
                if Instant::now() < token.valid_until {
                    return Ok(token.value.clone());
                }
            }
        }

        let fresh = self.request_token()?;
        let value = fresh.value.clone();
        if let Ok(mut guard) = self.cached.lock() {
            *guard = Some(fresh);
        }
        tracing::debug!("access token refreshed");
        Ok(value)
    }
}
