// =============================================================================
// GOOGLE CREDENTIAL PROVIDERS
// =============================================================================
//
// Every request to Drive needs an OAuth2 access token. Where that token comes
// from depends on how the service is deployed, so the Drive client only sees
// the `AccessTokenProvider` trait and `main` picks an implementation:
//
// - `ServiceAccountAuth`  - service account JSON key, JWT bearer grant
// - `RefreshTokenAuth`    - authorized-user `token.json` or environment
//                           variables, refresh-token grant
// - `StaticToken`         - a pre-issued access token, never refreshed
//
// Providers are built once at startup and shared; they cache the access token
// until shortly before it expires.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};

pub const DRIVE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens this close to expiry are treated as already expired.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid or missing credentials: {0}")]
    InvalidCredentials(String),
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),
    #[error("Failed to persist refreshed token: {0}")]
    Persist(#[from] std::io::Error),
}

impl From<serde_json::Error> for AuthError {
    fn from(e: serde_json::Error) -> Self {
        AuthError::InvalidCredentials(e.to_string())
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        AuthError::TokenExchange(e.to_string())
    }
}

/// Anything that can hand out a valid Drive access token.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, AuthError>;
}

/// Access token with its expiry.
#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now + Duration::seconds(EXPIRY_MARGIN_SECS)
    }
}

/// Response from Google's token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
    #[serde(default)]
    refresh_token: Option<String>,
}

fn default_expires_in() -> i64 {
    3600
}

/// Posts a token request and turns a non-2xx answer into an error with the body attached.
async fn exchange(
    client: &Client,
    token_uri: &str,
    form: &[(&str, &str)],
) -> Result<TokenResponse, AuthError> {
    let response = client.post(token_uri).form(form).send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await?;
        return Err(AuthError::TokenExchange(format!("({}): {}", status, text)));
    }

    Ok(response.json().await?)
}

// =============================================================================
// SERVICE ACCOUNT
// =============================================================================

/// Service account credentials from the JSON key file.
#[derive(Debug, Clone, Deserialize)]
struct ServiceAccountCredentials {
    client_email: String,
    private_key: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// JWT claims for the jwt-bearer grant.
#[derive(Debug, Serialize)]
struct JwtClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

/// Signs a JWT with the service account key and exchanges it for an access token.
///
/// The folders and documents must be shared with the service account email.
pub struct ServiceAccountAuth {
    credentials: ServiceAccountCredentials,
    client: Client,
    cached_token: RwLock<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub async fn from_file(path: &Path) -> Result<Self, AuthError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            AuthError::InvalidCredentials(format!("{}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        let credentials: ServiceAccountCredentials = serde_json::from_str(json)?;
        Ok(Self {
            credentials,
            client: Client::new(),
            cached_token: RwLock::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.credentials.client_email
    }

    fn claims(&self, now: DateTime<Utc>) -> JwtClaims {
        JwtClaims {
            iss: self.credentials.client_email.clone(),
            scope: DRIVE_READONLY_SCOPE.to_string(),
            aud: self.credentials.token_uri.clone(),
            iat: now.timestamp(),
            exp: now.timestamp() + 3600,
        }
    }

    async fn fetch_new_token(&self) -> Result<CachedToken, AuthError> {
        let now = Utc::now();

        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| AuthError::InvalidCredentials(e.to_string()))?;
        let jwt = encode(&Header::new(Algorithm::RS256), &self.claims(now), &key)
            .map_err(|e| AuthError::InvalidCredentials(e.to_string()))?;

        let response = exchange(
            &self.client,
            &self.credentials.token_uri,
            &[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", jwt.as_str()),
            ],
        )
        .await?;

        Ok(CachedToken {
            token: response.access_token,
            expires_at: now + Duration::seconds(response.expires_in),
        })
    }
}

#[async_trait]
impl AccessTokenProvider for ServiceAccountAuth {
    async fn access_token(&self) -> Result<String, AuthError> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Utc::now())) {
                return Ok(token.token.clone());
            }
        }

        let mut cached = self.cached_token.write().await;
        // Another request may have refreshed while we waited for the lock.
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            return Ok(token.token.clone());
        }

        tracing::debug!(email = %self.credentials.client_email, "Fetching service account token");
        let token = self.fetch_new_token().await?;
        let value = token.token.clone();
        *cached = Some(token);
        Ok(value)
    }
}

// =============================================================================
// AUTHORIZED USER (REFRESH TOKEN)
// =============================================================================

/// On-disk format of an authorized-user `token.json`.
///
/// Keys this service does not use (`universe_domain`, `account`, ...) are kept
/// in `extra` so that writing the file back after a refresh preserves them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizedUserFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Uses a long-lived refresh token to mint access tokens.
///
/// When built from a token file, each refreshed access token is written back
/// so a restart does not need to refresh again.
pub struct RefreshTokenAuth {
    client: Client,
    state: RwLock<AuthorizedUserFile>,
    token_file: Option<PathBuf>,
    refresh_lock: Mutex<()>,
}

impl RefreshTokenAuth {
    pub fn new(user: AuthorizedUserFile, token_file: Option<PathBuf>) -> Self {
        Self {
            client: Client::new(),
            state: RwLock::new(user),
            token_file,
            refresh_lock: Mutex::new(()),
        }
    }

    pub async fn from_token_file(path: impl Into<PathBuf>) -> Result<Self, AuthError> {
        let path = path.into();
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            AuthError::InvalidCredentials(format!("{}: {}", path.display(), e))
        })?;
        let user: AuthorizedUserFile = serde_json::from_str(&content)?;
        Ok(Self::new(user, Some(path)))
    }

    /// Builds from `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET`, `GOOGLE_REFRESH_TOKEN`
    /// and the optional `GOOGLE_ACCESS_TOKEN` / `GOOGLE_TOKEN_URI`.
    pub fn from_env() -> Result<Self, AuthError> {
        let var = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| AuthError::InvalidCredentials(format!("{} is not set", name)))
        };

        let user = AuthorizedUserFile {
            token: std::env::var("GOOGLE_ACCESS_TOKEN").ok(),
            refresh_token: Some(var("GOOGLE_REFRESH_TOKEN")?),
            token_uri: std::env::var("GOOGLE_TOKEN_URI").unwrap_or_else(|_| default_token_uri()),
            client_id: var("GOOGLE_CLIENT_ID")?,
            client_secret: var("GOOGLE_CLIENT_SECRET")?,
            scopes: vec![DRIVE_READONLY_SCOPE.to_string()],
            expiry: None,
            extra: serde_json::Map::new(),
        };
        Ok(Self::new(user, None))
    }

    /// The current token if it is still usable.
    ///
    /// A token without an expiry (as injected through the environment) is
    /// trusted until the first refresh replaces it.
    fn usable_token(user: &AuthorizedUserFile, now: DateTime<Utc>) -> Option<String> {
        let token = user.token.as_ref()?;
        match user.expiry {
            Some(expiry) if expiry <= now + Duration::seconds(EXPIRY_MARGIN_SECS) => None,
            _ => Some(token.clone()),
        }
    }

    async fn refresh(&self) -> Result<String, AuthError> {
        let user = self.state.read().await.clone();
        let refresh_token = user.refresh_token.as_deref().ok_or_else(|| {
            AuthError::InvalidCredentials(
                "access token expired and no refresh_token is available".to_string(),
            )
        })?;
        tracing::info!("Refreshing expired Google access token");

        let response = exchange(
            &self.client,
            &user.token_uri,
            &[
                ("grant_type", "refresh_token"),
                ("client_id", user.client_id.as_str()),
                ("client_secret", user.client_secret.as_str()),
                ("refresh_token", refresh_token),
            ],
        )
        .await?;

        let mut state = self.state.write().await;
        state.token = Some(response.access_token.clone());
        state.expiry = Some(Utc::now() + Duration::seconds(response.expires_in));
        if let Some(rotated) = response.refresh_token {
            state.refresh_token = Some(rotated);
        }

        if let Some(path) = &self.token_file {
            let json = serde_json::to_string_pretty(&*state)?;
            tokio::fs::write(path, json).await?;
        }

        Ok(response.access_token)
    }
}

#[async_trait]
impl AccessTokenProvider for RefreshTokenAuth {
    async fn access_token(&self) -> Result<String, AuthError> {
        if let Some(token) = Self::usable_token(&*self.state.read().await, Utc::now()) {
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;
        if let Some(token) = Self::usable_token(&*self.state.read().await, Utc::now()) {
            return Ok(token);
        }

        self.refresh().await
    }
}

// =============================================================================
// STATIC TOKEN
// =============================================================================

/// A token handed in from outside; when it expires, requests start failing.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Result<Self, AuthError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(AuthError::InvalidCredentials(
                "access token is empty".to_string(),
            ));
        }
        Ok(Self(token))
    }
}

#[async_trait]
impl AccessTokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String, AuthError> {
        Ok(self.0.clone())
    }
}
