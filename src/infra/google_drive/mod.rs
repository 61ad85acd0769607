// Google Drive infra layer.
// - `credentials.rs` mints OAuth2 access tokens (several interchangeable sources).
// - `drive_client.rs` talks to the Drive v3 HTTP API.

pub mod credentials;
pub mod drive_client;

use std::sync::Arc;

use crate::config::AuthConfig;
pub use credentials::{
    AccessTokenProvider, AuthError, RefreshTokenAuth, ServiceAccountAuth, StaticToken,
};
pub use drive_client::GoogleDriveClient;

/// Builds the credential provider selected in configuration.
pub async fn token_provider(auth: &AuthConfig) -> Result<Arc<dyn AccessTokenProvider>, AuthError> {
    let provider: Arc<dyn AccessTokenProvider> = match auth {
        AuthConfig::ServiceAccount { key_path, key_json } => {
            let sa = match (key_path, key_json) {
                (Some(path), _) => ServiceAccountAuth::from_file(path).await?,
                (None, Some(json)) => ServiceAccountAuth::from_json(json)?,
                (None, None) => {
                    return Err(AuthError::InvalidCredentials(
                        "no service account key configured".to_string(),
                    ))
                }
            };
            tracing::info!(email = sa.client_email(), "Using service account credentials");
            Arc::new(sa)
        }
        AuthConfig::AuthorizedUser { token_file } => {
            tracing::info!(path = %token_file.display(), "Using authorized-user token file");
            Arc::new(RefreshTokenAuth::from_token_file(token_file.clone()).await?)
        }
        AuthConfig::Env => {
            tracing::info!("Using refresh token from environment");
            Arc::new(RefreshTokenAuth::from_env()?)
        }
        AuthConfig::Static { token } => {
            tracing::info!("Using static access token");
            Arc::new(StaticToken::new(token.clone())?)
        }
    };

    Ok(provider)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builds_static_provider() {
        let provider = token_provider(&AuthConfig::Static {
            token: "abc".to_string(),
        })
        .await
        .unwrap();
        assert_eq!(provider.access_token().await.unwrap(), "abc");
    }

    #[tokio::test]
    async fn missing_token_file_fails_at_startup() {
        let dir = tempfile::tempdir().unwrap();
        let result = token_provider(&AuthConfig::AuthorizedUser {
            token_file: dir.path().join("token.json"),
        })
        .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials(_))));
    }
}
