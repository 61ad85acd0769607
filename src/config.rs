// Runtime configuration, read from environment variables (a `.env` file is
// loaded into the environment by `main` before this runs).

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Root folder holding one sub-folder per log period.
pub const DEFAULT_ROOT_FOLDER_ID: &str = "1AUi1RxwYNW_jqJmaIWbONshfU_RmRp3l";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_TOKEN_FILE: &str = "token.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
    #[error("{0} must be set when GOOGLE_AUTH_MODE={1}")]
    Missing(&'static str, &'static str),
}

/// Where Google credentials come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthConfig {
    /// Service account key, as a file path or inline JSON.
    ServiceAccount {
        key_path: Option<PathBuf>,
        key_json: Option<String>,
    },
    /// Authorized-user `token.json` that is refreshed in place.
    AuthorizedUser { token_file: PathBuf },
    /// Client id, secret and refresh token injected through the environment.
    Env,
    /// A ready-made access token.
    Static { token: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: IpAddr,
    pub port: u16,
    pub root_folder_id: String,
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let host_raw = get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let host = host_raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name: "HOST",
            value: host_raw,
        })?;

        let root_folder_id =
            get("DRIVE_ROOT_FOLDER_ID").unwrap_or_else(|| DEFAULT_ROOT_FOLDER_ID.to_string());

        let mode = get("GOOGLE_AUTH_MODE").unwrap_or_else(|| "authorized_user".to_string());
        let mode_key = mode.trim().to_ascii_lowercase();
        let auth = match mode_key.as_str() {
            "service_account" => {
                let key_path = get("GOOGLE_SERVICE_ACCOUNT_KEY").map(PathBuf::from);
                let key_json = get("GOOGLE_SERVICE_ACCOUNT_JSON");
                if key_path.is_none() && key_json.is_none() {
                    return Err(ConfigError::Missing(
                        "GOOGLE_SERVICE_ACCOUNT_KEY or GOOGLE_SERVICE_ACCOUNT_JSON",
                        "service_account",
                    ));
                }
                AuthConfig::ServiceAccount { key_path, key_json }
            }
            "authorized_user" => AuthConfig::AuthorizedUser {
                token_file: get("GOOGLE_TOKEN_FILE")
                    .unwrap_or_else(|| DEFAULT_TOKEN_FILE.to_string())
                    .into(),
            },
            "env" => AuthConfig::Env,
            "static" => AuthConfig::Static {
                token: get("GOOGLE_ACCESS_TOKEN")
                    .ok_or(ConfigError::Missing("GOOGLE_ACCESS_TOKEN", "static"))?,
            },
            _ => {
                return Err(ConfigError::Invalid {
                    name: "GOOGLE_AUTH_MODE",
                    value: mode,
                })
            }
        };

        Ok(Self {
            host,
            port,
            root_folder_id,
            auth,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:5000");
        assert_eq!(config.root_folder_id, DEFAULT_ROOT_FOLDER_ID);
        assert_eq!(
            config.auth,
            AuthConfig::AuthorizedUser {
                token_file: PathBuf::from("token.json")
            }
        );
    }

    #[test]
    fn reads_port_and_root_folder() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("HOST", "127.0.0.1"),
            ("DRIVE_ROOT_FOLDER_ID", "abc"),
        ])
        .unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.root_folder_id, "abc");
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for PORT: eighty");
    }

    #[test]
    fn selects_auth_mode() {
        let config = config_from(&[("GOOGLE_AUTH_MODE", "env")]).unwrap();
        assert_eq!(config.auth, AuthConfig::Env);

        let config = config_from(&[
            ("GOOGLE_AUTH_MODE", "Service_Account"),
            ("GOOGLE_SERVICE_ACCOUNT_KEY", "/secrets/key.json"),
        ])
        .unwrap();
        assert_eq!(
            config.auth,
            AuthConfig::ServiceAccount {
                key_path: Some(PathBuf::from("/secrets/key.json")),
                key_json: None,
            }
        );

        let config = config_from(&[
            ("GOOGLE_AUTH_MODE", "static"),
            ("GOOGLE_ACCESS_TOKEN", "ya29.x"),
        ])
        .unwrap();
        assert_eq!(
            config.auth,
            AuthConfig::Static {
                token: "ya29.x".to_string()
            }
        );
    }

    #[test]
    fn auth_mode_errors() {
        assert!(matches!(
            config_from(&[("GOOGLE_AUTH_MODE", "interactive")]),
            Err(ConfigError::Invalid { name: "GOOGLE_AUTH_MODE", .. })
        ));
        assert!(matches!(
            config_from(&[("GOOGLE_AUTH_MODE", "static")]),
            Err(ConfigError::Missing("GOOGLE_ACCESS_TOKEN", "static"))
        ));
        assert!(matches!(
            config_from(&[("GOOGLE_AUTH_MODE", "service_account")]),
            Err(ConfigError::Missing(_, "service_account"))
        ));
    }
}
