use std::env;
use thiserror::Error;

pub const DEFAULT_SEARCH_API_URL: &str = "https://api.cognitive.microsoft.com/bing/v5.0/images/search";
pub const DEFAULT_TOKEN_URL: &str = "https://login.microsoftonline.com/botframework.com/oauth2/v2.0/token";
pub const DEFAULT_OAUTH_SCOPE: &str = "https://api.botframework.com/.default";
pub const DEFAULT_MAX_ATTACHMENT_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub api_url: String,
    pub api_key: String,
    pub market: String,
}

#[derive(Debug, Clone)]
pub struct AppCredentialsConfig {
    pub app_id: String,
    pub app_password: String,
    pub token_url: String,
    pub scope: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub search: SearchConfig,
    /// `None` runs the bot without platform authentication (emulator).
    pub credentials: Option<AppCredentialsConfig>,
    pub media_auth_domain: String,
    pub max_attachment_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: "PORT",
                reason: e.to_string(),
            })?,
            None => 8080,
        };

        let api_key = get("BING_SEARCH_API_KEY").ok_or(ConfigError::Missing("BING_SEARCH_API_KEY"))?;
        let api_url = get("BING_SEARCH_API_URL").unwrap_or_else(|| DEFAULT_SEARCH_API_URL.to_string());
        url::Url::parse(&api_url).map_err(|e| ConfigError::Invalid {
            name: "BING_SEARCH_API_URL",
            reason: e.to_string(),
        })?;
        let market = get("BING_SEARCH_MARKET").unwrap_or_else(|| "en-us".to_string());

        let credentials = match (get("MICROSOFT_APP_ID"), get("MICROSOFT_APP_PASSWORD")) {
            (Some(app_id), Some(app_password)) => Some(AppCredentialsConfig {
                app_id,
                app_password,
                token_url: get("MICROSOFT_TOKEN_URL").unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
                scope: get("MICROSOFT_OAUTH_SCOPE").unwrap_or_else(|| DEFAULT_OAUTH_SCOPE.to_string()),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("MICROSOFT_APP_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("MICROSOFT_APP_ID")),
        };

        let media_auth_domain = get("MEDIA_AUTH_DOMAIN").unwrap_or_else(|| "skype.com".to_string());
        let max_attachment_bytes = match get("MAX_ATTACHMENT_BYTES") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|e| ConfigError::Invalid {
                name: "MAX_ATTACHMENT_BYTES",
                reason: e.to_string(),
            })?,
            None => DEFAULT_MAX_ATTACHMENT_BYTES,
        };

        Ok(Config {
            port,
            search: SearchConfig { api_url, api_key, market },
            credentials,
            media_auth_domain,
            max_attachment_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let cfg = Config::from_lookup(lookup(&[("BING_SEARCH_API_KEY", "k")])).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.search.api_url, DEFAULT_SEARCH_API_URL);
        assert_eq!(cfg.search.market, "en-us");
        assert!(cfg.credentials.is_none());
        assert_eq!(cfg.media_auth_domain, "skype.com");
        assert_eq!(cfg.max_attachment_bytes, DEFAULT_MAX_ATTACHMENT_BYTES);
    }

    #[test]
    fn missing_key_is_rejected() {
        let err = Config::from_lookup(lookup(&[("PORT", "3978")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("BING_SEARCH_API_KEY")));
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let err = Config::from_lookup(lookup(&[("BING_SEARCH_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn half_configured_credentials_are_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("BING_SEARCH_API_KEY", "k"),
            ("MICROSOFT_APP_ID", "app"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("MICROSOFT_APP_PASSWORD")));
    }

    #[test]
    fn credentials_pick_up_defaults() {
        let cfg = Config::from_lookup(lookup(&[
            ("BING_SEARCH_API_KEY", "k"),
            ("MICROSOFT_APP_ID", "app"),
            ("MICROSOFT_APP_PASSWORD", "secret"),
            ("PORT", "3978"),
        ]))
        .unwrap();
        let creds = cfg.credentials.unwrap();
        assert_eq!(creds.app_id, "app");
        assert_eq!(creds.token_url, DEFAULT_TOKEN_URL);
        assert_eq!(creds.scope, DEFAULT_OAUTH_SCOPE);
        assert_eq!(cfg.port, 3978);
    }

    #[test]
    fn attachment_limit_is_configurable() {
        let cfg = Config::from_lookup(lookup(&[
            ("BING_SEARCH_API_KEY", "k"),
            ("MAX_ATTACHMENT_BYTES", "1048576"),
        ]))
        .unwrap();
        assert_eq!(cfg.max_attachment_bytes, 1_048_576);

        let err = Config::from_lookup(lookup(&[
            ("BING_SEARCH_API_KEY", "k"),
            ("MAX_ATTACHMENT_BYTES", "lots"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "MAX_ATTACHMENT_BYTES", .. }));
    }

    #[test]
    fn bad_port_is_invalid() {
        let err = Config::from_lookup(lookup(&[
            ("BING_SEARCH_API_KEY", "k"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }
}
