use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::config::AppCredentialsConfig;
use crate::error::BotError;
use crate::services::error_body;

/// Seconds before expiry at which a cached token is refreshed.
const REFRESH_MARGIN_SECS: u64 = 60;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// Client-credentials token source for the chat platform.
///
/// Without configured credentials every lookup yields `None` and callers send
/// requests unauthenticated.
pub struct AppCredentials {
    client: Client,
    config: Option<AppCredentialsConfig>,
    access_token: Mutex<Option<(String, u64)>>, // (token, expiry_timestamp)
}

fn now_secs() -> Result<u64, BotError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| BotError::Credentials(e.to_string()))
}

impl AppCredentials {
    pub fn new(client: Client, config: Option<AppCredentialsConfig>) -> Self {
        AppCredentials {
            client,
            config,
            access_token: Mutex::new(None),
        }
    }

    pub async fn token(&self) -> Result<Option<String>, BotError> {
        let config = match &self.config {
            Some(c) => c,
            None => return Ok(None),
        };

        // Held across the refresh so concurrent requests wait for one fetch.
        let mut cached = self.access_token.lock().await;
        let now = now_secs()?;
        if let Some((token, expiry)) = &*cached {
            if *expiry > now + REFRESH_MARGIN_SECS {
                return Ok(Some(token.clone()));
            }
        }

        tracing::debug!(token_url = %config.token_url, "requesting platform access token");
        let res = self
            .client
            .post(&config.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", config.app_id.as_str()),
                ("client_secret", config.app_password.as_str()),
                ("scope", config.scope.as_str()),
            ])
            .send()
            .await
            .map_err(|e| BotError::Credentials(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let body = error_body(res).await;
            tracing::warn!(%status, body = %body, "token endpoint returned non-success status");
            return Err(BotError::Credentials(format!("token endpoint returned {}", status)));
        }

        let token_response: TokenResponse = res
            .json()
            .await
            .map_err(|e| BotError::Credentials(format!("unreadable token response: {}", e)))?;

        *cached = Some((token_response.access_token.clone(), now + token_response.expires_in));
        Ok(Some(token_response.access_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> AppCredentialsConfig {
        AppCredentialsConfig {
            app_id: "app-id".to_string(),
            app_password: "app-secret".to_string(),
            token_url: format!("{}/token", server.uri()),
            scope: "https://api.botframework.com/.default".to_string(),
        }
    }

    #[actix_web::test]
    async fn unconfigured_yields_no_token() {
        let creds = AppCredentials::new(Client::new(), None);
        assert_eq!(creds.token().await.unwrap(), None);
    }

    #[actix_web::test]
    async fn token_is_cached_until_near_expiry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=app-id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token_type": "Bearer",
                "expires_in": 3600,
                "access_token": "tok-1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let creds = AppCredentials::new(Client::new(), Some(config(&server)));
        assert_eq!(creds.token().await.unwrap().as_deref(), Some("tok-1"));
        assert_eq!(creds.token().await.unwrap().as_deref(), Some("tok-1"));
    }

    #[actix_web::test]
    async fn short_lived_token_is_refetched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "expires_in": 30,
                "access_token": "short"
            })))
            .expect(2)
            .mount(&server)
            .await;

        let creds = AppCredentials::new(Client::new(), Some(config(&server)));
        creds.token().await.unwrap();
        creds.token().await.unwrap();
    }

    #[actix_web::test]
    async fn rejected_credentials_are_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad secret"))
            .mount(&server)
            .await;

        let creds = AppCredentials::new(Client::new(), Some(config(&server)));
        let err = creds.token().await.unwrap_err();
        assert!(matches!(err, BotError::Credentials(_)));
    }
}
