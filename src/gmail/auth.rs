//! Bearer token for the Gmail API.
//!
//! Either the configured access token is used as-is, or a stored refresh
//! token is exchanged once. No consent flow, no token file.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::info;

use crate::config::{GmailAuth, GmailConfig};
use crate::error::GmailError;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Resolve an access token from configuration.
pub async fn obtain_access_token(
    client: &reqwest::Client,
    config: &GmailConfig,
) -> Result<SecretString, GmailError> {
    match &config.auth {
        GmailAuth::AccessToken(token) => Ok(token.clone()),
        GmailAuth::RefreshToken {
            client_id,
            client_secret,
            refresh_token,
        } => {
            let params = [
                ("grant_type", "refresh_token"),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.expose_secret()),
                ("refresh_token", refresh_token.expose_secret()),
            ];

            let resp = client
                .post(&config.token_url)
                .form(&params)
                .send()
                .await
                .map_err(|e| GmailError::TokenRefresh {
                    reason: e.to_string(),
                })?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(GmailError::TokenRefresh {
                    reason: format!("HTTP {status}: {body}"),
                });
            }

            let token: TokenResponse = resp.json().await.map_err(|e| GmailError::TokenRefresh {
                reason: format!("unreadable token response: {e}"),
            })?;

            info!(
                expires_in = token.expires_in.unwrap_or_default(),
                "Refreshed Gmail access token"
            );
            Ok(SecretString::from(token.access_token))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use mockito::Matcher;

    fn refresh_config(token_url: String) -> GmailConfig {
        GmailConfig {
            auth: GmailAuth::RefreshToken {
                client_id: "cid".into(),
                client_secret: SecretString::from("csecret"),
                refresh_token: SecretString::from("1//rt"),
            },
            api_base: "http://unused".into(),
            token_url,
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn static_token_is_returned_without_network() {
        let config = GmailConfig {
            auth: GmailAuth::AccessToken(SecretString::from("ya29.static")),
            api_base: "http://unused".into(),
            token_url: "http://127.0.0.1:9/token".into(),
            timeout: Duration::from_secs(1),
        };
        let token = obtain_access_token(&reqwest::Client::new(), &config)
            .await
            .unwrap();
        assert_eq!(token.expose_secret(), "ya29.static");
    }

    #[tokio::test]
    async fn refresh_grant_posts_form_and_reads_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                Matcher::UrlEncoded("client_id".into(), "cid".into()),
                Matcher::UrlEncoded("client_secret".into(), "csecret".into()),
                Matcher::UrlEncoded("refresh_token".into(), "1//rt".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"access_token":"ya29.fresh","expires_in":3599,"token_type":"Bearer"}"#)
            .create_async()
            .await;

        let config = refresh_config(format!("{}/token", server.url()));
        let token = obtain_access_token(&reqwest::Client::new(), &config)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(token.expose_secret(), "ya29.fresh");
    }

    #[tokio::test]
    async fn rejected_refresh_is_token_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;

        let config = refresh_config(format!("{}/token", server.url()));
        let err = obtain_access_token(&reqwest::Client::new(), &config)
            .await
            .unwrap_err();
        match err {
            GmailError::TokenRefresh { reason } => assert!(reason.contains("invalid_grant")),
            other => panic!("Expected TokenRefresh, got {:?}", other),
        }
    }
}
