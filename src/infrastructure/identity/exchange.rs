//! Client for the external verification backend.
//!
//! Supports service-account login and token exchange with a single retry on `401`.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    application::services::{credentials::CredentialExchange, session_cache::ServiceSessionCache},
    domain::{errors::ChannelError, models::ServiceSession},
};

pub struct CredentialExchangeClient {
    http: Client,
    base_url: String,
    account: String,
    password: Secret<String>,
    sessions: Arc<ServiceSessionCache>,
}

impl CredentialExchangeClient {
    pub fn new(
        base_url: impl Into<String>,
        account: impl Into<String>,
        password: Secret<String>,
        sessions: Arc<ServiceSessionCache>,
    ) -> Result<Self, ChannelError> {
        let http = Client::builder()
            .user_agent("channel-console/identity")
            .build()
            .map_err(|err| ChannelError::FirmLoginFailed {
                http_status: None,
                provider_message: err.to_string(),
            })?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            account: account.into(),
            password,
            sessions,
        })
    }

    /// Logs in as the service account and replaces the cached session with the result.
    pub async fn perform_firm_login(&self) -> Result<ServiceSession, ChannelError> {
        let body = FirmLoginBody {
            account: &self.account,
            password: self.password.expose_secret(),
        };
        let response = self
            .http
            .post(format!("{}/identity/firm-login", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|err| ChannelError::FirmLoginFailed {
                http_status: None,
                provider_message: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let provider_message = error_message(response).await;
            warn!(http_status = status.as_u16(), %provider_message, "firm login rejected");
            return Err(ChannelError::FirmLoginFailed {
                http_status: Some(status.as_u16()),
                provider_message,
            });
        }

        let token = response
            .json::<FirmLoginResponse>()
            .await
            .ok()
            .and_then(|body| body.access_token)
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| ChannelError::FirmLoginFailed {
                http_status: Some(status.as_u16()),
                provider_message: "response did not contain an access token".to_string(),
            })?;

        let session = ServiceSession::new(token);
        self.sessions.set(session.clone());
        info!("service session acquired");
        Ok(session)
    }

    async fn exchange(
        &self,
        session: &ServiceSession,
        external_access_token: &Secret<String>,
        retried: bool,
    ) -> Result<(), ChannelError> {
        let body = MetaLoginBody {
            access_token: external_access_token.expose_secret(),
        };
        let response = self
            .http
            .post(format!("{}/identity/meta-login", self.base_url))
            .header(reqwest::header::AUTHORIZATION, session.bearer())
            .json(&body)
            .send()
            .await
            .map_err(|err| ChannelError::TokenExchangeFailed {
                retried,
                http_status: None,
                message: err.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(ChannelError::TokenExchangeFailed {
            retried,
            http_status: Some(status.as_u16()),
            message: error_message(response).await,
        })
    }
}

#[async_trait]
impl CredentialExchange for CredentialExchangeClient {
    async fn request_meta_login(
        &self,
        external_access_token: &Secret<String>,
    ) -> Result<ServiceSession, ChannelError> {
        let session = match self.sessions.get() {
            Some(session) => session,
            None => {
                debug!("no cached service session, logging in");
                self.perform_firm_login().await?
            }
        };

        match self.exchange(&session, external_access_token, false).await {
            Ok(()) => Ok(session),
            Err(ChannelError::TokenExchangeFailed {
                http_status: Some(401),
                ..
            }) => {
                warn!("service session rejected as stale, retrying once with a fresh login");
                self.sessions.clear();
                let fresh = self.perform_firm_login().await?;
                self.exchange(&fresh, external_access_token, true).await?;
                info!("token exchange succeeded after session refresh");
                Ok(fresh)
            }
            Err(err) => Err(err),
        }
    }
}

async fn error_message(response: Response) -> String {
    let status = response.status();
    let fallback = || {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    };
    match response.json::<ErrorBody>().await {
        Ok(body) => body.message.or(body.detail).unwrap_or_else(fallback),
        Err(_) if status == StatusCode::UNAUTHORIZED => "unauthorized".to_string(),
        Err(_) => fallback(),
    }
}

#[derive(Serialize)]
struct FirmLoginBody<'a> {
    account: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FirmLoginResponse {
    #[serde(alias = "access_token")]
    access_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MetaLoginBody<'a> {
    access_token: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use serde_json::json;

    use super::*;

    fn client(server: &mockito::Server, sessions: Arc<ServiceSessionCache>) -> CredentialExchangeClient {
        CredentialExchangeClient::new(
            server.url(),
            "console",
            Secret::new("hunter2".to_string()),
            sessions,
        )
        .unwrap()
    }

    fn external_token() -> Secret<String> {
        Secret::new("abc".to_string())
    }

    async fn firm_login_mock(server: &mut mockito::Server, token: &str, hits: usize) -> mockito::Mock {
        server
            .mock("POST", "/identity/firm-login")
            .match_body(Matcher::Json(json!({ "account": "console", "password": "hunter2" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "accessToken": token }).to_string())
            .expect(hits)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn logs_in_first_when_no_session_is_cached() {
        let mut server = mockito::Server::new_async().await;
        let firm = firm_login_mock(&mut server, "fresh", 1).await;
        let exchange = server
            .mock("POST", "/identity/meta-login")
            .match_header("authorization", "Bearer fresh")
            .match_body(Matcher::Json(json!({ "accessToken": "abc" })))
            .with_status(200)
            .create_async()
            .await;

        let sessions = Arc::new(ServiceSessionCache::new());
        let session = client(&server, sessions.clone())
            .request_meta_login(&external_token())
            .await
            .unwrap();

        assert!(session.same_as(&ServiceSession::new("fresh")));
        firm.assert_async().await;
        exchange.assert_async().await;
    }

    #[tokio::test]
    async fn stale_session_is_replaced_after_one_retry() {
        let mut server = mockito::Server::new_async().await;
        let stale = server
            .mock("POST", "/identity/meta-login")
            .match_header("authorization", "Bearer stale")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;
        let firm = firm_login_mock(&mut server, "fresh", 1).await;
        let retried = server
            .mock("POST", "/identity/meta-login")
            .match_header("authorization", "Bearer fresh")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let sessions = Arc::new(ServiceSessionCache::new());
        sessions.set(ServiceSession::new("stale"));
        let session = client(&server, sessions.clone())
            .request_meta_login(&external_token())
            .await
            .unwrap();

        assert!(session.same_as(&ServiceSession::new("fresh")));
        assert!(sessions.get().unwrap().same_as(&session));
        stale.assert_async().await;
        firm.assert_async().await;
        retried.assert_async().await;
    }

    #[tokio::test]
    async fn second_rejection_fails_without_a_third_attempt() {
        let mut server = mockito::Server::new_async().await;
        let exchange = server
            .mock("POST", "/identity/meta-login")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(json!({ "message": "session expired" }).to_string())
            .expect(2)
            .create_async()
            .await;
        let firm = firm_login_mock(&mut server, "fresh", 1).await;

        let sessions = Arc::new(ServiceSessionCache::new());
        sessions.set(ServiceSession::new("stale"));
        let err = client(&server, sessions)
            .request_meta_login(&external_token())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ChannelError::TokenExchangeFailed {
                retried: true,
                http_status: Some(401),
                message: "session expired".to_string(),
            }
        );
        exchange.assert_async().await;
        firm.assert_async().await;
    }

    #[tokio::test]
    async fn other_failures_are_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let exchange = server
            .mock("POST", "/identity/meta-login")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;
        let firm = firm_login_mock(&mut server, "fresh", 0).await;

        let sessions = Arc::new(ServiceSessionCache::new());
        sessions.set(ServiceSession::new("cached"));
        let err = client(&server, sessions.clone())
            .request_meta_login(&external_token())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ChannelError::TokenExchangeFailed {
                retried: false,
                http_status: Some(500),
                ..
            }
        ));
        assert!(sessions.get().unwrap().same_as(&ServiceSession::new("cached")));
        exchange.assert_async().await;
        firm.assert_async().await;
    }

    #[tokio::test]
    async fn rejected_firm_login_reports_provider_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/identity/firm-login")
            .with_status(403)
            .with_header("content-type", "application/json")
            .with_body(json!({ "detail": "account locked" }).to_string())
            .create_async()
            .await;

        let err = client(&server, Arc::new(ServiceSessionCache::new()))
            .perform_firm_login()
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ChannelError::FirmLoginFailed {
                http_status: Some(403),
                provider_message: "account locked".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn firm_login_without_token_is_a_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/identity/firm-login")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{}")
            .create_async()
            .await;

        let sessions = Arc::new(ServiceSessionCache::new());
        let err = client(&server, sessions.clone())
            .perform_firm_login()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ChannelError::FirmLoginFailed {
                http_status: Some(200),
                ..
            }
        ));
        assert!(sessions.get().is_none());
    }
}
