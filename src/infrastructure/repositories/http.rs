use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::domain::{
    errors::ChannelError,
    models::{
        ChannelCredentials, ChannelId, ChannelRecord, ChannelStatusSnapshot, ConnectionStatus,
        FacebookChannelDraft, FacebookCredentials, LineChannelPatch, LineCredentials, Platform,
        SdkSettings,
    },
    repositories::ChannelRecordRepository,
};

/// Channel backend reached over its REST surface.
pub struct HttpChannelRepository {
    http: Client,
    base_url: String,
}

impl HttpChannelRepository {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ChannelError> {
        let http = Client::builder()
            .user_agent("channel-console/channels")
            .build()
            .map_err(|err| ChannelError::persistence(err.to_string()))?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ChannelError> {
        let response = request
            .send()
            .await
            .map_err(|err| ChannelError::persistence(err.to_string()))?;
        if response.status().is_success() {
            return Ok(response);
        }
        Err(Self::rejection(response).await)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ChannelError> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|err| ChannelError::persistence(format!("unexpected response body: {err}")))
    }

    async fn rejection(response: Response) -> ChannelError {
        let status = response.status();
        let message = response
            .json::<BackendError>()
            .await
            .ok()
            .and_then(BackendError::into_message)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
        debug!(http_status = status.as_u16(), %message, "channel backend rejected request");

        if status == StatusCode::NOT_FOUND {
            return ChannelError::NotFound(message);
        }
        ChannelError::Persistence {
            http_status: Some(status.as_u16()),
            message,
        }
    }
}

#[async_trait]
impl ChannelRecordRepository for HttpChannelRepository {
    async fn current_line(&self) -> Result<Option<ChannelRecord>, ChannelError> {
        let record: Option<LineChannelDto> = self
            .send_json(self.http.get(self.url("/channels/line/current")))
            .await?;
        Ok(record.map(LineChannelDto::into_record))
    }

    async fn list_facebook(&self) -> Result<Vec<ChannelRecord>, ChannelError> {
        let records: Vec<FacebookChannelDto> = self
            .send_json(self.http.get(self.url("/channels/facebook")))
            .await?;
        Ok(records
            .into_iter()
            .map(FacebookChannelDto::into_record)
            .collect())
    }

    async fn create_line(&self, patch: LineChannelPatch) -> Result<ChannelRecord, ChannelError> {
        let record: LineChannelDto = self
            .send_json(
                self.http
                    .post(self.url("/channels/line"))
                    .json(&LinePatchBody::from(&patch)),
            )
            .await?;
        Ok(record.into_record())
    }

    async fn update_line(
        &self,
        id: ChannelId,
        patch: LineChannelPatch,
    ) -> Result<ChannelRecord, ChannelError> {
        let record: LineChannelDto = self
            .send_json(
                self.http
                    .patch(self.url(&format!("/channels/line/{id}")))
                    .json(&LinePatchBody::from(&patch)),
            )
            .await?;
        Ok(record.into_record())
    }

    async fn delete_line(&self, id: ChannelId) -> Result<(), ChannelError> {
        self.send(self.http.delete(self.url(&format!("/channels/line/{id}"))))
            .await?;
        Ok(())
    }

    async fn create_facebook(
        &self,
        draft: FacebookChannelDraft,
    ) -> Result<ChannelRecord, ChannelError> {
        let record: FacebookChannelDto = self
            .send_json(
                self.http
                    .post(self.url("/channels/facebook"))
                    .json(&FacebookDraftBody::from(&draft)),
            )
            .await?;
        Ok(record.into_record())
    }

    async fn update_facebook(
        &self,
        id: ChannelId,
        draft: FacebookChannelDraft,
    ) -> Result<ChannelRecord, ChannelError> {
        let record: FacebookChannelDto = self
            .send_json(
                self.http
                    .patch(self.url(&format!("/channels/facebook/{id}")))
                    .json(&FacebookDraftBody::from(&draft)),
            )
            .await?;
        Ok(record.into_record())
    }

    async fn verify_line(&self, id: ChannelId) -> Result<ChannelRecord, ChannelError> {
        let record: LineChannelDto = self
            .send_json(
                self.http
                    .post(self.url("/channels/line/verify"))
                    .json(&VerifyBody { id }),
            )
            .await
            .map_err(|err| match err {
                // A 4xx other than 404 is the backend refusing the stored credentials.
                ChannelError::Persistence {
                    http_status: Some(status),
                    message,
                } if (400..500).contains(&status) => ChannelError::Verification(message),
                other => other,
            })?;
        Ok(record.into_record())
    }

    async fn line_status(&self) -> Result<ChannelStatusSnapshot, ChannelError> {
        let status: LineStatusDto = self
            .send_json(self.http.get(self.url("/channels/line/status")))
            .await
            .map_err(|err| ChannelError::StatusFetch(err.to_string()))?;
        Ok(ChannelStatusSnapshot {
            is_configured: status.is_configured,
            has_active_channel: status.has_active_channel,
            missing_fields: status.missing_fields,
            channel_id: status.channel_db_id,
        })
    }

    async fn sdk_settings(&self) -> Result<SdkSettings, ChannelError> {
        let settings: SdkSettingsDto = self
            .send_json(self.http.get(self.url("/channel-config/sdk-settings")))
            .await?;
        Ok(SdkSettings {
            app_id: settings.app_id.unwrap_or_default(),
            api_version: settings.api_version.unwrap_or_default(),
        })
    }

    async fn resolve_basic_id(
        &self,
        channel_access_token: &Secret<String>,
    ) -> Result<Option<String>, ChannelError> {
        let body = BasicIdBody {
            channel_access_token: channel_access_token.expose_secret(),
        };
        let resolved: BasicIdDto = self
            .send_json(self.http.post(self.url("/bot/basic-id")).json(&body))
            .await?;
        if !resolved.ok {
            warn!("basic id lookup returned ok=false");
            return Ok(None);
        }
        Ok(resolved.basic_id.filter(|id| !id.trim().is_empty()))
    }
}

#[derive(Debug, Deserialize)]
struct BackendError {
    detail: Option<serde_json::Value>,
    error: Option<serde_json::Value>,
    message: Option<String>,
}

impl BackendError {
    fn into_message(self) -> Option<String> {
        let render = |value: serde_json::Value| match value {
            serde_json::Value::String(text) => text,
            other => other.to_string(),
        };
        self.message
            .or_else(|| self.detail.map(render))
            .or_else(|| self.error.map(render))
    }
}

#[derive(Debug, Deserialize)]
struct LineChannelDto {
    id: ChannelId,
    channel_id: Option<String>,
    channel_secret: Option<String>,
    channel_access_token: Option<String>,
    login_channel_id: Option<String>,
    login_channel_secret: Option<String>,
    channel_name: Option<String>,
    basic_id: Option<String>,
    connection_status: Option<String>,
    last_verified_at: Option<DateTime<Utc>>,
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

impl LineChannelDto {
    fn into_record(self) -> ChannelRecord {
        let credentials = LineCredentials {
            channel_secret: present(self.channel_secret).map(Secret::new),
            channel_access_token: present(self.channel_access_token).map(Secret::new),
            login_channel_id: present(self.login_channel_id),
            login_channel_secret: present(self.login_channel_secret).map(Secret::new),
        };
        let external_id = self.channel_id.unwrap_or_default();
        let connection_status = self
            .connection_status
            .as_deref()
            .and_then(ConnectionStatus::from_str)
            .unwrap_or_else(|| {
                if credentials.missing_fields(&external_id).is_empty() {
                    ConnectionStatus::Connected
                } else {
                    ConnectionStatus::Disconnected
                }
            });

        ChannelRecord {
            id: self.id,
            platform: Platform::LineOfficialAccount,
            external_id,
            display_name: present(self.channel_name),
            basic_id: present(self.basic_id),
            credentials: ChannelCredentials::Line(credentials),
            connection_status,
            last_verified_at: self.last_verified_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FacebookChannelDto {
    id: ChannelId,
    page_id: Option<String>,
    page_access_token: Option<String>,
    channel_name: Option<String>,
    connection_status: Option<String>,
    last_verified_at: Option<DateTime<Utc>>,
}

impl FacebookChannelDto {
    fn into_record(self) -> ChannelRecord {
        ChannelRecord {
            id: self.id,
            platform: Platform::FacebookPage,
            external_id: self.page_id.unwrap_or_default(),
            display_name: present(self.channel_name),
            basic_id: None,
            credentials: ChannelCredentials::Facebook(FacebookCredentials {
                page_access_token: present(self.page_access_token).map(Secret::new),
            }),
            connection_status: self
                .connection_status
                .as_deref()
                .and_then(ConnectionStatus::from_str)
                .unwrap_or(ConnectionStatus::Disconnected),
            last_verified_at: self.last_verified_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct LinePatchBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    channel_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel_secret: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel_access_token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    login_channel_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    login_channel_secret: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    basic_id: Option<&'a str>,
}

impl<'a> From<&'a LineChannelPatch> for LinePatchBody<'a> {
    fn from(patch: &'a LineChannelPatch) -> Self {
        let secret = |value: &'a Option<Secret<String>>| {
            value.as_ref().map(|secret| secret.expose_secret().as_str())
        };
        Self {
            channel_id: patch.channel_id.as_deref(),
            channel_secret: secret(&patch.channel_secret),
            channel_access_token: secret(&patch.channel_access_token),
            login_channel_id: patch.login_channel_id.as_deref(),
            login_channel_secret: secret(&patch.login_channel_secret),
            channel_name: patch.channel_name.as_deref(),
            basic_id: patch.basic_id.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
struct FacebookDraftBody<'a> {
    page_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel_name: Option<&'a str>,
    page_access_token: &'a str,
    connection_status: &'static str,
    last_verified_at: DateTime<Utc>,
}

impl<'a> From<&'a FacebookChannelDraft> for FacebookDraftBody<'a> {
    fn from(draft: &'a FacebookChannelDraft) -> Self {
        Self {
            page_id: &draft.page_id,
            channel_name: draft.channel_name.as_deref(),
            page_access_token: draft.page_access_token.expose_secret(),
            connection_status: draft.connection_status.as_str(),
            last_verified_at: draft.last_verified_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct VerifyBody {
    id: ChannelId,
}

#[derive(Debug, Deserialize)]
struct LineStatusDto {
    #[serde(default)]
    is_configured: bool,
    #[serde(default)]
    has_active_channel: bool,
    #[serde(default)]
    missing_fields: Vec<String>,
    channel_db_id: Option<ChannelId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SdkSettingsDto {
    #[serde(alias = "app_id")]
    app_id: Option<String>,
    #[serde(alias = "api_version")]
    api_version: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BasicIdBody<'a> {
    channel_access_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BasicIdDto {
    #[serde(default = "default_ok")]
    ok: bool,
    basic_id: Option<String>,
}

fn default_ok() -> bool {
    true
}
