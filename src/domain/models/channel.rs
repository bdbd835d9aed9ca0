use chrono::{DateTime, Utc};
use secrecy::Secret;
use serde::{Deserialize, Serialize};

use super::platform::Platform;

/// Server-assigned identifier of a persisted channel record.
pub type ChannelId = i64;

/// One connected external channel as persisted by the channel backend.
#[derive(Debug, Clone)]
pub struct ChannelRecord {
    pub id: ChannelId,
    pub platform: Platform,
    /// LINE channel id or Facebook page id.
    pub external_id: String,
    pub display_name: Option<String>,
    /// Human-readable bot handle, LINE only.
    pub basic_id: Option<String>,
    pub credentials: ChannelCredentials,
    pub connection_status: ConnectionStatus,
    pub last_verified_at: Option<DateTime<Utc>>,
}

impl ChannelRecord {
    /// A record is usable when the provider-assigned id is known.
    pub fn is_usable(&self) -> bool {
        !self.external_id.trim().is_empty()
    }

    pub fn line_credentials(&self) -> Option<&LineCredentials> {
        match &self.credentials {
            ChannelCredentials::Line(credentials) => Some(credentials),
            ChannelCredentials::Facebook(_) => None,
        }
    }

    pub fn missing_fields(&self) -> Vec<String> {
        match &self.credentials {
            ChannelCredentials::Line(credentials) => credentials
                .missing_fields(&self.external_id)
                .into_iter()
                .map(|field| field.as_str().to_string())
                .collect(),
            ChannelCredentials::Facebook(credentials) => {
                let mut missing = Vec::new();
                if self.external_id.trim().is_empty() {
                    missing.push("page_id".to_string());
                }
                if credentials.page_access_token.is_none() {
                    missing.push("page_access_token".to_string());
                }
                missing
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connected,
    Expired,
    Disconnected,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Expired => "expired",
            ConnectionStatus::Disconnected => "disconnected",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "connected" => Some(ConnectionStatus::Connected),
            "expired" => Some(ConnectionStatus::Expired),
            "disconnected" => Some(ConnectionStatus::Disconnected),
            _ => None,
        }
    }
}

/// Opaque secret bundle. Never logged and never rendered in plaintext.
#[derive(Debug, Clone)]
pub enum ChannelCredentials {
    Line(LineCredentials),
    Facebook(FacebookCredentials),
}

#[derive(Debug, Clone, Default)]
pub struct LineCredentials {
    pub channel_secret: Option<Secret<String>>,
    pub channel_access_token: Option<Secret<String>>,
    pub login_channel_id: Option<String>,
    pub login_channel_secret: Option<Secret<String>>,
}

impl LineCredentials {
    pub fn missing_fields(&self, channel_id: &str) -> Vec<LineField> {
        LineField::ALL
            .into_iter()
            .filter(|field| match field {
                LineField::ChannelId => channel_id.trim().is_empty(),
                LineField::ChannelSecret => self.channel_secret.is_none(),
                LineField::ChannelAccessToken => self.channel_access_token.is_none(),
                LineField::LoginChannelId => self
                    .login_channel_id
                    .as_deref()
                    .is_none_or(|id| id.trim().is_empty()),
                LineField::LoginChannelSecret => self.login_channel_secret.is_none(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FacebookCredentials {
    pub page_access_token: Option<Secret<String>>,
}

/// Fields collected by the LINE setup wizard, in the order the wizard asks for them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LineField {
    ChannelId,
    ChannelSecret,
    ChannelAccessToken,
    LoginChannelId,
    LoginChannelSecret,
}

impl LineField {
    pub const ALL: [LineField; 5] = [
        LineField::ChannelId,
        LineField::ChannelSecret,
        LineField::ChannelAccessToken,
        LineField::LoginChannelId,
        LineField::LoginChannelSecret,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LineField::ChannelId => "channel_id",
            LineField::ChannelSecret => "channel_secret",
            LineField::ChannelAccessToken => "channel_access_token",
            LineField::LoginChannelId => "login_channel_id",
            LineField::LoginChannelSecret => "login_channel_secret",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        LineField::ALL.into_iter().find(|field| field.as_str() == value)
    }
}

/// Partial update of a LINE record. Unset fields are left untouched by the backend.
#[derive(Debug, Clone, Default)]
pub struct LineChannelPatch {
    pub channel_id: Option<String>,
    pub channel_secret: Option<Secret<String>>,
    pub channel_access_token: Option<Secret<String>>,
    pub login_channel_id: Option<String>,
    pub login_channel_secret: Option<Secret<String>>,
    pub channel_name: Option<String>,
    pub basic_id: Option<String>,
}

impl LineChannelPatch {
    pub fn single(field: LineField, value: String) -> Self {
        let mut patch = Self::default();
        match field {
            LineField::ChannelId => patch.channel_id = Some(value),
            LineField::ChannelSecret => patch.channel_secret = Some(Secret::new(value)),
            LineField::ChannelAccessToken => {
                patch.channel_access_token = Some(Secret::new(value))
            }
            LineField::LoginChannelId => patch.login_channel_id = Some(value),
            LineField::LoginChannelSecret => {
                patch.login_channel_secret = Some(Secret::new(value))
            }
        }
        patch
    }
}

/// Full body for creating or rebinding a Facebook page record.
#[derive(Debug, Clone)]
pub struct FacebookChannelDraft {
    pub page_id: String,
    pub channel_name: Option<String>,
    pub page_access_token: Secret<String>,
    pub connection_status: ConnectionStatus,
    pub last_verified_at: DateTime<Utc>,
}
