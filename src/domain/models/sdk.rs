use std::fmt;

use secrecy::Secret;
use serde::{Deserialize, Serialize};

use crate::domain::errors::ChannelError;

pub const DEFAULT_API_VERSION: &str = "v23.0";
pub const DEFAULT_LOCALE: &str = "en_US";

/// Settings served by the channel backend for SDK initialisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkSettings {
    pub app_id: String,
    pub api_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkConfig {
    pub app_id: String,
    pub api_version: String,
    pub locale: String,
}

impl SdkConfig {
    pub fn from_settings(settings: SdkSettings, locale: impl Into<String>) -> Self {
        Self {
            app_id: settings.app_id.trim().to_string(),
            api_version: normalize_api_version(&settings.api_version),
            locale: locale.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ChannelError> {
        if self.app_id.trim().is_empty() {
            return Err(ChannelError::SdkConfig(
                "missing application identifier".to_string(),
            ));
        }
        Ok(())
    }
}

/// Accepts `23.0`, `V23.0` or `v23.0`; blank falls back to the default version.
pub fn normalize_api_version(raw: &str) -> String {
    let version = raw.trim();
    if version.is_empty() {
        return DEFAULT_API_VERSION.to_string();
    }
    match version.strip_prefix(['v', 'V']) {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => format!("v{rest}"),
        _ if version.starts_with('v') => version.to_string(),
        _ => format!("v{version}"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "message")]
pub enum SdkReadiness {
    NotLoaded,
    Loading,
    Ready,
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginStatus {
    Connected,
    NotAuthorized,
    Unknown,
}

impl fmt::Display for LoginStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoginStatus::Connected => "connected",
            LoginStatus::NotAuthorized => "not_authorized",
            LoginStatus::Unknown => "unknown",
        })
    }
}

#[derive(Debug, Clone)]
pub struct LoginResponse {
    pub status: LoginStatus,
    pub access_token: Option<Secret<String>>,
}

impl LoginResponse {
    pub fn connected(access_token: impl Into<String>) -> Self {
        Self {
            status: LoginStatus::Connected,
            access_token: Some(Secret::new(access_token.into())),
        }
    }

    pub fn not_connected(status: LoginStatus) -> Self {
        Self {
            status,
            access_token: None,
        }
    }
}

/// A page the authorized user manages.
#[derive(Debug, Clone)]
pub struct ManagedPage {
    pub id: String,
    pub name: Option<String>,
    pub access_token: Option<Secret<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Business {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PageAccessToken {
    pub page_id: String,
    pub name: Option<String>,
    pub access_token: Secret<String>,
}
