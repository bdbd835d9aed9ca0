use thiserror::Error;

use crate::domain::models::{LoginStatus, Platform};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("identity SDK is misconfigured: {0}")]
    SdkConfig(String),
    #[error("identity SDK failed to load: {0}")]
    SdkLoad(String),
    #[error("identity SDK is not ready")]
    SdkNotReady,
    #[error("provider login was not completed (status: {status})")]
    AuthCancelled { status: LoginStatus },
    #[error("identity provider error: {0}")]
    Provider(String),
    #[error("service-account login failed (http status {http_status:?}): {provider_message}")]
    FirmLoginFailed {
        http_status: Option<u16>,
        provider_message: String,
    },
    #[error("token exchange failed (retried: {retried}, http status {http_status:?}): {message}")]
    TokenExchangeFailed {
        retried: bool,
        http_status: Option<u16>,
        message: String,
    },
    #[error("the authorized account does not manage any page")]
    NoManageablePages,
    #[error("a LINE Official Account is already connected")]
    DuplicateLineChannel,
    #[error("an authorization attempt is already in progress for {0}")]
    AuthorizationInProgress(Platform),
    #[error("authorization attempt was superseded")]
    Superseded,
    #[error("channel persistence failed (http status {http_status:?}): {message}")]
    Persistence {
        http_status: Option<u16>,
        message: String,
    },
    #[error("channel not found: {0}")]
    NotFound(String),
    #[error("LINE channel verification failed: {0}")]
    Verification(String),
    #[error("channel status could not be determined: {0}")]
    StatusFetch(String),
    #[error("LINE setup is incomplete, missing: {}", .0.join(", "))]
    IncompleteSetup(Vec<String>),
    #[error("no LINE setup is in progress")]
    NoSetupInProgress,
}

impl ChannelError {
    pub fn persistence(message: impl Into<String>) -> Self {
        ChannelError::Persistence {
            http_status: None,
            message: message.into(),
        }
    }
}
