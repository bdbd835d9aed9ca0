use poem_openapi::Enum;

use crate::domain::models::{ConnectionStatus, LineField, LoginStatus, Platform, ViewState};

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum PlatformKind {
    #[oai(rename = "line")]
    Line,
    #[oai(rename = "facebook")]
    Facebook,
}

impl From<PlatformKind> for Platform {
    fn from(value: PlatformKind) -> Self {
        match value {
            PlatformKind::Line => Platform::LineOfficialAccount,
            PlatformKind::Facebook => Platform::FacebookPage,
        }
    }
}

impl From<Platform> for PlatformKind {
    fn from(value: Platform) -> Self {
        match value {
            Platform::LineOfficialAccount => PlatformKind::Line,
            Platform::FacebookPage => PlatformKind::Facebook,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConnectionStatusKind {
    #[oai(rename = "connected")]
    Connected,
    #[oai(rename = "expired")]
    Expired,
    #[oai(rename = "disconnected")]
    Disconnected,
}

impl From<ConnectionStatus> for ConnectionStatusKind {
    fn from(value: ConnectionStatus) -> Self {
        match value {
            ConnectionStatus::Connected => ConnectionStatusKind::Connected,
            ConnectionStatus::Expired => ConnectionStatusKind::Expired,
            ConnectionStatus::Disconnected => ConnectionStatusKind::Disconnected,
        }
    }
}

/// Wizard steps, in the order the console asks for them.
#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum LineFieldKind {
    #[oai(rename = "channel_id")]
    ChannelId,
    #[oai(rename = "channel_secret")]
    ChannelSecret,
    #[oai(rename = "channel_access_token")]
    ChannelAccessToken,
    #[oai(rename = "login_channel_id")]
    LoginChannelId,
    #[oai(rename = "login_channel_secret")]
    LoginChannelSecret,
}

impl From<LineFieldKind> for LineField {
    fn from(value: LineFieldKind) -> Self {
        match value {
            LineFieldKind::ChannelId => LineField::ChannelId,
            LineFieldKind::ChannelSecret => LineField::ChannelSecret,
            LineFieldKind::ChannelAccessToken => LineField::ChannelAccessToken,
            LineFieldKind::LoginChannelId => LineField::LoginChannelId,
            LineFieldKind::LoginChannelSecret => LineField::LoginChannelSecret,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum ViewStateKind {
    #[oai(rename = "loading")]
    Loading,
    #[oai(rename = "empty")]
    Empty,
    #[oai(rename = "line_setup_wizard")]
    LineSetupWizard,
    #[oai(rename = "account_list")]
    AccountList,
}

impl From<&ViewState> for ViewStateKind {
    fn from(value: &ViewState) -> Self {
        match value {
            ViewState::Loading => ViewStateKind::Loading,
            ViewState::Empty => ViewStateKind::Empty,
            ViewState::LineSetupWizard { .. } => ViewStateKind::LineSetupWizard,
            ViewState::AccountList => ViewStateKind::AccountList,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum SdkStateKind {
    #[oai(rename = "not_loaded")]
    NotLoaded,
    #[oai(rename = "loading")]
    Loading,
    #[oai(rename = "ready")]
    Ready,
    #[oai(rename = "error")]
    Error,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum ReauthorizeOutcomeKind {
    #[oai(rename = "verified")]
    Verified,
    #[oai(rename = "setup_required")]
    SetupRequired,
    #[oai(rename = "reconnected")]
    Reconnected,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum LoginStatusKind {
    #[oai(rename = "connected")]
    Connected,
    #[oai(rename = "not_authorized")]
    NotAuthorized,
    #[oai(rename = "unknown")]
    Unknown,
}

impl From<LoginStatus> for LoginStatusKind {
    fn from(value: LoginStatus) -> Self {
        match value {
            LoginStatus::Connected => LoginStatusKind::Connected,
            LoginStatus::NotAuthorized => LoginStatusKind::NotAuthorized,
            LoginStatus::Unknown => LoginStatusKind::Unknown,
        }
    }
}
