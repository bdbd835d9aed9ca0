use poem_openapi::Object;

use crate::presentation::models::{
    ConnectionStatusKind, LoginStatusKind, PlatformKind, ReauthorizeOutcomeKind, SdkStateKind,
    ViewStateKind,
};

#[derive(Object)]
pub struct SuccessDto {
    pub success: bool,
}

/// A connected channel. Credentials are never echoed, only which of them are on file.
#[derive(Object)]
pub struct ChannelAccountDto {
    pub id: i64,
    pub platform: PlatformKind,
    pub external_id: String,
    pub display_name: Option<String>,
    pub basic_id: Option<String>,
    pub connection_status: ConnectionStatusKind,
    pub last_verified_at: Option<String>,
    pub missing_fields: Vec<String>,
}

#[derive(Object)]
pub struct ConsoleDto {
    pub view: ViewStateKind,
    /// LINE record the setup wizard is filling in, when the wizard is open.
    pub wizard_channel_id: Option<i64>,
    pub accounts: Vec<ChannelAccountDto>,
}

#[derive(Object)]
pub struct ReauthorizeResponseDto {
    pub outcome: ReauthorizeOutcomeKind,
    pub account: Option<ChannelAccountDto>,
    pub reason: Option<String>,
    pub view: ViewStateKind,
}

#[derive(Object)]
pub struct ReleaseResponseDto {
    pub released: bool,
}

#[derive(Object)]
pub struct ChannelStatusDto {
    pub is_configured: bool,
    pub has_active_channel: bool,
    pub missing_fields: Vec<String>,
    pub channel_id: Option<i64>,
    pub error: Option<String>,
    pub is_loading: bool,
    pub has_fetched_once: bool,
}

#[derive(Object)]
pub struct SdkReadinessDto {
    pub provider: String,
    pub state: SdkStateKind,
    pub message: Option<String>,
    /// Whether a browser login has handed over a token that the next connect will consume.
    pub has_pending_session: bool,
}

#[derive(Object)]
pub struct LoginStatusDto {
    pub status: LoginStatusKind,
}

#[derive(Object)]
pub struct BusinessDto {
    pub id: String,
    pub name: Option<String>,
}

/// A page offered for connection. Page tokens stay server-side.
#[derive(Object)]
pub struct ManagedPageDto {
    pub id: String,
    pub name: Option<String>,
    pub has_access_token: bool,
}
