use poem::http::StatusCode;
use tracing::warn;

use crate::{
    application::handlers::coordinator::ReauthorizeOutcome,
    domain::{
        errors::ChannelError,
        models::{Business, ChannelRecord, ChannelStatusView, ManagedPage, SdkReadiness, ViewState},
    },
    presentation::{
        http::responses::{
            BusinessDto, ChannelAccountDto, ChannelStatusDto, ConsoleDto, ManagedPageDto,
            ReauthorizeResponseDto, SdkReadinessDto,
        },
        models::{ReauthorizeOutcomeKind, SdkStateKind},
    },
};

pub fn map_account(record: &ChannelRecord) -> ChannelAccountDto {
    ChannelAccountDto {
        id: record.id,
        platform: record.platform.into(),
        external_id: record.external_id.clone(),
        display_name: record.display_name.clone(),
        basic_id: record.basic_id.clone(),
        connection_status: record.connection_status.into(),
        last_verified_at: record.last_verified_at.map(|at| at.to_rfc3339()),
        missing_fields: record.missing_fields(),
    }
}

pub fn map_console(view: &ViewState, accounts: &[ChannelRecord]) -> ConsoleDto {
    ConsoleDto {
        view: view.into(),
        wizard_channel_id: match view {
            ViewState::LineSetupWizard { resume } => *resume,
            _ => None,
        },
        accounts: accounts.iter().map(map_account).collect(),
    }
}

pub fn map_outcome(outcome: &ReauthorizeOutcome, view: &ViewState) -> ReauthorizeResponseDto {
    let (outcome, account, reason) = match outcome {
        ReauthorizeOutcome::Verified(record) => {
            (ReauthorizeOutcomeKind::Verified, Some(map_account(record)), None)
        }
        ReauthorizeOutcome::SetupRequired { reason, .. } => {
            (ReauthorizeOutcomeKind::SetupRequired, None, Some(reason.clone()))
        }
        ReauthorizeOutcome::Reconnected(record) => (
            ReauthorizeOutcomeKind::Reconnected,
            Some(map_account(record)),
            None,
        ),
    };
    ReauthorizeResponseDto {
        outcome,
        account,
        reason,
        view: view.into(),
    }
}

pub fn map_status(view: &ChannelStatusView) -> ChannelStatusDto {
    ChannelStatusDto {
        is_configured: view.snapshot.is_configured,
        has_active_channel: view.snapshot.has_active_channel,
        missing_fields: view.snapshot.missing_fields.clone(),
        channel_id: view.snapshot.channel_id,
        error: view.error.clone(),
        is_loading: view.is_loading,
        has_fetched_once: view.has_fetched_once,
    }
}

pub fn map_readiness(
    provider: &str,
    readiness: &SdkReadiness,
    has_pending_session: bool,
) -> SdkReadinessDto {
    let (state, message) = match readiness {
        SdkReadiness::NotLoaded => (SdkStateKind::NotLoaded, None),
        SdkReadiness::Loading => (SdkStateKind::Loading, None),
        SdkReadiness::Ready => (SdkStateKind::Ready, None),
        SdkReadiness::Error(message) => (SdkStateKind::Error, Some(message.clone())),
    };
    SdkReadinessDto {
        provider: provider.to_string(),
        state,
        message,
        has_pending_session,
    }
}

pub fn map_business(business: &Business) -> BusinessDto {
    BusinessDto {
        id: business.id.clone(),
        name: business.name.clone(),
    }
}

pub fn map_page(page: &ManagedPage) -> ManagedPageDto {
    ManagedPageDto {
        id: page.id.clone(),
        name: page.name.clone(),
        has_access_token: page.access_token.is_some(),
    }
}

pub fn channel_error(err: ChannelError) -> poem::Error {
    let status = match &err {
        ChannelError::DuplicateLineChannel
        | ChannelError::AuthorizationInProgress(_)
        | ChannelError::Superseded
        | ChannelError::NoSetupInProgress => StatusCode::CONFLICT,
        ChannelError::AuthCancelled { .. } => StatusCode::UNAUTHORIZED,
        ChannelError::NoManageablePages | ChannelError::IncompleteSetup(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ChannelError::NotFound(_) => StatusCode::NOT_FOUND,
        ChannelError::SdkConfig(_) | ChannelError::SdkLoad(_) | ChannelError::SdkNotReady => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ChannelError::Provider(_)
        | ChannelError::FirmLoginFailed { .. }
        | ChannelError::TokenExchangeFailed { .. }
        | ChannelError::Persistence { .. }
        | ChannelError::Verification(_)
        | ChannelError::StatusFetch(_) => StatusCode::BAD_GATEWAY,
    };
    if status.is_server_error() {
        warn!(http_status = status.as_u16(), error = %err, "request failed upstream");
    }
    poem::Error::from_string(err.to_string(), status)
}
