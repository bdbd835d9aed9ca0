use std::sync::Arc;

use poem_openapi::Tags;

use crate::{
    application::{
        handlers::coordinator::ChannelAuthCoordinator,
        services::{sdk_gateway::ExternalSdkGateway, status_store::ChannelStatusStore},
    },
    infrastructure::identity::facebook::FacebookGraphProvider,
    presentation::http::endpoints::{
        channels::ChannelsEndpoints, console::ConsoleEndpoints, health::HealthEndpoints,
        identity::IdentityEndpoints, status::StatusEndpoints,
    },
};

pub struct ApiState {
    pub coordinator: Arc<ChannelAuthCoordinator>,
    pub status_store: Arc<ChannelStatusStore>,
    pub gateway: Arc<ExternalSdkGateway>,
    pub facebook: Arc<FacebookGraphProvider>,
}

/// Enum of API sections (tags)
#[derive(Tags)]
pub enum EndpointsTags {
    Health,
    Console,
    Channels,
    Status,
    Identity,
}

pub type Endpoints = (
    HealthEndpoints,
    ConsoleEndpoints,
    ChannelsEndpoints,
    StatusEndpoints,
    IdentityEndpoints,
);

pub fn endpoints(state: Arc<ApiState>) -> Endpoints {
    (
        HealthEndpoints,
        ConsoleEndpoints::new(state.clone()),
        ChannelsEndpoints::new(state.clone()),
        StatusEndpoints::new(state.clone()),
        IdentityEndpoints::new(state),
    )
}
