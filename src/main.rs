use std::{io::Error, sync::Arc};

use channel_console::{
    application::{
        handlers::coordinator::{ChannelAuthCoordinator, CoordinatorSettings},
        services::{
            sdk_gateway::ExternalSdkGateway, session_cache::ServiceSessionCache,
            status_store::ChannelStatusStore,
        },
    },
    config::Config,
    domain::repositories::ChannelRecordRepository,
    infrastructure::{
        identity::{exchange::CredentialExchangeClient, facebook::FacebookGraphProvider},
        repositories::http::HttpChannelRepository,
    },
    presentation::http::endpoints::root::{ApiState, endpoints},
};
use poem::{Route, Server, listener::TcpListener};
use poem_openapi::OpenApiService;
use tokio::main;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::try_parse().map_err(Error::other)?;

    let server_url = format!("{}://{}:{}", config.scheme, config.host, config.port);

    let repo: Arc<dyn ChannelRecordRepository> =
        Arc::new(HttpChannelRepository::new(config.channel_backend_url.clone())?);
    let facebook = Arc::new(FacebookGraphProvider::new(config.facebook_graph_url.clone())?);
    let gateway = Arc::new(ExternalSdkGateway::new(facebook.clone()));
    let exchange = Arc::new(CredentialExchangeClient::new(
        config.identity_backend_url.clone(),
        config.firm_account.clone(),
        config.firm_password.clone(),
        Arc::new(ServiceSessionCache::new()),
    )?);
    let status_store = Arc::new(ChannelStatusStore::new(repo.clone()));
    let coordinator = Arc::new(ChannelAuthCoordinator::new(
        repo,
        gateway.clone(),
        exchange,
        status_store.clone(),
        CoordinatorSettings {
            login_scope: config.facebook_login_scope.clone(),
            sdk_locale: config.facebook_sdk_locale.clone(),
        },
    ));

    if let Err(err) = status_store.refresh_status().await {
        warn!(error = %err, "initial channel status unavailable");
    }
    if let Err(err) = coordinator.load().await {
        warn!(error = %err, "initial channel load failed, console stays in loading state");
    }

    let state = Arc::new(ApiState {
        coordinator,
        status_store,
        gateway,
        facebook,
    });

    info!(%server_url, "starting channel console");

    let api_service = OpenApiService::new(endpoints(state), "Channel Console API", "0.1.0")
        .server(format!("{}/api", server_url));
    let ui = api_service.swagger_ui();
    let app = Route::new().nest("/api", api_service).nest("/", ui);

    Server::new(TcpListener::bind(format!("0.0.0.0:{}", config.port)))
        .run(app)
        .await?;
    Ok(())
}
