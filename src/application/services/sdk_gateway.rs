use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use secrecy::Secret;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    application::services::identity::IdentityProvider,
    domain::{
        errors::ChannelError,
        models::{
            Business, LoginStatus, ManagedPage, PageAccessToken, SdkConfig, SdkReadiness,
        },
    },
};

type LoadFuture = Shared<BoxFuture<'static, Result<(), ChannelError>>>;

enum LoadSlot {
    NotLoaded,
    Loading(LoadFuture),
    Ready,
    Failed(ChannelError),
}

/// Lazily loads the identity SDK once and exposes its operations as plain async calls.
///
/// Concurrent `ensure_loaded` callers share a single in-flight load. A failed load is sticky
/// until `clear_error` is called.
pub struct ExternalSdkGateway {
    provider: Arc<dyn IdentityProvider>,
    slot: Mutex<LoadSlot>,
    readiness: watch::Sender<SdkReadiness>,
}

impl ExternalSdkGateway {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let (readiness, _) = watch::channel(SdkReadiness::NotLoaded);
        Self {
            provider,
            slot: Mutex::new(LoadSlot::NotLoaded),
            readiness,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn readiness(&self) -> SdkReadiness {
        self.readiness.borrow().clone()
    }

    pub async fn ensure_loaded(&self, config: &SdkConfig) -> Result<(), ChannelError> {
        let load = {
            let mut slot = self.lock();
            let in_flight = match &*slot {
                LoadSlot::Ready => return Ok(()),
                LoadSlot::Failed(err) => return Err(err.clone()),
                LoadSlot::Loading(load) => Some(load.clone()),
                LoadSlot::NotLoaded => None,
            };

            match in_flight {
                Some(load) => {
                    debug!(provider = self.provider.name(), "joining in-flight SDK load");
                    load
                }
                None => {
                    if let Err(err) = config.validate() {
                        warn!(provider = self.provider.name(), error = %err, "SDK configuration rejected");
                        self.settle(&mut slot, Err(err.clone()));
                        return Err(err);
                    }

                    info!(
                        provider = self.provider.name(),
                        api_version = %config.api_version,
                        locale = %config.locale,
                        "loading identity SDK"
                    );
                    let provider = Arc::clone(&self.provider);
                    let config = config.clone();
                    let load = async move { provider.load(&config).await }
                        .boxed()
                        .shared();
                    *slot = LoadSlot::Loading(load.clone());
                    self.readiness.send_replace(SdkReadiness::Loading);
                    load
                }
            }
        };

        let result = load.await;

        let mut slot = self.lock();
        if matches!(*slot, LoadSlot::Loading(_)) {
            self.settle(&mut slot, result.clone());
        }
        result
    }

    /// Forgets a failed load so the next `ensure_loaded` tries again.
    pub fn clear_error(&self) -> bool {
        let mut slot = self.lock();
        if matches!(*slot, LoadSlot::Failed(_)) {
            *slot = LoadSlot::NotLoaded;
            self.readiness.send_replace(SdkReadiness::NotLoaded);
            info!(provider = self.provider.name(), "SDK error cleared");
            return true;
        }
        false
    }

    /// Runs a provider login and only accepts a `connected` outcome.
    pub async fn login(&self, scope: &str) -> Result<Secret<String>, ChannelError> {
        self.ensure_ready()?;
        let response = self.provider.login(scope).await?;
        match (response.status, response.access_token) {
            (LoginStatus::Connected, Some(token)) => Ok(token),
            (LoginStatus::Connected, None) => Err(ChannelError::Provider(
                "login reported connected without an access token".to_string(),
            )),
            (status, _) => {
                info!(provider = self.provider.name(), %status, "provider login not completed");
                Err(ChannelError::AuthCancelled { status })
            }
        }
    }

    pub async fn login_status(&self) -> Result<LoginStatus, ChannelError> {
        self.ensure_ready()?;
        self.provider.login_status().await
    }

    pub async fn managed_pages(&self) -> Result<Vec<ManagedPage>, ChannelError> {
        self.ensure_ready()?;
        self.provider.managed_pages().await
    }

    pub async fn businesses(&self) -> Result<Vec<Business>, ChannelError> {
        self.ensure_ready()?;
        self.provider.businesses().await
    }

    pub async fn business_pages(&self, business_id: &str) -> Result<Vec<ManagedPage>, ChannelError> {
        self.ensure_ready()?;
        let business_id = business_id.trim();
        if business_id.is_empty() {
            return Err(ChannelError::Provider("business id must not be empty".to_string()));
        }
        self.provider.business_pages(business_id).await
    }

    pub async fn page_access_token(&self, page_id: &str) -> Result<PageAccessToken, ChannelError> {
        self.ensure_ready()?;
        let page_id = page_id.trim();
        if page_id.is_empty() {
            return Err(ChannelError::Provider("page id must not be empty".to_string()));
        }
        self.provider.page_access_token(page_id).await
    }

    fn ensure_ready(&self) -> Result<(), ChannelError> {
        match *self.lock() {
            LoadSlot::Ready => Ok(()),
            _ => Err(ChannelError::SdkNotReady),
        }
    }

    fn settle(&self, slot: &mut LoadSlot, result: Result<(), ChannelError>) {
        match result {
            Ok(()) => {
                *slot = LoadSlot::Ready;
                self.readiness.send_replace(SdkReadiness::Ready);
                info!(provider = self.provider.name(), "identity SDK ready");
            }
            Err(err) => {
                warn!(provider = self.provider.name(), error = %err, "identity SDK unavailable");
                self.readiness
                    .send_replace(SdkReadiness::Error(err.to_string()));
                *slot = LoadSlot::Failed(err);
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, LoadSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
