#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use channel_console::{
    application::{
        handlers::coordinator::{ChannelAuthCoordinator, CoordinatorSettings},
        services::{
            credentials::CredentialExchange, identity::IdentityProvider,
            sdk_gateway::ExternalSdkGateway, status_store::ChannelStatusStore,
        },
    },
    domain::{
        errors::ChannelError,
        models::{
            Business, ChannelId, ChannelRecord, ChannelStatusSnapshot, FacebookChannelDraft,
            LineChannelPatch, LineField, LoginResponse, LoginStatus, ManagedPage,
            PageAccessToken, SdkConfig, SdkSettings, ServiceSession,
        },
        repositories::ChannelRecordRepository,
    },
    infrastructure::repositories::in_memory::InMemoryChannelRepository,
};
use secrecy::{ExposeSecret, Secret};
use tokio::sync::Notify;

pub const SCOPE: &str = "pages_show_list,pages_messaging";

pub fn sdk_settings() -> SdkSettings {
    SdkSettings {
        app_id: "1234".to_string(),
        api_version: "23.0".to_string(),
    }
}

/// Identity provider scripted per test.
pub struct FakeIdentityProvider {
    pub loads: AtomicUsize,
    pub logins: AtomicUsize,
    pub token_lookups: AtomicUsize,
    pub login_entered: Notify,
    login: Mutex<LoginResponse>,
    pages: Mutex<Vec<ManagedPage>>,
    page_token: Mutex<Option<String>>,
    login_gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeIdentityProvider {
    pub fn new() -> Self {
        Self {
            loads: AtomicUsize::new(0),
            logins: AtomicUsize::new(0),
            token_lookups: AtomicUsize::new(0),
            login_entered: Notify::new(),
            login: Mutex::new(LoginResponse::connected("abc")),
            pages: Mutex::new(Vec::new()),
            page_token: Mutex::new(Some("page-token".to_string())),
            login_gate: Mutex::new(None),
        }
    }

    pub fn with_pages(self, pages: &[(&str, &str)]) -> Self {
        *self.pages.lock().unwrap() = pages
            .iter()
            .map(|(id, name)| ManagedPage {
                id: id.to_string(),
                name: Some(name.to_string()),
                access_token: None,
            })
            .collect();
        self
    }

    pub fn with_login(self, response: LoginResponse) -> Self {
        *self.login.lock().unwrap() = response;
        self
    }

    /// Holds every login until `gate` is notified.
    pub fn gate_login(&self, gate: Arc<Notify>) {
        *self.login_gate.lock().unwrap() = Some(gate);
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn load(&self, _config: &SdkConfig) -> Result<(), ChannelError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn login(&self, _scope: &str) -> Result<LoginResponse, ChannelError> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        self.login_entered.notify_one();
        let gate = self.login_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(self.login.lock().unwrap().clone())
    }

    async fn login_status(&self) -> Result<LoginStatus, ChannelError> {
        Ok(self.login.lock().unwrap().status)
    }

    async fn managed_pages(&self) -> Result<Vec<ManagedPage>, ChannelError> {
        Ok(self.pages.lock().unwrap().clone())
    }

    async fn businesses(&self) -> Result<Vec<Business>, ChannelError> {
        Ok(Vec::new())
    }

    async fn business_pages(&self, _business_id: &str) -> Result<Vec<ManagedPage>, ChannelError> {
        Ok(Vec::new())
    }

    async fn page_access_token(&self, page_id: &str) -> Result<PageAccessToken, ChannelError> {
        self.token_lookups.fetch_add(1, Ordering::SeqCst);
        let token = self.page_token.lock().unwrap().clone();
        token
            .map(|token| PageAccessToken {
                page_id: page_id.to_string(),
                name: None,
                access_token: Secret::new(token),
            })
            .ok_or_else(|| ChannelError::Provider("no page token".to_string()))
    }
}

/// Records every external token it is asked to exchange.
pub struct FakeExchanger {
    exchanged: Mutex<Vec<String>>,
    failure: Mutex<Option<ChannelError>>,
}

impl FakeExchanger {
    pub fn new() -> Self {
        Self {
            exchanged: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
        }
    }

    pub fn failing(error: ChannelError) -> Self {
        let exchanger = Self::new();
        *exchanger.failure.lock().unwrap() = Some(error);
        exchanger
    }

    pub fn exchanged(&self) -> Vec<String> {
        self.exchanged.lock().unwrap().clone()
    }
}

#[async_trait]
impl CredentialExchange for FakeExchanger {
    async fn request_meta_login(
        &self,
        external_access_token: &Secret<String>,
    ) -> Result<ServiceSession, ChannelError> {
        self.exchanged
            .lock()
            .unwrap()
            .push(external_access_token.expose_secret().clone());
        match self.failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(ServiceSession::new("service-session")),
        }
    }
}

/// In-memory backend that logs the name of every call made through the repository contract.
pub struct RecordingRepository {
    pub inner: InMemoryChannelRepository,
    pub facebook_write_entered: Notify,
    calls: Mutex<Vec<&'static str>>,
    facebook_write_gate: Mutex<Option<Arc<Notify>>>,
}

impl RecordingRepository {
    pub fn new() -> Self {
        Self::with_settings(sdk_settings())
    }

    pub fn with_settings(settings: SdkSettings) -> Self {
        Self {
            inner: InMemoryChannelRepository::new(settings),
            facebook_write_entered: Notify::new(),
            calls: Mutex::new(Vec::new()),
            facebook_write_gate: Mutex::new(None),
        }
    }

    /// Holds every Facebook create until `gate` is notified.
    pub fn gate_facebook_writes(&self, gate: Arc<Notify>) {
        *self.facebook_write_gate.lock().unwrap() = Some(gate);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls().iter().filter(|call| **call == name).count()
    }

    pub fn reset(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }

    /// Seeds a LINE record with every wizard field filled in.
    pub async fn seed_complete_line(&self) -> ChannelRecord {
        let mut patch = LineChannelPatch::single(LineField::ChannelId, "1650000000".to_string());
        patch.channel_secret = Some(Secret::new("secret".to_string()));
        patch.channel_access_token = Some(Secret::new("line-token".to_string()));
        patch.login_channel_id = Some("2000000000".to_string());
        patch.login_channel_secret = Some(Secret::new("login-secret".to_string()));
        self.inner.create_line(patch).await.unwrap()
    }
}

#[async_trait]
impl ChannelRecordRepository for RecordingRepository {
    async fn current_line(&self) -> Result<Option<ChannelRecord>, ChannelError> {
        self.record("current_line");
        self.inner.current_line().await
    }

    async fn list_facebook(&self) -> Result<Vec<ChannelRecord>, ChannelError> {
        self.record("list_facebook");
        self.inner.list_facebook().await
    }

    async fn create_line(&self, patch: LineChannelPatch) -> Result<ChannelRecord, ChannelError> {
        self.record("create_line");
        self.inner.create_line(patch).await
    }

    async fn update_line(
        &self,
        id: ChannelId,
        patch: LineChannelPatch,
    ) -> Result<ChannelRecord, ChannelError> {
        self.record("update_line");
        self.inner.update_line(id, patch).await
    }

    async fn delete_line(&self, id: ChannelId) -> Result<(), ChannelError> {
        self.record("delete_line");
        self.inner.delete_line(id).await
    }

    async fn create_facebook(
        &self,
        draft: FacebookChannelDraft,
    ) -> Result<ChannelRecord, ChannelError> {
        self.record("create_facebook");
        self.facebook_write_entered.notify_one();
        let gate = self.facebook_write_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.inner.create_facebook(draft).await
    }

    async fn update_facebook(
        &self,
        id: ChannelId,
        draft: FacebookChannelDraft,
    ) -> Result<ChannelRecord, ChannelError> {
        self.record("update_facebook");
        self.inner.update_facebook(id, draft).await
    }

    async fn verify_line(&self, id: ChannelId) -> Result<ChannelRecord, ChannelError> {
        self.record("verify_line");
        self.inner.verify_line(id).await
    }

    async fn line_status(&self) -> Result<ChannelStatusSnapshot, ChannelError> {
        self.record("line_status");
        self.inner.line_status().await
    }

    async fn sdk_settings(&self) -> Result<SdkSettings, ChannelError> {
        self.record("sdk_settings");
        self.inner.sdk_settings().await
    }

    async fn resolve_basic_id(
        &self,
        channel_access_token: &Secret<String>,
    ) -> Result<Option<String>, ChannelError> {
        self.record("resolve_basic_id");
        self.inner.resolve_basic_id(channel_access_token).await
    }
}

pub struct Harness {
    pub repo: Arc<RecordingRepository>,
    pub identity: Arc<FakeIdentityProvider>,
    pub exchanger: Arc<FakeExchanger>,
    pub status: Arc<ChannelStatusStore>,
    pub coordinator: Arc<ChannelAuthCoordinator>,
}

impl Harness {
    pub fn new(
        repo: RecordingRepository,
        identity: FakeIdentityProvider,
        exchanger: FakeExchanger,
    ) -> Self {
        let repo = Arc::new(repo);
        let identity = Arc::new(identity);
        let exchanger = Arc::new(exchanger);
        let status = Arc::new(ChannelStatusStore::new(repo.clone()));
        let coordinator = Arc::new(ChannelAuthCoordinator::new(
            repo.clone(),
            Arc::new(ExternalSdkGateway::new(identity.clone())),
            exchanger.clone(),
            status.clone(),
            CoordinatorSettings {
                login_scope: SCOPE.to_string(),
                sdk_locale: "en_US".to_string(),
            },
        ));
        Self {
            repo,
            identity,
            exchanger,
            status,
            coordinator,
        }
    }

    pub fn standard() -> Self {
        Self::new(
            RecordingRepository::new(),
            FakeIdentityProvider::new(),
            FakeExchanger::new(),
        )
    }
}
