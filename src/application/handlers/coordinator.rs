use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    application::{
        services::{
            credentials::CredentialExchange, sdk_gateway::ExternalSdkGateway,
            status_store::ChannelStatusStore,
        },
        usecases::line_setup::{
            CompleteLineSetupUseCase, SaveLineFieldRequest, SaveLineFieldUseCase,
        },
    },
    domain::{
        errors::ChannelError,
        models::{
            ChannelId, ChannelRecord, ConnectionStatus, FacebookChannelDraft, LineField,
            Platform, SdkConfig, ViewEvent, ViewState,
        },
        repositories::ChannelRecordRepository,
    },
};

#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    /// Comma-separated permissions requested from the identity provider.
    pub login_scope: String,
    pub sdk_locale: String,
}

#[derive(Debug, Clone)]
pub enum ReauthorizeOutcome {
    /// LINE credentials still work; the record is connected again.
    Verified(ChannelRecord),
    /// LINE verification failed and the setup wizard was re-entered for the record.
    SetupRequired { channel_id: ChannelId, reason: String },
    /// A fresh page access token was bound to the existing Facebook record.
    Reconnected(ChannelRecord),
}

/// Per-platform single-flight marker. Holds the id of the attempt currently allowed to finish.
#[derive(Default)]
struct BusyGuard {
    current: Mutex<Option<Uuid>>,
}

impl BusyGuard {
    fn lock(&self) -> MutexGuard<'_, Option<Uuid>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn acquire(&self, platform: Platform) -> Result<AttemptTicket<'_>, ChannelError> {
        let mut current = self.lock();
        if current.is_some() {
            return Err(ChannelError::AuthorizationInProgress(platform));
        }
        let attempt = Uuid::new_v4();
        *current = Some(attempt);
        debug!(%platform, %attempt, "authorization attempt started");
        Ok(AttemptTicket {
            guard: self,
            attempt,
        })
    }

    fn release(&self) -> Option<Uuid> {
        self.lock().take()
    }
}

struct AttemptTicket<'a> {
    guard: &'a BusyGuard,
    attempt: Uuid,
}

impl AttemptTicket<'_> {
    /// Fails with `Superseded` once the operator has released the platform.
    fn ensure_current(&self) -> Result<(), ChannelError> {
        if *self.guard.lock() == Some(self.attempt) {
            return Ok(());
        }
        info!(attempt = %self.attempt, "discarding result of a released attempt");
        Err(ChannelError::Superseded)
    }
}

impl Drop for AttemptTicket<'_> {
    fn drop(&mut self) {
        let mut current = self.guard.lock();
        if *current == Some(self.attempt) {
            *current = None;
        }
    }
}

/// Drives the console through connecting, setting up and re-authorizing channels.
///
/// Every view change goes through [`ViewState::transition`]; a failed operation leaves the
/// view where it was, except for the LINE re-verification fallback.
pub struct ChannelAuthCoordinator {
    repo: Arc<dyn ChannelRecordRepository>,
    gateway: Arc<ExternalSdkGateway>,
    exchange: Arc<dyn CredentialExchange>,
    status: Arc<ChannelStatusStore>,
    settings: CoordinatorSettings,
    view: watch::Sender<ViewState>,
    accounts: RwLock<Vec<ChannelRecord>>,
    line_busy: BusyGuard,
    facebook_busy: BusyGuard,
}

impl ChannelAuthCoordinator {
    pub fn new(
        repo: Arc<dyn ChannelRecordRepository>,
        gateway: Arc<ExternalSdkGateway>,
        exchange: Arc<dyn CredentialExchange>,
        status: Arc<ChannelStatusStore>,
        settings: CoordinatorSettings,
    ) -> Self {
        let (view, _) = watch::channel(ViewState::Loading);
        Self {
            repo,
            gateway,
            exchange,
            status,
            settings,
            view,
            accounts: RwLock::new(Vec::new()),
            line_busy: BusyGuard::default(),
            facebook_busy: BusyGuard::default(),
        }
    }

    pub fn view(&self) -> ViewState {
        self.view.borrow().clone()
    }

    pub fn subscribe_view(&self) -> watch::Receiver<ViewState> {
        self.view.subscribe()
    }

    pub fn accounts(&self) -> Vec<ChannelRecord> {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Fetches LINE and Facebook records together and settles the view on `Empty` or
    /// `AccountList`.
    pub async fn load(&self) -> Result<ViewState, ChannelError> {
        let (line, facebook) =
            tokio::try_join!(self.repo.current_line(), self.repo.list_facebook())?;

        let records: Vec<ChannelRecord> = line.into_iter().chain(facebook).collect();
        let usable = records.iter().filter(|record| record.is_usable()).count();
        info!(records = records.len(), usable, "channel records loaded");

        *self.accounts.write().unwrap_or_else(PoisonError::into_inner) = records;
        Ok(self.apply(ViewEvent::AccountsLoaded { usable }))
    }

    /// Opens the LINE setup wizard. Only one LINE channel may exist, which is checked against
    /// the loaded records without touching the network.
    pub fn connect_line(&self) -> Result<ViewState, ChannelError> {
        let existing = self
            .accounts()
            .into_iter()
            .find(|record| record.platform == Platform::LineOfficialAccount);

        let resume = match existing {
            Some(record) if record.missing_fields().is_empty() => {
                info!(channel_id = record.id, "line channel already connected");
                return Err(ChannelError::DuplicateLineChannel);
            }
            Some(record) => Some(record.id),
            None => None,
        };
        Ok(self.apply(ViewEvent::LineSetupStarted { resume }))
    }

    pub async fn save_line_field(
        &self,
        field: LineField,
        value: String,
    ) -> Result<ChannelRecord, ChannelError> {
        let resume = self.wizard_record()?;
        let ticket = self.line_busy.acquire(Platform::LineOfficialAccount)?;

        let record = SaveLineFieldUseCase::new(Arc::clone(&self.repo))
            .execute(SaveLineFieldRequest {
                channel_id: resume,
                field,
                value,
            })
            .await?;
        ticket.ensure_current()?;

        self.remember(record.clone());
        self.apply(ViewEvent::LineFieldSaved {
            channel_id: record.id,
        });
        Ok(record)
    }

    pub async fn complete_line_setup(&self) -> Result<ChannelRecord, ChannelError> {
        let channel_id = self.wizard_record()?.ok_or_else(|| {
            ChannelError::IncompleteSetup(
                LineField::ALL
                    .iter()
                    .map(|field| field.as_str().to_string())
                    .collect(),
            )
        })?;
        let ticket = self.line_busy.acquire(Platform::LineOfficialAccount)?;

        let record = CompleteLineSetupUseCase::new(Arc::clone(&self.repo))
            .execute(channel_id)
            .await?;
        ticket.ensure_current()?;

        self.refresh_status_best_effort().await;
        self.remember(record.clone());
        self.apply(ViewEvent::LineSetupCompleted);
        info!(channel_id, "line setup completed");
        Ok(record)
    }

    pub fn abandon_line_setup(&self) -> Result<ViewState, ChannelError> {
        self.wizard_record()?;
        let remaining = self.usable_accounts();
        Ok(self.apply(ViewEvent::LineSetupAbandoned { remaining }))
    }

    pub async fn remove_line(&self, channel_id: ChannelId) -> Result<ViewState, ChannelError> {
        let _ticket = self.line_busy.acquire(Platform::LineOfficialAccount)?;
        self.repo.delete_line(channel_id).await?;
        info!(channel_id, "line channel removed");

        self.accounts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|record| {
                !(record.platform == Platform::LineOfficialAccount && record.id == channel_id)
            });
        self.refresh_status_best_effort().await;
        let remaining = self.usable_accounts();
        Ok(self.apply(ViewEvent::ChannelRemoved { remaining }))
    }

    /// Runs the Facebook authorization sequence and binds the first managed page, either to a
    /// new record or to `target` when rebinding an existing one.
    pub async fn connect_facebook(
        &self,
        target: Option<ChannelId>,
    ) -> Result<ChannelRecord, ChannelError> {
        let ticket = self.facebook_busy.acquire(Platform::FacebookPage)?;
        let record = self.authorize_facebook(&ticket, target).await?;
        self.apply(ViewEvent::FacebookConnected);
        // A persisted record is kept even if the attempt was released during the write.
        ticket.ensure_current()?;
        Ok(record)
    }

    pub async fn reauthorize(
        &self,
        platform: Platform,
        channel_id: ChannelId,
    ) -> Result<ReauthorizeOutcome, ChannelError> {
        match platform {
            Platform::LineOfficialAccount => self.reverify_line(channel_id).await,
            Platform::FacebookPage => self
                .connect_facebook(Some(channel_id))
                .await
                .map(ReauthorizeOutcome::Reconnected),
        }
    }

    /// Abandons the in-flight attempt for `platform`. Its eventual result is reported as
    /// `Superseded`; a record whose write had already started is still kept.
    pub fn release(&self, platform: Platform) -> bool {
        let released = match platform {
            Platform::LineOfficialAccount => self.line_busy.release(),
            Platform::FacebookPage => self.facebook_busy.release(),
        };
        if let Some(attempt) = released {
            info!(%platform, %attempt, "authorization attempt released");
        }
        released.is_some()
    }

    async fn authorize_facebook(
        &self,
        ticket: &AttemptTicket<'_>,
        target: Option<ChannelId>,
    ) -> Result<ChannelRecord, ChannelError> {
        let settings = self.repo.sdk_settings().await?;
        let config = SdkConfig::from_settings(settings, self.settings.sdk_locale.clone());
        self.gateway.ensure_loaded(&config).await?;
        ticket.ensure_current()?;

        let user_token = self.gateway.login(&self.settings.login_scope).await?;
        ticket.ensure_current()?;

        self.exchange.request_meta_login(&user_token).await?;
        ticket.ensure_current()?;

        let mut pages = self
            .gateway
            .managed_pages()
            .await?
            .into_iter()
            .filter(|page| !page.id.trim().is_empty());
        let page = pages.next().ok_or(ChannelError::NoManageablePages)?;
        let skipped = pages.count();
        if skipped > 0 {
            info!(page_id = %page.id, skipped, "several pages managed, binding the first one");
        }

        let page_access_token = match page.access_token {
            Some(token) => token,
            None => self.gateway.page_access_token(&page.id).await?.access_token,
        };
        ticket.ensure_current()?;

        let draft = FacebookChannelDraft {
            page_id: page.id,
            channel_name: page.name,
            page_access_token,
            connection_status: ConnectionStatus::Connected,
            last_verified_at: Utc::now(),
        };
        let record = match target {
            Some(channel_id) => self.repo.update_facebook(channel_id, draft).await?,
            None => self.repo.create_facebook(draft).await?,
        };
        info!(
            channel_id = record.id,
            page_id = %record.external_id,
            rebind = target.is_some(),
            "facebook page connected"
        );

        self.refresh_status_best_effort().await;
        self.remember(record.clone());
        Ok(record)
    }

    async fn reverify_line(&self, channel_id: ChannelId) -> Result<ReauthorizeOutcome, ChannelError> {
        let ticket = self.line_busy.acquire(Platform::LineOfficialAccount)?;

        match self.repo.verify_line(channel_id).await {
            Ok(record) => {
                ticket.ensure_current()?;
                self.refresh_status_best_effort().await;
                self.remember(record.clone());
                info!(channel_id, "line channel verified");
                Ok(ReauthorizeOutcome::Verified(record))
            }
            Err(ChannelError::Verification(reason)) => {
                ticket.ensure_current()?;
                warn!(channel_id, %reason, "line verification failed, re-entering setup");
                self.mark_expired(channel_id);
                self.apply(ViewEvent::LineVerificationFailed { channel_id });
                Ok(ReauthorizeOutcome::SetupRequired { channel_id, reason })
            }
            Err(err) => Err(err),
        }
    }

    fn wizard_record(&self) -> Result<Option<ChannelId>, ChannelError> {
        match self.view() {
            ViewState::LineSetupWizard { resume } => Ok(resume),
            _ => Err(ChannelError::NoSetupInProgress),
        }
    }

    fn apply(&self, event: ViewEvent) -> ViewState {
        let mut next = ViewState::Loading;
        self.view.send_if_modified(|state| {
            next = state.transition(&event);
            if next == *state {
                return false;
            }
            debug!(from = state.as_str(), to = next.as_str(), ?event, "view transition");
            *state = next.clone();
            true
        });
        next
    }

    async fn refresh_status_best_effort(&self) {
        if let Err(err) = self.status.refresh_status().await {
            warn!(error = %err, "status refresh after channel change failed");
        }
    }

    fn remember(&self, record: ChannelRecord) {
        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        match accounts
            .iter_mut()
            .find(|existing| existing.platform == record.platform && existing.id == record.id)
        {
            Some(existing) => *existing = record,
            None => accounts.push(record),
        }
    }

    fn mark_expired(&self, channel_id: ChannelId) {
        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(record) = accounts.iter_mut().find(|record| {
            record.platform == Platform::LineOfficialAccount && record.id == channel_id
        }) {
            record.connection_status = ConnectionStatus::Expired;
        }
    }

    fn usable_accounts(&self) -> usize {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|record| record.is_usable())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_guard_allows_one_attempt_at_a_time() {
        let guard = BusyGuard::default();

        let ticket = guard.acquire(Platform::FacebookPage).unwrap();
        assert!(matches!(
            guard.acquire(Platform::FacebookPage),
            Err(ChannelError::AuthorizationInProgress(Platform::FacebookPage))
        ));

        drop(ticket);
        assert!(guard.acquire(Platform::FacebookPage).is_ok());
    }

    #[test]
    fn released_attempt_is_superseded() {
        let guard = BusyGuard::default();
        let stale = guard.acquire(Platform::LineOfficialAccount).unwrap();

        assert!(guard.release().is_some());
        let fresh = guard.acquire(Platform::LineOfficialAccount).unwrap();

        assert_eq!(stale.ensure_current(), Err(ChannelError::Superseded));
        assert!(fresh.ensure_current().is_ok());

        drop(stale);
        assert!(fresh.ensure_current().is_ok());
    }
}
