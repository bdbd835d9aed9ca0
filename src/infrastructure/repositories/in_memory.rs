use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use secrecy::Secret;
use tokio::sync::RwLock;

use crate::domain::{
    errors::ChannelError,
    models::{
        ChannelCredentials, ChannelId, ChannelRecord, ChannelStatusSnapshot, ConnectionStatus,
        FacebookChannelDraft, FacebookCredentials, LineChannelPatch, LineCredentials, LineField,
        Platform, SdkSettings,
    },
    repositories::ChannelRecordRepository,
};

/// Channel backend kept in process memory. Mirrors the rules of the real backend:
/// a single LINE record, any number of Facebook pages.
pub struct InMemoryChannelRepository {
    line: Arc<RwLock<Option<ChannelRecord>>>,
    facebook: Arc<RwLock<BTreeMap<ChannelId, ChannelRecord>>>,
    next_id: AtomicI64,
    sdk: SdkSettings,
    offline: AtomicBool,
}

impl InMemoryChannelRepository {
    pub fn new(sdk: SdkSettings) -> Self {
        Self {
            line: Arc::default(),
            facebook: Arc::default(),
            next_id: AtomicI64::new(1),
            sdk,
            offline: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent call fail as if the backend were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub async fn set_connection_status(&self, id: ChannelId, status: ConnectionStatus) {
        if let Some(record) = self.line.write().await.as_mut().filter(|r| r.id == id) {
            record.connection_status = status;
            return;
        }
        if let Some(record) = self.facebook.write().await.get_mut(&id) {
            record.connection_status = status;
        }
    }

    pub async fn facebook_record(&self, id: ChannelId) -> Option<ChannelRecord> {
        self.facebook.read().await.get(&id).cloned()
    }

    fn ensure_online(&self) -> Result<(), ChannelError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ChannelError::persistence("channel backend unavailable"));
        }
        Ok(())
    }

    fn next_id(&self) -> ChannelId {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn apply_line_patch(record: &mut ChannelRecord, patch: LineChannelPatch) {
        if let Some(channel_id) = patch.channel_id {
            record.external_id = channel_id;
        }
        if patch.channel_name.is_some() {
            record.display_name = patch.channel_name;
        }
        if patch.basic_id.is_some() {
            record.basic_id = patch.basic_id;
        }
        if let ChannelCredentials::Line(credentials) = &mut record.credentials {
            if patch.channel_secret.is_some() {
                credentials.channel_secret = patch.channel_secret;
            }
            if patch.channel_access_token.is_some() {
                credentials.channel_access_token = patch.channel_access_token;
            }
            if patch.login_channel_id.is_some() {
                credentials.login_channel_id = patch.login_channel_id;
            }
            if patch.login_channel_secret.is_some() {
                credentials.login_channel_secret = patch.login_channel_secret;
            }
        }
    }

    fn build_facebook_record(id: ChannelId, draft: FacebookChannelDraft) -> ChannelRecord {
        ChannelRecord {
            id,
            platform: Platform::FacebookPage,
            external_id: draft.page_id,
            display_name: draft.channel_name,
            basic_id: None,
            credentials: ChannelCredentials::Facebook(FacebookCredentials {
                page_access_token: Some(draft.page_access_token),
            }),
            connection_status: draft.connection_status,
            last_verified_at: Some(draft.last_verified_at),
        }
    }
}

#[async_trait]
impl ChannelRecordRepository for InMemoryChannelRepository {
    async fn current_line(&self) -> Result<Option<ChannelRecord>, ChannelError> {
        self.ensure_online()?;
        Ok(self.line.read().await.clone())
    }

    async fn list_facebook(&self) -> Result<Vec<ChannelRecord>, ChannelError> {
        self.ensure_online()?;
        let facebook = self.facebook.read().await;
        Ok(facebook.values().rev().cloned().collect())
    }

    async fn create_line(&self, patch: LineChannelPatch) -> Result<ChannelRecord, ChannelError> {
        self.ensure_online()?;
        let mut line = self.line.write().await;
        if line.is_some() {
            return Err(ChannelError::Persistence {
                http_status: Some(400),
                message: "a LINE channel already exists, update it instead".to_string(),
            });
        }

        let mut record = ChannelRecord {
            id: self.next_id(),
            platform: Platform::LineOfficialAccount,
            external_id: String::new(),
            display_name: None,
            basic_id: None,
            credentials: ChannelCredentials::Line(LineCredentials::default()),
            connection_status: ConnectionStatus::Disconnected,
            last_verified_at: None,
        };
        Self::apply_line_patch(&mut record, patch);
        *line = Some(record.clone());
        Ok(record)
    }

    async fn update_line(
        &self,
        id: ChannelId,
        patch: LineChannelPatch,
    ) -> Result<ChannelRecord, ChannelError> {
        self.ensure_online()?;
        let mut line = self.line.write().await;
        let record = line
            .as_mut()
            .filter(|record| record.id == id)
            .ok_or_else(|| ChannelError::NotFound(format!("line channel {id}")))?;
        Self::apply_line_patch(record, patch);
        Ok(record.clone())
    }

    async fn delete_line(&self, id: ChannelId) -> Result<(), ChannelError> {
        self.ensure_online()?;
        let mut line = self.line.write().await;
        match line.as_ref() {
            Some(record) if record.id == id => {
                *line = None;
                Ok(())
            }
            _ => Err(ChannelError::NotFound(format!("line channel {id}"))),
        }
    }

    async fn create_facebook(
        &self,
        draft: FacebookChannelDraft,
    ) -> Result<ChannelRecord, ChannelError> {
        self.ensure_online()?;
        let record = Self::build_facebook_record(self.next_id(), draft);
        self.facebook
            .write()
            .await
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_facebook(
        &self,
        id: ChannelId,
        draft: FacebookChannelDraft,
    ) -> Result<ChannelRecord, ChannelError> {
        self.ensure_online()?;
        let mut facebook = self.facebook.write().await;
        let existing = facebook
            .get_mut(&id)
            .ok_or_else(|| ChannelError::NotFound(format!("facebook channel {id}")))?;
        *existing = Self::build_facebook_record(id, draft);
        Ok(existing.clone())
    }

    async fn verify_line(&self, id: ChannelId) -> Result<ChannelRecord, ChannelError> {
        self.ensure_online()?;
        let mut line = self.line.write().await;
        let record = line
            .as_mut()
            .filter(|record| record.id == id)
            .ok_or_else(|| ChannelError::NotFound(format!("line channel {id}")))?;

        let missing = record.missing_fields();
        if !missing.is_empty() {
            record.connection_status = ConnectionStatus::Expired;
            return Err(ChannelError::Verification(format!(
                "missing {}",
                missing.join(", ")
            )));
        }

        record.connection_status = ConnectionStatus::Connected;
        record.last_verified_at = Some(Utc::now());
        Ok(record.clone())
    }

    async fn line_status(&self) -> Result<ChannelStatusSnapshot, ChannelError> {
        self.ensure_online()?;
        let line = self.line.read().await;
        Ok(match line.as_ref() {
            Some(record) => {
                let missing_fields = record.missing_fields();
                ChannelStatusSnapshot {
                    is_configured: missing_fields.is_empty(),
                    has_active_channel: true,
                    missing_fields,
                    channel_id: Some(record.id),
                }
            }
            None => ChannelStatusSnapshot {
                is_configured: false,
                has_active_channel: false,
                missing_fields: LineField::ALL
                    .iter()
                    .map(|field| field.as_str().to_string())
                    .collect(),
                channel_id: None,
            },
        })
    }

    async fn sdk_settings(&self) -> Result<SdkSettings, ChannelError> {
        self.ensure_online()?;
        Ok(self.sdk.clone())
    }

    async fn resolve_basic_id(
        &self,
        _channel_access_token: &Secret<String>,
    ) -> Result<Option<String>, ChannelError> {
        self.ensure_online()?;
        Ok(None)
    }
}
