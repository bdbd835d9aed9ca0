use async_trait::async_trait;
use secrecy::Secret;

use crate::domain::{
    errors::ChannelError,
    models::{
        ChannelId, ChannelRecord, ChannelStatusSnapshot, FacebookChannelDraft, LineChannelPatch,
        SdkSettings,
    },
};

/// Contract of the persisted-record backend. Implemented over HTTP in production.
#[async_trait]
pub trait ChannelRecordRepository: Send + Sync {
    async fn current_line(&self) -> Result<Option<ChannelRecord>, ChannelError>;
    async fn list_facebook(&self) -> Result<Vec<ChannelRecord>, ChannelError>;

    async fn create_line(&self, patch: LineChannelPatch) -> Result<ChannelRecord, ChannelError>;
    async fn update_line(
        &self,
        id: ChannelId,
        patch: LineChannelPatch,
    ) -> Result<ChannelRecord, ChannelError>;
    async fn delete_line(&self, id: ChannelId) -> Result<(), ChannelError>;

    async fn create_facebook(
        &self,
        draft: FacebookChannelDraft,
    ) -> Result<ChannelRecord, ChannelError>;
    async fn update_facebook(
        &self,
        id: ChannelId,
        draft: FacebookChannelDraft,
    ) -> Result<ChannelRecord, ChannelError>;

    /// Re-verifies the live status of an existing LINE record.
    async fn verify_line(&self, id: ChannelId) -> Result<ChannelRecord, ChannelError>;
    async fn line_status(&self) -> Result<ChannelStatusSnapshot, ChannelError>;
    async fn sdk_settings(&self) -> Result<SdkSettings, ChannelError>;
    async fn resolve_basic_id(
        &self,
        channel_access_token: &Secret<String>,
    ) -> Result<Option<String>, ChannelError>;
}
