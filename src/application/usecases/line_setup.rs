use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{
    errors::ChannelError,
    models::{ChannelId, ChannelRecord, LineChannelPatch, LineField},
    repositories::ChannelRecordRepository,
};

/// Persists one wizard step as soon as the operator advances past it.
pub struct SaveLineFieldUseCase {
    repo: Arc<dyn ChannelRecordRepository>,
}

pub struct SaveLineFieldRequest {
    /// Record being filled in. `None` until the first step has been saved.
    pub channel_id: Option<ChannelId>,
    pub field: LineField,
    pub value: String,
}

impl SaveLineFieldUseCase {
    pub fn new(repo: Arc<dyn ChannelRecordRepository>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, request: SaveLineFieldRequest) -> Result<ChannelRecord, ChannelError> {
        let value = request.value.trim().to_string();
        if value.is_empty() {
            return Err(ChannelError::IncompleteSetup(vec![
                request.field.as_str().to_string(),
            ]));
        }

        let patch = LineChannelPatch::single(request.field, value);
        let record = match request.channel_id {
            Some(id) => self.repo.update_line(id, patch).await?,
            None => self.repo.create_line(patch).await?,
        };
        info!(
            channel_id = record.id,
            field = request.field.as_str(),
            "line setup step saved"
        );
        Ok(record)
    }
}

/// Final wizard step: checks that every field landed, verifies the credentials with the backend
/// and attaches the bot's Basic ID.
pub struct CompleteLineSetupUseCase {
    repo: Arc<dyn ChannelRecordRepository>,
}

impl CompleteLineSetupUseCase {
    pub fn new(repo: Arc<dyn ChannelRecordRepository>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, channel_id: ChannelId) -> Result<ChannelRecord, ChannelError> {
        let record = self
            .repo
            .current_line()
            .await?
            .filter(|record| record.id == channel_id)
            .ok_or_else(|| ChannelError::NotFound(format!("line channel {channel_id}")))?;

        let missing = record.missing_fields();
        if !missing.is_empty() {
            return Err(ChannelError::IncompleteSetup(missing));
        }

        let record = self.repo.verify_line(record.id).await?;
        info!(channel_id = record.id, "line credentials verified");

        if record.basic_id.is_some() {
            return Ok(record);
        }
        Ok(self.attach_basic_id(record).await)
    }

    /// Best effort. A failed lookup leaves the record as it was.
    async fn attach_basic_id(&self, record: ChannelRecord) -> ChannelRecord {
        let Some(token) = record
            .line_credentials()
            .and_then(|credentials| credentials.channel_access_token.clone())
        else {
            return record;
        };

        let basic_id = match self.repo.resolve_basic_id(&token).await {
            Ok(Some(basic_id)) => basic_id,
            Ok(None) => return record,
            Err(err) => {
                warn!(channel_id = record.id, error = %err, "basic id lookup failed");
                return record;
            }
        };

        let patch = LineChannelPatch {
            basic_id: Some(basic_id),
            ..Default::default()
        };
        match self.repo.update_line(record.id, patch).await {
            Ok(updated) => updated,
            Err(err) => {
                warn!(channel_id = record.id, error = %err, "failed to store basic id");
                record
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::models::{ConnectionStatus, SdkSettings},
        infrastructure::repositories::in_memory::InMemoryChannelRepository,
    };

    fn repo() -> Arc<InMemoryChannelRepository> {
        Arc::new(InMemoryChannelRepository::new(SdkSettings {
            app_id: "1234".to_string(),
            api_version: "v23.0".to_string(),
        }))
    }

    #[tokio::test]
    async fn first_step_creates_and_later_steps_patch() {
        let repo = repo();
        let save = SaveLineFieldUseCase::new(repo.clone());

        let created = save
            .execute(SaveLineFieldRequest {
                channel_id: None,
                field: LineField::ChannelId,
                value: " 1650000000 ".to_string(),
            })
            .await
            .unwrap();
        let patched = save
            .execute(SaveLineFieldRequest {
                channel_id: Some(created.id),
                field: LineField::ChannelSecret,
                value: "secret".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(created.id, patched.id);
        assert_eq!(patched.external_id, "1650000000");
        let current = repo.current_line().await.unwrap().unwrap();
        assert!(current.line_credentials().unwrap().channel_secret.is_some());
    }

    #[tokio::test]
    async fn blank_value_is_not_saved() {
        let repo = repo();
        let save = SaveLineFieldUseCase::new(repo.clone());

        let err = save
            .execute(SaveLineFieldRequest {
                channel_id: None,
                field: LineField::ChannelId,
                value: "   ".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ChannelError::IncompleteSetup(vec!["channel_id".to_string()])
        );
        assert!(repo.current_line().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn completion_lists_missing_fields() {
        let repo = repo();
        let created = repo
            .create_line(LineChannelPatch::single(
                LineField::ChannelId,
                "1650000000".to_string(),
            ))
            .await
            .unwrap();

        let err = CompleteLineSetupUseCase::new(repo)
            .execute(created.id)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ChannelError::IncompleteSetup(vec![
                "channel_secret".to_string(),
                "channel_access_token".to_string(),
                "login_channel_id".to_string(),
                "login_channel_secret".to_string(),
            ])
        );
    }

    #[tokio::test]
    async fn completion_survives_unresolvable_basic_id() {
        let repo = repo();
        let save = SaveLineFieldUseCase::new(repo.clone());
        let mut channel_id = None;
        for field in LineField::ALL {
            let record = save
                .execute(SaveLineFieldRequest {
                    channel_id,
                    field,
                    value: format!("{}-value", field.as_str()),
                })
                .await
                .unwrap();
            channel_id = Some(record.id);
        }

        let record = CompleteLineSetupUseCase::new(repo)
            .execute(channel_id.unwrap())
            .await
            .unwrap();

        assert!(record.missing_fields().is_empty());
        assert!(record.basic_id.is_none());
    }

    #[tokio::test]
    async fn completion_marks_the_channel_connected() {
        let repo = repo();
        let mut patch = LineChannelPatch::single(LineField::ChannelId, "1650000000".to_string());
        patch.channel_secret = Some(secrecy::Secret::new("secret".to_string()));
        patch.channel_access_token = Some(secrecy::Secret::new("token".to_string()));
        patch.login_channel_id = Some("2000000000".to_string());
        patch.login_channel_secret = Some(secrecy::Secret::new("login-secret".to_string()));
        let created = repo.create_line(patch).await.unwrap();
        assert_eq!(created.connection_status, ConnectionStatus::Disconnected);

        let record = CompleteLineSetupUseCase::new(repo.clone())
            .execute(created.id)
            .await
            .unwrap();

        assert_eq!(record.connection_status, ConnectionStatus::Connected);
        assert!(record.last_verified_at.is_some());
        let stored = repo.current_line().await.unwrap().unwrap();
        assert_eq!(stored.connection_status, ConnectionStatus::Connected);
    }
}
