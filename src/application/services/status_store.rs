use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::domain::{
    errors::ChannelError,
    models::{ChannelStatusSnapshot, ChannelStatusView},
    repositories::ChannelRecordRepository,
};

/// Process-wide view of the LINE channel configuration.
///
/// `refresh_status` is the only mutator; everyone else subscribes.
pub struct ChannelStatusStore {
    repo: Arc<dyn ChannelRecordRepository>,
    state: watch::Sender<ChannelStatusView>,
}

impl ChannelStatusStore {
    pub fn new(repo: Arc<dyn ChannelRecordRepository>) -> Self {
        let (state, _) = watch::channel(ChannelStatusView::default());
        Self { repo, state }
    }

    pub fn current(&self) -> ChannelStatusView {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ChannelStatusView> {
        self.state.subscribe()
    }

    /// Fetches the summary from the backend. On failure the snapshot falls back to the
    /// unconfigured default and the error is kept next to it.
    pub async fn refresh_status(&self) -> Result<(), ChannelError> {
        self.state.send_modify(|view| view.is_loading = true);

        match self.repo.line_status().await {
            Ok(snapshot) => {
                debug!(
                    is_configured = snapshot.is_configured,
                    has_active_channel = snapshot.has_active_channel,
                    missing = snapshot.missing_fields.len(),
                    "channel status refreshed"
                );
                self.state.send_replace(ChannelStatusView {
                    snapshot,
                    error: None,
                    is_loading: false,
                    has_fetched_once: true,
                });
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "channel status refresh failed");
                let err = match err {
                    ChannelError::StatusFetch(_) => err,
                    other => ChannelError::StatusFetch(other.to_string()),
                };
                self.state.send_replace(ChannelStatusView {
                    snapshot: ChannelStatusSnapshot::default(),
                    error: Some(err.to_string()),
                    is_loading: false,
                    has_fetched_once: true,
                });
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use secrecy::Secret;

    use super::*;
    use crate::{
        domain::models::{LineChannelPatch, SdkSettings},
        infrastructure::repositories::in_memory::InMemoryChannelRepository,
    };

    fn settings() -> SdkSettings {
        SdkSettings {
            app_id: "1234".to_string(),
            api_version: "v23.0".to_string(),
        }
    }

    #[tokio::test]
    async fn refresh_publishes_backend_snapshot() {
        let repo = Arc::new(InMemoryChannelRepository::new(settings()));
        repo.create_line(LineChannelPatch {
            channel_id: Some("1650000000".to_string()),
            channel_secret: Some(Secret::new("secret".to_string())),
            ..Default::default()
        })
        .await
        .unwrap();
        let store = ChannelStatusStore::new(repo);
        let mut updates = store.subscribe();

        store.refresh_status().await.unwrap();

        assert!(updates.has_changed().unwrap());
        let view = updates.borrow_and_update().clone();
        assert!(view.has_fetched_once);
        assert!(view.error.is_none());
        assert!(view.snapshot.has_active_channel);
        assert!(!view.snapshot.is_configured);
        assert_eq!(
            view.snapshot.missing_fields,
            vec![
                "channel_access_token".to_string(),
                "login_channel_id".to_string(),
                "login_channel_secret".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn failed_refresh_resets_to_unknown_and_records_error() {
        let repo = Arc::new(InMemoryChannelRepository::new(settings()));
        repo.create_line(LineChannelPatch {
            channel_id: Some("1650000000".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
        let store = ChannelStatusStore::new(repo.clone());
        store.refresh_status().await.unwrap();
        assert!(store.current().snapshot.has_active_channel);

        repo.set_offline(true);
        let err = store.refresh_status().await.unwrap_err();

        assert!(matches!(err, ChannelError::StatusFetch(_)));
        let view = store.current();
        assert_eq!(view.snapshot, ChannelStatusSnapshot::default());
        assert!(view.error.is_some());
        assert!(!view.is_loading);
    }
}
