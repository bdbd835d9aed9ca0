use serde::{Deserialize, Serialize};

use super::channel::ChannelId;

/// Summary of the LINE channel configuration as reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStatusSnapshot {
    pub is_configured: bool,
    pub has_active_channel: bool,
    pub missing_fields: Vec<String>,
    pub channel_id: Option<ChannelId>,
}

/// What subscribers of the status store observe.
///
/// `error` is set when the last refresh could not reach a verdict; the snapshot is then the
/// unconfigured default rather than the previous value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStatusView {
    pub snapshot: ChannelStatusSnapshot,
    pub error: Option<String>,
    pub is_loading: bool,
    pub has_fetched_once: bool,
}
