use serde::{Deserialize, Serialize};

use super::channel::ChannelId;

/// What the console shows. Derived from which channel records exist, never stored on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum ViewState {
    Loading,
    Empty,
    /// `resume` points at a partially persisted LINE record the wizard keeps patching.
    LineSetupWizard { resume: Option<ChannelId> },
    AccountList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    AccountsLoaded { usable: usize },
    LineSetupStarted { resume: Option<ChannelId> },
    LineFieldSaved { channel_id: ChannelId },
    LineSetupCompleted,
    LineSetupAbandoned { remaining: usize },
    FacebookConnected,
    LineVerificationFailed { channel_id: ChannelId },
    ChannelRemoved { remaining: usize },
}

impl ViewState {
    fn from_count(usable: usize) -> ViewState {
        if usable == 0 {
            ViewState::Empty
        } else {
            ViewState::AccountList
        }
    }

    /// Pure transition function. Events that make no sense in the current state leave it as is.
    pub fn transition(&self, event: &ViewEvent) -> ViewState {
        use ViewEvent::*;

        match (self, event) {
            (
                ViewState::Loading | ViewState::Empty | ViewState::AccountList,
                AccountsLoaded { usable },
            ) => Self::from_count(*usable),
            (ViewState::Empty | ViewState::AccountList, LineSetupStarted { resume }) => {
                ViewState::LineSetupWizard { resume: *resume }
            }
            (ViewState::LineSetupWizard { .. }, LineFieldSaved { channel_id }) => {
                ViewState::LineSetupWizard {
                    resume: Some(*channel_id),
                }
            }
            (ViewState::LineSetupWizard { .. }, LineSetupCompleted) => ViewState::AccountList,
            (ViewState::LineSetupWizard { .. }, LineSetupAbandoned { remaining }) => {
                Self::from_count(*remaining)
            }
            (ViewState::Empty | ViewState::AccountList, FacebookConnected) => {
                ViewState::AccountList
            }
            (ViewState::Empty | ViewState::AccountList, LineVerificationFailed { channel_id }) => {
                ViewState::LineSetupWizard {
                    resume: Some(*channel_id),
                }
            }
            (ViewState::Empty | ViewState::AccountList, ChannelRemoved { remaining }) => {
                Self::from_count(*remaining)
            }
            (state, _) => state.clone(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewState::Loading => "loading",
            ViewState::Empty => "empty",
            ViewState::LineSetupWizard { .. } => "line_setup_wizard",
            ViewState::AccountList => "account_list",
        }
    }
}
