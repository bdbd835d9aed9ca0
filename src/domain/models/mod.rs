pub mod channel;
pub mod platform;
pub mod sdk;
pub mod session;
pub mod status;
pub mod view;

pub use channel::{
    ChannelCredentials, ChannelId, ChannelRecord, ConnectionStatus, FacebookChannelDraft,
    FacebookCredentials, LineChannelPatch, LineCredentials, LineField,
};
pub use platform::Platform;
pub use sdk::{
    Business, LoginResponse, LoginStatus, ManagedPage, PageAccessToken, SdkConfig, SdkReadiness,
    SdkSettings,
};
pub use session::ServiceSession;
pub use status::{ChannelStatusSnapshot, ChannelStatusView};
pub use view::{ViewEvent, ViewState};
