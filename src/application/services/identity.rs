use async_trait::async_trait;

use crate::domain::{
    errors::ChannelError,
    models::{Business, LoginResponse, LoginStatus, ManagedPage, PageAccessToken, SdkConfig},
};

/// Port over an external identity SDK. One adapter per real provider, plus fakes in tests.
///
/// Adapters report what the provider said; turning a non-connected login into a rejection
/// is the gateway's job.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Loads and initialises the SDK. Fails with `SdkLoad` when the SDK cannot be brought up.
    async fn load(&self, config: &SdkConfig) -> Result<(), ChannelError>;

    async fn login(&self, scope: &str) -> Result<LoginResponse, ChannelError>;

    async fn login_status(&self) -> Result<LoginStatus, ChannelError>;

    /// Pages managed by the logged-in user. An empty list is not an error.
    async fn managed_pages(&self) -> Result<Vec<ManagedPage>, ChannelError>;

    async fn businesses(&self) -> Result<Vec<Business>, ChannelError>;

    /// Pages owned by a business, or the pages it is a client of when it owns none.
    async fn business_pages(&self, business_id: &str) -> Result<Vec<ManagedPage>, ChannelError>;

    async fn page_access_token(&self, page_id: &str) -> Result<PageAccessToken, ChannelError>;
}
