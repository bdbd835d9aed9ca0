use async_trait::async_trait;
use secrecy::Secret;

use crate::domain::{errors::ChannelError, models::ServiceSession};

/// Binds an externally obtained access token to this system's service identity.
#[async_trait]
pub trait CredentialExchange: Send + Sync {
    /// Returns the service session used by the successful exchange call.
    async fn request_meta_login(
        &self,
        external_access_token: &Secret<String>,
    ) -> Result<ServiceSession, ChannelError>;
}
