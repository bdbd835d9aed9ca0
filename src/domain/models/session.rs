use secrecy::{ExposeSecret, Secret};

/// Bearer credential for the external verification backend, acting as the service account.
///
/// Carries no expiry: a stale session is only detected when the backend answers `401`.
#[derive(Debug, Clone)]
pub struct ServiceSession {
    token: Secret<String>,
}

impl ServiceSession {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Secret::new(token.into()),
        }
    }

    pub fn token(&self) -> &Secret<String> {
        &self.token
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token.expose_secret())
    }

    pub fn same_as(&self, other: &ServiceSession) -> bool {
        self.token.expose_secret() == other.token.expose_secret()
    }
}
