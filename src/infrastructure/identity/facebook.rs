use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::{debug, info, warn};

use crate::{
    application::services::identity::IdentityProvider,
    domain::{
        errors::ChannelError,
        models::{Business, LoginResponse, LoginStatus, ManagedPage, PageAccessToken, SdkConfig},
    },
};

const PAGE_FIELDS: &str = "id,name,access_token";

/// Identity provider backed by the Facebook Graph API.
///
/// The login dialog runs in the operator's browser, which hands the resulting user access
/// token over through [`FacebookGraphProvider::authorize_session`]. `login` then checks the
/// granted permissions and, when they cover the requested scope, promotes the token to the
/// active session used by every Graph call.
pub struct FacebookGraphProvider {
    http: Client,
    graph_url: String,
    api_version: RwLock<Option<String>>,
    pending: RwLock<Option<Secret<String>>>,
    active: RwLock<Option<Secret<String>>>,
}

impl FacebookGraphProvider {
    pub fn new(graph_url: impl Into<String>) -> Result<Self, ChannelError> {
        let http = Client::builder()
            .user_agent("channel-console/facebook")
            .build()
            .map_err(|err| ChannelError::SdkLoad(err.to_string()))?;
        Ok(Self {
            http,
            graph_url: graph_url.into().trim_end_matches('/').to_string(),
            api_version: RwLock::new(None),
            pending: RwLock::new(None),
            active: RwLock::new(None),
        })
    }

    /// Stores a user access token obtained by the browser-side login dialog.
    pub fn authorize_session(&self, user_access_token: Secret<String>) {
        *self.pending.write().unwrap_or_else(PoisonError::into_inner) = Some(user_access_token);
        debug!("facebook user session handed over");
    }

    pub fn has_pending_session(&self) -> bool {
        self.pending
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Drops the handed-over token unless the browser has replaced it meanwhile.
    fn consume_pending(&self, token: &Secret<String>) {
        let mut pending = self.pending.write().unwrap_or_else(PoisonError::into_inner);
        if pending
            .as_ref()
            .is_some_and(|current| current.expose_secret() == token.expose_secret())
        {
            *pending = None;
        }
    }

    fn active_token(&self) -> Result<Secret<String>, ChannelError> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| ChannelError::Provider("no authorized facebook session".to_string()))
    }

    fn endpoint(&self, path: &str) -> Result<String, ChannelError> {
        let version = self
            .api_version
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(ChannelError::SdkNotReady)?;
        Ok(format!("{}/{}/{}", self.graph_url, version, path.trim_start_matches('/')))
    }

    async fn graph_get<T: DeserializeOwned>(
        &self,
        path: &str,
        fields: &str,
        token: &Secret<String>,
    ) -> Result<T, ChannelError> {
        let response = self
            .http
            .get(self.endpoint(path)?)
            .query(&[("fields", fields), ("access_token", token.expose_secret().as_str())])
            .send()
            .await
            .map_err(|err| ChannelError::Provider(err.to_string()))?;

        let status = response.status();
        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|err| ChannelError::Provider(format!("unexpected graph response: {err}")))?;

        if let Some(error) = payload.get("error") {
            let message = error
                .get("message")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("graph request failed")
                .to_string();
            warn!(path, http_status = status.as_u16(), %message, "graph api error");
            return Err(ChannelError::Provider(message));
        }
        if !status.is_success() {
            return Err(ChannelError::Provider(format!(
                "graph request failed with status {status}"
            )));
        }

        serde_json::from_value(payload)
            .map_err(|err| ChannelError::Provider(format!("unexpected graph response: {err}")))
    }

    async fn list_pages(&self, path: &str, fields: &str) -> Result<Vec<ManagedPage>, ChannelError> {
        let token = self.active_token()?;
        let pages: GraphList<GraphPage> = self.graph_get(path, fields, &token).await?;
        Ok(pages.data.into_iter().map(GraphPage::into_page).collect())
    }
}

#[async_trait]
impl IdentityProvider for FacebookGraphProvider {
    fn name(&self) -> &'static str {
        "facebook"
    }

    async fn load(&self, config: &SdkConfig) -> Result<(), ChannelError> {
        Url::parse(&self.graph_url)
            .map_err(|err| ChannelError::SdkLoad(format!("invalid graph url: {err}")))?;
        *self
            .api_version
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(config.api_version.clone());
        info!(api_version = %config.api_version, "facebook graph client initialised");
        Ok(())
    }

    async fn login(&self, scope: &str) -> Result<LoginResponse, ChannelError> {
        let handed_over = self
            .pending
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let Some(token) = handed_over else {
            return Ok(LoginResponse::not_connected(LoginStatus::Unknown));
        };

        // Only a permission verdict consumes the handed-over token.
        let permissions: GraphList<GraphPermission> =
            self.graph_get("me/permissions", "permission,status", &token).await?;
        self.consume_pending(&token);

        let missing: Vec<&str> = scope
            .split(',')
            .map(str::trim)
            .filter(|wanted| !wanted.is_empty())
            .filter(|wanted| {
                !permissions
                    .data
                    .iter()
                    .any(|granted| granted.permission == *wanted && granted.status == "granted")
            })
            .collect();

        if !missing.is_empty() {
            info!(missing = ?missing, "facebook login lacks requested permissions");
            return Ok(LoginResponse::not_connected(LoginStatus::NotAuthorized));
        }

        let response = LoginResponse {
            status: LoginStatus::Connected,
            access_token: Some(token.clone()),
        };
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
        Ok(response)
    }

    async fn login_status(&self) -> Result<LoginStatus, ChannelError> {
        let Ok(token) = self.active_token() else {
            return Ok(LoginStatus::Unknown);
        };
        match self.graph_get::<GraphNode>("me", "id", &token).await {
            Ok(_) => Ok(LoginStatus::Connected),
            Err(ChannelError::Provider(message)) => {
                debug!(%message, "facebook session no longer authorized");
                Ok(LoginStatus::NotAuthorized)
            }
            Err(err) => Err(err),
        }
    }

    async fn managed_pages(&self) -> Result<Vec<ManagedPage>, ChannelError> {
        self.list_pages("me/accounts", PAGE_FIELDS).await
    }

    async fn businesses(&self) -> Result<Vec<Business>, ChannelError> {
        let token = self.active_token()?;
        let businesses: GraphList<GraphNode> =
            self.graph_get("me/businesses", "id,name", &token).await?;
        Ok(businesses
            .data
            .into_iter()
            .map(|node| Business {
                id: node.id,
                name: node.name,
            })
            .collect())
    }

    async fn business_pages(&self, business_id: &str) -> Result<Vec<ManagedPage>, ChannelError> {
        let owned = self
            .list_pages(&format!("{business_id}/owned_pages"), "id,name")
            .await?;
        if !owned.is_empty() {
            return Ok(owned);
        }
        debug!(business_id, "business owns no pages, falling back to client pages");
        self.list_pages(&format!("{business_id}/client_pages"), "id,name")
            .await
    }

    async fn page_access_token(&self, page_id: &str) -> Result<PageAccessToken, ChannelError> {
        let token = self.active_token()?;
        let page: GraphPage = self.graph_get(page_id, PAGE_FIELDS, &token).await?;
        let access_token = page
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                ChannelError::Provider(format!(
                    "no page access token returned for page {page_id}, check page permissions"
                ))
            })?;
        Ok(PageAccessToken {
            page_id: page.id.unwrap_or_else(|| page_id.to_string()),
            name: page.name,
            access_token: Secret::new(access_token),
        })
    }
}

#[derive(Deserialize)]
struct GraphList<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Deserialize)]
struct GraphNode {
    id: String,
    name: Option<String>,
}

#[derive(Deserialize)]
struct GraphPage {
    id: Option<String>,
    name: Option<String>,
    access_token: Option<String>,
}

impl GraphPage {
    fn into_page(self) -> ManagedPage {
        ManagedPage {
            id: self.id.unwrap_or_default(),
            name: self.name,
            access_token: self
                .access_token
                .filter(|token| !token.is_empty())
                .map(Secret::new),
        }
    }
}

#[derive(Deserialize)]
struct GraphPermission {
    permission: String,
    status: String,
}
