use std::sync::Arc;

use poem_openapi::{OpenApi, param::Path, payload::Json};
use secrecy::Secret;

use crate::presentation::{
    http::{
        endpoints::root::{ApiState, EndpointsTags},
        mappers::{channel_error, map_business, map_page, map_readiness},
        requests::FacebookSessionRequestDto,
        responses::{BusinessDto, LoginStatusDto, ManagedPageDto, SdkReadinessDto, SuccessDto},
    },
    models::LoginStatusKind,
};

pub struct IdentityEndpoints {
    state: Arc<ApiState>,
}

impl IdentityEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }

    fn readiness(&self) -> SdkReadinessDto {
        let gateway = &self.state.gateway;
        map_readiness(
            gateway.provider_name(),
            &gateway.readiness(),
            self.state.facebook.has_pending_session(),
        )
    }
}

#[OpenApi]
impl IdentityEndpoints {
    /// Hands over the user access token from the browser-side Facebook login dialog. The next
    /// Facebook connect consumes it.
    #[oai(path = "/identity/facebook/session", method = "post", tag = EndpointsTags::Identity)]
    pub async fn facebook_session(&self, request: Json<FacebookSessionRequestDto>) -> Json<SuccessDto> {
        self.state
            .facebook
            .authorize_session(Secret::new(request.0.access_token));
        Json(SuccessDto { success: true })
    }

    #[oai(path = "/identity/facebook/login-status", method = "get", tag = EndpointsTags::Identity)]
    pub async fn login_status(&self) -> poem::Result<Json<LoginStatusDto>> {
        let status = self
            .state
            .gateway
            .login_status()
            .await
            .map_err(channel_error)?;
        Ok(Json(LoginStatusDto {
            status: LoginStatusKind::from(status),
        }))
    }

    #[oai(path = "/identity/facebook/pages", method = "get", tag = EndpointsTags::Identity)]
    pub async fn managed_pages(&self) -> poem::Result<Json<Vec<ManagedPageDto>>> {
        let pages = self
            .state
            .gateway
            .managed_pages()
            .await
            .map_err(channel_error)?;
        Ok(Json(pages.iter().map(map_page).collect()))
    }

    #[oai(path = "/identity/facebook/businesses", method = "get", tag = EndpointsTags::Identity)]
    pub async fn businesses(&self) -> poem::Result<Json<Vec<BusinessDto>>> {
        let businesses = self
            .state
            .gateway
            .businesses()
            .await
            .map_err(channel_error)?;
        Ok(Json(businesses.iter().map(map_business).collect()))
    }

    /// Pages owned by a business, or the pages it manages for clients when it owns none.
    #[oai(
        path = "/identity/facebook/businesses/:business_id/pages",
        method = "get",
        tag = EndpointsTags::Identity
    )]
    pub async fn business_pages(
        &self,
        business_id: Path<String>,
    ) -> poem::Result<Json<Vec<ManagedPageDto>>> {
        let pages = self
            .state
            .gateway
            .business_pages(&business_id.0)
            .await
            .map_err(channel_error)?;
        Ok(Json(pages.iter().map(map_page).collect()))
    }

    #[oai(path = "/identity/sdk", method = "get", tag = EndpointsTags::Identity)]
    pub async fn sdk(&self) -> Json<SdkReadinessDto> {
        Json(self.readiness())
    }

    /// Clears a failed SDK load so the next connect attempt loads it again.
    #[oai(path = "/identity/sdk/reset", method = "post", tag = EndpointsTags::Identity)]
    pub async fn reset_sdk(&self) -> Json<SdkReadinessDto> {
        self.state.gateway.clear_error();
        Json(self.readiness())
    }
}
