use std::sync::Arc;

use poem_openapi::{OpenApi, param::Path, payload::Json};

use crate::presentation::{
    http::{
        endpoints::root::{ApiState, EndpointsTags},
        mappers::{channel_error, map_account, map_console, map_outcome},
        requests::SaveLineFieldRequestDto,
        responses::{ChannelAccountDto, ConsoleDto, ReauthorizeResponseDto, ReleaseResponseDto},
    },
    models::{LineFieldKind, PlatformKind},
};

pub struct ChannelsEndpoints {
    state: Arc<ApiState>,
}

impl ChannelsEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }

    fn console(&self) -> ConsoleDto {
        let coordinator = &self.state.coordinator;
        map_console(&coordinator.view(), &coordinator.accounts())
    }
}

#[OpenApi]
impl ChannelsEndpoints {
    /// Opens the LINE setup wizard, or rejects when a LINE channel is already connected.
    #[oai(path = "/channels/line/connect", method = "post", tag = EndpointsTags::Channels)]
    pub async fn connect_line(&self) -> poem::Result<Json<ConsoleDto>> {
        self.state
            .coordinator
            .connect_line()
            .map_err(channel_error)?;
        Ok(Json(self.console()))
    }

    #[oai(path = "/channels/line/setup/:field", method = "put", tag = EndpointsTags::Channels)]
    pub async fn save_line_field(
        &self,
        field: Path<LineFieldKind>,
        request: Json<SaveLineFieldRequestDto>,
    ) -> poem::Result<Json<ChannelAccountDto>> {
        let record = self
            .state
            .coordinator
            .save_line_field(field.0.into(), request.0.value)
            .await
            .map_err(channel_error)?;
        Ok(Json(map_account(&record)))
    }

    #[oai(path = "/channels/line/setup/complete", method = "post", tag = EndpointsTags::Channels)]
    pub async fn complete_line_setup(&self) -> poem::Result<Json<ChannelAccountDto>> {
        let record = self
            .state
            .coordinator
            .complete_line_setup()
            .await
            .map_err(channel_error)?;
        Ok(Json(map_account(&record)))
    }

    #[oai(path = "/channels/line/setup/abandon", method = "post", tag = EndpointsTags::Channels)]
    pub async fn abandon_line_setup(&self) -> poem::Result<Json<ConsoleDto>> {
        self.state
            .coordinator
            .abandon_line_setup()
            .map_err(channel_error)?;
        Ok(Json(self.console()))
    }

    #[oai(path = "/channels/line/:id", method = "delete", tag = EndpointsTags::Channels)]
    pub async fn remove_line(&self, id: Path<i64>) -> poem::Result<Json<ConsoleDto>> {
        self.state
            .coordinator
            .remove_line(id.0)
            .await
            .map_err(channel_error)?;
        Ok(Json(self.console()))
    }

    /// Authorizes with Facebook and connects the first page the operator manages.
    #[oai(path = "/channels/facebook/connect", method = "post", tag = EndpointsTags::Channels)]
    pub async fn connect_facebook(&self) -> poem::Result<Json<ChannelAccountDto>> {
        let record = self
            .state
            .coordinator
            .connect_facebook(None)
            .await
            .map_err(channel_error)?;
        Ok(Json(map_account(&record)))
    }

    #[oai(
        path = "/platforms/:platform/channels/:id/reauthorize",
        method = "post",
        tag = EndpointsTags::Channels
    )]
    pub async fn reauthorize(
        &self,
        platform: Path<PlatformKind>,
        id: Path<i64>,
    ) -> poem::Result<Json<ReauthorizeResponseDto>> {
        let coordinator = &self.state.coordinator;
        let outcome = coordinator
            .reauthorize(platform.0.into(), id.0)
            .await
            .map_err(channel_error)?;
        Ok(Json(map_outcome(&outcome, &coordinator.view())))
    }

    /// Gives up on the in-flight authorization for a platform; its result will be discarded.
    #[oai(path = "/platforms/:platform/release", method = "post", tag = EndpointsTags::Channels)]
    pub async fn release(&self, platform: Path<PlatformKind>) -> Json<ReleaseResponseDto> {
        let released = self.state.coordinator.release(platform.0.into());
        Json(ReleaseResponseDto { released })
    }
}
