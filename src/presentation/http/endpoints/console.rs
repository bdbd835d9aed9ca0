use std::sync::Arc;

use poem_openapi::{OpenApi, payload::Json};

use crate::presentation::http::{
    endpoints::root::{ApiState, EndpointsTags},
    mappers::{channel_error, map_console},
    responses::ConsoleDto,
};

pub struct ConsoleEndpoints {
    state: Arc<ApiState>,
}

impl ConsoleEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }

    fn snapshot(&self) -> ConsoleDto {
        let coordinator = &self.state.coordinator;
        map_console(&coordinator.view(), &coordinator.accounts())
    }
}

#[OpenApi]
impl ConsoleEndpoints {
    /// Current view of the channel console together with every known account.
    #[oai(path = "/console", method = "get", tag = EndpointsTags::Console)]
    pub async fn console(&self) -> Json<ConsoleDto> {
        Json(self.snapshot())
    }

    #[oai(path = "/console/reload", method = "post", tag = EndpointsTags::Console)]
    pub async fn reload(&self) -> poem::Result<Json<ConsoleDto>> {
        self.state.coordinator.load().await.map_err(channel_error)?;
        Ok(Json(self.snapshot()))
    }
}
