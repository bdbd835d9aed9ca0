use std::sync::Arc;

use futures::{StreamExt, stream::BoxStream};
use poem_openapi::{
    OpenApi,
    payload::{EventStream, Json},
};
use tokio_stream::wrappers::WatchStream;

use crate::presentation::http::{
    endpoints::root::{ApiState, EndpointsTags},
    mappers::{channel_error, map_status},
    responses::ChannelStatusDto,
};

pub struct StatusEndpoints {
    state: Arc<ApiState>,
}

impl StatusEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl StatusEndpoints {
    #[oai(path = "/channels/status", method = "get", tag = EndpointsTags::Status)]
    pub async fn status(&self) -> Json<ChannelStatusDto> {
        Json(map_status(&self.state.status_store.current()))
    }

    #[oai(path = "/channels/status/refresh", method = "post", tag = EndpointsTags::Status)]
    pub async fn refresh(&self) -> poem::Result<Json<ChannelStatusDto>> {
        let store = &self.state.status_store;
        store.refresh_status().await.map_err(channel_error)?;
        Ok(Json(map_status(&store.current())))
    }

    /// Server-sent events carrying every status the store publishes, starting with the current one.
    #[oai(path = "/channels/status/events", method = "get", tag = EndpointsTags::Status)]
    pub async fn events(&self) -> EventStream<BoxStream<'static, ChannelStatusDto>> {
        let updates = WatchStream::new(self.state.status_store.subscribe());
        EventStream::new(updates.map(|view| map_status(&view)).boxed())
    }
}
