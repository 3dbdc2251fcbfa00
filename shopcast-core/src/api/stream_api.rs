// api/stream_api.rs

use async_trait::async_trait;
use uuid::Uuid;

use shopcast_common::models::{ScheduleStreamRequest, Stream, StreamPatch};
use shopcast_common::traits::api::StreamApi;
use crate::api::CoreApi;
use crate::Error;

#[async_trait]
impl StreamApi for CoreApi {
    async fn schedule_stream(&self, request: ScheduleStreamRequest) -> Result<Stream, Error> {
        self.scheduler.schedule(request).await
    }

    async fn update_stream(&self, stream_id: Uuid, patch: StreamPatch, admin_override: bool) -> Result<Stream, Error> {
        self.scheduler.update(stream_id, patch, admin_override).await
    }

    async fn cancel_stream(&self, stream_id: Uuid, reason: &str) -> Result<Stream, Error> {
        self.scheduler.cancel(stream_id, reason).await
    }

    async fn ban_stream(&self, stream_id: Uuid) -> Result<Stream, Error> {
        self.lifecycle.ban(stream_id).await
    }

    async fn extend_stream(&self, stream_id: Uuid) -> Result<Stream, Error> {
        self.lifecycle.extend(stream_id).await
    }

    async fn start_stream(&self, stream_id: Uuid) -> Result<Stream, Error> {
        self.lifecycle.start(stream_id).await
    }

    async fn finish_stream(&self, stream_id: Uuid) -> Result<Stream, Error> {
        self.lifecycle.finish(stream_id).await
    }

    async fn report_stream(&self, stream_id: Uuid) -> Result<Stream, Error> {
        self.lifecycle.report(stream_id).await
    }

    async fn get_stream(&self, stream_id: Uuid) -> Result<Stream, Error> {
        self.scheduler.get_stream(stream_id).await
    }

    async fn list_shop_streams(&self, shop_id: Uuid) -> Result<Vec<Stream>, Error> {
        self.scheduler.list_shop_streams(shop_id).await
    }
}
