use std::time::Duration;
use async_trait::async_trait;
use uuid::Uuid;
use crate::error::Error;
use crate::models::{
    AvailableQuota, LifecycleSummary, NewShop, NotificationSummary, PaymentOutcome, Penalty,
    PurchaseOrder, PurchaseRequest, QuotaResetSummary, Reel, ReelExpirySummary, SanctionSummary,
    ScheduleStreamRequest, Shop, ShopStatus, SocialPlatform, Stream, StreamPatch, SweeperKind,
    SystemStatus,
};

/// The full operation surface consumed by the UI collaborator.
pub trait ShopcastApi:
StreamApi
+ ReelApi
+ PurchaseApi
+ OperationsApi
+ ShopApi
{
}

impl<T> ShopcastApi for T
where
    T: StreamApi
    + ReelApi
    + PurchaseApi
    + OperationsApi
    + ShopApi,
{
    // marker
}

#[async_trait]
pub trait StreamApi: Send + Sync {
    async fn schedule_stream(&self, request: ScheduleStreamRequest) -> Result<Stream, Error>;
    async fn update_stream(&self, stream_id: Uuid, patch: StreamPatch, admin_override: bool) -> Result<Stream, Error>;
    async fn cancel_stream(&self, stream_id: Uuid, reason: &str) -> Result<Stream, Error>;
    async fn ban_stream(&self, stream_id: Uuid) -> Result<Stream, Error>;
    async fn extend_stream(&self, stream_id: Uuid) -> Result<Stream, Error>;
    async fn start_stream(&self, stream_id: Uuid) -> Result<Stream, Error>;
    async fn finish_stream(&self, stream_id: Uuid) -> Result<Stream, Error>;
    /// A viewer report; only counted inside the stream's report window.
    async fn report_stream(&self, stream_id: Uuid) -> Result<Stream, Error>;
    async fn get_stream(&self, stream_id: Uuid) -> Result<Stream, Error>;
    async fn list_shop_streams(&self, shop_id: Uuid) -> Result<Vec<Stream>, Error>;
}

#[async_trait]
pub trait ReelApi: Send + Sync {
    async fn publish_reel(&self, shop_id: Uuid, platform: SocialPlatform, content: &str) -> Result<Reel, Error>;
    async fn hide_reel(&self, reel_id: Uuid) -> Result<Reel, Error>;
    async fn reactivate_reel(&self, reel_id: Uuid) -> Result<Reel, Error>;
    async fn list_shop_reels(&self, shop_id: Uuid) -> Result<Vec<Reel>, Error>;
}

#[async_trait]
pub trait PurchaseApi: Send + Sync {
    async fn create_purchase_preference(&self, order: PurchaseOrder) -> Result<PurchaseRequest, Error>;
    async fn approve_purchase(&self, purchase_id: Uuid) -> Result<PurchaseRequest, Error>;
    async fn reject_purchase(&self, purchase_id: Uuid, notes: &str) -> Result<PurchaseRequest, Error>;
    async fn cancel_purchase(&self, purchase_id: Uuid) -> Result<PurchaseRequest, Error>;
    async fn handle_payment_notification(
        &self,
        external_reference: &str,
        outcome: PaymentOutcome,
    ) -> Result<PurchaseRequest, Error>;
    async fn await_confirmation(&self, purchase_id: Uuid, timeout: Duration) -> Result<PurchaseRequest, Error>;
    async fn get_purchase(&self, purchase_id: Uuid) -> Result<PurchaseRequest, Error>;
}

#[async_trait]
pub trait OperationsApi: Send + Sync {
    async fn run_streams_lifecycle(&self) -> Result<LifecycleSummary, Error>;
    async fn run_sanctions(&self) -> Result<SanctionSummary, Error>;
    async fn run_notifications(&self) -> Result<NotificationSummary, Error>;
    async fn run_reel_expiry(&self) -> Result<ReelExpirySummary, Error>;
    async fn run_quota_reset(&self) -> Result<QuotaResetSummary, Error>;
    async fn fetch_system_status(&self) -> Result<SystemStatus, Error>;
    async fn set_sweeper_enabled(&self, kind: SweeperKind, enabled: bool) -> Result<SystemStatus, Error>;
}

#[async_trait]
pub trait ShopApi: Send + Sync {
    async fn create_shop(&self, new_shop: NewShop) -> Result<Shop, Error>;
    async fn get_shop(&self, shop_id: Uuid) -> Result<Shop, Error>;
    async fn set_shop_status(&self, shop_id: Uuid, status: ShopStatus) -> Result<Shop, Error>;
    async fn set_social_handle(&self, shop_id: Uuid, platform: SocialPlatform, handle: Option<String>) -> Result<Shop, Error>;
    async fn penalize_shop(&self, shop_id: Uuid, reason: &str) -> Result<Penalty, Error>;
    async fn lift_suspension(&self, shop_id: Uuid) -> Result<Shop, Error>;
    async fn list_penalties(&self, shop_id: Uuid) -> Result<Vec<Penalty>, Error>;
    async fn available_quota(&self, shop_id: Uuid) -> Result<AvailableQuota, Error>;
}
