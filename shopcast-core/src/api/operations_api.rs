// api/operations_api.rs
//
// Manual triggers for the sweepers. Each run is recorded in the registry
// exactly like a scheduled tick.

use async_trait::async_trait;

use shopcast_common::models::{
    LifecycleSummary, NotificationSummary, QuotaResetSummary, ReelExpirySummary, SanctionSummary,
    SweeperKind, SystemStatus,
};
use shopcast_common::traits::api::OperationsApi;
use crate::api::CoreApi;
use crate::Error;

#[async_trait]
impl OperationsApi for CoreApi {
    async fn run_streams_lifecycle(&self) -> Result<LifecycleSummary, Error> {
        let summary = self.lifecycle.run_tick().await?;
        self.record(SweeperKind::StreamsLifecycle, &summary)?;
        Ok(summary)
    }

    async fn run_sanctions(&self) -> Result<SanctionSummary, Error> {
        let summary = self.sanctions.run_tick().await?;
        self.record(SweeperKind::Sanctions, &summary)?;
        Ok(summary)
    }

    async fn run_notifications(&self) -> Result<NotificationSummary, Error> {
        let summary = self.notifications.run_tick().await?;
        self.record(SweeperKind::Notifications, &summary)?;
        Ok(summary)
    }

    async fn run_reel_expiry(&self) -> Result<ReelExpirySummary, Error> {
        let summary = self.reels.sweep_expired().await?;
        self.record(SweeperKind::ReelExpiry, &summary)?;
        Ok(summary)
    }

    async fn run_quota_reset(&self) -> Result<QuotaResetSummary, Error> {
        let summary = self.wallet.reset_periods().await?;
        self.record(SweeperKind::QuotaReset, &summary)?;
        Ok(summary)
    }

    async fn fetch_system_status(&self) -> Result<SystemStatus, Error> {
        Ok(SystemStatus {
            generated_at: self.clock.now(),
            sweepers: self.registry.snapshot(),
        })
    }

    async fn set_sweeper_enabled(&self, kind: SweeperKind, enabled: bool) -> Result<SystemStatus, Error> {
        self.registry.set_enabled(kind, enabled);
        tracing::info!("Sweeper '{}' {}", kind, if enabled { "enabled" } else { "disabled" });
        self.fetch_system_status().await
    }
}
