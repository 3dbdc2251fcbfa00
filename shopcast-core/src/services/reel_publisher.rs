// File: shopcast-core/src/services/reel_publisher.rs

use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

use shopcast_common::models::{QuotaKind, RecordError, Reel, ReelExpirySummary, ReelStatus, SocialPlatform};
use shopcast_common::traits::repository_traits::ReelRepository;
use crate::config::EngineConfig;
use crate::eventbus::{DomainEvent, EventBus};
use crate::services::quota_wallet::QuotaWalletService;
use crate::services::shop_service::ShopService;
use crate::utils::time::Clock;
use crate::Error;

pub struct ReelPublisher {
    reel_repo: Arc<dyn ReelRepository + Send + Sync>,
    shops: Arc<ShopService>,
    wallet: Arc<QuotaWalletService>,
    config: Arc<EngineConfig>,
    clock: Arc<dyn Clock>,
    event_bus: EventBus,
}

impl ReelPublisher {
    pub fn new(
        reel_repo: Arc<dyn ReelRepository + Send + Sync>,
        shops: Arc<ShopService>,
        wallet: Arc<QuotaWalletService>,
        config: Arc<EngineConfig>,
        clock: Arc<dyn Clock>,
        event_bus: EventBus,
    ) -> Self {
        Self { reel_repo, shops, wallet, config, clock, event_bus }
    }

    pub async fn publish(&self, shop_id: Uuid, platform: SocialPlatform, content: &str) -> Result<Reel, Error> {
        let shop = self.shops.get_shop(shop_id).await?;
        if !shop.can_publish_reels() {
            return Err(Error::ShopNotSchedulable {
                shop_id,
                reason: format!("status is {}", shop.status),
            });
        }

        let available = self.wallet.available_quota(shop_id).await?.reel;
        if available <= 0 {
            return Err(Error::InsufficientQuota { shop_id, requested: 1, available });
        }
        let debit = self.wallet.debit(&shop, QuotaKind::Reel, 1).await?;

        let reel = Reel::new(shop_id, platform, content.trim(), debit.origin(), self.clock.now(), self.config.reel_ttl());
        if let Err(e) = self.reel_repo.insert_reel(&reel).await {
            error!("Failed to persist reel for shop {}: {:?}", shop_id, e);
            self.wallet.refund(shop_id, QuotaKind::Reel, 1, None).await?;
            return Err(e);
        }

        info!("Published reel {} for shop {} (origin {}, expires {})", reel.reel_id, shop_id, reel.origin, reel.expires_at);
        self.event_bus
            .publish(DomainEvent::ReelPublished { reel_id: reel.reel_id, shop_id })
            .await;
        Ok(reel)
    }

    async fn get_reel(&self, reel_id: Uuid) -> Result<Reel, Error> {
        self.reel_repo
            .get_reel(reel_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("reel {}", reel_id)))
    }

    async fn save(&self, mut reel: Reel) -> Result<Reel, Error> {
        if !self.reel_repo.update_reel(&reel).await? {
            return Err(Error::Conflict(format!("reel {} was modified concurrently", reel.reel_id)));
        }
        reel.version += 1;
        Ok(reel)
    }

    pub async fn hide(&self, reel_id: Uuid) -> Result<Reel, Error> {
        let mut reel = self.get_reel(reel_id).await?;
        reel.hide(self.clock.now())?;
        let reel = self.save(reel).await?;
        info!("Reel {} hidden", reel_id);
        Ok(reel)
    }

    pub async fn reactivate(&self, reel_id: Uuid) -> Result<Reel, Error> {
        let mut reel = self.get_reel(reel_id).await?;
        reel.reactivate(self.clock.now())?;
        let reel = self.save(reel).await?;
        info!("Reel {} reactivated", reel_id);
        Ok(reel)
    }

    /// Reels of a shop with expiry applied as of now.
    pub async fn list_shop_reels(&self, shop_id: Uuid) -> Result<Vec<Reel>, Error> {
        let now = self.clock.now();
        let mut reels = self.reel_repo.list_reels_for_shop(shop_id).await?;
        for reel in reels.iter_mut() {
            reel.status = reel.effective_status(now);
        }
        Ok(reels)
    }

    /// ACTIVE reels past `expires_at` become EXPIRED. HIDDEN reels are left alone.
    pub async fn sweep_expired(&self) -> Result<ReelExpirySummary, Error> {
        let now = self.clock.now();
        let mut summary = ReelExpirySummary::default();
        for mut reel in self.reel_repo.list_expired_active(now).await? {
            reel.status = ReelStatus::Expired;
            reel.updated_at = now;
            match self.reel_repo.update_reel(&reel).await {
                Ok(true) => summary.expired += 1,
                Ok(false) => debug!("Reel {} changed during expiry sweep; skipping", reel.reel_id),
                Err(e) => {
                    error!("Expiring reel {} failed: {:?}", reel.reel_id, e);
                    summary.errors.push(RecordError { record_id: reel.reel_id, message: e.to_string() });
                }
            }
        }
        if summary.expired > 0 {
            info!("Expired {} reel(s)", summary.expired);
        }
        Ok(summary)
    }
}
