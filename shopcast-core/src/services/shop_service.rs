// File: shopcast-core/src/services/shop_service.rs

use std::sync::Arc;
use chrono_tz::Tz;
use tracing::{debug, info};
use uuid::Uuid;

use shopcast_common::models::{NewShop, Penalty, Shop, ShopStatus, SocialPlatform};
use shopcast_common::traits::repository_traits::{PenaltyRepository, ShopRepository};
use crate::config::EngineConfig;
use crate::services::quota_wallet::QuotaWalletService;
use crate::utils::time::Clock;
use crate::Error;

/// Versioned records are retried this many times before giving up with
/// `Error::Conflict`.
pub const MAX_CAS_ATTEMPTS: usize = 5;

/// Admin surface over shops and their penalty records.
pub struct ShopService {
    pub shop_repo: Arc<dyn ShopRepository + Send + Sync>,
    pub penalty_repo: Arc<dyn PenaltyRepository + Send + Sync>,
    wallet: Arc<QuotaWalletService>,
    config: Arc<EngineConfig>,
    clock: Arc<dyn Clock>,
}

impl ShopService {
    pub fn new(
        shop_repo: Arc<dyn ShopRepository + Send + Sync>,
        penalty_repo: Arc<dyn PenaltyRepository + Send + Sync>,
        wallet: Arc<QuotaWalletService>,
        config: Arc<EngineConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { shop_repo, penalty_repo, wallet, config, clock }
    }

    pub async fn create_shop(&self, new_shop: NewShop) -> Result<Shop, Error> {
        let name = new_shop.name.trim();
        if name.is_empty() {
            return Err(Error::Parse("shop name must not be empty".into()));
        }
        if let Some(tz) = &new_shop.timezone {
            tz.parse::<Tz>()
                .map_err(|e| Error::Parse(format!("invalid timezone '{}': {}", tz, e)))?;
        }

        let now = self.clock.now();
        let mut shop = Shop::new(name, new_shop.plan, now);
        shop.timezone = new_shop.timezone;
        shop.social_handles = new_shop.social_handles;
        shop.legacy_quota = new_shop.legacy_quota;

        self.shop_repo.create_shop(&shop).await?;

        // Imported shops keep their flat quota fields and stay wallet-less
        // until their first quota mutation.
        let legacy = &shop.legacy_quota;
        let has_legacy = legacy.live_base.is_some()
            || legacy.live_extra.is_some()
            || legacy.reel_base.is_some()
            || legacy.reel_extra.is_some();
        if !has_legacy {
            self.wallet.ensure_wallet(&shop).await?;
        }

        info!("Created shop {} ('{}', plan {})", shop.shop_id, shop.name, shop.plan);
        Ok(shop)
    }

    pub async fn get_shop(&self, shop_id: Uuid) -> Result<Shop, Error> {
        self.shop_repo
            .get_shop(shop_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("shop {}", shop_id)))
    }

    /// Loads, mutates and compare-and-sets a shop, retrying on lost races.
    pub async fn mutate<F>(&self, shop_id: Uuid, mut f: F) -> Result<Shop, Error>
    where
        F: FnMut(&mut Shop) -> Result<(), Error> + Send,
    {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let mut shop = self.get_shop(shop_id).await?;
            f(&mut shop)?;
            shop.updated_at = self.clock.now();
            if self.shop_repo.update_shop(&shop).await? {
                shop.version += 1;
                return Ok(shop);
            }
            debug!("Shop {} changed concurrently; retrying", shop_id);
        }
        Err(Error::Conflict(format!("shop {} kept changing", shop_id)))
    }

    pub async fn set_shop_status(&self, shop_id: Uuid, status: ShopStatus) -> Result<Shop, Error> {
        let now = self.clock.now();
        let shop = self
            .mutate(shop_id, |shop| {
                if shop.status == ShopStatus::PendingVerification && status == ShopStatus::Active {
                    shop.owner_accepted_at.get_or_insert(now);
                }
                if status != ShopStatus::AgendaSuspended {
                    shop.agenda_suspended_until = None;
                }
                shop.status = status;
                Ok(())
            })
            .await?;
        info!("Shop {} status set to {}", shop_id, status);
        Ok(shop)
    }

    pub async fn set_social_handle(
        &self,
        shop_id: Uuid,
        platform: SocialPlatform,
        handle: Option<String>,
    ) -> Result<Shop, Error> {
        let handle = handle
            .map(|h| h.trim().trim_start_matches('@').to_string())
            .filter(|h| !h.is_empty());
        self.mutate(shop_id, |shop| {
            match &handle {
                Some(h) => {
                    shop.social_handles.insert(platform, h.clone());
                }
                None => {
                    shop.social_handles.remove(&platform);
                }
            }
            Ok(())
        })
        .await
    }

    /// Manual admin penalty. Not tied to any stream occurrence.
    pub async fn penalize_shop(&self, shop_id: Uuid, reason: &str) -> Result<Penalty, Error> {
        self.get_shop(shop_id).await?;
        let penalty = Penalty::new(shop_id, None, reason, self.clock.now());
        self.penalty_repo.insert_penalty_once(&penalty).await?;
        info!("Admin penalty on shop {}: {}", shop_id, reason);
        Ok(penalty)
    }

    /// Lifts every active penalty, clears the explicit flag and ends any
    /// agenda suspension.
    pub async fn lift_suspension(&self, shop_id: Uuid) -> Result<Shop, Error> {
        let now = self.clock.now();
        let lifted = self.penalty_repo.lift_penalties(shop_id, now).await?;
        let shop = self
            .mutate(shop_id, |shop| {
                shop.penalized_flag = false;
                shop.agenda_suspended_until = None;
                if shop.status == ShopStatus::AgendaSuspended {
                    shop.status = ShopStatus::Active;
                }
                Ok(())
            })
            .await?;
        info!("Lifted suspension of shop {} ({} penalties)", shop_id, lifted);
        Ok(shop)
    }

    pub async fn list_penalties(&self, shop_id: Uuid) -> Result<Vec<Penalty>, Error> {
        self.penalty_repo.list_penalties(shop_id).await
    }

    pub async fn is_penalized(&self, shop: &Shop) -> Result<bool, Error> {
        let active = self.penalty_repo.count_active_penalties(shop.shop_id).await?;
        Ok(shop.is_penalized(active.max(0) as usize))
    }

    /// `Ok(())` only when the shop is ACTIVE and not penalized.
    pub async fn ensure_schedulable(&self, shop: &Shop) -> Result<(), Error> {
        if shop.status != ShopStatus::Active {
            return Err(Error::ShopNotSchedulable {
                shop_id: shop.shop_id,
                reason: format!("status is {}", shop.status),
            });
        }
        if self.is_penalized(shop).await? {
            return Err(Error::ShopNotSchedulable {
                shop_id: shop.shop_id,
                reason: "shop is penalized".into(),
            });
        }
        Ok(())
    }

    pub fn tz_for(&self, shop: &Shop) -> Tz {
        self.config.tz_for(shop.timezone.as_deref())
    }
}
