//! api/mod.rs
//!
//! `CoreApi` wires repositories, services and sweepers together and
//! implements the operation surface in `shopcast_common::traits::api`.
//! Each trait lives in its own file.

pub mod operations_api;
pub mod purchase_api;
pub mod reel_api;
pub mod shop_api;
pub mod stream_api;

use std::sync::Arc;
use serde::Serialize;

use shopcast_common::models::SweeperKind;
use shopcast_common::traits::collaborator_traits::{NotificationSink, PaymentGateway};
use shopcast_common::traits::repository_traits::{
    PenaltyRepository, PurchaseRepository, QuotaWalletRepository, ReelRepository, ShopRepository,
    StreamRepository,
};
use crate::config::EngineConfig;
use crate::db::Database;
use crate::eventbus::EventBus;
use crate::repositories::{
    InMemoryPenaltyRepository, InMemoryPurchaseRepository, InMemoryQuotaWalletRepository,
    InMemoryReelRepository, InMemoryShopRepository, InMemoryStreamRepository,
    PostgresPenaltyRepository, PostgresPurchaseRepository, PostgresQuotaWalletRepository,
    PostgresReelRepository, PostgresShopRepository, PostgresStreamRepository,
};
use crate::services::{
    NotificationService, PurchaseLedger, QuotaWalletService, ReelPublisher, SanctionEngine,
    ShopService, StreamLifecycleEngine, StreamScheduler,
};
use crate::tasks::SweeperRegistry;
use crate::utils::time::Clock;
use crate::Error;

/// The storage backend, as trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub shops: Arc<dyn ShopRepository + Send + Sync>,
    pub penalties: Arc<dyn PenaltyRepository + Send + Sync>,
    pub wallets: Arc<dyn QuotaWalletRepository + Send + Sync>,
    pub streams: Arc<dyn StreamRepository + Send + Sync>,
    pub reels: Arc<dyn ReelRepository + Send + Sync>,
    pub purchases: Arc<dyn PurchaseRepository + Send + Sync>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            shops: Arc::new(InMemoryShopRepository::new()),
            penalties: Arc::new(InMemoryPenaltyRepository::new()),
            wallets: Arc::new(InMemoryQuotaWalletRepository::new()),
            streams: Arc::new(InMemoryStreamRepository::new()),
            reels: Arc::new(InMemoryReelRepository::new()),
            purchases: Arc::new(InMemoryPurchaseRepository::new()),
        }
    }

    pub fn postgres(db: &Database) -> Self {
        let pool = db.pool().clone();
        Self {
            shops: Arc::new(PostgresShopRepository::new(pool.clone())),
            penalties: Arc::new(PostgresPenaltyRepository::new(pool.clone())),
            wallets: Arc::new(PostgresQuotaWalletRepository::new(pool.clone())),
            streams: Arc::new(PostgresStreamRepository::new(pool.clone())),
            reels: Arc::new(PostgresReelRepository::new(pool.clone())),
            purchases: Arc::new(PostgresPurchaseRepository::new(pool)),
        }
    }
}

pub struct CoreApi {
    pub config: Arc<EngineConfig>,
    pub clock: Arc<dyn Clock>,
    pub event_bus: EventBus,
    pub registry: Arc<SweeperRegistry>,

    pub shops: Arc<ShopService>,
    pub wallet: Arc<QuotaWalletService>,
    pub scheduler: Arc<StreamScheduler>,
    pub lifecycle: Arc<StreamLifecycleEngine>,
    pub sanctions: Arc<SanctionEngine>,
    pub reels: Arc<ReelPublisher>,
    pub purchases: Arc<PurchaseLedger>,
    pub notifications: Arc<NotificationService>,
}

impl CoreApi {
    pub fn new(
        repos: Repositories,
        gateway: Arc<dyn PaymentGateway + Send + Sync>,
        sink: Arc<dyn NotificationSink + Send + Sync>,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
        event_bus: EventBus,
    ) -> Self {
        let config = Arc::new(config);
        let registry = Arc::new(SweeperRegistry::new(&config));

        let wallet = Arc::new(QuotaWalletService::new(
            repos.wallets.clone(),
            repos.shops.clone(),
            repos.streams.clone(),
            repos.reels.clone(),
            config.clone(),
            clock.clone(),
        ));
        let shops = Arc::new(ShopService::new(
            repos.shops.clone(),
            repos.penalties.clone(),
            wallet.clone(),
            config.clone(),
            clock.clone(),
        ));
        let scheduler = Arc::new(StreamScheduler::new(
            repos.streams.clone(),
            shops.clone(),
            wallet.clone(),
            config.clone(),
            clock.clone(),
            event_bus.clone(),
        ));
        let lifecycle = Arc::new(StreamLifecycleEngine::new(
            repos.streams.clone(),
            config.clone(),
            clock.clone(),
            event_bus.clone(),
        ));
        let sanctions = Arc::new(SanctionEngine::new(
            repos.streams.clone(),
            shops.clone(),
            config.clone(),
            clock.clone(),
            event_bus.clone(),
        ));
        let reels = Arc::new(ReelPublisher::new(
            repos.reels.clone(),
            shops.clone(),
            wallet.clone(),
            config.clone(),
            clock.clone(),
            event_bus.clone(),
        ));
        let purchases = Arc::new(PurchaseLedger::new(
            repos.purchases.clone(),
            shops.clone(),
            wallet.clone(),
            gateway,
            config.clone(),
            clock.clone(),
            event_bus.clone(),
        ));
        let notifications = Arc::new(NotificationService::new(
            repos.streams.clone(),
            sink,
            config.clone(),
            clock.clone(),
        ));

        Self {
            config,
            clock,
            event_bus,
            registry,
            shops,
            wallet,
            scheduler,
            lifecycle,
            sanctions,
            reels,
            purchases,
            notifications,
        }
    }

    fn record<T: Serialize>(&self, kind: SweeperKind, summary: &T) -> Result<(), Error> {
        let value = serde_json::to_value(summary)?;
        self.registry.record_run(kind, self.clock.now(), value);
        Ok(())
    }

    /// Runs one tick of a sweeper and records its summary.
    pub async fn run_sweeper(&self, kind: SweeperKind) -> Result<serde_json::Value, Error> {
        let value = match kind {
            SweeperKind::StreamsLifecycle => serde_json::to_value(self.lifecycle.run_tick().await?)?,
            SweeperKind::Sanctions => serde_json::to_value(self.sanctions.run_tick().await?)?,
            SweeperKind::Notifications => serde_json::to_value(self.notifications.run_tick().await?)?,
            SweeperKind::ReelExpiry => serde_json::to_value(self.reels.sweep_expired().await?)?,
            SweeperKind::QuotaReset => serde_json::to_value(self.wallet.reset_periods().await?)?,
        };
        self.record(kind, &value)?;
        Ok(value)
    }
}
