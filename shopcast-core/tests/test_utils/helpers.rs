// File: shopcast-core/tests/test_utils/helpers.rs
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use shopcast_common::models::{
    NewShop, Notification, Plan, ScheduleStreamRequest, Shop, ShopStatus, SocialPlatform, Stream,
};
use shopcast_common::traits::api::{ShopApi, StreamApi};
use shopcast_common::traits::collaborator_traits::{NotificationSink, PaymentGateway};
use shopcast_core::eventbus::EventBus;
use shopcast_core::payments::ManualPaymentGateway;
use shopcast_core::utils::time::ManualClock;
use shopcast_core::{CoreApi, Database, EngineConfig, Error, Repositories};

/// Monday 2025-06-09 12:00 UTC (09:00 in Buenos Aires).
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 9, 12, 0, 0).unwrap()
}

/// Tuesday 2025-06-10 20:00 UTC (17:00 local), the default stream slot.
pub fn slot() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 10, 20, 0, 0).unwrap()
}

pub struct TestApi {
    pub api: Arc<CoreApi>,
    pub clock: ManualClock,
    /// The storage behind `api`, for seeding rows the API would not write.
    pub repos: Repositories,
}

impl TestApi {
    pub fn set_time(&self, at: DateTime<Utc>) {
        self.clock.set(at);
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }
}

/// Sink that remembers what it was asked to deliver.
#[derive(Default)]
pub struct RecordingSink {
    pub sent: Mutex<Vec<Notification>>,
    pub fail: bool,
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, notification: &Notification) -> Result<(), Error> {
        if self.fail {
            return Err(Error::Parse("sink unavailable".into()));
        }
        self.sent.lock().push(notification.clone());
        Ok(())
    }
}

pub fn build_api(
    config: EngineConfig,
    gateway: Arc<dyn PaymentGateway + Send + Sync>,
    sink: Arc<dyn NotificationSink + Send + Sync>,
) -> TestApi {
    build_api_with_repos(Repositories::in_memory(), config, gateway, sink)
}

pub fn build_api_with_repos(
    repos: Repositories,
    config: EngineConfig,
    gateway: Arc<dyn PaymentGateway + Send + Sync>,
    sink: Arc<dyn NotificationSink + Send + Sync>,
) -> TestApi {
    let clock = ManualClock::new(t0());
    let api = CoreApi::new(
        repos.clone(),
        gateway,
        sink,
        config,
        Arc::new(clock.clone()),
        EventBus::new(),
    );
    TestApi { api: Arc::new(api), clock, repos }
}

pub fn setup_api_with_repos(repos: Repositories) -> TestApi {
    build_api_with_repos(
        repos,
        EngineConfig::default(),
        Arc::new(ManualPaymentGateway),
        Arc::new(RecordingSink::default()),
    )
}

/// Migrated test database from `TEST_DATABASE_URL`, or `None` when the
/// variable is unset so Postgres-backed tests can bail out.
pub async fn setup_test_database() -> Result<Option<Database>, Error> {
    let url = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => return Ok(None),
    };
    Ok(Some(Database::connect_and_migrate(&url, 5).await?))
}

pub fn postgres_api(db: &Database) -> TestApi {
    setup_api_with_repos(Repositories::postgres(db))
}

pub fn setup_api() -> TestApi {
    build_api(
        EngineConfig::default(),
        Arc::new(ManualPaymentGateway),
        Arc::new(RecordingSink::default()),
    )
}

pub fn setup_api_with_config(config: EngineConfig) -> TestApi {
    build_api(config, Arc::new(ManualPaymentGateway), Arc::new(RecordingSink::default()))
}

/// An ACTIVE shop with an Instagram handle.
pub async fn active_shop(api: &CoreApi, plan: Plan) -> Result<Shop, Error> {
    let mut handles = HashMap::new();
    handles.insert(SocialPlatform::Instagram, "mitienda".to_string());
    let shop = api
        .create_shop(NewShop {
            name: format!("Tienda {}", &Uuid::new_v4().to_string()[..8]),
            plan,
            timezone: None,
            social_handles: handles,
            legacy_quota: Default::default(),
        })
        .await?;
    api.set_shop_status(shop.shop_id, ShopStatus::Active).await
}

pub fn stream_request(shop_id: Uuid, full_date: DateTime<Utc>) -> ScheduleStreamRequest {
    ScheduleStreamRequest {
        shop_id,
        title: "Liquidación de invierno".to_string(),
        full_date,
        platform: SocialPlatform::Instagram,
        admin_override: false,
    }
}

pub async fn schedule_at(api: &CoreApi, shop_id: Uuid, full_date: DateTime<Utc>) -> Result<Stream, Error> {
    api.schedule_stream(stream_request(shop_id, full_date)).await
}

/// Files `n` viewer reports at the current clock time.
pub async fn report_times(api: &CoreApi, stream_id: Uuid, n: usize) -> Result<Stream, Error> {
    let mut last = api.get_stream(stream_id).await?;
    for _ in 0..n {
        last = api.report_stream(stream_id).await?;
    }
    Ok(last)
}
