// File: shopcast-core/tests/test_utils/flaky.rs
//
// Repository wrappers that fail one chosen write on demand and pass
// everything else through to the in-memory backend.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use shopcast_common::models::{Penalty, QuotaDebit, QuotaKind, QuotaWalletSnapshot, Stream, StreamStatus};
use shopcast_common::traits::repository_traits::{PenaltyRepository, QuotaWalletRepository, StreamRepository};
use shopcast_core::repositories::{
    InMemoryPenaltyRepository, InMemoryQuotaWalletRepository, InMemoryStreamRepository,
};
use shopcast_core::Error;

/// Once armed, the next guarded call fails and the switch disarms itself.
#[derive(Default)]
pub struct FailSwitch(AtomicBool);

impl FailSwitch {
    pub fn arm(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_armed(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn trip(&self, op: &str) -> Result<(), Error> {
        if self.0.swap(false, Ordering::SeqCst) {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                format!("{} lost its connection", op),
            )));
        }
        Ok(())
    }
}

/// Fails `credit_extra` when armed.
#[derive(Default)]
pub struct FlakyWalletRepository {
    pub inner: InMemoryQuotaWalletRepository,
    pub fail_credit: FailSwitch,
}

#[async_trait]
impl QuotaWalletRepository for FlakyWalletRepository {
    async fn get_wallet(&self, shop_id: Uuid) -> Result<Option<QuotaWalletSnapshot>, Error> {
        self.inner.get_wallet(shop_id).await
    }

    async fn create_wallet_if_absent(&self, wallet: &QuotaWalletSnapshot) -> Result<QuotaWalletSnapshot, Error> {
        self.inner.create_wallet_if_absent(wallet).await
    }

    async fn list_wallets(&self) -> Result<Vec<QuotaWalletSnapshot>, Error> {
        self.inner.list_wallets().await
    }

    async fn debit(&self, shop_id: Uuid, kind: QuotaKind, n: i32) -> Result<Option<QuotaDebit>, Error> {
        self.inner.debit(shop_id, kind, n).await
    }

    async fn credit_extra(
        &self,
        shop_id: Uuid,
        kind: QuotaKind,
        n: i32,
        idempotency_key: Option<&str>,
    ) -> Result<bool, Error> {
        self.fail_credit.trip("credit_extra")?;
        self.inner.credit_extra(shop_id, kind, n, idempotency_key).await
    }

    async fn set_base_limits(&self, shop_id: Uuid, weekly_live_base: i32, reel_daily: i32) -> Result<(), Error> {
        self.inner.set_base_limits(shop_id, weekly_live_base, reel_daily).await
    }

    async fn reset_live_week(&self, shop_id: Uuid, week_key: &str) -> Result<bool, Error> {
        self.inner.reset_live_week(shop_id, week_key).await
    }

    async fn reset_reel_day(&self, shop_id: Uuid, day_key: &str) -> Result<bool, Error> {
        self.inner.reset_reel_day(shop_id, day_key).await
    }
}

/// Fails `update_stream` or `insert_replacement` when armed.
#[derive(Default)]
pub struct FlakyStreamRepository {
    pub inner: InMemoryStreamRepository,
    pub fail_update: FailSwitch,
    pub fail_replacement: FailSwitch,
}

#[async_trait]
impl StreamRepository for FlakyStreamRepository {
    async fn insert_stream(&self, stream: &Stream) -> Result<(), Error> {
        self.inner.insert_stream(stream).await
    }

    async fn insert_replacement(&self, stream: &Stream) -> Result<bool, Error> {
        self.fail_replacement.trip("insert_replacement")?;
        self.inner.insert_replacement(stream).await
    }

    async fn get_stream(&self, stream_id: Uuid) -> Result<Option<Stream>, Error> {
        self.inner.get_stream(stream_id).await
    }

    async fn update_stream(&self, stream: &Stream) -> Result<bool, Error> {
        self.fail_update.trip("update_stream")?;
        self.inner.update_stream(stream).await
    }

    async fn list_streams_for_shop(&self, shop_id: Uuid) -> Result<Vec<Stream>, Error> {
        self.inner.list_streams_for_shop(shop_id).await
    }

    async fn list_shop_streams_between(
        &self,
        shop_id: Uuid,
        statuses: &[StreamStatus],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Stream>, Error> {
        self.inner.list_shop_streams_between(shop_id, statuses, from, to).await
    }

    async fn list_streams_by_status(
        &self,
        statuses: &[StreamStatus],
        scheduled_from: Option<DateTime<Utc>>,
        scheduled_to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Stream>, Error> {
        self.inner.list_streams_by_status(statuses, scheduled_from, scheduled_to).await
    }

    async fn increment_report_count(&self, stream_id: Uuid) -> Result<Option<i32>, Error> {
        self.inner.increment_report_count(stream_id).await
    }
}

/// Fails `insert_penalty_once` when armed.
#[derive(Default)]
pub struct FlakyPenaltyRepository {
    pub inner: InMemoryPenaltyRepository,
    pub fail_insert: FailSwitch,
}

#[async_trait]
impl PenaltyRepository for FlakyPenaltyRepository {
    async fn insert_penalty_once(&self, penalty: &Penalty) -> Result<bool, Error> {
        self.fail_insert.trip("insert_penalty_once")?;
        self.inner.insert_penalty_once(penalty).await
    }

    async fn list_penalties(&self, shop_id: Uuid) -> Result<Vec<Penalty>, Error> {
        self.inner.list_penalties(shop_id).await
    }

    async fn count_active_penalties(&self, shop_id: Uuid) -> Result<i64, Error> {
        self.inner.count_active_penalties(shop_id).await
    }

    async fn lift_penalties(&self, shop_id: Uuid, lifted_at: DateTime<Utc>) -> Result<u64, Error> {
        self.inner.lift_penalties(shop_id, lifted_at).await
    }
}

/// In-memory repositories with the flaky wrappers plugged in.
pub struct FlakyRepos {
    pub wallets: Arc<FlakyWalletRepository>,
    pub streams: Arc<FlakyStreamRepository>,
    pub penalties: Arc<FlakyPenaltyRepository>,
}

impl FlakyRepos {
    pub fn new() -> Self {
        Self {
            wallets: Arc::new(FlakyWalletRepository::default()),
            streams: Arc::new(FlakyStreamRepository::default()),
            penalties: Arc::new(FlakyPenaltyRepository::default()),
        }
    }

    pub fn repositories(&self) -> shopcast_core::Repositories {
        shopcast_core::Repositories {
            wallets: self.wallets.clone(),
            streams: self.streams.clone(),
            penalties: self.penalties.clone(),
            ..shopcast_core::Repositories::in_memory()
        }
    }
}
