use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use crate::error::Error;
use crate::models::{
    Penalty, PurchaseRequest, PurchaseStatus, QuotaDebit, QuotaKind, QuotaWalletSnapshot, Reel,
    Shop, ShopStatus, Stream, StreamStatus,
};

/// Versioned records: `update_*` methods are compare-and-set on `version`.
/// They return `Ok(false)` when the stored version moved on, and bump the
/// stored version by one on success. The caller's copy is not modified.
#[async_trait]
pub trait ShopRepository: Send + Sync {
    async fn create_shop(&self, shop: &Shop) -> Result<(), Error>;
    async fn get_shop(&self, shop_id: Uuid) -> Result<Option<Shop>, Error>;
    async fn update_shop(&self, shop: &Shop) -> Result<bool, Error>;
    async fn list_shops_by_status(&self, status: ShopStatus) -> Result<Vec<Shop>, Error>;
}

#[async_trait]
pub trait PenaltyRepository: Send + Sync {
    /// Inserts unless a penalty for the same `(shop_id, stream_id)` already
    /// exists. Returns whether a row was written.
    async fn insert_penalty_once(&self, penalty: &Penalty) -> Result<bool, Error>;
    async fn list_penalties(&self, shop_id: Uuid) -> Result<Vec<Penalty>, Error>;
    async fn count_active_penalties(&self, shop_id: Uuid) -> Result<i64, Error>;
    /// Deactivates every active penalty of the shop; returns how many.
    async fn lift_penalties(&self, shop_id: Uuid, lifted_at: DateTime<Utc>) -> Result<u64, Error>;
}

#[async_trait]
pub trait QuotaWalletRepository: Send + Sync {
    async fn get_wallet(&self, shop_id: Uuid) -> Result<Option<QuotaWalletSnapshot>, Error>;

    /// Inserts `wallet` unless the shop already has one; returns the stored row.
    async fn create_wallet_if_absent(&self, wallet: &QuotaWalletSnapshot) -> Result<QuotaWalletSnapshot, Error>;

    async fn list_wallets(&self) -> Result<Vec<QuotaWalletSnapshot>, Error>;

    /// Atomic base-first debit. `Ok(None)` when the wallet is short (and
    /// untouched). Errors with `NotFound` when the shop has no wallet.
    async fn debit(&self, shop_id: Uuid, kind: QuotaKind, n: i32) -> Result<Option<QuotaDebit>, Error>;

    /// Adds to the extra balance. With an idempotency key the credit is
    /// applied at most once; returns false when the key was already used.
    async fn credit_extra(
        &self,
        shop_id: Uuid,
        kind: QuotaKind,
        n: i32,
        idempotency_key: Option<&str>,
    ) -> Result<bool, Error>;

    async fn set_base_limits(&self, shop_id: Uuid, weekly_live_base: i32, reel_daily: i32) -> Result<(), Error>;

    /// Zeroes `weekly_live_used` unless the wallet already belongs to `week_key`.
    async fn reset_live_week(&self, shop_id: Uuid, week_key: &str) -> Result<bool, Error>;

    /// Zeroes `reel_daily_used` unless the wallet already belongs to `day_key`.
    async fn reset_reel_day(&self, shop_id: Uuid, day_key: &str) -> Result<bool, Error>;
}

#[async_trait]
pub trait StreamRepository: Send + Sync {
    async fn insert_stream(&self, stream: &Stream) -> Result<(), Error>;

    /// Inserts a stream that stands in for `replaces_stream_id` unless that
    /// stream already has a replacement. Returns whether a row was written.
    async fn insert_replacement(&self, stream: &Stream) -> Result<bool, Error>;

    async fn get_stream(&self, stream_id: Uuid) -> Result<Option<Stream>, Error>;
    async fn update_stream(&self, stream: &Stream) -> Result<bool, Error>;
    async fn list_streams_for_shop(&self, shop_id: Uuid) -> Result<Vec<Stream>, Error>;

    /// Streams of a shop in `statuses` whose `full_date` is in `[from, to)`.
    async fn list_shop_streams_between(
        &self,
        shop_id: Uuid,
        statuses: &[StreamStatus],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Stream>, Error>;

    /// All streams in `statuses`, optionally bounded on `full_date` (inclusive).
    async fn list_streams_by_status(
        &self,
        statuses: &[StreamStatus],
        scheduled_from: Option<DateTime<Utc>>,
        scheduled_to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Stream>, Error>;

    /// Atomically bumps `report_count` (and `version`); returns the new count.
    async fn increment_report_count(&self, stream_id: Uuid) -> Result<Option<i32>, Error>;
}

#[async_trait]
pub trait ReelRepository: Send + Sync {
    async fn insert_reel(&self, reel: &Reel) -> Result<(), Error>;
    async fn get_reel(&self, reel_id: Uuid) -> Result<Option<Reel>, Error>;
    async fn update_reel(&self, reel: &Reel) -> Result<bool, Error>;
    async fn list_reels_for_shop(&self, shop_id: Uuid) -> Result<Vec<Reel>, Error>;
    /// ACTIVE reels whose `expires_at` is before `now`.
    async fn list_expired_active(&self, now: DateTime<Utc>) -> Result<Vec<Reel>, Error>;
    async fn count_reels_created_between(
        &self,
        shop_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, Error>;
}

#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    async fn insert_purchase(&self, purchase: &PurchaseRequest) -> Result<(), Error>;
    async fn get_purchase(&self, purchase_id: Uuid) -> Result<Option<PurchaseRequest>, Error>;
    async fn get_purchase_by_reference(&self, external_reference: &str) -> Result<Option<PurchaseRequest>, Error>;
    async fn list_purchases_for_shop(&self, shop_id: Uuid) -> Result<Vec<PurchaseRequest>, Error>;

    /// Moves a PENDING purchase to `status`. Returns false if it was not PENDING.
    async fn resolve_purchase(
        &self,
        purchase_id: Uuid,
        status: PurchaseStatus,
        notes: Option<&str>,
        resolved_at: DateTime<Utc>,
    ) -> Result<bool, Error>;

    /// Stamps `applied_at` on an APPROVED purchase that has none yet.
    /// Returns false if it was already stamped.
    async fn mark_purchase_applied(&self, purchase_id: Uuid, applied_at: DateTime<Utc>) -> Result<bool, Error>;
}
