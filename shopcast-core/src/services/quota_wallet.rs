// File: shopcast-core/src/services/quota_wallet.rs
//
// The wallet is the canonical quota ledger. Shops that predate it are served
// from a projection of their flat legacy fields plus counted rows; the first
// mutation materializes that projection as a wallet row.

use std::sync::Arc;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use shopcast_common::models::{
    AvailableQuota, Plan, QuotaDebit, QuotaKind, QuotaOrigin, QuotaResetSummary,
    QuotaWalletSnapshot, RecordError, Shop, StreamStatus,
};
use shopcast_common::traits::repository_traits::{
    QuotaWalletRepository, ReelRepository, ShopRepository, StreamRepository,
};
use crate::config::EngineConfig;
use crate::utils::time::{self, Clock};
use crate::Error;

/// Stream states that still hold the slot they consumed.
const SLOT_CONSUMING: [StreamStatus; 5] = [
    StreamStatus::Upcoming,
    StreamStatus::Live,
    StreamStatus::Finished,
    StreamStatus::Missed,
    StreamStatus::PendingReprogrammation,
];

pub struct QuotaWalletService {
    wallet_repo: Arc<dyn QuotaWalletRepository + Send + Sync>,
    shop_repo: Arc<dyn ShopRepository + Send + Sync>,
    stream_repo: Arc<dyn StreamRepository + Send + Sync>,
    reel_repo: Arc<dyn ReelRepository + Send + Sync>,
    config: Arc<EngineConfig>,
    clock: Arc<dyn Clock>,
}

/// Splits a counted usage into `(used, remaining_extra)` against a base.
fn project_usage(base: i32, extra: i32, counted: i32) -> (i32, i32) {
    let used = counted.min(base).max(0);
    let overflow = (counted - base).max(0);
    (used, (extra - overflow).max(0))
}

impl QuotaWalletService {
    pub fn new(
        wallet_repo: Arc<dyn QuotaWalletRepository + Send + Sync>,
        shop_repo: Arc<dyn ShopRepository + Send + Sync>,
        stream_repo: Arc<dyn StreamRepository + Send + Sync>,
        reel_repo: Arc<dyn ReelRepository + Send + Sync>,
        config: Arc<EngineConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { wallet_repo, shop_repo, stream_repo, reel_repo, config, clock }
    }

    fn tz(&self, shop: &Shop) -> Tz {
        self.config.tz_for(shop.timezone.as_deref())
    }

    fn period_keys(&self, shop: &Shop, now: DateTime<Utc>) -> (String, String) {
        let tz = self.tz(shop);
        (time::week_key(&tz, now), time::day_key(&tz, now))
    }

    async fn load_shop(&self, shop_id: Uuid) -> Result<Shop, Error> {
        self.shop_repo
            .get_shop(shop_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("shop {}", shop_id)))
    }

    /// The wallet a wallet-less shop would have right now.
    pub async fn legacy_projection(&self, shop: &Shop) -> Result<QuotaWalletSnapshot, Error> {
        let now = self.clock.now();
        let tz = self.tz(shop);
        let legacy = &shop.legacy_quota;

        let live_base = legacy.live_base.unwrap_or_else(|| shop.plan.weekly_live_base()).max(0);
        let live_extra = legacy.live_extra.unwrap_or(0).max(0);
        let reel_base = legacy.reel_base.unwrap_or_else(|| shop.plan.daily_reel_base()).max(0);
        let reel_extra = legacy.reel_extra.unwrap_or(0).max(0);

        let (week_from, week_to) = time::iso_week_bounds(&tz, now);
        let live_count = self
            .stream_repo
            .list_shop_streams_between(shop.shop_id, &SLOT_CONSUMING, week_from, week_to)
            .await?
            .iter()
            // A replacement inherits the origin of the MISSED stream it
            // stands in for; only the original holds the slot.
            .filter(|s| s.quota_origin != QuotaOrigin::Complimentary && s.replaces_stream_id.is_none())
            .count() as i32;

        let (day_from, day_to) = time::local_day_bounds(&tz, now);
        let reel_count = self
            .reel_repo
            .count_reels_created_between(shop.shop_id, day_from, day_to)
            .await? as i32;

        let (live_used, live_extra) = project_usage(live_base, live_extra, live_count);
        let (reel_used, reel_extra) = project_usage(reel_base, reel_extra, reel_count);

        Ok(QuotaWalletSnapshot {
            shop_id: shop.shop_id,
            weekly_live_base_limit: live_base,
            weekly_live_used: live_used,
            live_extra_balance: live_extra,
            reel_daily_limit: reel_base,
            reel_daily_used: reel_used,
            reel_extra_balance: reel_extra,
            live_week_key: time::week_key(&tz, now),
            reel_day_key: time::day_key(&tz, now),
            updated_at: now,
        })
    }

    /// Makes sure a wallet row exists and its usage counters belong to the
    /// current week/day, then returns it.
    pub async fn ensure_wallet(&self, shop: &Shop) -> Result<QuotaWalletSnapshot, Error> {
        let wallet = match self.wallet_repo.get_wallet(shop.shop_id).await? {
            Some(w) => w,
            None => {
                let projected = self.legacy_projection(shop).await?;
                let stored = self.wallet_repo.create_wallet_if_absent(&projected).await?;
                info!("Materialized quota wallet for shop {}", shop.shop_id);
                stored
            }
        };

        let (week, day) = self.period_keys(shop, self.clock.now());
        let mut rolled = false;
        if wallet.live_week_key != week {
            rolled |= self.wallet_repo.reset_live_week(shop.shop_id, &week).await?;
        }
        if wallet.reel_day_key != day {
            rolled |= self.wallet_repo.reset_reel_day(shop.shop_id, &day).await?;
        }
        if !rolled {
            return Ok(wallet);
        }
        self.wallet_repo
            .get_wallet(shop.shop_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("quota wallet for shop {}", shop.shop_id)))
    }

    /// The single read every consumer uses.
    pub async fn available_quota(&self, shop_id: Uuid) -> Result<AvailableQuota, Error> {
        let shop = self.load_shop(shop_id).await?;
        let (wallet, from_wallet) = match self.wallet_repo.get_wallet(shop_id).await? {
            Some(mut w) => {
                // Counters from a finished period read as zero until reset.
                let (week, day) = self.period_keys(&shop, self.clock.now());
                if w.live_week_key != week {
                    w.weekly_live_used = 0;
                    w.live_week_key = week;
                }
                if w.reel_day_key != day {
                    w.reel_daily_used = 0;
                    w.reel_day_key = day;
                }
                (w, true)
            }
            None => (self.legacy_projection(&shop).await?, false),
        };
        Ok(AvailableQuota {
            shop_id,
            live: wallet.available_live(),
            reel: wallet.available_reel(),
            from_wallet,
            wallet,
        })
    }

    /// Atomic base-first debit; `InsufficientQuota` leaves the wallet untouched.
    pub async fn debit(&self, shop: &Shop, kind: QuotaKind, n: i32) -> Result<QuotaDebit, Error> {
        let wallet = self.ensure_wallet(shop).await?;
        match self.wallet_repo.debit(shop.shop_id, kind, n).await? {
            Some(debit) => {
                debug!(
                    "Debited {} {} unit(s) from shop {} (base {}, extra {})",
                    n, kind, shop.shop_id, debit.from_base, debit.from_extra
                );
                Ok(debit)
            }
            None => {
                let available = self
                    .wallet_repo
                    .get_wallet(shop.shop_id)
                    .await?
                    .unwrap_or(wallet)
                    .available(kind);
                Err(Error::InsufficientQuota {
                    shop_id: shop.shop_id,
                    requested: n,
                    available,
                })
            }
        }
    }

    /// Returns a consumed unit. Refunds always land in the extra balance.
    /// A keyed refund is applied at most once; returns false on a repeat.
    pub async fn refund(
        &self,
        shop_id: Uuid,
        kind: QuotaKind,
        n: i32,
        idempotency_key: Option<&str>,
    ) -> Result<bool, Error> {
        let shop = self.load_shop(shop_id).await?;
        self.ensure_wallet(&shop).await?;
        let applied = self.wallet_repo.credit_extra(shop_id, kind, n, idempotency_key).await?;
        if applied {
            info!("Refunded {} {} unit(s) to shop {}", n, kind, shop_id);
        } else {
            debug!("Refund {:?} for shop {} was already applied", idempotency_key, shop_id);
        }
        Ok(applied)
    }

    /// Credits purchased quota. With a key, a repeated credit is a no-op
    /// returning false.
    pub async fn credit_extra(
        &self,
        shop_id: Uuid,
        kind: QuotaKind,
        n: i32,
        idempotency_key: Option<&str>,
    ) -> Result<bool, Error> {
        let shop = self.load_shop(shop_id).await?;
        self.ensure_wallet(&shop).await?;
        let applied = self.wallet_repo.credit_extra(shop_id, kind, n, idempotency_key).await?;
        if applied {
            info!("Credited {} extra {} unit(s) to shop {}", n, kind, shop_id);
        } else {
            warn!("Credit {:?} for shop {} was already applied", idempotency_key, shop_id);
        }
        Ok(applied)
    }

    /// Rewrites the base allotments after a plan change.
    pub async fn apply_plan(&self, shop: &Shop, plan: Plan) -> Result<(), Error> {
        self.ensure_wallet(shop).await?;
        self.wallet_repo
            .set_base_limits(shop.shop_id, plan.weekly_live_base(), plan.daily_reel_base())
            .await
    }

    /// Scheduled rollover of every wallet to the current week/day.
    pub async fn reset_periods(&self) -> Result<QuotaResetSummary, Error> {
        let now = self.clock.now();
        let mut summary = QuotaResetSummary::default();
        for wallet in self.wallet_repo.list_wallets().await? {
            summary.wallets += 1;
            let shop = match self.load_shop(wallet.shop_id).await {
                Ok(s) => s,
                Err(e) => {
                    summary.errors.push(RecordError { record_id: wallet.shop_id, message: e.to_string() });
                    continue;
                }
            };
            let (week, day) = self.period_keys(&shop, now);
            match self.wallet_repo.reset_live_week(shop.shop_id, &week).await {
                Ok(true) => summary.weekly_resets += 1,
                Ok(false) => {}
                Err(e) => {
                    error!("Weekly reset failed for shop {}: {:?}", shop.shop_id, e);
                    summary.errors.push(RecordError { record_id: shop.shop_id, message: e.to_string() });
                }
            }
            match self.wallet_repo.reset_reel_day(shop.shop_id, &day).await {
                Ok(true) => summary.daily_resets += 1,
                Ok(false) => {}
                Err(e) => {
                    error!("Daily reel reset failed for shop {}: {:?}", shop.shop_id, e);
                    summary.errors.push(RecordError { record_id: shop.shop_id, message: e.to_string() });
                }
            }
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::project_usage;

    #[test]
    fn projection_spills_overflow_into_extra() {
        assert_eq!(project_usage(1, 2, 0), (0, 2));
        assert_eq!(project_usage(1, 2, 1), (1, 2));
        assert_eq!(project_usage(1, 2, 2), (1, 1));
        assert_eq!(project_usage(0, 1, 5), (0, 0));
    }

    #[test]
    fn projection_matches_flat_formula() {
        for base in 0..4 {
            for extra in 0..4 {
                for counted in 0..8 {
                    let (used, left) = project_usage(base, extra, counted);
                    let projected = (base - used).max(0) + left;
                    let flat = (base + extra - counted).max(0);
                    assert_eq!(projected, flat, "base={} extra={} counted={}", base, extra, counted);
                }
            }
        }
    }
}
