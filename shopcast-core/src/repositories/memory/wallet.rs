use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use shopcast_common::error::Error;
use shopcast_common::models::{QuotaDebit, QuotaKind, QuotaWalletSnapshot};
use shopcast_common::traits::repository_traits::QuotaWalletRepository;

/// Each mutation runs under the DashMap entry lock of the shop's wallet.
#[derive(Default)]
pub struct InMemoryQuotaWalletRepository {
    wallets: DashMap<Uuid, QuotaWalletSnapshot>,
    credits: DashMap<String, Uuid>,
}

impl InMemoryQuotaWalletRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing(shop_id: Uuid) -> Error {
    Error::NotFound(format!("quota wallet for shop {}", shop_id))
}

#[async_trait]
impl QuotaWalletRepository for InMemoryQuotaWalletRepository {
    async fn get_wallet(&self, shop_id: Uuid) -> Result<Option<QuotaWalletSnapshot>, Error> {
        Ok(self.wallets.get(&shop_id).map(|w| w.value().clone()))
    }

    async fn create_wallet_if_absent(&self, wallet: &QuotaWalletSnapshot) -> Result<QuotaWalletSnapshot, Error> {
        let stored = self
            .wallets
            .entry(wallet.shop_id)
            .or_insert_with(|| wallet.clone());
        Ok(stored.value().clone())
    }

    async fn list_wallets(&self) -> Result<Vec<QuotaWalletSnapshot>, Error> {
        Ok(self.wallets.iter().map(|w| w.value().clone()).collect())
    }

    async fn debit(&self, shop_id: Uuid, kind: QuotaKind, n: i32) -> Result<Option<QuotaDebit>, Error> {
        let mut wallet = self.wallets.get_mut(&shop_id).ok_or_else(|| missing(shop_id))?;
        match wallet.try_debit(kind, n) {
            Some((from_base, from_extra)) => {
                wallet.updated_at = Utc::now();
                Ok(Some(QuotaDebit {
                    from_base,
                    from_extra,
                    wallet: wallet.value().clone(),
                }))
            }
            None => Ok(None),
        }
    }

    async fn credit_extra(
        &self,
        shop_id: Uuid,
        kind: QuotaKind,
        n: i32,
        idempotency_key: Option<&str>,
    ) -> Result<bool, Error> {
        if n <= 0 {
            return Err(Error::Parse(format!("credit amount must be positive, got {}", n)));
        }
        let mut wallet = self.wallets.get_mut(&shop_id).ok_or_else(|| missing(shop_id))?;
        if let Some(key) = idempotency_key {
            match self.credits.entry(key.to_string()) {
                Entry::Occupied(_) => return Ok(false),
                Entry::Vacant(v) => {
                    v.insert(shop_id);
                }
            }
        }
        wallet.credit_extra(kind, n);
        wallet.updated_at = Utc::now();
        Ok(true)
    }

    async fn set_base_limits(&self, shop_id: Uuid, weekly_live_base: i32, reel_daily: i32) -> Result<(), Error> {
        let mut wallet = self.wallets.get_mut(&shop_id).ok_or_else(|| missing(shop_id))?;
        wallet.weekly_live_base_limit = weekly_live_base.max(0);
        wallet.reel_daily_limit = reel_daily.max(0);
        wallet.updated_at = Utc::now();
        Ok(())
    }

    async fn reset_live_week(&self, shop_id: Uuid, week_key: &str) -> Result<bool, Error> {
        let mut wallet = self.wallets.get_mut(&shop_id).ok_or_else(|| missing(shop_id))?;
        if wallet.live_week_key == week_key {
            return Ok(false);
        }
        wallet.weekly_live_used = 0;
        wallet.live_week_key = week_key.to_string();
        wallet.updated_at = Utc::now();
        Ok(true)
    }

    async fn reset_reel_day(&self, shop_id: Uuid, day_key: &str) -> Result<bool, Error> {
        let mut wallet = self.wallets.get_mut(&shop_id).ok_or_else(|| missing(shop_id))?;
        if wallet.reel_day_key == day_key {
            return Ok(false);
        }
        wallet.reel_daily_used = 0;
        wallet.reel_day_key = day_key.to_string();
        wallet.updated_at = Utc::now();
        Ok(true)
    }
}
