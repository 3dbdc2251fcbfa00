// File: shopcast-core/src/repositories/postgres/wallet.rs

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use shopcast_common::error::Error;
use shopcast_common::models::{QuotaDebit, QuotaKind, QuotaWalletSnapshot};
use shopcast_common::traits::repository_traits::QuotaWalletRepository;

const WALLET_COLUMNS: &str = r#"
    shop_id, weekly_live_base_limit, weekly_live_used, live_extra_balance,
    reel_daily_limit, reel_daily_used, reel_extra_balance,
    live_week_key, reel_day_key, updated_at
"#;

pub struct PostgresQuotaWalletRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresQuotaWalletRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn wallet_from_row(r: &PgRow) -> Result<QuotaWalletSnapshot, Error> {
    Ok(QuotaWalletSnapshot {
        shop_id: r.try_get("shop_id")?,
        weekly_live_base_limit: r.try_get("weekly_live_base_limit")?,
        weekly_live_used: r.try_get("weekly_live_used")?,
        live_extra_balance: r.try_get("live_extra_balance")?,
        reel_daily_limit: r.try_get("reel_daily_limit")?,
        reel_daily_used: r.try_get("reel_daily_used")?,
        reel_extra_balance: r.try_get("reel_extra_balance")?,
        live_week_key: r.try_get("live_week_key")?,
        reel_day_key: r.try_get("reel_day_key")?,
        updated_at: r.try_get("updated_at")?,
    })
}

#[async_trait]
impl QuotaWalletRepository for PostgresQuotaWalletRepository {
    async fn get_wallet(&self, shop_id: Uuid) -> Result<Option<QuotaWalletSnapshot>, Error> {
        let sql = format!("SELECT {} FROM quota_wallets WHERE shop_id = $1", WALLET_COLUMNS);
        let row_opt = sqlx::query(&sql)
            .bind(shop_id)
            .fetch_optional(&self.pool)
            .await?;
        row_opt.as_ref().map(wallet_from_row).transpose()
    }

    async fn create_wallet_if_absent(&self, wallet: &QuotaWalletSnapshot) -> Result<QuotaWalletSnapshot, Error> {
        sqlx::query(
            r#"
            INSERT INTO quota_wallets (
                shop_id, weekly_live_base_limit, weekly_live_used, live_extra_balance,
                reel_daily_limit, reel_daily_used, reel_extra_balance,
                live_week_key, reel_day_key, updated_at
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
            ON CONFLICT (shop_id) DO NOTHING
            "#,
        )
            .bind(wallet.shop_id)
            .bind(wallet.weekly_live_base_limit)
            .bind(wallet.weekly_live_used)
            .bind(wallet.live_extra_balance)
            .bind(wallet.reel_daily_limit)
            .bind(wallet.reel_daily_used)
            .bind(wallet.reel_extra_balance)
            .bind(&wallet.live_week_key)
            .bind(&wallet.reel_day_key)
            .bind(wallet.updated_at)
            .execute(&self.pool)
            .await?;

        self.get_wallet(wallet.shop_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("quota wallet for shop {}", wallet.shop_id)))
    }

    async fn list_wallets(&self) -> Result<Vec<QuotaWalletSnapshot>, Error> {
        let sql = format!("SELECT {} FROM quota_wallets ORDER BY shop_id", WALLET_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(wallet_from_row).collect()
    }

    async fn debit(&self, shop_id: Uuid, kind: QuotaKind, n: i32) -> Result<Option<QuotaDebit>, Error> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {} FROM quota_wallets WHERE shop_id = $1 FOR UPDATE", WALLET_COLUMNS);
        let row_opt = sqlx::query(&sql)
            .bind(shop_id)
            .fetch_optional(&mut *tx)
            .await?;
        let mut wallet = match row_opt {
            Some(r) => wallet_from_row(&r)?,
            None => return Err(Error::NotFound(format!("quota wallet for shop {}", shop_id))),
        };

        let Some((from_base, from_extra)) = wallet.try_debit(kind, n) else {
            tx.rollback().await?;
            return Ok(None);
        };
        wallet.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE quota_wallets
            SET weekly_live_used = $2,
                live_extra_balance = $3,
                reel_daily_used = $4,
                reel_extra_balance = $5,
                updated_at = $6
            WHERE shop_id = $1
            "#,
        )
            .bind(shop_id)
            .bind(wallet.weekly_live_used)
            .bind(wallet.live_extra_balance)
            .bind(wallet.reel_daily_used)
            .bind(wallet.reel_extra_balance)
            .bind(wallet.updated_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(QuotaDebit { from_base, from_extra, wallet }))
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
        let mut tx = self.pool.begin().await?;

        if let Some(key) = idempotency_key {
            let inserted = sqlx::query(
                r#"
                INSERT INTO wallet_credits (idempotency_key, shop_id, kind, amount, created_at)
                VALUES ($1,$2,$3,$4,$5)
                ON CONFLICT (idempotency_key) DO NOTHING
                "#,
            )
                .bind(key)
                .bind(shop_id)
                .bind(kind.to_string())
                .bind(n)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await?;
            if inserted.rows_affected() == 0 {
                tx.rollback().await?;
                return Ok(false);
            }
        }

        let sql = match kind {
            QuotaKind::Live => {
                "UPDATE quota_wallets SET live_extra_balance = live_extra_balance + $2, updated_at = $3 WHERE shop_id = $1"
            }
            QuotaKind::Reel => {
                "UPDATE quota_wallets SET reel_extra_balance = reel_extra_balance + $2, updated_at = $3 WHERE shop_id = $1"
            }
        };
        let updated = sqlx::query(sql)
            .bind(shop_id)
            .bind(n)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(Error::NotFound(format!("quota wallet for shop {}", shop_id)));
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn set_base_limits(&self, shop_id: Uuid, weekly_live_base: i32, reel_daily: i32) -> Result<(), Error> {
        let result = sqlx::query(
            r#"
            UPDATE quota_wallets
            SET weekly_live_base_limit = $2, reel_daily_limit = $3, updated_at = $4
            WHERE shop_id = $1
            "#,
        )
            .bind(shop_id)
            .bind(weekly_live_base.max(0))
            .bind(reel_daily.max(0))
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("quota wallet for shop {}", shop_id)));
        }
        Ok(())
    }

    async fn reset_live_week(&self, shop_id: Uuid, week_key: &str) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            UPDATE quota_wallets
            SET weekly_live_used = 0, live_week_key = $2, updated_at = $3
            WHERE shop_id = $1 AND live_week_key <> $2
            "#,
        )
            .bind(shop_id)
            .bind(week_key)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn reset_reel_day(&self, shop_id: Uuid, day_key: &str) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            UPDATE quota_wallets
            SET reel_daily_used = 0, reel_day_key = $2, updated_at = $3
            WHERE shop_id = $1 AND reel_day_key <> $2
            "#,
        )
            .bind(shop_id)
            .bind(day_key)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
