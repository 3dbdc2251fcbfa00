// File: shopcast-core/src/repositories/postgres/shop.rs

use std::collections::HashMap;
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use shopcast_common::error::Error;
use shopcast_common::models::{LegacyQuota, Shop, ShopStatus, SocialPlatform};
use shopcast_common::traits::repository_traits::ShopRepository;
use super::enum_col;

const SHOP_COLUMNS: &str = r#"
    shop_id, name, plan, status, penalized_flag, agenda_suspended_until,
    owner_accepted_at, social_handles, timezone,
    legacy_live_base, legacy_live_extra, legacy_reel_base, legacy_reel_extra,
    version, created_at, updated_at
"#;

pub struct PostgresShopRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresShopRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn shop_from_row(r: &PgRow) -> Result<Shop, Error> {
    let handles: Json<HashMap<SocialPlatform, String>> = r.try_get("social_handles")?;
    Ok(Shop {
        shop_id: r.try_get("shop_id")?,
        name: r.try_get("name")?,
        plan: enum_col(r, "plan")?,
        status: enum_col(r, "status")?,
        penalized_flag: r.try_get("penalized_flag")?,
        agenda_suspended_until: r.try_get("agenda_suspended_until")?,
        owner_accepted_at: r.try_get("owner_accepted_at")?,
        social_handles: handles.0,
        timezone: r.try_get("timezone")?,
        legacy_quota: LegacyQuota {
            live_base: r.try_get("legacy_live_base")?,
            live_extra: r.try_get("legacy_live_extra")?,
            reel_base: r.try_get("legacy_reel_base")?,
            reel_extra: r.try_get("legacy_reel_extra")?,
        },
        version: r.try_get("version")?,
        created_at: r.try_get("created_at")?,
        updated_at: r.try_get("updated_at")?,
    })
}

#[async_trait]
impl ShopRepository for PostgresShopRepository {
    async fn create_shop(&self, shop: &Shop) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO shops (
                shop_id, name, plan, status, penalized_flag, agenda_suspended_until,
                owner_accepted_at, social_handles, timezone,
                legacy_live_base, legacy_live_extra, legacy_reel_base, legacy_reel_extra,
                version, created_at, updated_at
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16)
            "#,
        )
            .bind(shop.shop_id)
            .bind(&shop.name)
            .bind(shop.plan.as_str())
            .bind(shop.status.as_str())
            .bind(shop.penalized_flag)
            .bind(shop.agenda_suspended_until)
            .bind(shop.owner_accepted_at)
            .bind(Json(&shop.social_handles))
            .bind(&shop.timezone)
            .bind(shop.legacy_quota.live_base)
            .bind(shop.legacy_quota.live_extra)
            .bind(shop.legacy_quota.reel_base)
            .bind(shop.legacy_quota.reel_extra)
            .bind(shop.version)
            .bind(shop.created_at)
            .bind(shop.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_shop(&self, shop_id: Uuid) -> Result<Option<Shop>, Error> {
        let sql = format!("SELECT {} FROM shops WHERE shop_id = $1", SHOP_COLUMNS);
        let row_opt = sqlx::query(&sql)
            .bind(shop_id)
            .fetch_optional(&self.pool)
            .await?;
        row_opt.as_ref().map(shop_from_row).transpose()
    }

    async fn update_shop(&self, shop: &Shop) -> Result<bool, Error> {
        // Legacy quota columns are read-only and never written here.
        let result = sqlx::query(
            r#"
            UPDATE shops
            SET name = $3,
                plan = $4,
                status = $5,
                penalized_flag = $6,
                agenda_suspended_until = $7,
                owner_accepted_at = $8,
                social_handles = $9,
                timezone = $10,
                updated_at = $11,
                version = version + 1
            WHERE shop_id = $1 AND version = $2
            "#,
        )
            .bind(shop.shop_id)
            .bind(shop.version)
            .bind(&shop.name)
            .bind(shop.plan.as_str())
            .bind(shop.status.as_str())
            .bind(shop.penalized_flag)
            .bind(shop.agenda_suspended_until)
            .bind(shop.owner_accepted_at)
            .bind(Json(&shop.social_handles))
            .bind(&shop.timezone)
            .bind(shop.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn list_shops_by_status(&self, status: ShopStatus) -> Result<Vec<Shop>, Error> {
        let sql = format!("SELECT {} FROM shops WHERE status = $1 ORDER BY created_at", SHOP_COLUMNS);
        let rows = sqlx::query(&sql)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(shop_from_row).collect()
    }
}
