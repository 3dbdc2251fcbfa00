// File: shopcast-core/src/repositories/postgres/reel.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use shopcast_common::error::Error;
use shopcast_common::models::Reel;
use shopcast_common::traits::repository_traits::ReelRepository;
use super::enum_col;

const REEL_COLUMNS: &str =
    "reel_id, shop_id, platform, content, status, origin, created_at, expires_at, version, updated_at";

pub struct PostgresReelRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresReelRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn reel_from_row(r: &PgRow) -> Result<Reel, Error> {
    Ok(Reel {
        reel_id: r.try_get("reel_id")?,
        shop_id: r.try_get("shop_id")?,
        platform: enum_col(r, "platform")?,
        content: r.try_get("content")?,
        status: enum_col(r, "status")?,
        origin: enum_col(r, "origin")?,
        created_at: r.try_get("created_at")?,
        expires_at: r.try_get("expires_at")?,
        version: r.try_get("version")?,
        updated_at: r.try_get("updated_at")?,
    })
}

#[async_trait]
impl ReelRepository for PostgresReelRepository {
    async fn insert_reel(&self, reel: &Reel) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO reels (
                reel_id, shop_id, platform, content, status, origin,
                created_at, expires_at, version, updated_at
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
            "#,
        )
            .bind(reel.reel_id)
            .bind(reel.shop_id)
            .bind(reel.platform.as_str())
            .bind(&reel.content)
            .bind(reel.status.as_str())
            .bind(reel.origin.as_str())
            .bind(reel.created_at)
            .bind(reel.expires_at)
            .bind(reel.version)
            .bind(reel.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_reel(&self, reel_id: Uuid) -> Result<Option<Reel>, Error> {
        let sql = format!("SELECT {} FROM reels WHERE reel_id = $1", REEL_COLUMNS);
        let row_opt = sqlx::query(&sql)
            .bind(reel_id)
            .fetch_optional(&self.pool)
            .await?;
        row_opt.as_ref().map(reel_from_row).transpose()
    }

    async fn update_reel(&self, reel: &Reel) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            UPDATE reels
            SET content = $3, status = $4, updated_at = $5, version = version + 1
            WHERE reel_id = $1 AND version = $2
            "#,
        )
            .bind(reel.reel_id)
            .bind(reel.version)
            .bind(&reel.content)
            .bind(reel.status.as_str())
            .bind(reel.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn list_reels_for_shop(&self, shop_id: Uuid) -> Result<Vec<Reel>, Error> {
        let sql = format!("SELECT {} FROM reels WHERE shop_id = $1 ORDER BY created_at DESC", REEL_COLUMNS);
        let rows = sqlx::query(&sql)
            .bind(shop_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(reel_from_row).collect()
    }

    async fn list_expired_active(&self, now: DateTime<Utc>) -> Result<Vec<Reel>, Error> {
        let sql = format!(
            "SELECT {} FROM reels WHERE status = 'ACTIVE' AND expires_at < $1 ORDER BY expires_at",
            REEL_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(now)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(reel_from_row).collect()
    }

    async fn count_reels_created_between(
        &self,
        shop_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, Error> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS cnt FROM reels
            WHERE shop_id = $1 AND created_at >= $2 AND created_at < $3
            "#,
        )
            .bind(shop_id)
            .bind(from)
            .bind(to)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("cnt")?)
    }
}
