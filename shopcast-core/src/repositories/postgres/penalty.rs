// File: shopcast-core/src/repositories/postgres/penalty.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use shopcast_common::error::Error;
use shopcast_common::models::Penalty;
use shopcast_common::traits::repository_traits::PenaltyRepository;

pub struct PostgresPenaltyRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresPenaltyRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PenaltyRepository for PostgresPenaltyRepository {
    async fn insert_penalty_once(&self, penalty: &Penalty) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO penalties (penalty_id, shop_id, stream_id, reason, date, active, lifted_at)
            VALUES ($1,$2,$3,$4,$5,$6,$7)
            ON CONFLICT DO NOTHING
            "#,
        )
            .bind(penalty.penalty_id)
            .bind(penalty.shop_id)
            .bind(penalty.stream_id)
            .bind(&penalty.reason)
            .bind(penalty.date)
            .bind(penalty.active)
            .bind(penalty.lifted_at)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn list_penalties(&self, shop_id: Uuid) -> Result<Vec<Penalty>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT penalty_id, shop_id, stream_id, reason, date, active, lifted_at
            FROM penalties
            WHERE shop_id = $1
            ORDER BY date DESC
            "#,
        )
            .bind(shop_id)
            .fetch_all(&self.pool)
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for r in rows {
            out.push(Penalty {
                penalty_id: r.try_get("penalty_id")?,
                shop_id: r.try_get("shop_id")?,
                stream_id: r.try_get("stream_id")?,
                reason: r.try_get("reason")?,
                date: r.try_get("date")?,
                active: r.try_get("active")?,
                lifted_at: r.try_get("lifted_at")?,
            });
        }
        Ok(out)
    }

    async fn count_active_penalties(&self, shop_id: Uuid) -> Result<i64, Error> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM penalties WHERE shop_id = $1 AND active")
            .bind(shop_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("cnt")?)
    }

    async fn lift_penalties(&self, shop_id: Uuid, lifted_at: DateTime<Utc>) -> Result<u64, Error> {
        let result = sqlx::query(
            "UPDATE penalties SET active = FALSE, lifted_at = $2 WHERE shop_id = $1 AND active",
        )
            .bind(shop_id)
            .bind(lifted_at)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
