// File: shopcast-core/src/repositories/postgres/purchase.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use shopcast_common::error::Error;
use shopcast_common::models::{PurchaseRequest, PurchaseStatus};
use shopcast_common::traits::repository_traits::PurchaseRepository;
use super::{enum_col, opt_enum_col};

const PURCHASE_COLUMNS: &str = r#"
    purchase_id, shop_id, purchase_type, quantity, target_plan, amount_cents, status,
    external_reference, checkout_url, notes, created_at, resolved_at, applied_at
"#;

pub struct PostgresPurchaseRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresPurchaseRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn purchase_from_row(r: &PgRow) -> Result<PurchaseRequest, Error> {
    Ok(PurchaseRequest {
        purchase_id: r.try_get("purchase_id")?,
        shop_id: r.try_get("shop_id")?,
        purchase_type: enum_col(r, "purchase_type")?,
        quantity: r.try_get("quantity")?,
        target_plan: opt_enum_col(r, "target_plan")?,
        amount_cents: r.try_get("amount_cents")?,
        status: enum_col(r, "status")?,
        external_reference: r.try_get("external_reference")?,
        checkout_url: r.try_get("checkout_url")?,
        notes: r.try_get("notes")?,
        created_at: r.try_get("created_at")?,
        resolved_at: r.try_get("resolved_at")?,
        applied_at: r.try_get("applied_at")?,
    })
}

#[async_trait]
impl PurchaseRepository for PostgresPurchaseRepository {
    async fn insert_purchase(&self, p: &PurchaseRequest) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO purchase_requests (
                purchase_id, shop_id, purchase_type, quantity, target_plan, amount_cents, status,
                external_reference, checkout_url, notes, created_at, resolved_at, applied_at
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13)
            "#,
        )
            .bind(p.purchase_id)
            .bind(p.shop_id)
            .bind(p.purchase_type.as_str())
            .bind(p.quantity)
            .bind(p.target_plan.map(|plan| plan.as_str()))
            .bind(p.amount_cents)
            .bind(p.status.as_str())
            .bind(&p.external_reference)
            .bind(&p.checkout_url)
            .bind(&p.notes)
            .bind(p.created_at)
            .bind(p.resolved_at)
            .bind(p.applied_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_purchase(&self, purchase_id: Uuid) -> Result<Option<PurchaseRequest>, Error> {
        let sql = format!("SELECT {} FROM purchase_requests WHERE purchase_id = $1", PURCHASE_COLUMNS);
        let row_opt = sqlx::query(&sql)
            .bind(purchase_id)
            .fetch_optional(&self.pool)
            .await?;
        row_opt.as_ref().map(purchase_from_row).transpose()
    }

    async fn get_purchase_by_reference(&self, external_reference: &str) -> Result<Option<PurchaseRequest>, Error> {
        let sql = format!("SELECT {} FROM purchase_requests WHERE external_reference = $1", PURCHASE_COLUMNS);
        let row_opt = sqlx::query(&sql)
            .bind(external_reference)
            .fetch_optional(&self.pool)
            .await?;
        row_opt.as_ref().map(purchase_from_row).transpose()
    }

    async fn list_purchases_for_shop(&self, shop_id: Uuid) -> Result<Vec<PurchaseRequest>, Error> {
        let sql = format!(
            "SELECT {} FROM purchase_requests WHERE shop_id = $1 ORDER BY created_at DESC",
            PURCHASE_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(shop_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(purchase_from_row).collect()
    }

    async fn resolve_purchase(
        &self,
        purchase_id: Uuid,
        status: PurchaseStatus,
        notes: Option<&str>,
        resolved_at: DateTime<Utc>,
    ) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            UPDATE purchase_requests
            SET status = $2, notes = COALESCE($3, notes), resolved_at = $4
            WHERE purchase_id = $1 AND status = 'PENDING'
            "#,
        )
            .bind(purchase_id)
            .bind(status.as_str())
            .bind(notes)
            .bind(resolved_at)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn mark_purchase_applied(&self, purchase_id: Uuid, applied_at: DateTime<Utc>) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            UPDATE purchase_requests
            SET applied_at = $2
            WHERE purchase_id = $1 AND status = 'APPROVED' AND applied_at IS NULL
            "#,
        )
            .bind(purchase_id)
            .bind(applied_at)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
