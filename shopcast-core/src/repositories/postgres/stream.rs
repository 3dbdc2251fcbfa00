// File: shopcast-core/src/repositories/postgres/stream.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use shopcast_common::error::Error;
use shopcast_common::models::{Stream, StreamStatus};
use shopcast_common::traits::repository_traits::StreamRepository;
use super::{enum_col, status_codes};

const STREAM_COLUMNS: &str = r#"
    stream_id, shop_id, title, status, full_date, extension_count, platform, url,
    report_count, is_visible, rating, quota_origin, started_at, finished_at,
    cancel_reason, replaces_stream_id, reminder_sent_at, version, created_at, updated_at
"#;

pub struct PostgresStreamRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresStreamRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn insert_row(&self, s: &Stream, on_conflict: &str) -> Result<u64, Error> {
        let sql = format!(
            r#"
            INSERT INTO streams (
                stream_id, shop_id, title, status, full_date, extension_count, platform, url,
                report_count, is_visible, rating, quota_origin, started_at, finished_at,
                cancel_reason, replaces_stream_id, reminder_sent_at, version, created_at, updated_at
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19,$20)
            {}
            "#,
            on_conflict
        );
        let result = sqlx::query(&sql)
            .bind(s.stream_id)
            .bind(s.shop_id)
            .bind(&s.title)
            .bind(s.status.as_str())
            .bind(s.full_date)
            .bind(s.extension_count)
            .bind(s.platform.as_str())
            .bind(&s.url)
            .bind(s.report_count)
            .bind(s.is_visible)
            .bind(s.rating)
            .bind(s.quota_origin.as_str())
            .bind(s.started_at)
            .bind(s.finished_at)
            .bind(&s.cancel_reason)
            .bind(s.replaces_stream_id)
            .bind(s.reminder_sent_at)
            .bind(s.version)
            .bind(s.created_at)
            .bind(s.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn stream_from_row(r: &PgRow) -> Result<Stream, Error> {
    Ok(Stream {
        stream_id: r.try_get("stream_id")?,
        shop_id: r.try_get("shop_id")?,
        title: r.try_get("title")?,
        status: enum_col(r, "status")?,
        full_date: r.try_get("full_date")?,
        extension_count: r.try_get("extension_count")?,
        platform: enum_col(r, "platform")?,
        url: r.try_get("url")?,
        report_count: r.try_get("report_count")?,
        is_visible: r.try_get("is_visible")?,
        rating: r.try_get("rating")?,
        quota_origin: enum_col(r, "quota_origin")?,
        started_at: r.try_get("started_at")?,
        finished_at: r.try_get("finished_at")?,
        cancel_reason: r.try_get("cancel_reason")?,
        replaces_stream_id: r.try_get("replaces_stream_id")?,
        reminder_sent_at: r.try_get("reminder_sent_at")?,
        version: r.try_get("version")?,
        created_at: r.try_get("created_at")?,
        updated_at: r.try_get("updated_at")?,
    })
}

#[async_trait]
impl StreamRepository for PostgresStreamRepository {
    async fn insert_stream(&self, s: &Stream) -> Result<(), Error> {
        self.insert_row(s, "").await?;
        Ok(())
    }

    async fn insert_replacement(&self, s: &Stream) -> Result<bool, Error> {
        if s.replaces_stream_id.is_none() {
            return Err(Error::Parse(format!("stream {} replaces nothing", s.stream_id)));
        }
        let written = self
            .insert_row(s, "ON CONFLICT (replaces_stream_id) WHERE replaces_stream_id IS NOT NULL DO NOTHING")
            .await?;
        Ok(written == 1)
    }

    async fn get_stream(&self, stream_id: Uuid) -> Result<Option<Stream>, Error> {
        let sql = format!("SELECT {} FROM streams WHERE stream_id = $1", STREAM_COLUMNS);
        let row_opt = sqlx::query(&sql)
            .bind(stream_id)
            .fetch_optional(&self.pool)
            .await?;
        row_opt.as_ref().map(stream_from_row).transpose()
    }

    async fn update_stream(&self, s: &Stream) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            UPDATE streams
            SET title = $3,
                status = $4,
                full_date = $5,
                extension_count = $6,
                platform = $7,
                url = $8,
                report_count = $9,
                is_visible = $10,
                rating = $11,
                started_at = $12,
                finished_at = $13,
                cancel_reason = $14,
                reminder_sent_at = $15,
                updated_at = $16,
                version = version + 1
            WHERE stream_id = $1 AND version = $2
            "#,
        )
            .bind(s.stream_id)
            .bind(s.version)
            .bind(&s.title)
            .bind(s.status.as_str())
            .bind(s.full_date)
            .bind(s.extension_count)
            .bind(s.platform.as_str())
            .bind(&s.url)
            .bind(s.report_count)
            .bind(s.is_visible)
            .bind(s.rating)
            .bind(s.started_at)
            .bind(s.finished_at)
            .bind(&s.cancel_reason)
            .bind(s.reminder_sent_at)
            .bind(s.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn list_streams_for_shop(&self, shop_id: Uuid) -> Result<Vec<Stream>, Error> {
        let sql = format!("SELECT {} FROM streams WHERE shop_id = $1 ORDER BY full_date", STREAM_COLUMNS);
        let rows = sqlx::query(&sql)
            .bind(shop_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(stream_from_row).collect()
    }

    async fn list_shop_streams_between(
        &self,
        shop_id: Uuid,
        statuses: &[StreamStatus],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Stream>, Error> {
        let sql = format!(
            r#"
            SELECT {} FROM streams
            WHERE shop_id = $1
              AND status = ANY($2)
              AND full_date >= $3
              AND full_date < $4
            ORDER BY full_date
            "#,
            STREAM_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(shop_id)
            .bind(status_codes(statuses, StreamStatus::as_str))
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(stream_from_row).collect()
    }

    async fn list_streams_by_status(
        &self,
        statuses: &[StreamStatus],
        scheduled_from: Option<DateTime<Utc>>,
        scheduled_to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Stream>, Error> {
        let sql = format!(
            r#"
            SELECT {} FROM streams
            WHERE status = ANY($1)
              AND ($2::timestamptz IS NULL OR full_date >= $2)
              AND ($3::timestamptz IS NULL OR full_date <= $3)
            ORDER BY full_date
            "#,
            STREAM_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(status_codes(statuses, StreamStatus::as_str))
            .bind(scheduled_from)
            .bind(scheduled_to)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(stream_from_row).collect()
    }

    async fn increment_report_count(&self, stream_id: Uuid) -> Result<Option<i32>, Error> {
        let row_opt = sqlx::query(
            r#"
            UPDATE streams
            SET report_count = report_count + 1,
                version = version + 1,
                updated_at = $2
            WHERE stream_id = $1
            RETURNING report_count
            "#,
        )
            .bind(stream_id)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;
        match row_opt {
            Some(r) => Ok(Some(r.try_get("report_count")?)),
            None => Ok(None),
        }
    }
}
