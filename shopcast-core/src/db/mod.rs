// shopcast-core/src/db/mod.rs

use std::time::Duration;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use tracing::{info, warn};
use crate::Error;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Postgres pool shared by every repository.
#[derive(Clone)]
pub struct Database {
    pool: Pool<Postgres>,
}

impl Database {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(database_url)
            .await?;
        info!("Connected to Postgres (max_connections={})", max_connections);
        Ok(Self { pool })
    }

    /// Connects, applies pending migrations and checks the schema answers.
    pub async fn connect_and_migrate(database_url: &str, max_connections: u32) -> Result<Self, Error> {
        let db = Self::new(database_url, max_connections).await?;
        db.migrate().await?;
        db.ping().await?;
        Ok(db)
    }

    pub async fn migrate(&self) -> Result<(), Error> {
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Shopcast schema is up to date");
        Ok(())
    }

    /// Cheap readiness check against the shops table.
    pub async fn ping(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1 FROM shops LIMIT 1")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn close(self) {
        if self.pool.is_closed() {
            warn!("Database pool already closed");
            return;
        }
        self.pool.close().await;
        info!("Database pool closed");
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }

    pub fn from_pool(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}
