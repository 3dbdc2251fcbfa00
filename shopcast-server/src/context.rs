//! shopcast-server/src/context.rs
//!
//! Builds the `CoreApi` the HTTP layer and the sweepers share.

use std::sync::Arc;
use tracing::info;

use shopcast_common::traits::collaborator_traits::{NotificationSink, PaymentGateway};
use shopcast_core::eventbus::EventBus;
use shopcast_core::payments::{HttpPaymentGateway, ManualPaymentGateway};
use shopcast_core::services::LoggingNotificationSink;
use shopcast_core::utils::time::SystemClock;
use shopcast_core::{CoreApi, Database, EngineConfig, Error, Repositories};

use crate::Args;

pub struct ServerContext {
    pub api: Arc<CoreApi>,
    /// `None` when running in memory.
    pub db: Option<Database>,
}

impl ServerContext {
    pub async fn new(args: &Args) -> Result<Self, Error> {
        let config = EngineConfig::from_env()?;

        let (repos, db) = if args.in_memory {
            info!("Using in-memory repositories; data is lost on exit.");
            (Repositories::in_memory(), None)
        } else {
            let db = Database::connect_and_migrate(&args.db_url, args.db_max_connections).await?;
            (Repositories::postgres(&db), Some(db))
        };

        let gateway: Arc<dyn PaymentGateway + Send + Sync> =
            match (&config.payment_api_url, &config.payment_access_token) {
                (Some(url), Some(token)) => {
                    info!("Payment provider at {}", url);
                    Arc::new(HttpPaymentGateway::new(url, token))
                }
                _ => {
                    info!("No payment provider configured; purchases are approved manually.");
                    Arc::new(ManualPaymentGateway)
                }
            };
        let sink: Arc<dyn NotificationSink + Send + Sync> = Arc::new(LoggingNotificationSink);

        let api = CoreApi::new(
            repos,
            gateway,
            sink,
            config,
            Arc::new(SystemClock),
            EventBus::new(),
        );

        Ok(Self { api: Arc::new(api), db })
    }
}
