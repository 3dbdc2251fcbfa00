// File: src/services/mod.rs

pub mod quota_wallet;
pub mod shop_service;
pub mod stream_scheduler;
pub mod stream_lifecycle;
pub mod sanction_engine;
pub mod reel_publisher;
pub mod purchase_ledger;
pub mod notification_service;

pub use quota_wallet::QuotaWalletService;
pub use shop_service::ShopService;
pub use stream_scheduler::StreamScheduler;
pub use stream_lifecycle::StreamLifecycleEngine;
pub use sanction_engine::SanctionEngine;
pub use reel_publisher::ReelPublisher;
pub use purchase_ledger::PurchaseLedger;
pub use notification_service::{LoggingNotificationSink, NotificationService};
