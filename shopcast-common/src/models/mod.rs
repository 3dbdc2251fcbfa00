// File: shopcast-common/src/models/mod.rs
pub mod shop;
pub mod quota;
pub mod stream;
pub mod reel;
pub mod purchase;
pub mod operations;

pub use shop::{LegacyQuota, NewShop, Penalty, Plan, Shop, ShopStatus, SocialPlatform};
pub use quota::{AvailableQuota, QuotaDebit, QuotaKind, QuotaOrigin, QuotaWalletSnapshot};
pub use stream::{ScheduleStreamRequest, Stream, StreamEvent, StreamPatch, StreamStatus};
pub use reel::{Reel, ReelStatus};
pub use purchase::{
    PaymentOutcome, PaymentPreference, PreferenceRequest, PurchaseOrder, PurchaseRequest,
    PurchaseStatus, PurchaseType,
};
pub use operations::{
    LifecycleSummary, Notification, NotificationKind, NotificationSummary, QuotaResetSummary,
    RecordError, ReelExpirySummary, SanctionSummary, SweeperKind, SweeperStatus, SystemStatus,
};
