// ================================================================
// File: shopcast-common/src/error.rs
// ================================================================

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found error: {0}")]
    NotFound(String),

    // Infrastructure variants:
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Timeout error: {0}")]
    Timeout(#[from] tokio::time::error::Elapsed),

    /// A versioned record changed underneath us.
    #[error("Concurrent modification: {0}")]
    Conflict(String),

    #[error("Event bus error: {0}")]
    EventBus(String),

    // Domain taxonomy:
    #[error("Shop {shop_id} cannot schedule: {reason}")]
    ShopNotSchedulable { shop_id: Uuid, reason: String },

    #[error("Insufficient quota for shop {shop_id}: requested {requested}, available {available}")]
    InsufficientQuota { shop_id: Uuid, requested: i32, available: i32 },

    #[error("Shop already has a stream scheduled on {day}")]
    DuplicateDailySlot { day: String },

    #[error("Weekly stream cap of {cap} reached for week {week}")]
    WeeklyCapExceeded { week: String, cap: i64 },

    #[error("No social handle configured for platform {0}")]
    MissingSocialHandle(String),

    #[error("Stream {stream_id} already used its {max} extensions")]
    ExtensionLimitReached { stream_id: Uuid, max: i32 },

    #[error("Purchase {purchase_id} was already processed (status {status})")]
    AlreadyProcessed { purchase_id: Uuid, status: String },

    #[error("Invalid transition: cannot {event} from {from}")]
    InvalidTransition { from: String, event: String },

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Payment not initiated: {0}")]
    PaymentNotInitiated(String),

    #[error("Payment rejected: {0}")]
    PaymentRejected(String),
}

impl Error {
    /// Short machine-readable code, stable across message wording changes.
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "NotFound",
            Error::Database(_) => "Database",
            Error::Http(_) => "Http",
            Error::Json(_) => "Json",
            Error::Io(_) => "Io",
            Error::Parse(_) => "Parse",
            Error::Config(_) => "Config",
            Error::Migration(_) => "Migration",
            Error::Timeout(_) => "Timeout",
            Error::Conflict(_) => "Conflict",
            Error::EventBus(_) => "EventBus",
            Error::ShopNotSchedulable { .. } => "ShopNotSchedulable",
            Error::InsufficientQuota { .. } => "InsufficientQuota",
            Error::DuplicateDailySlot { .. } => "DuplicateDailySlot",
            Error::WeeklyCapExceeded { .. } => "WeeklyCapExceeded",
            Error::MissingSocialHandle(_) => "MissingSocialHandle",
            Error::ExtensionLimitReached { .. } => "ExtensionLimitReached",
            Error::AlreadyProcessed { .. } => "AlreadyProcessed",
            Error::InvalidTransition { .. } => "InvalidTransition",
            Error::InvalidSchedule(_) => "InvalidSchedule",
            Error::PaymentNotInitiated(_) => "PaymentNotInitiated",
            Error::PaymentRejected(_) => "PaymentRejected",
        }
    }

    /// True for validation failures the caller can fix and retry.
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            Error::ShopNotSchedulable { .. }
                | Error::InsufficientQuota { .. }
                | Error::DuplicateDailySlot { .. }
                | Error::WeeklyCapExceeded { .. }
                | Error::MissingSocialHandle(_)
                | Error::ExtensionLimitReached { .. }
                | Error::AlreadyProcessed { .. }
                | Error::InvalidTransition { .. }
                | Error::InvalidSchedule(_)
                | Error::PaymentNotInitiated(_)
                | Error::PaymentRejected(_)
        )
    }

    pub fn invalid_transition(from: impl ToString, event: impl ToString) -> Self {
        Error::InvalidTransition {
            from: from.to_string(),
            event: event.to_string(),
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Parse(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Parse(s.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Parse(e.to_string())
    }
}

impl From<chrono::format::ParseError> for Error {
    fn from(err: chrono::format::ParseError) -> Self {
        Error::Parse(err.to_string())
    }
}

impl From<uuid::Error> for Error {
    fn from(err: uuid::Error) -> Self {
        Error::Parse(err.to_string())
    }
}
