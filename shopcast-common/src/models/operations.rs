// File: shopcast-common/src/models/operations.rs
//
// Summaries returned by the batch entry points and the system status snapshot.

use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A per-record failure collected by a sweeper instead of aborting the tick.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RecordError {
    pub record_id: Uuid,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct LifecycleSummary {
    pub started: u32,
    pub finished: u32,
    pub errors: Vec<RecordError>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct SanctionSummary {
    pub candidates: u32,
    pub sanctioned: u32,
    pub reprogrammed: u32,
    pub suspended: u32,
    /// Agenda suspensions whose end date passed during this tick.
    pub released: u32,
    pub errors: Vec<RecordError>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct NotificationSummary {
    pub candidates: u32,
    pub sent: u32,
    pub errors: Vec<RecordError>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ReelExpirySummary {
    pub expired: u32,
    pub errors: Vec<RecordError>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct QuotaResetSummary {
    pub wallets: u32,
    pub weekly_resets: u32,
    pub daily_resets: u32,
    pub errors: Vec<RecordError>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SweeperKind {
    StreamsLifecycle,
    Sanctions,
    Notifications,
    ReelExpiry,
    QuotaReset,
}

impl SweeperKind {
    pub const ALL: [SweeperKind; 5] = [
        SweeperKind::StreamsLifecycle,
        SweeperKind::Sanctions,
        SweeperKind::Notifications,
        SweeperKind::ReelExpiry,
        SweeperKind::QuotaReset,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SweeperKind::StreamsLifecycle => "streams_lifecycle",
            SweeperKind::Sanctions => "sanctions",
            SweeperKind::Notifications => "notifications",
            SweeperKind::ReelExpiry => "reel_expiry",
            SweeperKind::QuotaReset => "quota_reset",
        }
    }
}

impl fmt::Display for SweeperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SweeperKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SweeperKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("Unknown sweeper: {}", s))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SweeperStatus {
    pub kind: SweeperKind,
    pub enabled: bool,
    pub interval_secs: u64,
    pub runs: u64,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_summary: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SystemStatus {
    pub generated_at: DateTime<Utc>,
    pub sweepers: Vec<SweeperStatus>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    StreamStartingSoon,
}

/// Message handed to the notification collaborator.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub shop_id: Uuid,
    pub stream_id: Uuid,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub url: String,
}
