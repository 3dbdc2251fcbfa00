// File: shopcast-common/src/models/purchase.rs

use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::shop::Plan;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseType {
    LivePack,
    ReelPack,
    PlanUpgrade,
}

impl PurchaseType {
    pub fn as_str(self) -> &'static str {
        match self {
            PurchaseType::LivePack => "LIVE_PACK",
            PurchaseType::ReelPack => "REEL_PACK",
            PurchaseType::PlanUpgrade => "PLAN_UPGRADE",
        }
    }
}

impl fmt::Display for PurchaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PurchaseType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LIVE_PACK" => Ok(PurchaseType::LivePack),
            "REEL_PACK" => Ok(PurchaseType::ReelPack),
            "PLAN_UPGRADE" => Ok(PurchaseType::PlanUpgrade),
            _ => Err(format!("Unknown purchase type: {}", s)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseStatus {
    Pending,
    Approved,
    Rejected,
}

impl PurchaseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "PENDING",
            PurchaseStatus::Approved => "APPROVED",
            PurchaseStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PurchaseStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(PurchaseStatus::Pending),
            "APPROVED" => Ok(PurchaseStatus::Approved),
            "REJECTED" => Ok(PurchaseStatus::Rejected),
            _ => Err(format!("Unknown purchase status: {}", s)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PurchaseRequest {
    pub purchase_id: Uuid,
    pub shop_id: Uuid,
    pub purchase_type: PurchaseType,
    pub quantity: i32,
    /// Only for PLAN_UPGRADE.
    pub target_plan: Option<Plan>,
    pub amount_cents: i64,
    pub status: PurchaseStatus,
    /// Preference id handed out by the payment provider.
    pub external_reference: Option<String>,
    pub checkout_url: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    /// When the credit or plan change of an APPROVED purchase landed.
    pub applied_at: Option<DateTime<Utc>>,
}

/// What the caller asks the ledger to sell.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PurchaseOrder {
    pub shop_id: Uuid,
    pub purchase_type: PurchaseType,
    pub quantity: i32,
    pub target_plan: Option<Plan>,
}

/// Request handed to the payment collaborator.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PreferenceRequest {
    pub purchase_id: Uuid,
    pub shop_id: Uuid,
    pub title: String,
    pub quantity: i32,
    pub unit_price_cents: i64,
    pub notification_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PaymentPreference {
    pub preference_id: String,
    pub checkout_url: Option<String>,
}

/// Outcome reported by the payment provider's webhook.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentOutcome {
    Approved,
    Rejected,
}
