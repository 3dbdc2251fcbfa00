// File: shopcast-common/src/models/quota.rs

use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which bucket a unit of capacity was taken from.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuotaOrigin {
    Plan,
    Extra,
    /// Admin-created stream that consumed nothing.
    Complimentary,
}

impl QuotaOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            QuotaOrigin::Plan => "PLAN",
            QuotaOrigin::Extra => "EXTRA",
            QuotaOrigin::Complimentary => "COMPLIMENTARY",
        }
    }
}

impl fmt::Display for QuotaOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for QuotaOrigin {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PLAN" => Ok(QuotaOrigin::Plan),
            "EXTRA" => Ok(QuotaOrigin::Extra),
            "COMPLIMENTARY" => Ok(QuotaOrigin::Complimentary),
            _ => Err(format!("Unknown quota origin: {}", s)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum QuotaKind {
    Live,
    Reel,
}

impl fmt::Display for QuotaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuotaKind::Live => write!(f, "live"),
            QuotaKind::Reel => write!(f, "reel"),
        }
    }
}

/// Per-shop ledger row. All counters are kept >= 0 by every mutation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct QuotaWalletSnapshot {
    pub shop_id: Uuid,
    pub weekly_live_base_limit: i32,
    pub weekly_live_used: i32,
    pub live_extra_balance: i32,
    pub reel_daily_limit: i32,
    pub reel_daily_used: i32,
    pub reel_extra_balance: i32,
    /// ISO week the live usage counter belongs to, e.g. `2026-W42`.
    pub live_week_key: String,
    /// Shop-local day the reel usage counter belongs to, e.g. `2026-10-19`.
    pub reel_day_key: String,
    pub updated_at: DateTime<Utc>,
}

impl QuotaWalletSnapshot {
    pub fn available_live(&self) -> i32 {
        (self.weekly_live_base_limit - self.weekly_live_used).max(0) + self.live_extra_balance.max(0)
    }

    pub fn available_reel(&self) -> i32 {
        (self.reel_daily_limit - self.reel_daily_used).max(0) + self.reel_extra_balance.max(0)
    }

    pub fn available(&self, kind: QuotaKind) -> i32 {
        match kind {
            QuotaKind::Live => self.available_live(),
            QuotaKind::Reel => self.available_reel(),
        }
    }

    /// Takes `n` units, base first then extra. Returns the units drawn from
    /// `(base, extra)`, or `None` without touching anything if short.
    pub fn try_debit(&mut self, kind: QuotaKind, n: i32) -> Option<(i32, i32)> {
        if n <= 0 || self.available(kind) < n {
            return None;
        }
        let (limit, used, extra) = match kind {
            QuotaKind::Live => (
                self.weekly_live_base_limit,
                &mut self.weekly_live_used,
                &mut self.live_extra_balance,
            ),
            QuotaKind::Reel => (
                self.reel_daily_limit,
                &mut self.reel_daily_used,
                &mut self.reel_extra_balance,
            ),
        };
        let from_base = n.min((limit - *used).max(0));
        let from_extra = n - from_base;
        *used += from_base;
        *extra -= from_extra;
        Some((from_base, from_extra))
    }

    pub fn credit_extra(&mut self, kind: QuotaKind, n: i32) {
        let n = n.max(0);
        match kind {
            QuotaKind::Live => self.live_extra_balance += n,
            QuotaKind::Reel => self.reel_extra_balance += n,
        }
    }
}

/// Result of a successful debit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaDebit {
    pub from_base: i32,
    pub from_extra: i32,
    pub wallet: QuotaWalletSnapshot,
}

impl QuotaDebit {
    /// Origin recorded on the consuming record; a split debit counts as base.
    pub fn origin(&self) -> QuotaOrigin {
        if self.from_base > 0 {
            QuotaOrigin::Plan
        } else {
            QuotaOrigin::Extra
        }
    }
}

/// The single authoritative "available" view handed to every consumer.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AvailableQuota {
    pub shop_id: Uuid,
    pub live: i32,
    pub reel: i32,
    /// False when the numbers come from the legacy projection.
    pub from_wallet: bool,
    pub wallet: QuotaWalletSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet(base: i32, used: i32, extra: i32) -> QuotaWalletSnapshot {
        QuotaWalletSnapshot {
            shop_id: Uuid::new_v4(),
            weekly_live_base_limit: base,
            weekly_live_used: used,
            live_extra_balance: extra,
            reel_daily_limit: 1,
            reel_daily_used: 0,
            reel_extra_balance: 0,
            live_week_key: "2026-W42".into(),
            reel_day_key: "2026-10-19".into(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn available_never_negative() {
        let w = wallet(1, 4, 0);
        assert_eq!(w.available_live(), 0);
    }

    #[test]
    fn debit_spills_into_extra() {
        let mut w = wallet(1, 0, 2);
        assert_eq!(w.try_debit(QuotaKind::Live, 2), Some((1, 1)));
        assert_eq!(w.weekly_live_used, 1);
        assert_eq!(w.live_extra_balance, 1);
        assert_eq!(w.available_live(), 1);
    }

    #[test]
    fn short_debit_leaves_wallet_untouched() {
        let mut w = wallet(0, 0, 0);
        let before = w.clone();
        assert_eq!(w.try_debit(QuotaKind::Live, 1), None);
        assert_eq!(w, before);
    }
}
