// File: shopcast-common/src/models/reel.rs

use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;
use crate::models::quota::QuotaOrigin;
use crate::models::shop::SocialPlatform;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReelStatus {
    Active,
    Expired,
    Hidden,
    /// Media still being handled by the upload collaborator.
    Processing,
}

impl ReelStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReelStatus::Active => "ACTIVE",
            ReelStatus::Expired => "EXPIRED",
            ReelStatus::Hidden => "HIDDEN",
            ReelStatus::Processing => "PROCESSING",
        }
    }
}

impl fmt::Display for ReelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReelStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(ReelStatus::Active),
            "EXPIRED" => Ok(ReelStatus::Expired),
            "HIDDEN" => Ok(ReelStatus::Hidden),
            "PROCESSING" => Ok(ReelStatus::Processing),
            _ => Err(format!("Unknown reel status: {}", s)),
        }
    }
}

/// A 24-hour promotional post.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Reel {
    pub reel_id: Uuid,
    pub shop_id: Uuid,
    pub platform: SocialPlatform,
    pub content: String,
    pub status: ReelStatus,
    /// PLAN or EXTRA, never COMPLIMENTARY.
    pub origin: QuotaOrigin,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl Reel {
    pub fn new(
        shop_id: Uuid,
        platform: SocialPlatform,
        content: &str,
        origin: QuotaOrigin,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            reel_id: Uuid::new_v4(),
            shop_id,
            platform,
            content: content.to_string(),
            status: ReelStatus::Active,
            origin,
            created_at: now,
            expires_at: now + ttl,
            version: 0,
            updated_at: now,
        }
    }

    /// Status as seen at `now`, with expiry computed lazily for reels the
    /// sweeper has not reached yet.
    pub fn effective_status(&self, now: DateTime<Utc>) -> ReelStatus {
        if self.status == ReelStatus::Active && now > self.expires_at {
            ReelStatus::Expired
        } else {
            self.status
        }
    }

    pub fn hide(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        match self.effective_status(now) {
            ReelStatus::Active | ReelStatus::Processing => {
                self.status = ReelStatus::Hidden;
                self.updated_at = now;
                Ok(())
            }
            other => Err(Error::invalid_transition(other, "hide")),
        }
    }

    pub fn reactivate(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        if self.status != ReelStatus::Hidden || now > self.expires_at {
            return Err(Error::invalid_transition(self.effective_status(now), "reactivate"));
        }
        self.status = ReelStatus::Active;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reel(now: DateTime<Utc>) -> Reel {
        Reel::new(
            Uuid::new_v4(),
            SocialPlatform::Instagram,
            "promo",
            QuotaOrigin::Plan,
            now,
            Duration::hours(24),
        )
    }

    #[test]
    fn expiry_is_lazy() {
        let t = Utc::now();
        let r = reel(t);
        assert_eq!(r.effective_status(t + Duration::hours(23)), ReelStatus::Active);
        assert_eq!(r.effective_status(t + Duration::hours(25)), ReelStatus::Expired);
    }

    #[test]
    fn hidden_reel_never_looks_expired() {
        let t = Utc::now();
        let mut r = reel(t);
        r.hide(t).unwrap();
        assert_eq!(r.effective_status(t + Duration::hours(30)), ReelStatus::Hidden);
    }

    #[test]
    fn reactivation_only_before_expiry() {
        let t = Utc::now();
        let mut r = reel(t);
        r.hide(t).unwrap();
        assert!(r.clone().reactivate(t + Duration::hours(25)).is_err());
        r.reactivate(t + Duration::hours(1)).unwrap();
        assert_eq!(r.status, ReelStatus::Active);
    }
}
