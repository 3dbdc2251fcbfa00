// File: shopcast-common/src/models/shop.rs

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription plan. Determines the base stream/reel allotments.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Plan {
    Estandar,
    AltaVisibilidad,
    MaximaVisibilidad,
}

impl Plan {
    /// Base weekly live-stream allotment.
    pub fn weekly_live_base(self) -> i32 {
        match self {
            Plan::Estandar => 0,
            Plan::AltaVisibilidad => 1,
            Plan::MaximaVisibilidad => 3,
        }
    }

    /// Base daily reel allotment.
    pub fn daily_reel_base(self) -> i32 {
        match self {
            Plan::Estandar => 1,
            Plan::AltaVisibilidad => 3,
            Plan::MaximaVisibilidad => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Plan::Estandar => "ESTANDAR",
            Plan::AltaVisibilidad => "ALTA_VISIBILIDAD",
            Plan::MaximaVisibilidad => "MAXIMA_VISIBILIDAD",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Plan::Estandar => "Estandar",
            Plan::AltaVisibilidad => "Alta Visibilidad",
            Plan::MaximaVisibilidad => "Maxima Visibilidad",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Plan {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace(' ', "_");
        match normalized.as_str() {
            "ESTANDAR" => Ok(Plan::Estandar),
            "ALTA_VISIBILIDAD" => Ok(Plan::AltaVisibilidad),
            "MAXIMA_VISIBILIDAD" => Ok(Plan::MaximaVisibilidad),
            _ => Err(format!("Unknown plan: {}", s)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShopStatus {
    PendingVerification,
    Active,
    AgendaSuspended,
    Hidden,
    Banned,
}

impl ShopStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ShopStatus::PendingVerification => "PENDING_VERIFICATION",
            ShopStatus::Active => "ACTIVE",
            ShopStatus::AgendaSuspended => "AGENDA_SUSPENDED",
            ShopStatus::Hidden => "HIDDEN",
            ShopStatus::Banned => "BANNED",
        }
    }
}

impl fmt::Display for ShopStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ShopStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING_VERIFICATION" => Ok(ShopStatus::PendingVerification),
            "ACTIVE" => Ok(ShopStatus::Active),
            "AGENDA_SUSPENDED" => Ok(ShopStatus::AgendaSuspended),
            "HIDDEN" => Ok(ShopStatus::Hidden),
            "BANNED" => Ok(ShopStatus::Banned),
            _ => Err(format!("Unknown shop status: {}", s)),
        }
    }
}

/// Platforms a shop can broadcast or post on.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SocialPlatform {
    Instagram,
    Tiktok,
    Youtube,
    Facebook,
    Twitch,
}

impl SocialPlatform {
    pub fn as_str(self) -> &'static str {
        match self {
            SocialPlatform::Instagram => "instagram",
            SocialPlatform::Tiktok => "tiktok",
            SocialPlatform::Youtube => "youtube",
            SocialPlatform::Facebook => "facebook",
            SocialPlatform::Twitch => "twitch",
        }
    }

    /// Public live URL for a handle on this platform.
    pub fn live_url(self, handle: &str) -> String {
        let handle = handle.trim().trim_start_matches('@');
        match self {
            SocialPlatform::Instagram => format!("https://www.instagram.com/{}/live", handle),
            SocialPlatform::Tiktok => format!("https://www.tiktok.com/@{}/live", handle),
            SocialPlatform::Youtube => format!("https://www.youtube.com/@{}/live", handle),
            SocialPlatform::Facebook => format!("https://www.facebook.com/{}/live", handle),
            SocialPlatform::Twitch => format!("https://www.twitch.tv/{}", handle),
        }
    }
}

impl fmt::Display for SocialPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SocialPlatform {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "instagram" => Ok(SocialPlatform::Instagram),
            "tiktok" => Ok(SocialPlatform::Tiktok),
            "youtube" => Ok(SocialPlatform::Youtube),
            "facebook" => Ok(SocialPlatform::Facebook),
            "twitch" => Ok(SocialPlatform::Twitch),
            _ => Err(format!("Unknown platform: {}", s)),
        }
    }
}

/// Flat quota columns that predate the wallet. Read-only: they only seed
/// the wallet projection for shops that never had a wallet row.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct LegacyQuota {
    pub live_base: Option<i32>,
    pub live_extra: Option<i32>,
    pub reel_base: Option<i32>,
    pub reel_extra: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Shop {
    pub shop_id: Uuid,
    pub name: String,
    pub plan: Plan,
    pub status: ShopStatus,
    /// Explicit admin flag; see `is_penalized` for the derived value.
    pub penalized_flag: bool,
    pub agenda_suspended_until: Option<DateTime<Utc>>,
    pub owner_accepted_at: Option<DateTime<Utc>>,
    pub social_handles: HashMap<SocialPlatform, String>,
    /// IANA timezone name used for calendar-day and ISO-week keys.
    pub timezone: Option<String>,
    pub legacy_quota: LegacyQuota,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Shop {
    pub fn new(name: &str, plan: Plan, now: DateTime<Utc>) -> Self {
        Self {
            shop_id: Uuid::new_v4(),
            name: name.to_string(),
            plan,
            status: ShopStatus::PendingVerification,
            penalized_flag: false,
            agenda_suspended_until: None,
            owner_accepted_at: None,
            social_handles: HashMap::new(),
            timezone: None,
            legacy_quota: LegacyQuota::default(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Explicit flag OR any active penalty OR agenda suspension.
    pub fn is_penalized(&self, active_penalties: usize) -> bool {
        self.penalized_flag || active_penalties > 0 || self.status == ShopStatus::AgendaSuspended
    }

    pub fn handle_for(&self, platform: SocialPlatform) -> Option<&str> {
        self.social_handles
            .get(&platform)
            .map(|h| h.trim())
            .filter(|h| !h.is_empty())
    }

    /// Reel actions stay open while only the stream agenda is frozen.
    pub fn can_publish_reels(&self) -> bool {
        matches!(self.status, ShopStatus::Active | ShopStatus::AgendaSuspended)
    }
}

/// Input of `createShop`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewShop {
    pub name: String,
    pub plan: Plan,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub social_handles: HashMap<SocialPlatform, String>,
    #[serde(default)]
    pub legacy_quota: LegacyQuota,
}

/// An immutable sanction record. Only `active`/`lifted_at` change, and only
/// through an explicit lift.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Penalty {
    pub penalty_id: Uuid,
    pub shop_id: Uuid,
    /// The stream occurrence this penalty was issued for, if any.
    pub stream_id: Option<Uuid>,
    pub reason: String,
    pub date: DateTime<Utc>,
    pub active: bool,
    pub lifted_at: Option<DateTime<Utc>>,
}

impl Penalty {
    pub fn new(shop_id: Uuid, stream_id: Option<Uuid>, reason: &str, date: DateTime<Utc>) -> Self {
        Self {
            penalty_id: Uuid::new_v4(),
            shop_id,
            stream_id,
            reason: reason.to_string(),
            date,
            active: true,
            lifted_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_allotments_follow_tiers() {
        assert_eq!(Plan::Estandar.weekly_live_base(), 0);
        assert_eq!(Plan::AltaVisibilidad.weekly_live_base(), 1);
        assert_eq!(Plan::MaximaVisibilidad.weekly_live_base(), 3);
        assert_eq!(Plan::Estandar.daily_reel_base(), 1);
        assert_eq!(Plan::AltaVisibilidad.daily_reel_base(), 3);
        assert_eq!(Plan::MaximaVisibilidad.daily_reel_base(), 5);
    }

    #[test]
    fn plan_parses_labels_and_codes() {
        assert_eq!("Alta Visibilidad".parse::<Plan>().unwrap(), Plan::AltaVisibilidad);
        assert_eq!("MAXIMA_VISIBILIDAD".parse::<Plan>().unwrap(), Plan::MaximaVisibilidad);
        assert!("premium".parse::<Plan>().is_err());
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!("active".parse::<ShopStatus>().is_err());
        assert!("".parse::<ShopStatus>().is_err());
    }

    #[test]
    fn new_shop_is_stamped_with_the_given_instant() {
        let at = Utc::now() - chrono::Duration::hours(5);
        let shop = Shop::new("tienda", Plan::AltaVisibilidad, at);
        assert_eq!(shop.created_at, at);
        assert_eq!(shop.updated_at, at);
        assert_eq!(shop.status, ShopStatus::PendingVerification);
    }

    #[test]
    fn penalized_is_derived() {
        let mut shop = Shop::new("tienda", Plan::Estandar, Utc::now());
        shop.status = ShopStatus::Active;
        assert!(!shop.is_penalized(0));
        assert!(shop.is_penalized(1));
        shop.status = ShopStatus::AgendaSuspended;
        assert!(shop.is_penalized(0));
        shop.status = ShopStatus::Active;
        shop.penalized_flag = true;
        assert!(shop.is_penalized(0));
    }

    #[test]
    fn live_url_strips_at_sign() {
        assert_eq!(
            SocialPlatform::Instagram.live_url("@mitienda"),
            "https://www.instagram.com/mitienda/live"
        );
        assert_eq!(
            SocialPlatform::Tiktok.live_url("mitienda"),
            "https://www.tiktok.com/@mitienda/live"
        );
    }
}
