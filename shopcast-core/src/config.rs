// File: shopcast-core/src/config.rs
//
// Engine tunables. Defaults match the production rules; every field can be
// overridden with a `SHOPCAST_*` environment variable (a `.env` file is
// honoured through dotenv).

use std::env;
use std::str::FromStr;
use chrono::Duration;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::warn;

use shopcast_common::models::{Plan, PurchaseType, SweeperKind};
use crate::Error;

/// Unit prices, in cents, quoted to the payment provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceCatalog {
    pub live_pack_unit_cents: i64,
    pub reel_pack_unit_cents: i64,
    pub alta_visibilidad_cents: i64,
    pub maxima_visibilidad_cents: i64,
}

impl Default for PriceCatalog {
    fn default() -> Self {
        Self {
            live_pack_unit_cents: 250_000,
            reel_pack_unit_cents: 80_000,
            alta_visibilidad_cents: 1_500_000,
            maxima_visibilidad_cents: 3_000_000,
        }
    }
}

impl PriceCatalog {
    /// Unit price for a purchase. Plan upgrades are priced by target plan and
    /// there is nothing to sell for an upgrade to Estandar.
    pub fn unit_price(&self, purchase_type: PurchaseType, target_plan: Option<Plan>) -> Option<i64> {
        match purchase_type {
            PurchaseType::LivePack => Some(self.live_pack_unit_cents),
            PurchaseType::ReelPack => Some(self.reel_pack_unit_cents),
            PurchaseType::PlanUpgrade => match target_plan? {
                Plan::Estandar => None,
                Plan::AltaVisibilidad => Some(self.alta_visibilidad_cents),
                Plan::MaximaVisibilidad => Some(self.maxima_visibilidad_cents),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fallback IANA zone for shops without their own.
    pub timezone: String,

    pub weekly_stream_cap: i64,
    pub stream_base_minutes: i64,
    pub max_extensions: i32,

    pub report_threshold: i32,
    pub report_window_before_minutes: i64,
    pub report_window_after_minutes: i64,
    pub sanction_lookback_minutes: i64,
    pub missed_streams_for_suspension: i64,
    pub missed_rolling_days: i64,
    pub suspension_days: i64,
    pub auto_reprogram: bool,

    pub reel_ttl_hours: i64,
    pub reminder_lead_minutes: i64,

    pub lifecycle_interval_secs: u64,
    pub sanctions_interval_secs: u64,
    pub notifications_interval_secs: u64,
    pub reel_expiry_interval_secs: u64,
    pub quota_reset_interval_secs: u64,

    pub lifecycle_enabled: bool,
    pub sanctions_enabled: bool,
    pub notifications_enabled: bool,
    pub reel_expiry_enabled: bool,
    pub quota_reset_enabled: bool,

    pub prices: PriceCatalog,
    pub payment_api_url: Option<String>,
    pub payment_access_token: Option<String>,
    pub payment_notification_url: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timezone: "America/Argentina/Buenos_Aires".to_string(),
            weekly_stream_cap: 7,
            stream_base_minutes: 30,
            max_extensions: 3,
            report_threshold: 5,
            report_window_before_minutes: 5,
            report_window_after_minutes: 35,
            sanction_lookback_minutes: 180,
            missed_streams_for_suspension: 3,
            missed_rolling_days: 30,
            suspension_days: 7,
            auto_reprogram: true,
            reel_ttl_hours: 24,
            reminder_lead_minutes: 30,
            lifecycle_interval_secs: 60,
            sanctions_interval_secs: 300,
            notifications_interval_secs: 300,
            reel_expiry_interval_secs: 300,
            quota_reset_interval_secs: 600,
            lifecycle_enabled: true,
            sanctions_enabled: true,
            notifications_enabled: true,
            reel_expiry_enabled: true,
            quota_reset_enabled: true,
            prices: PriceCatalog::default(),
            payment_api_url: None,
            payment_access_token: None,
            payment_notification_url: None,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, Error> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| Error::Config(format!("{} has an invalid value '{}'", key, raw))),
        Err(_) => Ok(default),
    }
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl EngineConfig {
    /// Defaults overlaid with `SHOPCAST_*` variables.
    pub fn from_env() -> Result<Self, Error> {
        if let Err(e) = dotenv::dotenv() {
            // A missing .env is normal outside development.
            tracing::debug!("No .env loaded: {}", e);
        }
        let d = Self::default();
        let cfg = Self {
            timezone: env::var("SHOPCAST_TIMEZONE").unwrap_or(d.timezone),
            weekly_stream_cap: env_or("SHOPCAST_WEEKLY_STREAM_CAP", d.weekly_stream_cap)?,
            stream_base_minutes: env_or("SHOPCAST_STREAM_BASE_MINUTES", d.stream_base_minutes)?,
            max_extensions: env_or("SHOPCAST_MAX_EXTENSIONS", d.max_extensions)?,
            report_threshold: env_or("SHOPCAST_REPORT_THRESHOLD", d.report_threshold)?,
            report_window_before_minutes: env_or("SHOPCAST_REPORT_WINDOW_BEFORE_MINUTES", d.report_window_before_minutes)?,
            report_window_after_minutes: env_or("SHOPCAST_REPORT_WINDOW_AFTER_MINUTES", d.report_window_after_minutes)?,
            sanction_lookback_minutes: env_or("SHOPCAST_SANCTION_LOOKBACK_MINUTES", d.sanction_lookback_minutes)?,
            missed_streams_for_suspension: env_or("SHOPCAST_MISSED_STREAMS_FOR_SUSPENSION", d.missed_streams_for_suspension)?,
            missed_rolling_days: env_or("SHOPCAST_MISSED_ROLLING_DAYS", d.missed_rolling_days)?,
            suspension_days: env_or("SHOPCAST_SUSPENSION_DAYS", d.suspension_days)?,
            auto_reprogram: env_or("SHOPCAST_AUTO_REPROGRAM", d.auto_reprogram)?,
            reel_ttl_hours: env_or("SHOPCAST_REEL_TTL_HOURS", d.reel_ttl_hours)?,
            reminder_lead_minutes: env_or("SHOPCAST_REMINDER_LEAD_MINUTES", d.reminder_lead_minutes)?,
            lifecycle_interval_secs: env_or("SHOPCAST_LIFECYCLE_INTERVAL_SECS", d.lifecycle_interval_secs)?,
            sanctions_interval_secs: env_or("SHOPCAST_SANCTIONS_INTERVAL_SECS", d.sanctions_interval_secs)?,
            notifications_interval_secs: env_or("SHOPCAST_NOTIFICATIONS_INTERVAL_SECS", d.notifications_interval_secs)?,
            reel_expiry_interval_secs: env_or("SHOPCAST_REEL_EXPIRY_INTERVAL_SECS", d.reel_expiry_interval_secs)?,
            quota_reset_interval_secs: env_or("SHOPCAST_QUOTA_RESET_INTERVAL_SECS", d.quota_reset_interval_secs)?,
            lifecycle_enabled: env_or("SHOPCAST_LIFECYCLE_ENABLED", d.lifecycle_enabled)?,
            sanctions_enabled: env_or("SHOPCAST_SANCTIONS_ENABLED", d.sanctions_enabled)?,
            notifications_enabled: env_or("SHOPCAST_NOTIFICATIONS_ENABLED", d.notifications_enabled)?,
            reel_expiry_enabled: env_or("SHOPCAST_REEL_EXPIRY_ENABLED", d.reel_expiry_enabled)?,
            quota_reset_enabled: env_or("SHOPCAST_QUOTA_RESET_ENABLED", d.quota_reset_enabled)?,
            prices: PriceCatalog {
                live_pack_unit_cents: env_or("SHOPCAST_PRICE_LIVE_PACK_CENTS", d.prices.live_pack_unit_cents)?,
                reel_pack_unit_cents: env_or("SHOPCAST_PRICE_REEL_PACK_CENTS", d.prices.reel_pack_unit_cents)?,
                alta_visibilidad_cents: env_or("SHOPCAST_PRICE_ALTA_VISIBILIDAD_CENTS", d.prices.alta_visibilidad_cents)?,
                maxima_visibilidad_cents: env_or("SHOPCAST_PRICE_MAXIMA_VISIBILIDAD_CENTS", d.prices.maxima_visibilidad_cents)?,
            },
            payment_api_url: env_opt("SHOPCAST_PAYMENT_API_URL"),
            payment_access_token: env_opt("SHOPCAST_PAYMENT_ACCESS_TOKEN"),
            payment_notification_url: env_opt("SHOPCAST_PAYMENT_NOTIFICATION_URL"),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.default_tz()?;
        if self.weekly_stream_cap < 1 {
            return Err(Error::Config("weekly_stream_cap must be at least 1".into()));
        }
        if self.stream_base_minutes < 1 || self.reel_ttl_hours < 1 {
            return Err(Error::Config("durations must be positive".into()));
        }
        if self.max_extensions < 0 || self.report_threshold < 1 {
            return Err(Error::Config("max_extensions >= 0 and report_threshold >= 1 required".into()));
        }
        if self.missed_streams_for_suspension < 1 {
            return Err(Error::Config("missed_streams_for_suspension must be at least 1".into()));
        }
        Ok(())
    }

    pub fn default_tz(&self) -> Result<Tz, Error> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| Error::Config(format!("invalid timezone '{}': {}", self.timezone, e)))
    }

    /// Resolves a shop's zone, falling back to the platform default.
    pub fn tz_for(&self, shop_timezone: Option<&str>) -> Tz {
        if let Some(name) = shop_timezone {
            match name.parse::<Tz>() {
                Ok(tz) => return tz,
                Err(_) => warn!("Unknown shop timezone '{}', using {}", name, self.timezone),
            }
        }
        self.timezone.parse::<Tz>().unwrap_or(chrono_tz::UTC)
    }

    pub fn reel_ttl(&self) -> Duration {
        Duration::hours(self.reel_ttl_hours)
    }

    pub fn sweeper_interval_secs(&self, kind: SweeperKind) -> u64 {
        match kind {
            SweeperKind::StreamsLifecycle => self.lifecycle_interval_secs,
            SweeperKind::Sanctions => self.sanctions_interval_secs,
            SweeperKind::Notifications => self.notifications_interval_secs,
            SweeperKind::ReelExpiry => self.reel_expiry_interval_secs,
            SweeperKind::QuotaReset => self.quota_reset_interval_secs,
        }
    }

    pub fn sweeper_enabled(&self, kind: SweeperKind) -> bool {
        match kind {
            SweeperKind::StreamsLifecycle => self.lifecycle_enabled,
            SweeperKind::Sanctions => self.sanctions_enabled,
            SweeperKind::Notifications => self.notifications_enabled,
            SweeperKind::ReelExpiry => self.reel_expiry_enabled,
            SweeperKind::QuotaReset => self.quota_reset_enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = EngineConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.default_tz().unwrap(), chrono_tz::America::Argentina::Buenos_Aires);
    }

    #[test]
    fn bad_timezone_is_rejected() {
        let cfg = EngineConfig {
            timezone: "Mars/Olympus".into(),
            ..EngineConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn shop_timezone_falls_back() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.tz_for(Some("Europe/Madrid")), chrono_tz::Europe::Madrid);
        assert_eq!(cfg.tz_for(Some("nowhere")), chrono_tz::America::Argentina::Buenos_Aires);
        assert_eq!(cfg.tz_for(None), chrono_tz::America::Argentina::Buenos_Aires);
    }

    #[test]
    fn plan_upgrade_priced_by_target() {
        let prices = PriceCatalog::default();
        assert_eq!(prices.unit_price(PurchaseType::PlanUpgrade, None), None);
        assert_eq!(prices.unit_price(PurchaseType::PlanUpgrade, Some(Plan::Estandar)), None);
        assert_eq!(
            prices.unit_price(PurchaseType::PlanUpgrade, Some(Plan::MaximaVisibilidad)),
            Some(prices.maxima_visibilidad_cents)
        );
    }
}
