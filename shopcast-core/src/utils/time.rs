use std::sync::Arc;
use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use parking_lot::RwLock;

/// Source of "now" for every service and sweeper.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<RwLock<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Arc::new(RwLock::new(start)) }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.write() = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.write();
        *guard = *guard + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}

/// Maps a local wall-clock time to UTC. Ambiguous times take the earlier
/// instant; times inside a DST gap are read as UTC.
pub fn localize(tz: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => naive.and_utc(),
    }
}

fn local_midnight(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    localize(tz, date.and_time(chrono::NaiveTime::MIN))
}

/// Shop-local calendar day, e.g. `2026-10-19`.
pub fn day_key(tz: &Tz, at: DateTime<Utc>) -> String {
    at.with_timezone(tz).date_naive().format("%Y-%m-%d").to_string()
}

/// ISO week in the shop's zone, e.g. `2026-W43`.
pub fn week_key(tz: &Tz, at: DateTime<Utc>) -> String {
    let week = at.with_timezone(tz).date_naive().iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

/// `[start, end)` of the local day containing `at`.
pub fn local_day_bounds(tz: &Tz, at: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let date = at.with_timezone(tz).date_naive();
    let next = date.succ_opt().unwrap_or(date);
    (local_midnight(tz, date), local_midnight(tz, next))
}

/// `[monday 00:00, next monday 00:00)` of the local ISO week containing `at`.
pub fn iso_week_bounds(tz: &Tz, at: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let date = at.with_timezone(tz).date_naive();
    let monday = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
    let next_monday = monday + Duration::days(7);
    (local_midnight(tz, monday), local_midnight(tz, next_monday))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::Argentina::Buenos_Aires;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn day_key_uses_local_date() {
        // 01:30 UTC is still the previous evening in Buenos Aires (UTC-3).
        let at = utc("2026-10-20T01:30:00Z");
        assert_eq!(day_key(&Buenos_Aires, at), "2026-10-19");
        assert_eq!(day_key(&chrono_tz::UTC, at), "2026-10-20");
    }

    #[test]
    fn week_key_is_iso() {
        assert_eq!(week_key(&chrono_tz::UTC, utc("2026-01-01T12:00:00Z")), "2026-W01");
        assert_eq!(week_key(&chrono_tz::UTC, utc("2027-01-01T12:00:00Z")), "2026-W53");
    }

    #[test]
    fn week_bounds_start_on_local_monday() {
        let (start, end) = iso_week_bounds(&Buenos_Aires, utc("2026-10-22T15:00:00Z"));
        assert_eq!(start, utc("2026-10-19T03:00:00Z"));
        assert_eq!(end, utc("2026-10-26T03:00:00Z"));
    }

    #[test]
    fn day_bounds_cover_24_hours() {
        let (start, end) = local_day_bounds(&Buenos_Aires, utc("2026-10-20T01:30:00Z"));
        assert_eq!(start, utc("2026-10-19T03:00:00Z"));
        assert_eq!(end - start, Duration::hours(24));
    }

    #[test]
    fn manual_clock_is_shared() {
        let clock = ManualClock::new(utc("2026-10-19T10:00:00Z"));
        let other = clock.clone();
        clock.advance(Duration::minutes(45));
        assert_eq!(other.now(), utc("2026-10-19T10:45:00Z"));
    }
}
