// File: shopcast-common/src/models/stream.rs

use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;
use crate::models::quota::QuotaOrigin;
use crate::models::shop::SocialPlatform;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamStatus {
    Upcoming,
    Live,
    Finished,
    Missed,
    Cancelled,
    Banned,
    PendingReprogrammation,
}

/// Everything that can happen to a stream.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StreamEvent {
    Start,
    Cancel,
    Ban,
    Miss,
    Reprogram,
    Finish,
    Extend,
    Reschedule,
}

impl fmt::Display for StreamEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StreamEvent::Start => "start",
            StreamEvent::Cancel => "cancel",
            StreamEvent::Ban => "ban",
            StreamEvent::Miss => "miss",
            StreamEvent::Reprogram => "reprogram",
            StreamEvent::Finish => "finish",
            StreamEvent::Extend => "extend",
            StreamEvent::Reschedule => "reschedule",
        };
        write!(f, "{}", s)
    }
}

impl StreamStatus {
    pub const ALL: [StreamStatus; 7] = [
        StreamStatus::Upcoming,
        StreamStatus::Live,
        StreamStatus::Finished,
        StreamStatus::Missed,
        StreamStatus::Cancelled,
        StreamStatus::Banned,
        StreamStatus::PendingReprogrammation,
    ];

    /// Statuses that hold the shop's calendar day.
    pub const DAY_OCCUPYING: [StreamStatus; 3] = [
        StreamStatus::Upcoming,
        StreamStatus::Live,
        StreamStatus::PendingReprogrammation,
    ];

    /// Statuses counted against the weekly cap.
    pub const WEEK_COUNTED: [StreamStatus; 2] = [StreamStatus::Upcoming, StreamStatus::Live];

    pub fn as_str(self) -> &'static str {
        match self {
            StreamStatus::Upcoming => "UPCOMING",
            StreamStatus::Live => "LIVE",
            StreamStatus::Finished => "FINISHED",
            StreamStatus::Missed => "MISSED",
            StreamStatus::Cancelled => "CANCELLED",
            StreamStatus::Banned => "BANNED",
            StreamStatus::PendingReprogrammation => "PENDING_REPROGRAMMATION",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, StreamStatus::Finished | StreamStatus::Cancelled | StreamStatus::Banned)
    }

    /// Total transition function. Anything not listed is rejected.
    pub fn transition(self, event: StreamEvent) -> Result<StreamStatus, Error> {
        use StreamEvent as E;
        use StreamStatus as S;
        let next = match (self, event) {
            (S::Upcoming, E::Start) => S::Live,
            (S::Upcoming, E::Cancel) => S::Cancelled,
            (S::Upcoming, E::Ban) | (S::Live, E::Ban) => S::Banned,
            (S::Upcoming, E::Miss) | (S::Live, E::Miss) => S::Missed,
            (S::Missed, E::Reprogram) => S::PendingReprogrammation,
            (S::Live, E::Finish) => S::Finished,
            (S::Live, E::Extend) => S::Live,
            (S::PendingReprogrammation, E::Reschedule) => S::Upcoming,
            (from, ev) => return Err(Error::invalid_transition(from, ev)),
        };
        Ok(next)
    }
}

impl fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StreamStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StreamStatus::ALL
            .iter()
            .copied()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| format!("Unknown stream status: {}", s))
    }
}

/// One scheduled broadcast.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Stream {
    pub stream_id: Uuid,
    pub shop_id: Uuid,
    pub title: String,
    pub status: StreamStatus,
    pub full_date: DateTime<Utc>,
    pub extension_count: i32,
    pub platform: SocialPlatform,
    pub url: String,
    pub report_count: i32,
    pub is_visible: bool,
    pub rating: Option<f32>,
    pub quota_origin: QuotaOrigin,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
    /// Set on a PENDING_REPROGRAMMATION replacement for a missed stream.
    pub replaces_stream_id: Option<Uuid>,
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Stream {
    pub fn new(
        shop_id: Uuid,
        title: &str,
        full_date: DateTime<Utc>,
        platform: SocialPlatform,
        url: String,
        quota_origin: QuotaOrigin,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            stream_id: Uuid::new_v4(),
            shop_id,
            title: title.to_string(),
            status: StreamStatus::Upcoming,
            full_date,
            extension_count: 0,
            platform,
            url,
            report_count: 0,
            is_visible: true,
            rating: None,
            quota_origin,
            started_at: None,
            finished_at: None,
            cancel_reason: None,
            replaces_stream_id: None,
            reminder_sent_at: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// HH:mm of the scheduled instant in the given zone.
    pub fn scheduled_time<Tz: TimeZone>(&self, tz: &Tz) -> String
    where
        Tz::Offset: fmt::Display,
    {
        self.full_date.with_timezone(tz).format("%H:%M").to_string()
    }

    /// When a LIVE stream is due to end given its extensions.
    pub fn scheduled_end(&self, base_minutes: i64) -> Option<DateTime<Utc>> {
        self.started_at
            .map(|s| s + Duration::minutes(base_minutes * (1 + i64::from(self.extension_count))))
    }

    /// Applies `event` in place, stamping the side fields. Errors leave the
    /// stream untouched.
    pub fn apply(&mut self, event: StreamEvent, now: DateTime<Utc>, max_extensions: i32) -> Result<(), Error> {
        let next = self.status.transition(event)?;
        match event {
            StreamEvent::Extend => {
                if self.extension_count >= max_extensions {
                    return Err(Error::ExtensionLimitReached {
                        stream_id: self.stream_id,
                        max: max_extensions,
                    });
                }
                self.extension_count += 1;
            }
            StreamEvent::Start => {
                if self.started_at.is_none() {
                    self.started_at = Some(now);
                }
            }
            StreamEvent::Finish => {
                self.finished_at = Some(now);
            }
            StreamEvent::Reschedule => {
                self.report_count = 0;
                self.started_at = None;
                self.extension_count = 0;
                self.reminder_sent_at = None;
            }
            _ => {}
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }
}

/// Input of `scheduleStream`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScheduleStreamRequest {
    pub shop_id: Uuid,
    pub title: String,
    pub full_date: DateTime<Utc>,
    pub platform: SocialPlatform,
    /// Skips the validation checks; the quota debit stays atomic.
    #[serde(default)]
    pub admin_override: bool,
}

/// Partial edit of an UPCOMING or PENDING_REPROGRAMMATION stream.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct StreamPatch {
    pub title: Option<String>,
    pub full_date: Option<DateTime<Utc>>,
    pub platform: Option<SocialPlatform>,
}

impl StreamPatch {
    pub fn touches_schedule(&self) -> bool {
        self.full_date.is_some() || self.platform.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream() -> Stream {
        let now = Utc::now();
        Stream::new(
            Uuid::new_v4(),
            "Liquidacion",
            now,
            SocialPlatform::Instagram,
            "https://www.instagram.com/x/live".into(),
            QuotaOrigin::Plan,
            now,
        )
    }

    #[test]
    fn new_stream_is_stamped_with_the_given_instant() {
        let at = Utc::now() - Duration::days(3);
        let s = Stream::new(
            Uuid::new_v4(),
            "Vivo",
            at + Duration::days(1),
            SocialPlatform::Tiktok,
            String::new(),
            QuotaOrigin::Extra,
            at,
        );
        assert_eq!(s.created_at, at);
        assert_eq!(s.updated_at, at);
        assert_eq!(s.status, StreamStatus::Upcoming);
    }

    #[test]
    fn terminal_states_reject_everything() {
        for status in [StreamStatus::Finished, StreamStatus::Cancelled, StreamStatus::Banned] {
            for event in [
                StreamEvent::Start,
                StreamEvent::Cancel,
                StreamEvent::Ban,
                StreamEvent::Miss,
                StreamEvent::Finish,
                StreamEvent::Extend,
                StreamEvent::Reschedule,
                StreamEvent::Reprogram,
            ] {
                assert!(status.transition(event).is_err(), "{} accepted {}", status, event);
            }
        }
    }

    #[test]
    fn cancel_only_before_live() {
        assert_eq!(
            StreamStatus::Upcoming.transition(StreamEvent::Cancel).unwrap(),
            StreamStatus::Cancelled
        );
        assert!(StreamStatus::Live.transition(StreamEvent::Cancel).is_err());
    }

    #[test]
    fn missed_moves_only_through_reprogramming() {
        assert!(StreamStatus::Missed.transition(StreamEvent::Start).is_err());
        assert_eq!(
            StreamStatus::Missed.transition(StreamEvent::Reprogram).unwrap(),
            StreamStatus::PendingReprogrammation
        );
        assert_eq!(
            StreamStatus::PendingReprogrammation
                .transition(StreamEvent::Reschedule)
                .unwrap(),
            StreamStatus::Upcoming
        );
    }

    #[test]
    fn fourth_extension_fails() {
        let mut s = stream();
        let now = Utc::now();
        s.apply(StreamEvent::Start, now, 3).unwrap();
        for _ in 0..3 {
            s.apply(StreamEvent::Extend, now, 3).unwrap();
        }
        let err = s.apply(StreamEvent::Extend, now, 3).unwrap_err();
        assert!(matches!(err, Error::ExtensionLimitReached { .. }));
        assert_eq!(s.extension_count, 3);
    }

    #[test]
    fn start_keeps_manual_started_at() {
        let mut s = stream();
        let early = Utc::now() - Duration::minutes(10);
        s.started_at = Some(early);
        s.apply(StreamEvent::Start, Utc::now(), 3).unwrap();
        assert_eq!(s.started_at, Some(early));
    }

    #[test]
    fn scheduled_end_grows_with_extensions() {
        let mut s = stream();
        let t = Utc::now();
        s.apply(StreamEvent::Start, t, 3).unwrap();
        s.apply(StreamEvent::Extend, t, 3).unwrap();
        assert_eq!(s.scheduled_end(30), Some(t + Duration::minutes(60)));
    }

    #[test]
    fn unknown_status_string_is_rejected() {
        assert!("upcoming".parse::<StreamStatus>().is_err());
        assert_eq!("LIVE".parse::<StreamStatus>().unwrap(), StreamStatus::Live);
    }
}
