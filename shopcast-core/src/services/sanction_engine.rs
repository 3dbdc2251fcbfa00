// File: shopcast-core/src/services/sanction_engine.rs
//
// Scan candidates, then apply guarded transitions. Every effect is keyed so
// a repeated tick over the same data does nothing, and the MISSED flip comes
// last so an interrupted sanction is picked up again.

use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use shopcast_common::models::{
    Penalty, RecordError, SanctionSummary, ShopStatus, Stream, StreamEvent, StreamStatus,
};
use shopcast_common::traits::repository_traits::StreamRepository;
use crate::config::EngineConfig;
use crate::eventbus::{DomainEvent, EventBus};
use crate::services::shop_service::ShopService;
use crate::utils::time::Clock;
use crate::Error;

pub const MISSED_BROADCAST_REASON: &str = "missed broadcast: report threshold";

pub struct SanctionEngine {
    stream_repo: Arc<dyn StreamRepository + Send + Sync>,
    shops: Arc<ShopService>,
    config: Arc<EngineConfig>,
    clock: Arc<dyn Clock>,
    event_bus: EventBus,
}

#[derive(Default)]
struct Outcome {
    sanctioned: bool,
    reprogrammed: bool,
    suspended: bool,
}

impl SanctionEngine {
    pub fn new(
        stream_repo: Arc<dyn StreamRepository + Send + Sync>,
        shops: Arc<ShopService>,
        config: Arc<EngineConfig>,
        clock: Arc<dyn Clock>,
        event_bus: EventBus,
    ) -> Self {
        Self { stream_repo, shops, config, clock, event_bus }
    }

    pub async fn run_tick(&self) -> Result<SanctionSummary, Error> {
        let now = self.clock.now();
        let mut summary = SanctionSummary::default();

        summary.released = self.release_expired_suspensions(now, &mut summary.errors).await?;

        let from = now - Duration::minutes(self.config.sanction_lookback_minutes);
        let to = now + Duration::minutes(self.config.report_window_before_minutes);
        let candidates: Vec<Stream> = self
            .stream_repo
            .list_streams_by_status(&[StreamStatus::Upcoming, StreamStatus::Live], Some(from), Some(to))
            .await?
            .into_iter()
            .filter(|s| s.report_count >= self.config.report_threshold)
            .collect();
        summary.candidates = candidates.len() as u32;

        for stream in candidates {
            let stream_id = stream.stream_id;
            match self.sanction(stream, now).await {
                Ok(outcome) => {
                    summary.sanctioned += u32::from(outcome.sanctioned);
                    summary.reprogrammed += u32::from(outcome.reprogrammed);
                    summary.suspended += u32::from(outcome.suspended);
                }
                Err(e) => {
                    error!("Sanctioning stream {} failed: {:?}", stream_id, e);
                    summary.errors.push(RecordError { record_id: stream_id, message: e.to_string() });
                }
            }
        }

        if summary.sanctioned > 0 || summary.released > 0 {
            info!(
                "Sanction tick: {} candidate(s), {} sanctioned, {} reprogrammed, {} suspended, {} released",
                summary.candidates, summary.sanctioned, summary.reprogrammed, summary.suspended, summary.released
            );
        }
        Ok(summary)
    }

    /// Penalty, replacement and escalation are written before the stream
    /// flips to MISSED. Each is keyed on the stream, so a tick that fails
    /// partway leaves the stream a candidate and the next tick finishes it.
    async fn sanction(&self, stream: Stream, now: DateTime<Utc>) -> Result<Outcome, Error> {
        let mut outcome = Outcome::default();
        let from = stream.status;
        let mut missed = stream.clone();
        missed.apply(StreamEvent::Miss, now, self.config.max_extensions)?;

        let penalty = Penalty::new(stream.shop_id, Some(stream.stream_id), MISSED_BROADCAST_REASON, now);
        if self.shops.penalty_repo.insert_penalty_once(&penalty).await? {
            self.event_bus
                .publish(DomainEvent::ShopSanctioned {
                    shop_id: stream.shop_id,
                    stream_id: Some(stream.stream_id),
                    reason: MISSED_BROADCAST_REASON.to_string(),
                })
                .await;
        }

        if self.config.auto_reprogram {
            outcome.reprogrammed = self.reprogram(&missed, now).await?;
        }

        outcome.suspended = self.escalate(&stream, now).await?;

        if !self.stream_repo.update_stream(&missed).await? {
            debug!("Stream {} changed before it could be marked MISSED; next tick retries", stream.stream_id);
            return Ok(outcome);
        }
        outcome.sanctioned = true;
        warn!(
            "Stream {} of shop {} marked MISSED ({} reports)",
            stream.stream_id, stream.shop_id, stream.report_count
        );
        self.event_bus
            .publish(DomainEvent::StreamStatusChanged {
                stream_id: stream.stream_id,
                shop_id: stream.shop_id,
                from,
                to: StreamStatus::Missed,
            })
            .await;
        Ok(outcome)
    }

    /// Suspends the agenda once the shop reaches the missed-stream threshold
    /// inside the rolling window, counting `stream` as missed. Returns
    /// whether it suspended.
    async fn escalate(&self, stream: &Stream, now: DateTime<Utc>) -> Result<bool, Error> {
        let shop_id = stream.shop_id;
        let since = now - Duration::days(self.config.missed_rolling_days);
        let earlier = self
            .stream_repo
            .list_shop_streams_between(shop_id, &[StreamStatus::Missed], since, now + Duration::days(1))
            .await?
            .iter()
            .filter(|s| s.stream_id != stream.stream_id)
            .count() as i64;
        let missed = earlier + 1;
        if missed < self.config.missed_streams_for_suspension {
            return Ok(false);
        }

        let shop = self.shops.get_shop(shop_id).await?;
        if shop.status != ShopStatus::Active {
            return Ok(false);
        }

        let until = now + Duration::days(self.config.suspension_days);
        let mut suspended = false;
        self.shops
            .mutate(shop_id, |shop| {
                // A concurrent writer may already have moved the shop on.
                suspended = shop.status == ShopStatus::Active;
                if suspended {
                    shop.status = ShopStatus::AgendaSuspended;
                    shop.agenda_suspended_until = Some(until);
                }
                Ok(())
            })
            .await?;
        if suspended {
            warn!("Shop {} agenda suspended until {} after {} missed streams", shop_id, until, missed);
            self.event_bus
                .publish(DomainEvent::AgendaSuspended { shop_id, until })
                .await;
        }
        Ok(suspended)
    }

    /// Creates the PENDING_REPROGRAMMATION replacement that keeps the slot
    /// the missed stream consumed. Returns false if it already exists.
    async fn reprogram(&self, missed: &Stream, now: DateTime<Utc>) -> Result<bool, Error> {
        let mut replacement = Stream::new(
            missed.shop_id,
            &missed.title,
            missed.full_date,
            missed.platform,
            missed.url.clone(),
            missed.quota_origin,
            now,
        );
        replacement.status = missed.status.transition(StreamEvent::Reprogram)?;
        replacement.replaces_stream_id = Some(missed.stream_id);
        if !self.stream_repo.insert_replacement(&replacement).await? {
            return Ok(false);
        }

        info!(
            "Stream {} of shop {} awaits reprogramming as {}",
            missed.stream_id, missed.shop_id, replacement.stream_id
        );
        self.event_bus
            .publish(DomainEvent::StreamStatusChanged {
                stream_id: replacement.stream_id,
                shop_id: replacement.shop_id,
                from: StreamStatus::Missed,
                to: StreamStatus::PendingReprogrammation,
            })
            .await;
        Ok(true)
    }

    /// Returns agenda-suspended shops whose suspension ended to ACTIVE.
    /// Penalty records stay until an admin lifts them.
    async fn release_expired_suspensions(
        &self,
        now: DateTime<Utc>,
        errors: &mut Vec<RecordError>,
    ) -> Result<u32, Error> {
        let mut released = 0;
        for shop in self.shops.shop_repo.list_shops_by_status(ShopStatus::AgendaSuspended).await? {
            let due = shop.agenda_suspended_until.map_or(false, |until| until <= now);
            if !due {
                continue;
            }
            let result = self
                .shops
                .mutate(shop.shop_id, |s| {
                    if s.status == ShopStatus::AgendaSuspended {
                        s.status = ShopStatus::Active;
                        s.agenda_suspended_until = None;
                    }
                    Ok(())
                })
                .await;
            match result {
                Ok(_) => {
                    released += 1;
                    info!("Agenda suspension of shop {} ended", shop.shop_id);
                }
                Err(e) => {
                    error!("Releasing shop {} failed: {:?}", shop.shop_id, e);
                    errors.push(RecordError { record_id: shop.shop_id, message: e.to_string() });
                }
            }
        }
        Ok(released)
    }
}
