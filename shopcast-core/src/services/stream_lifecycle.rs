// File: shopcast-core/src/services/stream_lifecycle.rs

use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error, info};
use uuid::Uuid;

use shopcast_common::models::{LifecycleSummary, RecordError, Stream, StreamEvent, StreamStatus};
use shopcast_common::traits::repository_traits::StreamRepository;
use crate::config::EngineConfig;
use crate::eventbus::{DomainEvent, EventBus};
use crate::utils::time::Clock;
use crate::Error;

/// Time-driven transitions plus the manual admin overrides on a stream.
pub struct StreamLifecycleEngine {
    stream_repo: Arc<dyn StreamRepository + Send + Sync>,
    config: Arc<EngineConfig>,
    clock: Arc<dyn Clock>,
    event_bus: EventBus,
}

enum Step {
    Applied,
    Skipped,
}

impl StreamLifecycleEngine {
    pub fn new(
        stream_repo: Arc<dyn StreamRepository + Send + Sync>,
        config: Arc<EngineConfig>,
        clock: Arc<dyn Clock>,
        event_bus: EventBus,
    ) -> Self {
        Self { stream_repo, config, clock, event_bus }
    }

    fn due_end(&self, stream: &Stream) -> DateTime<Utc> {
        stream
            .scheduled_end(self.config.stream_base_minutes)
            .unwrap_or_else(|| {
                stream.full_date
                    + Duration::minutes(self.config.stream_base_minutes * (1 + i64::from(stream.extension_count)))
            })
    }

    /// Applies `event` and compare-and-sets the record. A lost race is a
    /// skip, not an error.
    async fn step(&self, stream: &mut Stream, event: StreamEvent, now: DateTime<Utc>) -> Result<Step, Error> {
        let from = stream.status;
        stream.apply(event, now, self.config.max_extensions)?;
        if !self.stream_repo.update_stream(stream).await? {
            debug!("Stream {} changed underneath the lifecycle sweep; skipping", stream.stream_id);
            return Ok(Step::Skipped);
        }
        stream.version += 1;
        if from != stream.status {
            self.event_bus
                .publish(DomainEvent::StreamStatusChanged {
                    stream_id: stream.stream_id,
                    shop_id: stream.shop_id,
                    from,
                    to: stream.status,
                })
                .await;
        }
        Ok(Step::Applied)
    }

    pub async fn run_tick(&self) -> Result<LifecycleSummary, Error> {
        let now = self.clock.now();
        let mut summary = LifecycleSummary::default();

        let due = self
            .stream_repo
            .list_streams_by_status(&[StreamStatus::Upcoming], None, Some(now))
            .await?;
        for mut stream in due {
            match self.step(&mut stream, StreamEvent::Start, now).await {
                Ok(Step::Applied) => {
                    summary.started += 1;
                    info!("Stream {} of shop {} is now LIVE", stream.stream_id, stream.shop_id);
                }
                Ok(Step::Skipped) => {}
                Err(e) => {
                    error!("Could not start stream {}: {:?}", stream.stream_id, e);
                    summary.errors.push(RecordError { record_id: stream.stream_id, message: e.to_string() });
                }
            }
        }

        let live = self
            .stream_repo
            .list_streams_by_status(&[StreamStatus::Live], None, None)
            .await?;
        for mut stream in live {
            if now <= self.due_end(&stream) {
                continue;
            }
            match self.step(&mut stream, StreamEvent::Finish, now).await {
                Ok(Step::Applied) => {
                    summary.finished += 1;
                    info!(
                        "Stream {} of shop {} finished after {} extension(s)",
                        stream.stream_id, stream.shop_id, stream.extension_count
                    );
                }
                Ok(Step::Skipped) => {}
                Err(e) => {
                    error!("Could not finish stream {}: {:?}", stream.stream_id, e);
                    summary.errors.push(RecordError { record_id: stream.stream_id, message: e.to_string() });
                }
            }
        }

        if summary.started > 0 || summary.finished > 0 {
            info!("Lifecycle tick: {} started, {} finished", summary.started, summary.finished);
        }
        Ok(summary)
    }

    async fn manual(&self, stream_id: Uuid, event: StreamEvent) -> Result<Stream, Error> {
        let mut stream = self
            .stream_repo
            .get_stream(stream_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("stream {}", stream_id)))?;
        match self.step(&mut stream, event, self.clock.now()).await? {
            Step::Applied => {
                info!("Stream {} of shop {}: {} -> {}", stream_id, stream.shop_id, event, stream.status);
                Ok(stream)
            }
            Step::Skipped => Err(Error::Conflict(format!("stream {} was modified concurrently", stream_id))),
        }
    }

    pub async fn start(&self, stream_id: Uuid) -> Result<Stream, Error> {
        self.manual(stream_id, StreamEvent::Start).await
    }

    pub async fn finish(&self, stream_id: Uuid) -> Result<Stream, Error> {
        self.manual(stream_id, StreamEvent::Finish).await
    }

    pub async fn extend(&self, stream_id: Uuid) -> Result<Stream, Error> {
        self.manual(stream_id, StreamEvent::Extend).await
    }

    pub async fn ban(&self, stream_id: Uuid) -> Result<Stream, Error> {
        self.manual(stream_id, StreamEvent::Ban).await
    }

    /// Counts a viewer report. Reports outside
    /// `[start - before, start + after]` are ignored.
    pub async fn report(&self, stream_id: Uuid) -> Result<Stream, Error> {
        let stream = self
            .stream_repo
            .get_stream(stream_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("stream {}", stream_id)))?;
        if !matches!(stream.status, StreamStatus::Upcoming | StreamStatus::Live) {
            return Err(Error::invalid_transition(stream.status, "report"));
        }

        let now = self.clock.now();
        let opens = stream.full_date - Duration::minutes(self.config.report_window_before_minutes);
        let closes = stream.full_date + Duration::minutes(self.config.report_window_after_minutes);
        if now < opens || now > closes {
            debug!("Report for stream {} outside its window; ignored", stream_id);
            return Ok(stream);
        }

        let count = self
            .stream_repo
            .increment_report_count(stream_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("stream {}", stream_id)))?;
        if count >= self.config.report_threshold {
            info!("Stream {} reached {} reports", stream_id, count);
        }
        self.stream_repo
            .get_stream(stream_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("stream {}", stream_id)))
    }
}
