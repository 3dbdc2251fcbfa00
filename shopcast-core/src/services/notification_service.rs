// File: shopcast-core/src/services/notification_service.rs

use std::sync::Arc;
use async_trait::async_trait;
use chrono::Duration;
use tracing::{debug, error, info, warn};

use shopcast_common::models::{
    Notification, NotificationKind, NotificationSummary, RecordError, StreamStatus,
};
use shopcast_common::traits::collaborator_traits::NotificationSink;
use shopcast_common::traits::repository_traits::StreamRepository;
use crate::config::EngineConfig;
use crate::utils::time::Clock;
use crate::Error;

/// Writes notifications to the log. Used when no delivery channel is wired.
#[derive(Debug, Default, Clone)]
pub struct LoggingNotificationSink;

#[async_trait]
impl NotificationSink for LoggingNotificationSink {
    async fn send(&self, notification: &Notification) -> Result<(), Error> {
        info!(
            "Notify shop {}: stream '{}' starts at {} ({})",
            notification.shop_id, notification.title, notification.starts_at, notification.url
        );
        Ok(())
    }
}

/// "Starting soon" reminders, sent at most once per stream.
pub struct NotificationService {
    stream_repo: Arc<dyn StreamRepository + Send + Sync>,
    sink: Arc<dyn NotificationSink + Send + Sync>,
    config: Arc<EngineConfig>,
    clock: Arc<dyn Clock>,
}

impl NotificationService {
    pub fn new(
        stream_repo: Arc<dyn StreamRepository + Send + Sync>,
        sink: Arc<dyn NotificationSink + Send + Sync>,
        config: Arc<EngineConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { stream_repo, sink, config, clock }
    }

    pub async fn run_tick(&self) -> Result<NotificationSummary, Error> {
        let now = self.clock.now();
        let horizon = now + Duration::minutes(self.config.reminder_lead_minutes);
        let mut summary = NotificationSummary::default();

        let due = self
            .stream_repo
            .list_streams_by_status(&[StreamStatus::Upcoming], Some(now), Some(horizon))
            .await?;
        for mut stream in due.into_iter().filter(|s| s.reminder_sent_at.is_none()) {
            summary.candidates += 1;

            // Claim first so a concurrent sweep cannot send the same reminder.
            stream.reminder_sent_at = Some(now);
            stream.updated_at = now;
            match self.stream_repo.update_stream(&stream).await {
                Ok(true) => stream.version += 1,
                Ok(false) => {
                    debug!("Reminder for stream {} already claimed", stream.stream_id);
                    continue;
                }
                Err(e) => {
                    summary.errors.push(RecordError { record_id: stream.stream_id, message: e.to_string() });
                    continue;
                }
            }

            let notification = Notification {
                kind: NotificationKind::StreamStartingSoon,
                shop_id: stream.shop_id,
                stream_id: stream.stream_id,
                title: stream.title.clone(),
                starts_at: stream.full_date,
                url: stream.url.clone(),
            };
            match self.sink.send(&notification).await {
                Ok(()) => summary.sent += 1,
                Err(e) => {
                    error!("Reminder for stream {} failed: {:?}", stream.stream_id, e);
                    summary.errors.push(RecordError { record_id: stream.stream_id, message: e.to_string() });
                    // Release the claim so the next sweep retries.
                    stream.reminder_sent_at = None;
                    if let Ok(false) | Err(_) = self.stream_repo.update_stream(&stream).await {
                        warn!("Could not release reminder claim on stream {}", stream.stream_id);
                    }
                }
            }
        }

        if summary.sent > 0 {
            info!("Sent {} stream reminder(s)", summary.sent);
        }
        Ok(summary)
    }
}
