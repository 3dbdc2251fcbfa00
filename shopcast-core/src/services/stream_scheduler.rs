// File: shopcast-core/src/services/stream_scheduler.rs

use std::sync::Arc;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use shopcast_common::models::{
    QuotaKind, QuotaOrigin, ScheduleStreamRequest, Shop, ShopStatus, SocialPlatform, Stream,
    StreamEvent, StreamPatch, StreamStatus,
};
use shopcast_common::traits::repository_traits::StreamRepository;
use crate::config::EngineConfig;
use crate::eventbus::{DomainEvent, EventBus};
use crate::services::quota_wallet::QuotaWalletService;
use crate::services::shop_service::ShopService;
use crate::utils::time::{self, Clock};
use crate::Error;

/// Validates and commits stream creation, edits and cancellation.
pub struct StreamScheduler {
    stream_repo: Arc<dyn StreamRepository + Send + Sync>,
    shops: Arc<ShopService>,
    wallet: Arc<QuotaWalletService>,
    config: Arc<EngineConfig>,
    clock: Arc<dyn Clock>,
    event_bus: EventBus,
    shop_locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl StreamScheduler {
    pub fn new(
        stream_repo: Arc<dyn StreamRepository + Send + Sync>,
        shops: Arc<ShopService>,
        wallet: Arc<QuotaWalletService>,
        config: Arc<EngineConfig>,
        clock: Arc<dyn Clock>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            stream_repo,
            shops,
            wallet,
            config,
            clock,
            event_bus,
            shop_locks: DashMap::new(),
        }
    }

    /// Serializes the check-then-commit of a single shop's agenda.
    fn shop_lock(&self, shop_id: Uuid) -> Arc<Mutex<()>> {
        self.shop_locks
            .entry(shop_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    pub async fn get_stream(&self, stream_id: Uuid) -> Result<Stream, Error> {
        self.stream_repo
            .get_stream(stream_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("stream {}", stream_id)))
    }

    pub async fn list_shop_streams(&self, shop_id: Uuid) -> Result<Vec<Stream>, Error> {
        self.stream_repo.list_streams_for_shop(shop_id).await
    }

    /// One stream per local day, the weekly cap, then the platform handle.
    /// Returns the broadcast URL.
    async fn check_slot(
        &self,
        shop: &Shop,
        full_date: DateTime<Utc>,
        platform: SocialPlatform,
        editing: Option<Uuid>,
    ) -> Result<String, Error> {
        let tz = self.shops.tz_for(shop);

        let (day_from, day_to) = time::local_day_bounds(&tz, full_date);
        let same_day = self
            .stream_repo
            .list_shop_streams_between(shop.shop_id, &StreamStatus::DAY_OCCUPYING, day_from, day_to)
            .await?;
        if same_day.iter().any(|s| Some(s.stream_id) != editing) {
            return Err(Error::DuplicateDailySlot { day: time::day_key(&tz, full_date) });
        }

        let (week_from, week_to) = time::iso_week_bounds(&tz, full_date);
        let in_week = self
            .stream_repo
            .list_shop_streams_between(shop.shop_id, &StreamStatus::WEEK_COUNTED, week_from, week_to)
            .await?
            .iter()
            .filter(|s| Some(s.stream_id) != editing)
            .count() as i64;
        if in_week + 1 > self.config.weekly_stream_cap {
            return Err(Error::WeeklyCapExceeded {
                week: time::week_key(&tz, full_date),
                cap: self.config.weekly_stream_cap,
            });
        }

        shop.handle_for(platform)
            .map(|h| platform.live_url(h))
            .ok_or_else(|| Error::MissingSocialHandle(platform.to_string()))
    }

    fn url_or_empty(shop: &Shop, platform: SocialPlatform) -> String {
        shop.handle_for(platform)
            .map(|h| platform.live_url(h))
            .unwrap_or_default()
    }

    pub async fn schedule(&self, request: ScheduleStreamRequest) -> Result<Stream, Error> {
        let lock = self.shop_lock(request.shop_id);
        let _guard = lock.lock().await;

        let shop = self.shops.get_shop(request.shop_id).await?;
        let now = self.clock.now();
        let title = request.title.trim();
        if title.is_empty() {
            return Err(Error::InvalidSchedule("title must not be empty".into()));
        }

        let (url, origin) = if request.admin_override {
            let url = Self::url_or_empty(&shop, request.platform);
            // The debit stays atomic; with nothing left the slot is on the house.
            let origin = match self.wallet.debit(&shop, QuotaKind::Live, 1).await {
                Ok(debit) => debit.origin(),
                Err(Error::InsufficientQuota { .. }) => QuotaOrigin::Complimentary,
                Err(e) => return Err(e),
            };
            (url, origin)
        } else {
            if request.full_date <= now {
                return Err(Error::InvalidSchedule(format!(
                    "{} is in the past",
                    request.full_date.to_rfc3339()
                )));
            }
            self.shops.ensure_schedulable(&shop).await?;
            let available = self.wallet.available_quota(shop.shop_id).await?.live;
            if available <= 0 {
                return Err(Error::InsufficientQuota {
                    shop_id: shop.shop_id,
                    requested: 1,
                    available,
                });
            }
            let url = self.check_slot(&shop, request.full_date, request.platform, None).await?;
            let debit = self.wallet.debit(&shop, QuotaKind::Live, 1).await?;
            (url, debit.origin())
        };

        let stream = Stream::new(shop.shop_id, title, request.full_date, request.platform, url, origin, now);

        if let Err(e) = self.stream_repo.insert_stream(&stream).await {
            error!("Failed to persist stream for shop {}: {:?}", shop.shop_id, e);
            if origin != QuotaOrigin::Complimentary {
                self.wallet.refund(shop.shop_id, QuotaKind::Live, 1, None).await?;
            }
            return Err(e);
        }

        info!(
            "Scheduled stream {} for shop {} at {} (origin {}{})",
            stream.stream_id,
            shop.shop_id,
            stream.full_date,
            origin,
            if request.admin_override { ", admin override" } else { "" }
        );
        self.event_bus
            .publish(DomainEvent::StreamScheduled {
                stream_id: stream.stream_id,
                shop_id: stream.shop_id,
                full_date: stream.full_date,
            })
            .await;
        Ok(stream)
    }

    /// Edits an UPCOMING or PENDING_REPROGRAMMATION stream. A new date on a
    /// PENDING_REPROGRAMMATION stream reschedules it to UPCOMING without a debit.
    pub async fn update(&self, stream_id: Uuid, patch: StreamPatch, admin_override: bool) -> Result<Stream, Error> {
        let current = self.get_stream(stream_id).await?;
        let lock = self.shop_lock(current.shop_id);
        let _guard = lock.lock().await;

        let mut stream = self.get_stream(stream_id).await?;
        if !matches!(stream.status, StreamStatus::Upcoming | StreamStatus::PendingReprogrammation) {
            return Err(Error::invalid_transition(stream.status, "update"));
        }
        let now = self.clock.now();
        let shop = self.shops.get_shop(stream.shop_id).await?;
        let previous_status = stream.status;

        if let Some(title) = &patch.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(Error::InvalidSchedule("title must not be empty".into()));
            }
            stream.title = title.to_string();
        }

        if patch.touches_schedule() {
            let full_date = patch.full_date.unwrap_or(stream.full_date);
            let platform = patch.platform.unwrap_or(stream.platform);

            if admin_override {
                stream.url = Self::url_or_empty(&shop, platform);
            } else {
                if patch.full_date.is_some() && full_date <= now {
                    return Err(Error::InvalidSchedule(format!("{} is in the past", full_date.to_rfc3339())));
                }
                if stream.status == StreamStatus::PendingReprogrammation {
                    // The reprogramming right survives the penalty that created it.
                    if shop.status != ShopStatus::Active {
                        return Err(Error::ShopNotSchedulable {
                            shop_id: shop.shop_id,
                            reason: format!("status is {}", shop.status),
                        });
                    }
                } else {
                    self.shops.ensure_schedulable(&shop).await?;
                }
                stream.url = self.check_slot(&shop, full_date, platform, Some(stream.stream_id)).await?;
            }
            stream.full_date = full_date;
            stream.platform = platform;

            if stream.status == StreamStatus::PendingReprogrammation && patch.full_date.is_some() {
                stream.apply(StreamEvent::Reschedule, now, self.config.max_extensions)?;
            }
        }

        stream.updated_at = now;
        if !self.stream_repo.update_stream(&stream).await? {
            return Err(Error::Conflict(format!("stream {} was modified concurrently", stream_id)));
        }
        stream.version += 1;

        if stream.status != previous_status {
            info!("Rescheduled stream {} of shop {} to {}", stream_id, stream.shop_id, stream.full_date);
            self.event_bus
                .publish(DomainEvent::StreamStatusChanged {
                    stream_id,
                    shop_id: stream.shop_id,
                    from: previous_status,
                    to: stream.status,
                })
                .await;
        }
        Ok(stream)
    }

    fn cancel_refund_key(stream_id: Uuid) -> String {
        format!("stream-cancel:{}", stream_id)
    }

    /// Returns the unit a cancelled stream consumed. Keyed by the stream, so
    /// it lands at most once however many times it is attempted.
    async fn refund_cancelled(&self, stream: &Stream) -> Result<bool, Error> {
        if stream.quota_origin == QuotaOrigin::Complimentary {
            return Ok(false);
        }
        let key = Self::cancel_refund_key(stream.stream_id);
        self.wallet
            .refund(stream.shop_id, QuotaKind::Live, 1, Some(&key))
            .await
            .map_err(|e| {
                warn!("Refund for cancelled stream {} failed: {:?}", stream.stream_id, e);
                e
            })
    }

    /// UPCOMING → CANCELLED, returning the consumed unit to the extra balance.
    /// Cancelling an already CANCELLED stream still fails, but first settles
    /// a refund an earlier attempt did not get to.
    pub async fn cancel(&self, stream_id: Uuid, reason: &str) -> Result<Stream, Error> {
        let mut stream = self.get_stream(stream_id).await?;
        if stream.status == StreamStatus::Cancelled {
            if self.refund_cancelled(&stream).await? {
                info!("Settled pending refund of cancelled stream {}", stream_id);
            }
            return Err(Error::invalid_transition(stream.status, "cancel"));
        }

        let now = self.clock.now();
        stream.apply(StreamEvent::Cancel, now, self.config.max_extensions)?;
        let reason = reason.trim();
        stream.cancel_reason = Some(if reason.is_empty() { "cancelled".to_string() } else { reason.to_string() });

        if !self.stream_repo.update_stream(&stream).await? {
            return Err(Error::Conflict(format!("stream {} was modified concurrently", stream_id)));
        }
        stream.version += 1;

        self.refund_cancelled(&stream).await?;

        info!("Cancelled stream {} of shop {}: {}", stream_id, stream.shop_id, reason);
        self.event_bus
            .publish(DomainEvent::StreamStatusChanged {
                stream_id,
                shop_id: stream.shop_id,
                from: StreamStatus::Upcoming,
                to: StreamStatus::Cancelled,
            })
            .await;
        Ok(stream)
    }
}
