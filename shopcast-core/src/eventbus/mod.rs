//! src/eventbus/mod.rs
//!
//! In-process event bus. Every subscriber owns a bounded MPSC queue; a
//! `watch` channel carries the shutdown signal the sweepers listen on.

use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::warn;
use uuid::Uuid;

use shopcast_common::models::{PurchaseStatus, StreamStatus};

/// Domain events published by the services and engines.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    StreamScheduled {
        stream_id: Uuid,
        shop_id: Uuid,
        full_date: DateTime<Utc>,
    },
    StreamStatusChanged {
        stream_id: Uuid,
        shop_id: Uuid,
        from: StreamStatus,
        to: StreamStatus,
    },
    ReelPublished {
        reel_id: Uuid,
        shop_id: Uuid,
    },
    PurchaseResolved {
        purchase_id: Uuid,
        shop_id: Uuid,
        status: PurchaseStatus,
    },
    ShopSanctioned {
        shop_id: Uuid,
        stream_id: Option<Uuid>,
        reason: String,
    },
    AgendaSuspended {
        shop_id: Uuid,
        until: DateTime<Utc>,
    },
}

impl DomainEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::StreamScheduled { .. } => "stream.scheduled",
            DomainEvent::StreamStatusChanged { .. } => "stream.status_changed",
            DomainEvent::ReelPublished { .. } => "reel.published",
            DomainEvent::PurchaseResolved { .. } => "purchase.resolved",
            DomainEvent::ShopSanctioned { .. } => "shop.sanctioned",
            DomainEvent::AgendaSuspended { .. } => "shop.agenda_suspended",
        }
    }

    pub fn shop_id(&self) -> Uuid {
        match self {
            DomainEvent::StreamScheduled { shop_id, .. }
            | DomainEvent::StreamStatusChanged { shop_id, .. }
            | DomainEvent::ReelPublished { shop_id, .. }
            | DomainEvent::PurchaseResolved { shop_id, .. }
            | DomainEvent::ShopSanctioned { shop_id, .. }
            | DomainEvent::AgendaSuspended { shop_id, .. } => *shop_id,
        }
    }
}

/// Publishing never waits on a slow subscriber: a full queue drops the
/// event for that subscriber only, and closed queues are pruned.
#[derive(Clone)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::Sender<DomainEvent>>>>,
    shutdown_tx: watch::Sender<bool>,
    pub shutdown_rx: watch::Receiver<bool>,
}

const DEFAULT_BUFFER_SIZE: usize = 1024;

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            subscribers: Arc::new(Mutex::new(vec![])),
            shutdown_tx: tx,
            shutdown_rx: rx,
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    pub async fn subscribe(&self, buffer_size: Option<usize>) -> mpsc::Receiver<DomainEvent> {
        let size = buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE);
        let (tx, rx) = mpsc::channel(size);
        let mut subs = self.subscribers.lock().await;
        subs.push(tx);
        rx
    }

    pub async fn publish(&self, event: DomainEvent) {
        let mut subs = self.subscribers.lock().await;
        subs.retain(|s| !s.is_closed());
        for s in subs.iter() {
            if let Err(mpsc::error::TrySendError::Full(_)) = s.try_send(event.clone()) {
                warn!("Event subscriber queue full; dropping {}", event.event_type());
            }
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        let subs = self.subscribers.lock().await;
        subs.iter().filter(|s| !s.is_closed()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Duration};

    fn resolved(status: PurchaseStatus) -> DomainEvent {
        DomainEvent::PurchaseResolved {
            purchase_id: Uuid::new_v4(),
            shop_id: Uuid::new_v4(),
            status,
        }
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe(Some(5)).await;
        let mut rx2 = bus.subscribe(Some(5)).await;

        bus.publish(resolved(PurchaseStatus::Approved)).await;

        let evt1 = rx1.recv().await.expect("rx1 should get event");
        let evt2 = rx2.recv().await.expect("rx2 should get event");
        assert_eq!(evt1.event_type(), "purchase.resolved");
        assert_eq!(evt2.shop_id(), evt1.shop_id());
    }

    #[tokio::test]
    async fn test_full_queue_does_not_block_publish() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe(Some(1)).await;

        bus.publish(resolved(PurchaseStatus::Approved)).await;
        let second = bus.publish(resolved(PurchaseStatus::Rejected));
        assert!(timeout(Duration::from_millis(200), second).await.is_ok());

        match rx.recv().await {
            Some(DomainEvent::PurchaseResolved { status, .. }) => assert_eq!(status, PurchaseStatus::Approved),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dropped_subscribers_are_pruned() {
        let bus = EventBus::new();
        let rx = bus.subscribe(None).await;
        let _keep = bus.subscribe(None).await;
        drop(rx);
        bus.publish(resolved(PurchaseStatus::Approved)).await;
        assert_eq!(bus.subscriber_count().await, 1);
    }

    #[tokio::test]
    async fn test_shutdown_flag() {
        let bus = EventBus::new();
        let mut rx = bus.shutdown_rx.clone();
        assert!(!bus.is_shutdown());
        bus.shutdown();
        rx.changed().await.unwrap();
        assert!(*rx.borrow());
    }
}
