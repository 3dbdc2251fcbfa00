use async_trait::async_trait;
use crate::error::Error;
use crate::models::{Notification, PaymentPreference, PreferenceRequest};

/// External payment provider. The core only records the preference it
/// returns and later reacts to an explicit approval.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_preference(&self, request: &PreferenceRequest) -> Result<PaymentPreference, Error>;
}

/// Delivery channel for shop notifications (push, e-mail, ...).
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), Error>;
}
