// api/purchase_api.rs

use std::time::Duration;
use async_trait::async_trait;
use uuid::Uuid;

use shopcast_common::models::{PaymentOutcome, PurchaseOrder, PurchaseRequest};
use shopcast_common::traits::api::PurchaseApi;
use crate::api::CoreApi;
use crate::Error;

#[async_trait]
impl PurchaseApi for CoreApi {
    async fn create_purchase_preference(&self, order: PurchaseOrder) -> Result<PurchaseRequest, Error> {
        self.purchases.create_preference(order).await
    }

    async fn approve_purchase(&self, purchase_id: Uuid) -> Result<PurchaseRequest, Error> {
        self.purchases.approve(purchase_id).await
    }

    async fn reject_purchase(&self, purchase_id: Uuid, notes: &str) -> Result<PurchaseRequest, Error> {
        self.purchases.reject(purchase_id, notes).await
    }

    async fn cancel_purchase(&self, purchase_id: Uuid) -> Result<PurchaseRequest, Error> {
        self.purchases.cancel(purchase_id).await
    }

    async fn handle_payment_notification(
        &self,
        external_reference: &str,
        outcome: PaymentOutcome,
    ) -> Result<PurchaseRequest, Error> {
        self.purchases.handle_payment_notification(external_reference, outcome).await
    }

    async fn await_confirmation(&self, purchase_id: Uuid, timeout: Duration) -> Result<PurchaseRequest, Error> {
        self.purchases.await_confirmation(purchase_id, timeout).await
    }

    async fn get_purchase(&self, purchase_id: Uuid) -> Result<PurchaseRequest, Error> {
        self.purchases.get_purchase(purchase_id).await
    }
}
