use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use shopcast_common::error::Error;
use shopcast_common::models::{PurchaseRequest, PurchaseStatus};
use shopcast_common::traits::repository_traits::PurchaseRepository;

#[derive(Default)]
pub struct InMemoryPurchaseRepository {
    purchases: DashMap<Uuid, PurchaseRequest>,
}

impl InMemoryPurchaseRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PurchaseRepository for InMemoryPurchaseRepository {
    async fn insert_purchase(&self, purchase: &PurchaseRequest) -> Result<(), Error> {
        if let Some(reference) = &purchase.external_reference {
            let taken = self
                .purchases
                .iter()
                .any(|p| p.external_reference.as_deref() == Some(reference.as_str()));
            if taken {
                return Err(Error::Conflict(format!("external reference {} already recorded", reference)));
            }
        }
        self.purchases.insert(purchase.purchase_id, purchase.clone());
        Ok(())
    }

    async fn get_purchase(&self, purchase_id: Uuid) -> Result<Option<PurchaseRequest>, Error> {
        Ok(self.purchases.get(&purchase_id).map(|p| p.value().clone()))
    }

    async fn get_purchase_by_reference(&self, external_reference: &str) -> Result<Option<PurchaseRequest>, Error> {
        Ok(self
            .purchases
            .iter()
            .find(|p| p.external_reference.as_deref() == Some(external_reference))
            .map(|p| p.value().clone()))
    }

    async fn list_purchases_for_shop(&self, shop_id: Uuid) -> Result<Vec<PurchaseRequest>, Error> {
        let mut out: Vec<PurchaseRequest> = self
            .purchases
            .iter()
            .filter(|p| p.shop_id == shop_id)
            .map(|p| p.value().clone())
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn resolve_purchase(
        &self,
        purchase_id: Uuid,
        status: PurchaseStatus,
        notes: Option<&str>,
        resolved_at: DateTime<Utc>,
    ) -> Result<bool, Error> {
        let Some(mut stored) = self.purchases.get_mut(&purchase_id) else {
            return Ok(false);
        };
        if stored.status != PurchaseStatus::Pending {
            return Ok(false);
        }
        stored.status = status;
        if let Some(n) = notes {
            stored.notes = Some(n.to_string());
        }
        stored.resolved_at = Some(resolved_at);
        Ok(true)
    }

    async fn mark_purchase_applied(&self, purchase_id: Uuid, applied_at: DateTime<Utc>) -> Result<bool, Error> {
        let Some(mut stored) = self.purchases.get_mut(&purchase_id) else {
            return Ok(false);
        };
        if stored.status != PurchaseStatus::Approved || stored.applied_at.is_some() {
            return Ok(false);
        }
        stored.applied_at = Some(applied_at);
        Ok(true)
    }
}
