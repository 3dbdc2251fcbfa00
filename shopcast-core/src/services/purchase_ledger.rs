// File: shopcast-core/src/services/purchase_ledger.rs

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use shopcast_common::models::{
    PaymentOutcome, Plan, PreferenceRequest, PurchaseOrder, PurchaseRequest, PurchaseStatus,
    PurchaseType, QuotaKind,
};
use shopcast_common::traits::collaborator_traits::PaymentGateway;
use shopcast_common::traits::repository_traits::PurchaseRepository;
use crate::config::EngineConfig;
use crate::eventbus::{DomainEvent, EventBus};
use crate::services::quota_wallet::QuotaWalletService;
use crate::services::shop_service::ShopService;
use crate::utils::time::Clock;
use crate::Error;

pub const CANCELLED_NOTE: &str = "cancelled by shop";
pub const PROVIDER_REJECTED_NOTE: &str = "rejected by payment provider";

/// Purchase requests for extra quota or plan upgrades. Every resolution is a
/// compare-and-set on PENDING, so each request affects the wallet at most once.
/// An APPROVED purchase without `applied_at` still owes its effect.
pub struct PurchaseLedger {
    purchase_repo: Arc<dyn PurchaseRepository + Send + Sync>,
    shops: Arc<ShopService>,
    wallet: Arc<QuotaWalletService>,
    gateway: Arc<dyn PaymentGateway + Send + Sync>,
    config: Arc<EngineConfig>,
    clock: Arc<dyn Clock>,
    event_bus: EventBus,
}

fn describe(order: &PurchaseOrder) -> String {
    match (order.purchase_type, order.target_plan) {
        (PurchaseType::LivePack, _) => format!("{} extra live stream(s)", order.quantity),
        (PurchaseType::ReelPack, _) => format!("{} extra reel(s)", order.quantity),
        (PurchaseType::PlanUpgrade, Some(plan)) => format!("Plan {}", plan.label()),
        (PurchaseType::PlanUpgrade, None) => "Plan upgrade".to_string(),
    }
}

impl PurchaseLedger {
    pub fn new(
        purchase_repo: Arc<dyn PurchaseRepository + Send + Sync>,
        shops: Arc<ShopService>,
        wallet: Arc<QuotaWalletService>,
        gateway: Arc<dyn PaymentGateway + Send + Sync>,
        config: Arc<EngineConfig>,
        clock: Arc<dyn Clock>,
        event_bus: EventBus,
    ) -> Self {
        Self { purchase_repo, shops, wallet, gateway, config, clock, event_bus }
    }

    pub async fn get_purchase(&self, purchase_id: Uuid) -> Result<PurchaseRequest, Error> {
        self.purchase_repo
            .get_purchase(purchase_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("purchase {}", purchase_id)))
    }

    /// Prices the order, opens a checkout with the payment provider and
    /// records a PENDING request. Nothing is recorded if the provider fails.
    pub async fn create_preference(&self, mut order: PurchaseOrder) -> Result<PurchaseRequest, Error> {
        let shop = self.shops.get_shop(order.shop_id).await?;
        match order.purchase_type {
            PurchaseType::PlanUpgrade => {
                let target = order
                    .target_plan
                    .ok_or_else(|| Error::PaymentNotInitiated("plan upgrade needs a target plan".into()))?;
                if target == shop.plan {
                    return Err(Error::PaymentNotInitiated(format!("shop is already on plan {}", target)));
                }
                order.quantity = 1;
            }
            PurchaseType::LivePack | PurchaseType::ReelPack => {
                if order.quantity < 1 {
                    return Err(Error::PaymentNotInitiated("quantity must be at least 1".into()));
                }
                order.target_plan = None;
            }
        }
        let unit_price = self
            .config
            .prices
            .unit_price(order.purchase_type, order.target_plan)
            .ok_or_else(|| Error::PaymentNotInitiated(format!("{} has no price", describe(&order))))?;

        let purchase_id = Uuid::new_v4();
        let preference_request = PreferenceRequest {
            purchase_id,
            shop_id: order.shop_id,
            title: describe(&order),
            quantity: order.quantity,
            unit_price_cents: unit_price,
            notification_url: self.config.payment_notification_url.clone(),
        };
        let preference = self
            .gateway
            .create_preference(&preference_request)
            .await
            .map_err(|e| {
                warn!("Payment provider refused purchase for shop {}: {}", order.shop_id, e);
                Error::PaymentNotInitiated(e.to_string())
            })?;

        let purchase = PurchaseRequest {
            purchase_id,
            shop_id: order.shop_id,
            purchase_type: order.purchase_type,
            quantity: order.quantity,
            target_plan: order.target_plan,
            amount_cents: unit_price * i64::from(order.quantity),
            status: PurchaseStatus::Pending,
            external_reference: Some(preference.preference_id),
            checkout_url: preference.checkout_url,
            notes: None,
            created_at: self.clock.now(),
            resolved_at: None,
            applied_at: None,
        };
        self.purchase_repo.insert_purchase(&purchase).await?;
        info!(
            "Purchase {} opened for shop {}: {} ({} cents)",
            purchase_id, purchase.shop_id, preference_request.title, purchase.amount_cents
        );
        Ok(purchase)
    }

    async fn already_processed(&self, purchase_id: Uuid) -> Error {
        match self.get_purchase(purchase_id).await {
            Ok(p) => Error::AlreadyProcessed { purchase_id, status: p.status.to_string() },
            Err(e) => e,
        }
    }

    /// PENDING → APPROVED, then exactly one wallet credit or plan change.
    ///
    /// Approving an already APPROVED purchase fails with `AlreadyProcessed`,
    /// but first completes an effect an earlier approval did not get to.
    pub async fn approve(&self, purchase_id: Uuid) -> Result<PurchaseRequest, Error> {
        let purchase = self.get_purchase(purchase_id).await?;
        if purchase.status != PurchaseStatus::Pending {
            self.settle_unapplied(&purchase).await?;
            return Err(Error::AlreadyProcessed { purchase_id, status: purchase.status.to_string() });
        }
        let now = self.clock.now();
        if !self
            .purchase_repo
            .resolve_purchase(purchase_id, PurchaseStatus::Approved, None, now)
            .await?
        {
            return Err(self.already_processed(purchase_id).await);
        }

        self.apply_effect(&purchase).await?;
        info!("Approved purchase {} ({}) for shop {}", purchase_id, purchase.purchase_type, purchase.shop_id);
        self.publish_approved(&purchase).await;
        self.get_purchase(purchase_id).await
    }

    async fn settle_unapplied(&self, purchase: &PurchaseRequest) -> Result<(), Error> {
        if purchase.status != PurchaseStatus::Approved || purchase.applied_at.is_some() {
            return Ok(());
        }
        if self.apply_effect(purchase).await? {
            info!("Completed approval of purchase {} for shop {}", purchase.purchase_id, purchase.shop_id);
            self.publish_approved(purchase).await;
        }
        Ok(())
    }

    /// Credits the wallet or changes the plan, then stamps the purchase as
    /// applied. Pack credits are keyed by the purchase id, so running this
    /// twice credits once. Returns false if another caller stamped it first.
    async fn apply_effect(&self, purchase: &PurchaseRequest) -> Result<bool, Error> {
        let purchase_id = purchase.purchase_id;
        let key = purchase_id.to_string();
        let applied = match purchase.purchase_type {
            PurchaseType::LivePack => {
                self.wallet
                    .credit_extra(purchase.shop_id, QuotaKind::Live, purchase.quantity, Some(&key))
                    .await
                    .map(|_| ())
            }
            PurchaseType::ReelPack => {
                self.wallet
                    .credit_extra(purchase.shop_id, QuotaKind::Reel, purchase.quantity, Some(&key))
                    .await
                    .map(|_| ())
            }
            PurchaseType::PlanUpgrade => match purchase.target_plan {
                Some(plan) => self.upgrade_plan(purchase.shop_id, plan).await,
                None => Err(Error::Parse(format!("purchase {} has no target plan", purchase_id))),
            },
        };
        if let Err(e) = applied {
            error!("Purchase {} approved but its effect failed, a retry completes it: {:?}", purchase_id, e);
            return Err(e);
        }
        self.purchase_repo
            .mark_purchase_applied(purchase_id, self.clock.now())
            .await
    }

    async fn publish_approved(&self, purchase: &PurchaseRequest) {
        self.event_bus
            .publish(DomainEvent::PurchaseResolved {
                purchase_id: purchase.purchase_id,
                shop_id: purchase.shop_id,
                status: PurchaseStatus::Approved,
            })
            .await;
    }

    async fn upgrade_plan(&self, shop_id: Uuid, plan: Plan) -> Result<(), Error> {
        let shop = self
            .shops
            .mutate(shop_id, |shop| {
                shop.plan = plan;
                Ok(())
            })
            .await?;
        self.wallet.apply_plan(&shop, plan).await?;
        info!("Shop {} moved to plan {}", shop_id, plan);
        Ok(())
    }

    pub async fn reject(&self, purchase_id: Uuid, notes: &str) -> Result<PurchaseRequest, Error> {
        let purchase = self.get_purchase(purchase_id).await?;
        if purchase.status != PurchaseStatus::Pending {
            return Err(Error::AlreadyProcessed { purchase_id, status: purchase.status.to_string() });
        }
        if !self
            .purchase_repo
            .resolve_purchase(purchase_id, PurchaseStatus::Rejected, Some(notes), self.clock.now())
            .await?
        {
            return Err(self.already_processed(purchase_id).await);
        }

        info!("Rejected purchase {} of shop {}: {}", purchase_id, purchase.shop_id, notes);
        self.event_bus
            .publish(DomainEvent::PurchaseResolved {
                purchase_id,
                shop_id: purchase.shop_id,
                status: PurchaseStatus::Rejected,
            })
            .await;
        self.get_purchase(purchase_id).await
    }

    pub async fn cancel(&self, purchase_id: Uuid) -> Result<PurchaseRequest, Error> {
        self.reject(purchase_id, CANCELLED_NOTE).await
    }

    /// Webhook entry point keyed by the provider's preference id.
    pub async fn handle_payment_notification(
        &self,
        external_reference: &str,
        outcome: PaymentOutcome,
    ) -> Result<PurchaseRequest, Error> {
        let purchase = self
            .purchase_repo
            .get_purchase_by_reference(external_reference)
            .await?
            .ok_or_else(|| Error::NotFound(format!("purchase with reference {}", external_reference)))?;
        match outcome {
            PaymentOutcome::Approved => self.approve(purchase.purchase_id).await,
            PaymentOutcome::Rejected => self.reject(purchase.purchase_id, PROVIDER_REJECTED_NOTE).await,
        }
    }

    /// Waits for the purchase to be resolved. REJECTED maps to
    /// `PaymentRejected`, an elapsed timeout to `Timeout`.
    pub async fn await_confirmation(&self, purchase_id: Uuid, timeout: Duration) -> Result<PurchaseRequest, Error> {
        // Subscribe before reading so a resolution in between is not lost.
        let mut rx = self.event_bus.subscribe(Some(64)).await;
        let current = self.get_purchase(purchase_id).await?;
        if current.status == PurchaseStatus::Pending {
            tokio::time::timeout(timeout, async {
                while let Some(event) = rx.recv().await {
                    if let DomainEvent::PurchaseResolved { purchase_id: id, .. } = event {
                        if id == purchase_id {
                            break;
                        }
                    }
                }
            })
            .await?;
        }

        let purchase = self.get_purchase(purchase_id).await?;
        match purchase.status {
            PurchaseStatus::Approved => Ok(purchase),
            PurchaseStatus::Rejected => Err(Error::PaymentRejected(
                purchase.notes.clone().unwrap_or_else(|| format!("purchase {} was rejected", purchase_id)),
            )),
            PurchaseStatus::Pending => Err(Error::EventBus("event bus closed while waiting".into())),
        }
    }
}
