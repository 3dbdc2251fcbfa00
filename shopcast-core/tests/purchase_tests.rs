// tests/purchase_tests.rs

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use mockall::mock;

use shopcast_common::models::{
    PaymentOutcome, PaymentPreference, Plan, PreferenceRequest, PurchaseOrder, PurchaseStatus,
    PurchaseType,
};
use shopcast_common::traits::api::{PurchaseApi, ShopApi};
use shopcast_common::traits::collaborator_traits::PaymentGateway;
use shopcast_core::services::purchase_ledger::{CANCELLED_NOTE, PROVIDER_REJECTED_NOTE};
use shopcast_core::{EngineConfig, Error};

mod test_utils;
use test_utils::flaky::FlakyRepos;
use test_utils::helpers::*;

mock! {
    pub Gateway {}

    #[async_trait]
    impl PaymentGateway for Gateway {
        async fn create_preference(&self, request: &PreferenceRequest) -> Result<PaymentPreference, Error>;
    }
}

fn live_pack(shop_id: uuid::Uuid, quantity: i32) -> PurchaseOrder {
    PurchaseOrder { shop_id, purchase_type: PurchaseType::LivePack, quantity, target_plan: None }
}

fn upgrade(shop_id: uuid::Uuid, plan: Plan) -> PurchaseOrder {
    PurchaseOrder { shop_id, purchase_type: PurchaseType::PlanUpgrade, quantity: 1, target_plan: Some(plan) }
}

#[tokio::test]
async fn test_live_pack_credits_once() -> Result<(), Error> {
    let t = setup_api();
    let shop = active_shop(&t.api, Plan::Estandar).await?;

    let purchase = t.api.create_purchase_preference(live_pack(shop.shop_id, 2)).await?;
    assert_eq!(purchase.status, PurchaseStatus::Pending);
    assert_eq!(purchase.amount_cents, 500_000);
    assert!(purchase.external_reference.as_deref().unwrap_or_default().starts_with("manual-"));
    assert_eq!(t.api.available_quota(shop.shop_id).await?.live, 0);

    let approved = t.api.approve_purchase(purchase.purchase_id).await?;
    assert_eq!(approved.status, PurchaseStatus::Approved);
    assert!(approved.resolved_at.is_some());
    assert_eq!(t.api.available_quota(shop.shop_id).await?.live, 2);

    let again = t.api.approve_purchase(purchase.purchase_id).await;
    assert!(matches!(again, Err(Error::AlreadyProcessed { .. })), "got {:?}", again);
    let rejected = t.api.reject_purchase(purchase.purchase_id, "late").await;
    assert!(matches!(rejected, Err(Error::AlreadyProcessed { .. })), "got {:?}", rejected);
    assert_eq!(t.api.available_quota(shop.shop_id).await?.live, 2);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_approvals_apply_once() -> Result<(), Error> {
    let t = setup_api();
    let shop = active_shop(&t.api, Plan::Estandar).await?;
    let purchase = t.api.create_purchase_preference(live_pack(shop.shop_id, 3)).await?;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let api = t.api.clone();
        let id = purchase.purchase_id;
        handles.push(tokio::spawn(async move { api.approve_purchase(id).await }));
    }
    let mut ok = 0;
    for h in handles {
        match h.await.expect("task panicked") {
            Ok(_) => ok += 1,
            Err(Error::AlreadyProcessed { .. }) => {}
            Err(e) => panic!("unexpected error: {:?}", e),
        }
    }
    assert_eq!(ok, 1);
    assert_eq!(t.api.available_quota(shop.shop_id).await?.live, 3);
    Ok(())
}

#[tokio::test]
async fn test_failed_credit_is_completed_by_next_approval() -> Result<(), Error> {
    let flaky = FlakyRepos::new();
    let t = setup_api_with_repos(flaky.repositories());
    let shop = active_shop(&t.api, Plan::Estandar).await?;
    let purchase = t.api.create_purchase_preference(live_pack(shop.shop_id, 2)).await?;

    flaky.wallets.fail_credit.arm();
    let first = t.api.approve_purchase(purchase.purchase_id).await;
    assert!(matches!(first, Err(Error::Io(_))), "got {:?}", first);
    let owed = t.api.get_purchase(purchase.purchase_id).await?;
    assert_eq!(owed.status, PurchaseStatus::Approved);
    assert_eq!(owed.applied_at, None);
    assert_eq!(t.api.available_quota(shop.shop_id).await?.live, 0);

    // The webhook is delivered again.
    let retry = t.api.approve_purchase(purchase.purchase_id).await;
    assert!(matches!(retry, Err(Error::AlreadyProcessed { .. })), "got {:?}", retry);
    assert!(t.api.get_purchase(purchase.purchase_id).await?.applied_at.is_some());
    assert_eq!(t.api.available_quota(shop.shop_id).await?.live, 2);

    let third = t.api.approve_purchase(purchase.purchase_id).await;
    assert!(matches!(third, Err(Error::AlreadyProcessed { .. })), "got {:?}", third);
    assert_eq!(t.api.available_quota(shop.shop_id).await?.live, 2);
    Ok(())
}

#[tokio::test]
async fn test_plan_upgrade_changes_allotments() -> Result<(), Error> {
    let t = setup_api();
    let shop = active_shop(&t.api, Plan::Estandar).await?;

    let purchase = t.api.create_purchase_preference(upgrade(shop.shop_id, Plan::MaximaVisibilidad)).await?;
    assert_eq!(purchase.amount_cents, 3_000_000);
    t.api.approve_purchase(purchase.purchase_id).await?;

    assert_eq!(t.api.get_shop(shop.shop_id).await?.plan, Plan::MaximaVisibilidad);
    let quota = t.api.available_quota(shop.shop_id).await?;
    assert_eq!(quota.live, 3);
    assert_eq!(quota.reel, 5);
    Ok(())
}

#[tokio::test]
async fn test_invalid_orders_are_not_initiated() -> Result<(), Error> {
    let t = setup_api();
    let shop = active_shop(&t.api, Plan::AltaVisibilidad).await?;

    for order in [
        upgrade(shop.shop_id, Plan::Estandar),
        upgrade(shop.shop_id, Plan::AltaVisibilidad),
        live_pack(shop.shop_id, 0),
        PurchaseOrder { shop_id: shop.shop_id, purchase_type: PurchaseType::PlanUpgrade, quantity: 1, target_plan: None },
    ] {
        let res = t.api.create_purchase_preference(order.clone()).await;
        assert!(matches!(res, Err(Error::PaymentNotInitiated(_))), "order {:?} gave {:?}", order, res);
    }
    Ok(())
}

#[tokio::test]
async fn test_gateway_failure_records_nothing() -> Result<(), Error> {
    let mut gateway = MockGateway::new();
    gateway
        .expect_create_preference()
        .times(1)
        .returning(|_| Err(Error::Parse("provider down".into())));
    let t = build_api(EngineConfig::default(), Arc::new(gateway), Arc::new(RecordingSink::default()));
    let shop = active_shop(&t.api, Plan::Estandar).await?;

    let res = t.api.create_purchase_preference(live_pack(shop.shop_id, 1)).await;
    assert!(matches!(res, Err(Error::PaymentNotInitiated(_))), "got {:?}", res);
    Ok(())
}

#[tokio::test]
async fn test_gateway_receives_priced_request() -> Result<(), Error> {
    let mut gateway = MockGateway::new();
    gateway
        .expect_create_preference()
        .withf(|req| req.quantity == 4 && req.unit_price_cents == 80_000)
        .times(1)
        .returning(|_| {
            Ok(PaymentPreference {
                preference_id: "pref-123".into(),
                checkout_url: Some("https://pay.example.test/checkout/pref-123".into()),
            })
        });
    let t = build_api(EngineConfig::default(), Arc::new(gateway), Arc::new(RecordingSink::default()));
    let shop = active_shop(&t.api, Plan::Estandar).await?;

    let order = PurchaseOrder { shop_id: shop.shop_id, purchase_type: PurchaseType::ReelPack, quantity: 4, target_plan: None };
    let purchase = t.api.create_purchase_preference(order).await?;
    assert_eq!(purchase.external_reference.as_deref(), Some("pref-123"));
    assert_eq!(purchase.amount_cents, 320_000);

    let approved = t.api.handle_payment_notification("pref-123", PaymentOutcome::Approved).await?;
    assert_eq!(approved.status, PurchaseStatus::Approved);
    assert_eq!(t.api.available_quota(shop.shop_id).await?.reel, 5);
    Ok(())
}

#[tokio::test]
async fn test_provider_rejection() -> Result<(), Error> {
    let t = setup_api();
    let shop = active_shop(&t.api, Plan::Estandar).await?;
    let purchase = t.api.create_purchase_preference(live_pack(shop.shop_id, 1)).await?;
    let reference = purchase.external_reference.clone().unwrap_or_default();

    let rejected = t.api.handle_payment_notification(&reference, PaymentOutcome::Rejected).await?;
    assert_eq!(rejected.status, PurchaseStatus::Rejected);
    assert_eq!(rejected.notes.as_deref(), Some(PROVIDER_REJECTED_NOTE));
    assert_eq!(t.api.available_quota(shop.shop_id).await?.live, 0);

    let res = t.api.handle_payment_notification("manual-unknown", PaymentOutcome::Approved).await;
    assert!(matches!(res, Err(Error::NotFound(_))), "got {:?}", res);
    Ok(())
}

#[tokio::test]
async fn test_await_confirmation_outcomes() -> Result<(), Error> {
    let t = setup_api();
    let shop = active_shop(&t.api, Plan::Estandar).await?;

    let purchase = t.api.create_purchase_preference(live_pack(shop.shop_id, 1)).await?;
    let api = t.api.clone();
    let id = purchase.purchase_id;
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        api.approve_purchase(id).await
    });
    let confirmed = t.api.await_confirmation(id, Duration::from_secs(5)).await?;
    assert_eq!(confirmed.status, PurchaseStatus::Approved);

    // Already resolved: returns without waiting.
    t.api.await_confirmation(id, Duration::from_millis(1)).await?;

    let cancelled = t.api.create_purchase_preference(live_pack(shop.shop_id, 1)).await?;
    let res = t.api.cancel_purchase(cancelled.purchase_id).await?;
    assert_eq!(res.notes.as_deref(), Some(CANCELLED_NOTE));
    let waited = t.api.await_confirmation(cancelled.purchase_id, Duration::from_secs(1)).await;
    assert!(matches!(waited, Err(Error::PaymentRejected(_))), "got {:?}", waited);

    let pending = t.api.create_purchase_preference(live_pack(shop.shop_id, 1)).await?;
    let waited = t.api.await_confirmation(pending.purchase_id, Duration::from_millis(50)).await;
    assert!(matches!(waited, Err(Error::Timeout(_))), "got {:?}", waited);
    assert_eq!(t.api.get_purchase(pending.purchase_id).await?.status, PurchaseStatus::Pending);
    Ok(())
}
