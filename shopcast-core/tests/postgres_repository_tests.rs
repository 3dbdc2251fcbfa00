// tests/postgres_repository_tests.rs
//
// Runs only when TEST_DATABASE_URL points at a scratch database.

use chrono::Duration;
use futures_util::future::join_all;

use shopcast_common::models::{
    PaymentOutcome, Plan, PurchaseOrder, PurchaseType, ShopStatus, StreamEvent, StreamStatus,
};
use shopcast_common::traits::api::{OperationsApi, PurchaseApi, ShopApi, StreamApi};
use shopcast_common::traits::repository_traits::StreamRepository;
use shopcast_core::Error;

mod test_utils;
use test_utils::helpers::*;

#[tokio::test]
async fn test_postgres_schedule_and_sanction() -> Result<(), Error> {
    let Some(db) = setup_test_database().await? else {
        return Ok(());
    };
    let t = postgres_api(&db);
    let shop = active_shop(&t.api, Plan::MaximaVisibilidad).await?;

    let stream = schedule_at(&t.api, shop.shop_id, slot()).await?;
    assert_eq!(t.api.available_quota(shop.shop_id).await?.live, 2);
    let dup = schedule_at(&t.api, shop.shop_id, slot() + Duration::hours(1)).await;
    assert!(matches!(dup, Err(Error::DuplicateDailySlot { .. })), "got {:?}", dup);

    t.set_time(slot() + Duration::minutes(10));
    report_times(&t.api, stream.stream_id, 5).await?;
    t.set_time(slot() + Duration::minutes(36));

    // Other shops in a shared database may contribute candidates too.
    assert!(t.api.run_sanctions().await?.sanctioned >= 1);
    assert_eq!(t.api.get_stream(stream.stream_id).await?.status, StreamStatus::Missed);
    assert_eq!(t.api.list_penalties(shop.shop_id).await?.len(), 1);

    t.api.run_sanctions().await?;
    assert_eq!(t.api.list_penalties(shop.shop_id).await?.len(), 1);
    assert_eq!(t.api.get_shop(shop.shop_id).await?.status, ShopStatus::Active);
    Ok(())
}

#[tokio::test]
async fn test_postgres_debits_do_not_oversell() -> Result<(), Error> {
    let Some(db) = setup_test_database().await? else {
        return Ok(());
    };
    let t = postgres_api(&db);
    let shop = active_shop(&t.api, Plan::AltaVisibilidad).await?;

    let tasks = (0..4).map(|day| {
        let api = t.api.clone();
        let shop_id = shop.shop_id;
        tokio::spawn(async move { schedule_at(&api, shop_id, slot() + Duration::days(day)).await })
    });
    let ok = join_all(tasks)
        .await
        .into_iter()
        .filter(|r| matches!(r, Ok(Ok(_))))
        .count();
    assert_eq!(ok, 1);
    assert_eq!(t.api.available_quota(shop.shop_id).await?.live, 0);
    Ok(())
}

#[tokio::test]
async fn test_postgres_purchase_applies_once() -> Result<(), Error> {
    let Some(db) = setup_test_database().await? else {
        return Ok(());
    };
    let t = postgres_api(&db);
    let shop = active_shop(&t.api, Plan::Estandar).await?;

    let purchase = t
        .api
        .create_purchase_preference(PurchaseOrder {
            shop_id: shop.shop_id,
            purchase_type: PurchaseType::LivePack,
            quantity: 2,
            target_plan: None,
        })
        .await?;
    let reference = purchase.external_reference.clone().unwrap_or_default();
    t.api.handle_payment_notification(&reference, PaymentOutcome::Approved).await?;
    let again = t.api.handle_payment_notification(&reference, PaymentOutcome::Approved).await;
    assert!(matches!(again, Err(Error::AlreadyProcessed { .. })), "got {:?}", again);
    assert_eq!(t.api.available_quota(shop.shop_id).await?.live, 2);
    assert!(t.api.get_purchase(purchase.purchase_id).await?.applied_at.is_some());
    Ok(())
}

#[tokio::test]
async fn test_postgres_replacement_is_written_once() -> Result<(), Error> {
    let Some(db) = setup_test_database().await? else {
        return Ok(());
    };
    let t = postgres_api(&db);
    let shop = active_shop(&t.api, Plan::MaximaVisibilidad).await?;
    let missed = schedule_at(&t.api, shop.shop_id, slot()).await?;

    let mut first = missed.clone();
    first.stream_id = uuid::Uuid::new_v4();
    first.status = StreamStatus::Missed.transition(StreamEvent::Reprogram)?;
    first.replaces_stream_id = Some(missed.stream_id);
    let mut second = first.clone();
    second.stream_id = uuid::Uuid::new_v4();

    assert!(t.repos.streams.insert_replacement(&first).await?);
    assert!(!t.repos.streams.insert_replacement(&second).await?);
    assert!(t.repos.streams.get_stream(second.stream_id).await?.is_none());
    Ok(())
}
