// tests/reel_tests.rs

use chrono::Duration;

use shopcast_common::models::{
    Plan, PurchaseOrder, PurchaseType, QuotaOrigin, ReelStatus, ShopStatus, SocialPlatform,
};
use shopcast_common::traits::api::{OperationsApi, PurchaseApi, ReelApi, ShopApi};
use shopcast_core::Error;

mod test_utils;
use test_utils::helpers::*;

#[tokio::test]
async fn test_daily_reel_allotment() -> Result<(), Error> {
    let t = setup_api();
    let shop = active_shop(&t.api, Plan::Estandar).await?;

    let reel = t.api.publish_reel(shop.shop_id, SocialPlatform::Instagram, "  nueva colección ").await?;
    assert_eq!(reel.status, ReelStatus::Active);
    assert_eq!(reel.content, "nueva colección");
    assert_eq!(reel.expires_at, t0() + Duration::hours(24));

    let res = t.api.publish_reel(shop.shop_id, SocialPlatform::Instagram, "otra").await;
    assert!(matches!(res, Err(Error::InsufficientQuota { requested: 1, available: 0, .. })), "got {:?}", res);

    t.advance(Duration::days(1));
    t.api.publish_reel(shop.shop_id, SocialPlatform::Instagram, "otra").await?;
    assert_eq!(t.api.list_shop_reels(shop.shop_id).await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_reel_past_daily_base_draws_from_extra() -> Result<(), Error> {
    let t = setup_api();
    let shop = active_shop(&t.api, Plan::Estandar).await?;

    let first = t.api.publish_reel(shop.shop_id, SocialPlatform::Instagram, "apertura").await?;
    assert_eq!(first.origin, QuotaOrigin::Plan);

    let pack = t
        .api
        .create_purchase_preference(PurchaseOrder {
            shop_id: shop.shop_id,
            purchase_type: PurchaseType::ReelPack,
            quantity: 2,
            target_plan: None,
        })
        .await?;
    t.api.approve_purchase(pack.purchase_id).await?;
    assert_eq!(t.api.available_quota(shop.shop_id).await?.wallet.reel_extra_balance, 2);

    let second = t.api.publish_reel(shop.shop_id, SocialPlatform::Instagram, "segunda tanda").await?;
    assert_eq!(second.origin, QuotaOrigin::Extra);
    let quota = t.api.available_quota(shop.shop_id).await?;
    assert_eq!(quota.wallet.reel_daily_used, 1);
    assert_eq!(quota.wallet.reel_extra_balance, 1);
    assert_eq!(quota.reel, 1);
    Ok(())
}

#[tokio::test]
async fn test_expiry_is_visible_before_the_sweep() -> Result<(), Error> {
    let t = setup_api();
    let shop = active_shop(&t.api, Plan::AltaVisibilidad).await?;
    let reel = t.api.publish_reel(shop.shop_id, SocialPlatform::Instagram, "promo").await?;

    t.advance(Duration::hours(25));
    let listed = t.api.list_shop_reels(shop.shop_id).await?;
    assert_eq!(listed[0].reel_id, reel.reel_id);
    assert_eq!(listed[0].status, ReelStatus::Expired);

    assert_eq!(t.api.run_reel_expiry().await?.expired, 1);
    assert_eq!(t.api.run_reel_expiry().await?.expired, 0);
    Ok(())
}

#[tokio::test]
async fn test_hidden_reels_are_left_to_the_admin() -> Result<(), Error> {
    let t = setup_api();
    let shop = active_shop(&t.api, Plan::MaximaVisibilidad).await?;
    let hidden = t.api.publish_reel(shop.shop_id, SocialPlatform::Instagram, "uno").await?;
    let visible = t.api.publish_reel(shop.shop_id, SocialPlatform::Instagram, "dos").await?;

    assert_eq!(t.api.hide_reel(hidden.reel_id).await?.status, ReelStatus::Hidden);
    assert_eq!(t.api.reactivate_reel(hidden.reel_id).await?.status, ReelStatus::Active);
    t.api.hide_reel(hidden.reel_id).await?;

    t.advance(Duration::hours(25));
    assert_eq!(t.api.run_reel_expiry().await?.expired, 1);

    let reels = t.api.list_shop_reels(shop.shop_id).await?;
    let status_of = |id| reels.iter().find(|r| r.reel_id == id).map(|r| r.status);
    assert_eq!(status_of(hidden.reel_id), Some(ReelStatus::Hidden));
    assert_eq!(status_of(visible.reel_id), Some(ReelStatus::Expired));

    let res = t.api.reactivate_reel(hidden.reel_id).await;
    assert!(matches!(res, Err(Error::InvalidTransition { .. })), "got {:?}", res);
    let res = t.api.hide_reel(visible.reel_id).await;
    assert!(matches!(res, Err(Error::InvalidTransition { .. })), "got {:?}", res);
    Ok(())
}

#[tokio::test]
async fn test_hidden_shop_cannot_publish() -> Result<(), Error> {
    let t = setup_api();
    let shop = active_shop(&t.api, Plan::MaximaVisibilidad).await?;
    t.api.set_shop_status(shop.shop_id, ShopStatus::Hidden).await?;

    let res = t.api.publish_reel(shop.shop_id, SocialPlatform::Instagram, "promo").await;
    assert!(matches!(res, Err(Error::ShopNotSchedulable { .. })), "got {:?}", res);
    assert_eq!(t.api.available_quota(shop.shop_id).await?.reel, 5);
    Ok(())
}
