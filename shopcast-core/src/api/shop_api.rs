// api/shop_api.rs

use async_trait::async_trait;
use uuid::Uuid;

use shopcast_common::models::{AvailableQuota, NewShop, Penalty, Shop, ShopStatus, SocialPlatform};
use shopcast_common::traits::api::ShopApi;
use crate::api::CoreApi;
use crate::Error;

#[async_trait]
impl ShopApi for CoreApi {
    async fn create_shop(&self, new_shop: NewShop) -> Result<Shop, Error> {
        self.shops.create_shop(new_shop).await
    }

    async fn get_shop(&self, shop_id: Uuid) -> Result<Shop, Error> {
        self.shops.get_shop(shop_id).await
    }

    async fn set_shop_status(&self, shop_id: Uuid, status: ShopStatus) -> Result<Shop, Error> {
        self.shops.set_shop_status(shop_id, status).await
    }

    async fn set_social_handle(&self, shop_id: Uuid, platform: SocialPlatform, handle: Option<String>) -> Result<Shop, Error> {
        self.shops.set_social_handle(shop_id, platform, handle).await
    }

    async fn penalize_shop(&self, shop_id: Uuid, reason: &str) -> Result<Penalty, Error> {
        self.shops.penalize_shop(shop_id, reason).await
    }

    async fn lift_suspension(&self, shop_id: Uuid) -> Result<Shop, Error> {
        self.shops.lift_suspension(shop_id).await
    }

    async fn list_penalties(&self, shop_id: Uuid) -> Result<Vec<Penalty>, Error> {
        self.shops.list_penalties(shop_id).await
    }

    async fn available_quota(&self, shop_id: Uuid) -> Result<AvailableQuota, Error> {
        self.wallet.available_quota(shop_id).await
    }
}
