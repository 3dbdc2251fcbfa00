// api/reel_api.rs

use async_trait::async_trait;
use uuid::Uuid;

use shopcast_common::models::{Reel, SocialPlatform};
use shopcast_common::traits::api::ReelApi;
use crate::api::CoreApi;
use crate::Error;

#[async_trait]
impl ReelApi for CoreApi {
    async fn publish_reel(&self, shop_id: Uuid, platform: SocialPlatform, content: &str) -> Result<Reel, Error> {
        self.reels.publish(shop_id, platform, content).await
    }

    async fn hide_reel(&self, reel_id: Uuid) -> Result<Reel, Error> {
        self.reels.hide(reel_id).await
    }

    async fn reactivate_reel(&self, reel_id: Uuid) -> Result<Reel, Error> {
        self.reels.reactivate(reel_id).await
    }

    async fn list_shop_reels(&self, shop_id: Uuid) -> Result<Vec<Reel>, Error> {
        self.reels.list_shop_reels(shop_id).await
    }
}
