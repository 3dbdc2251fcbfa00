use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use shopcast_common::error::Error;
use shopcast_common::models::{Shop, ShopStatus};
use shopcast_common::traits::repository_traits::ShopRepository;

#[derive(Default)]
pub struct InMemoryShopRepository {
    shops: DashMap<Uuid, Shop>,
}

impl InMemoryShopRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ShopRepository for InMemoryShopRepository {
    async fn create_shop(&self, shop: &Shop) -> Result<(), Error> {
        if self.shops.contains_key(&shop.shop_id) {
            return Err(Error::Conflict(format!("shop {} already exists", shop.shop_id)));
        }
        self.shops.insert(shop.shop_id, shop.clone());
        Ok(())
    }

    async fn get_shop(&self, shop_id: Uuid) -> Result<Option<Shop>, Error> {
        Ok(self.shops.get(&shop_id).map(|s| s.value().clone()))
    }

    async fn update_shop(&self, shop: &Shop) -> Result<bool, Error> {
        let Some(mut stored) = self.shops.get_mut(&shop.shop_id) else {
            return Ok(false);
        };
        if stored.version != shop.version {
            return Ok(false);
        }
        let legacy = stored.legacy_quota.clone();
        *stored = shop.clone();
        stored.legacy_quota = legacy;
        stored.version = shop.version + 1;
        Ok(true)
    }

    async fn list_shops_by_status(&self, status: ShopStatus) -> Result<Vec<Shop>, Error> {
        let mut out: Vec<Shop> = self
            .shops
            .iter()
            .filter(|s| s.status == status)
            .map(|s| s.value().clone())
            .collect();
        out.sort_by_key(|s| s.created_at);
        Ok(out)
    }
}
