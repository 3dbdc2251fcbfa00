use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use shopcast_common::error::Error;
use shopcast_common::models::{Reel, ReelStatus};
use shopcast_common::traits::repository_traits::ReelRepository;

#[derive(Default)]
pub struct InMemoryReelRepository {
    reels: DashMap<Uuid, Reel>,
}

impl InMemoryReelRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReelRepository for InMemoryReelRepository {
    async fn insert_reel(&self, reel: &Reel) -> Result<(), Error> {
        if self.reels.contains_key(&reel.reel_id) {
            return Err(Error::Conflict(format!("reel {} already exists", reel.reel_id)));
        }
        self.reels.insert(reel.reel_id, reel.clone());
        Ok(())
    }

    async fn get_reel(&self, reel_id: Uuid) -> Result<Option<Reel>, Error> {
        Ok(self.reels.get(&reel_id).map(|r| r.value().clone()))
    }

    async fn update_reel(&self, reel: &Reel) -> Result<bool, Error> {
        let Some(mut stored) = self.reels.get_mut(&reel.reel_id) else {
            return Ok(false);
        };
        if stored.version != reel.version {
            return Ok(false);
        }
        *stored = reel.clone();
        stored.version = reel.version + 1;
        Ok(true)
    }

    async fn list_reels_for_shop(&self, shop_id: Uuid) -> Result<Vec<Reel>, Error> {
        let mut out: Vec<Reel> = self
            .reels
            .iter()
            .filter(|r| r.shop_id == shop_id)
            .map(|r| r.value().clone())
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn list_expired_active(&self, now: DateTime<Utc>) -> Result<Vec<Reel>, Error> {
        let mut out: Vec<Reel> = self
            .reels
            .iter()
            .filter(|r| r.status == ReelStatus::Active && r.expires_at < now)
            .map(|r| r.value().clone())
            .collect();
        out.sort_by_key(|r| r.expires_at);
        Ok(out)
    }

    async fn count_reels_created_between(
        &self,
        shop_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, Error> {
        let count = self
            .reels
            .iter()
            .filter(|r| r.shop_id == shop_id && r.created_at >= from && r.created_at < to)
            .count();
        Ok(count as i64)
    }
}
