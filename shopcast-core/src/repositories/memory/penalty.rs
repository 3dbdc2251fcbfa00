use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use shopcast_common::error::Error;
use shopcast_common::models::Penalty;
use shopcast_common::traits::repository_traits::PenaltyRepository;

#[derive(Default)]
pub struct InMemoryPenaltyRepository {
    penalties: Mutex<Vec<Penalty>>,
}

impl InMemoryPenaltyRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PenaltyRepository for InMemoryPenaltyRepository {
    async fn insert_penalty_once(&self, penalty: &Penalty) -> Result<bool, Error> {
        let mut all = self.penalties.lock();
        let duplicate = penalty.stream_id.is_some()
            && all
                .iter()
                .any(|p| p.shop_id == penalty.shop_id && p.stream_id == penalty.stream_id);
        if duplicate {
            return Ok(false);
        }
        all.push(penalty.clone());
        Ok(true)
    }

    async fn list_penalties(&self, shop_id: Uuid) -> Result<Vec<Penalty>, Error> {
        let mut out: Vec<Penalty> = self
            .penalties
            .lock()
            .iter()
            .filter(|p| p.shop_id == shop_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(out)
    }

    async fn count_active_penalties(&self, shop_id: Uuid) -> Result<i64, Error> {
        let count = self
            .penalties
            .lock()
            .iter()
            .filter(|p| p.shop_id == shop_id && p.active)
            .count();
        Ok(count as i64)
    }

    async fn lift_penalties(&self, shop_id: Uuid, lifted_at: DateTime<Utc>) -> Result<u64, Error> {
        let mut lifted = 0;
        for p in self.penalties.lock().iter_mut() {
            if p.shop_id == shop_id && p.active {
                p.active = false;
                p.lifted_at = Some(lifted_at);
                lifted += 1;
            }
        }
        Ok(lifted)
    }
}
