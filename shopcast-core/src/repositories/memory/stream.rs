use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use shopcast_common::error::Error;
use shopcast_common::models::{Stream, StreamStatus};
use shopcast_common::traits::repository_traits::StreamRepository;

#[derive(Default)]
pub struct InMemoryStreamRepository {
    streams: DashMap<Uuid, Stream>,
    /// replaced stream id -> replacement stream id
    replacements: DashMap<Uuid, Uuid>,
}

impl InMemoryStreamRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn collect<F: Fn(&Stream) -> bool>(&self, keep: F) -> Vec<Stream> {
        let mut out: Vec<Stream> = self
            .streams
            .iter()
            .filter(|s| keep(s.value()))
            .map(|s| s.value().clone())
            .collect();
        out.sort_by_key(|s| s.full_date);
        out
    }
}

#[async_trait]
impl StreamRepository for InMemoryStreamRepository {
    async fn insert_stream(&self, stream: &Stream) -> Result<(), Error> {
        if self.streams.contains_key(&stream.stream_id) {
            return Err(Error::Conflict(format!("stream {} already exists", stream.stream_id)));
        }
        if let Some(replaced) = stream.replaces_stream_id {
            if !self.insert_replacement(stream).await? {
                return Err(Error::Conflict(format!("stream {} is already replaced", replaced)));
            }
            return Ok(());
        }
        self.streams.insert(stream.stream_id, stream.clone());
        Ok(())
    }

    async fn insert_replacement(&self, stream: &Stream) -> Result<bool, Error> {
        let Some(replaced) = stream.replaces_stream_id else {
            return Err(Error::Parse(format!("stream {} replaces nothing", stream.stream_id)));
        };
        match self.replacements.entry(replaced) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                self.streams.insert(stream.stream_id, stream.clone());
                slot.insert(stream.stream_id);
                Ok(true)
            }
        }
    }

    async fn get_stream(&self, stream_id: Uuid) -> Result<Option<Stream>, Error> {
        Ok(self.streams.get(&stream_id).map(|s| s.value().clone()))
    }

    async fn update_stream(&self, stream: &Stream) -> Result<bool, Error> {
        let Some(mut stored) = self.streams.get_mut(&stream.stream_id) else {
            return Ok(false);
        };
        if stored.version != stream.version {
            return Ok(false);
        }
        *stored = stream.clone();
        stored.version = stream.version + 1;
        Ok(true)
    }

    async fn list_streams_for_shop(&self, shop_id: Uuid) -> Result<Vec<Stream>, Error> {
        Ok(self.collect(|s| s.shop_id == shop_id))
    }

    async fn list_shop_streams_between(
        &self,
        shop_id: Uuid,
        statuses: &[StreamStatus],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Stream>, Error> {
        Ok(self.collect(|s| {
            s.shop_id == shop_id && statuses.contains(&s.status) && s.full_date >= from && s.full_date < to
        }))
    }

    async fn list_streams_by_status(
        &self,
        statuses: &[StreamStatus],
        scheduled_from: Option<DateTime<Utc>>,
        scheduled_to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Stream>, Error> {
        Ok(self.collect(|s| {
            statuses.contains(&s.status)
                && scheduled_from.map_or(true, |from| s.full_date >= from)
                && scheduled_to.map_or(true, |to| s.full_date <= to)
        }))
    }

    async fn increment_report_count(&self, stream_id: Uuid) -> Result<Option<i32>, Error> {
        Ok(self.streams.get_mut(&stream_id).map(|mut s| {
            s.report_count += 1;
            s.version += 1;
            s.updated_at = Utc::now();
            s.report_count
        }))
    }
}
