// tests/sanction_tests.rs

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use shopcast_common::models::{
    Plan, ScheduleStreamRequest, ShopStatus, SocialPlatform, StreamPatch, StreamStatus,
};
use shopcast_common::traits::api::{OperationsApi, ReelApi, ShopApi, StreamApi};
use shopcast_core::services::sanction_engine::MISSED_BROADCAST_REASON;
use shopcast_core::{CoreApi, EngineConfig, Error};

mod test_utils;
use test_utils::flaky::FlakyRepos;
use test_utils::helpers::*;

/// Reports a stream past the threshold ten minutes in, then moves the
/// clock to 36 minutes after its start.
async fn get_reported(t: &TestApi, stream_id: Uuid, at: DateTime<Utc>, reports: usize) -> Result<(), Error> {
    t.set_time(at + Duration::minutes(10));
    report_times(&t.api, stream_id, reports).await?;
    t.set_time(at + Duration::minutes(36));
    Ok(())
}

async fn admin_schedule(api: &CoreApi, shop_id: Uuid, at: DateTime<Utc>) -> Result<Uuid, Error> {
    let stream = api
        .schedule_stream(ScheduleStreamRequest {
            shop_id,
            title: "Vivo".into(),
            full_date: at,
            platform: SocialPlatform::Instagram,
            admin_override: true,
        })
        .await?;
    Ok(stream.stream_id)
}

#[tokio::test]
async fn test_reported_stream_is_missed_and_penalized() -> Result<(), Error> {
    let t = setup_api();
    let shop = active_shop(&t.api, Plan::MaximaVisibilidad).await?;
    let stream = schedule_at(&t.api, shop.shop_id, slot()).await?;
    get_reported(&t, stream.stream_id, slot(), 5).await?;

    let summary = t.api.run_sanctions().await?;
    assert_eq!(summary.candidates, 1);
    assert_eq!(summary.sanctioned, 1);
    assert_eq!(summary.reprogrammed, 1);
    assert_eq!(summary.suspended, 0);

    assert_eq!(t.api.get_stream(stream.stream_id).await?.status, StreamStatus::Missed);

    let penalties = t.api.list_penalties(shop.shop_id).await?;
    assert_eq!(penalties.len(), 1);
    assert_eq!(penalties[0].stream_id, Some(stream.stream_id));
    assert_eq!(penalties[0].reason, MISSED_BROADCAST_REASON);
    assert!(penalties[0].active);

    let replacement = t
        .api
        .list_shop_streams(shop.shop_id)
        .await?
        .into_iter()
        .find(|s| s.status == StreamStatus::PendingReprogrammation)
        .expect("replacement stream");
    assert_eq!(replacement.replaces_stream_id, Some(stream.stream_id));
    assert_eq!(replacement.quota_origin, stream.quota_origin);

    // The penalty blocks new streams.
    let res = schedule_at(&t.api, shop.shop_id, slot() + Duration::days(2)).await;
    assert!(matches!(res, Err(Error::ShopNotSchedulable { .. })));
    Ok(())
}

#[tokio::test]
async fn test_second_run_changes_nothing() -> Result<(), Error> {
    let t = setup_api();
    let shop = active_shop(&t.api, Plan::MaximaVisibilidad).await?;
    let stream = schedule_at(&t.api, shop.shop_id, slot()).await?;
    get_reported(&t, stream.stream_id, slot(), 5).await?;

    t.api.run_sanctions().await?;
    let streams_before = t.api.list_shop_streams(shop.shop_id).await?.len();

    let again = t.api.run_sanctions().await?;
    assert_eq!(again.candidates, 0);
    assert_eq!(again.sanctioned, 0);
    assert_eq!(t.api.list_penalties(shop.shop_id).await?.len(), 1);
    assert_eq!(t.api.list_shop_streams(shop.shop_id).await?.len(), streams_before);
    Ok(())
}

#[tokio::test]
async fn test_failed_missed_flip_is_finished_next_tick() -> Result<(), Error> {
    let flaky = FlakyRepos::new();
    let t = setup_api_with_repos(flaky.repositories());
    let shop = active_shop(&t.api, Plan::MaximaVisibilidad).await?;
    let stream = schedule_at(&t.api, shop.shop_id, slot()).await?;
    get_reported(&t, stream.stream_id, slot(), 5).await?;

    flaky.streams.fail_update.arm();
    let first = t.api.run_sanctions().await?;
    assert_eq!(first.sanctioned, 0);
    assert_eq!(first.errors.len(), 1);
    assert_eq!(first.errors[0].record_id, stream.stream_id);
    // Consequences are in place, the stream is still a candidate.
    assert_eq!(t.api.get_stream(stream.stream_id).await?.status, StreamStatus::Upcoming);
    assert_eq!(t.api.list_penalties(shop.shop_id).await?.len(), 1);
    assert_eq!(t.api.list_shop_streams(shop.shop_id).await?.len(), 2);

    let second = t.api.run_sanctions().await?;
    assert_eq!(second.sanctioned, 1);
    assert!(second.errors.is_empty());
    assert_eq!(t.api.get_stream(stream.stream_id).await?.status, StreamStatus::Missed);
    assert_eq!(t.api.list_penalties(shop.shop_id).await?.len(), 1);
    let streams = t.api.list_shop_streams(shop.shop_id).await?;
    assert_eq!(streams.len(), 2);
    assert_eq!(
        streams.iter().filter(|s| s.replaces_stream_id == Some(stream.stream_id)).count(),
        1
    );
    Ok(())
}

#[tokio::test]
async fn test_failed_penalty_write_is_retried_next_tick() -> Result<(), Error> {
    let flaky = FlakyRepos::new();
    let t = setup_api_with_repos(flaky.repositories());
    let shop = active_shop(&t.api, Plan::MaximaVisibilidad).await?;
    let stream = schedule_at(&t.api, shop.shop_id, slot()).await?;
    get_reported(&t, stream.stream_id, slot(), 5).await?;

    flaky.penalties.fail_insert.arm();
    let first = t.api.run_sanctions().await?;
    assert_eq!(first.errors.len(), 1);
    assert_eq!(t.api.get_stream(stream.stream_id).await?.status, StreamStatus::Upcoming);
    assert!(t.api.list_penalties(shop.shop_id).await?.is_empty());

    let second = t.api.run_sanctions().await?;
    assert_eq!(second.sanctioned, 1);
    assert_eq!(second.reprogrammed, 1);
    assert_eq!(t.api.get_stream(stream.stream_id).await?.status, StreamStatus::Missed);
    assert_eq!(t.api.list_penalties(shop.shop_id).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_failed_replacement_is_created_next_tick() -> Result<(), Error> {
    let flaky = FlakyRepos::new();
    let t = setup_api_with_repos(flaky.repositories());
    let shop = active_shop(&t.api, Plan::MaximaVisibilidad).await?;
    let stream = schedule_at(&t.api, shop.shop_id, slot()).await?;
    get_reported(&t, stream.stream_id, slot(), 5).await?;

    flaky.streams.fail_replacement.arm();
    let first = t.api.run_sanctions().await?;
    assert_eq!(first.errors.len(), 1);
    assert_eq!(t.api.get_stream(stream.stream_id).await?.status, StreamStatus::Upcoming);
    assert_eq!(t.api.list_shop_streams(shop.shop_id).await?.len(), 1);

    let second = t.api.run_sanctions().await?;
    assert_eq!(second.sanctioned, 1);
    assert_eq!(second.reprogrammed, 1);
    let replacement = t
        .api
        .list_shop_streams(shop.shop_id)
        .await?
        .into_iter()
        .find(|s| s.replaces_stream_id == Some(stream.stream_id))
        .expect("replacement stream");
    assert_eq!(replacement.status, StreamStatus::PendingReprogrammation);
    assert_eq!(t.api.list_penalties(shop.shop_id).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_below_threshold_is_left_alone() -> Result<(), Error> {
    let t = setup_api();
    let shop = active_shop(&t.api, Plan::MaximaVisibilidad).await?;
    let stream = schedule_at(&t.api, shop.shop_id, slot()).await?;
    get_reported(&t, stream.stream_id, slot(), 4).await?;

    let summary = t.api.run_sanctions().await?;
    assert_eq!(summary.sanctioned, 0);
    assert_eq!(t.api.get_stream(stream.stream_id).await?.status, StreamStatus::Upcoming);
    assert!(t.api.list_penalties(shop.shop_id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_auto_reprogram_can_be_turned_off() -> Result<(), Error> {
    let config = EngineConfig { auto_reprogram: false, ..EngineConfig::default() };
    let t = setup_api_with_config(config);
    let shop = active_shop(&t.api, Plan::MaximaVisibilidad).await?;
    let stream = schedule_at(&t.api, shop.shop_id, slot()).await?;
    get_reported(&t, stream.stream_id, slot(), 5).await?;

    let summary = t.api.run_sanctions().await?;
    assert_eq!(summary.sanctioned, 1);
    assert_eq!(summary.reprogrammed, 0);
    assert_eq!(t.api.list_shop_streams(shop.shop_id).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_rescheduling_replacement_does_not_debit() -> Result<(), Error> {
    let t = setup_api();
    let shop = active_shop(&t.api, Plan::MaximaVisibilidad).await?;
    let stream = schedule_at(&t.api, shop.shop_id, slot()).await?;
    get_reported(&t, stream.stream_id, slot(), 5).await?;
    t.api.run_sanctions().await?;

    let replacement = t
        .api
        .list_shop_streams(shop.shop_id)
        .await?
        .into_iter()
        .find(|s| s.replaces_stream_id == Some(stream.stream_id))
        .expect("replacement stream");
    let before = t.api.available_quota(shop.shop_id).await?.live;

    let new_date = slot() + Duration::days(2);
    let rescheduled = t
        .api
        .update_stream(replacement.stream_id, StreamPatch { full_date: Some(new_date), ..Default::default() }, false)
        .await?;
    assert_eq!(rescheduled.status, StreamStatus::Upcoming);
    assert_eq!(rescheduled.full_date, new_date);
    assert_eq!(rescheduled.report_count, 0);
    assert_eq!(t.api.available_quota(shop.shop_id).await?.live, before);
    Ok(())
}

#[tokio::test]
async fn test_three_misses_suspend_agenda_until_release() -> Result<(), Error> {
    let t = setup_api();
    let shop = active_shop(&t.api, Plan::MaximaVisibilidad).await?;

    let mut suspended = 0;
    for day in 0..3 {
        let at = slot() + Duration::days(day);
        t.set_time(t0());
        let stream_id = admin_schedule(&t.api, shop.shop_id, at).await?;
        get_reported(&t, stream_id, at, 5).await?;
        let summary = t.api.run_sanctions().await?;
        assert_eq!(summary.sanctioned, 1, "day {}", day);
        suspended += summary.suspended;
    }
    assert_eq!(suspended, 1);

    let now = slot() + Duration::days(2) + Duration::minutes(36);
    let shop_now = t.api.get_shop(shop.shop_id).await?;
    assert_eq!(shop_now.status, ShopStatus::AgendaSuspended);
    assert_eq!(shop_now.agenda_suspended_until, Some(now + Duration::days(7)));

    // Streams are frozen, reels are not.
    t.api.publish_reel(shop.shop_id, SocialPlatform::Instagram, "sigue la promo").await?;

    t.set_time(now + Duration::days(7) - Duration::minutes(1));
    assert_eq!(t.api.run_sanctions().await?.released, 0);

    t.set_time(now + Duration::days(7));
    assert_eq!(t.api.run_sanctions().await?.released, 1);
    let released = t.api.get_shop(shop.shop_id).await?;
    assert_eq!(released.status, ShopStatus::Active);
    assert_eq!(released.agenda_suspended_until, None);
    // Penalty records outlive the suspension.
    assert_eq!(t.api.list_penalties(shop.shop_id).await?.iter().filter(|p| p.active).count(), 3);
    Ok(())
}

#[tokio::test]
async fn test_lift_suspension_clears_penalties() -> Result<(), Error> {
    let t = setup_api();
    let shop = active_shop(&t.api, Plan::MaximaVisibilidad).await?;
    let stream = schedule_at(&t.api, shop.shop_id, slot()).await?;
    get_reported(&t, stream.stream_id, slot(), 5).await?;
    t.api.run_sanctions().await?;

    let shop_after = t.api.lift_suspension(shop.shop_id).await?;
    assert_eq!(shop_after.status, ShopStatus::Active);
    let penalties = t.api.list_penalties(shop.shop_id).await?;
    assert!(penalties.iter().all(|p| !p.active && p.lifted_at.is_some()));

    schedule_at(&t.api, shop.shop_id, slot() + Duration::days(2)).await?;
    Ok(())
}
