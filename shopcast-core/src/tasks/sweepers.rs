// src/tasks/sweepers.rs

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use shopcast_common::models::SweeperKind;
use crate::api::CoreApi;

/// Spawns the periodic task for one sweeper. Each tick consults the
/// registry, so a disabled sweeper idles until re-enabled. The task ends
/// when the shutdown flag flips.
pub fn spawn_sweeper_task(
    api: Arc<CoreApi>,
    kind: SweeperKind,
    mut shutdown_rx: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let secs = api.registry.interval_secs(kind).max(1);
        let mut interval = tokio::time::interval(Duration::from_secs(secs));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("Sweeper '{}' running every {}s", kind, secs);

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("Sweeper '{}' stopping", kind);
                        break;
                    }
                    continue;
                }
            }

            if !api.registry.is_enabled(kind) {
                debug!("Sweeper '{}' disabled; skipping tick", kind);
                continue;
            }
            if let Err(e) = api.run_sweeper(kind).await {
                error!("Sweeper '{}' failed: {:?}", kind, e);
            }
        }
    })
}

pub fn spawn_all_sweepers(api: Arc<CoreApi>, shutdown_rx: watch::Receiver<bool>) -> Vec<tokio::task::JoinHandle<()>> {
    SweeperKind::ALL
        .iter()
        .map(|kind| spawn_sweeper_task(api.clone(), *kind, shutdown_rx.clone()))
        .collect()
}
