//! shopcast-server/src/server.rs
//!
//! Runs the HTTP API and the sweepers until Ctrl-C.

use std::net::SocketAddr;
use axum_server::Handle;
use tracing::{error, info};

use shopcast_core::tasks::spawn_all_sweepers;
use shopcast_core::Error;

use crate::context::ServerContext;
use crate::routes;
use crate::Args;

pub async fn run_server(args: Args) -> Result<(), Error> {
    let ctx = ServerContext::new(&args).await?;
    let event_bus = ctx.api.event_bus.clone();

    // 1) Sweepers
    let sweeper_handles = if args.no_sweepers {
        info!("Sweepers not spawned (--no-sweepers).");
        Vec::new()
    } else {
        spawn_all_sweepers(ctx.api.clone(), event_bus.shutdown_rx.clone())
    };

    // 2) HTTP API
    let addr: SocketAddr = args
        .server_addr
        .parse()
        .map_err(|e| Error::Config(format!("Invalid --server-addr '{}': {}", args.server_addr, e)))?;
    let app = routes::router(ctx.api.clone());
    let handle = Handle::new();

    info!("Shopcast API listening on http://{}", addr);
    let server = axum_server::bind(addr)
        .handle(handle.clone())
        .serve(app.into_make_service());
    let srv_handle = tokio::spawn(async move {
        if let Err(e) = server.await {
            error!("HTTP server error: {:?}", e);
        }
    });

    // 3) Ctrl-C => signal
    let eb_for_ctrlc = event_bus.clone();
    let _ctrlc_handle = tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {:?}", e);
        }
        info!("Ctrl-C detected; shutting down event bus...");
        eb_for_ctrlc.shutdown();
    });

    // 4) Wait for shutdown
    let mut shutdown_rx = event_bus.shutdown_rx.clone();
    while !*shutdown_rx.borrow() {
        if shutdown_rx.changed().await.is_err() {
            break;
        }
    }
    info!("Shutdown signaled; stopping HTTP server...");
    handle.graceful_shutdown(Some(std::time::Duration::from_secs(10)));
    if let Err(e) = srv_handle.await {
        error!("HTTP server task ended abnormally: {:?}", e);
    }

    for h in sweeper_handles {
        if let Err(e) = h.await {
            error!("Sweeper task ended abnormally: {:?}", e);
        }
    }

    if let Some(db) = ctx.db {
        db.close().await;
    }
    info!("Server shutdown complete.");
    Ok(())
}
