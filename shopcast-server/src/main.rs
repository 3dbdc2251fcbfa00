use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

mod context;
mod routes;
mod server;

#[derive(Parser, Debug, Clone)]
#[command(name = "shopcast")]
#[command(author, version, about = "Shopcast - live-commerce scheduling, quota and sanctions engine")]
pub struct Args {
    /// Address the HTTP API binds to
    #[arg(long, default_value = "0.0.0.0:8080")]
    pub server_addr: String,

    /// Postgres connection URL.
    #[arg(long, default_value = "postgres://shopcast@localhost:5432/shopcast")]
    pub db_url: String,

    #[arg(long, default_value_t = 10)]
    pub db_max_connections: u32,

    /// Keep everything in process memory instead of Postgres
    #[arg(long, default_value = "false")]
    pub in_memory: bool,

    /// Do not spawn the periodic sweepers (manual triggers still work)
    #[arg(long, default_value = "false")]
    pub no_sweepers: bool,
}

fn init_tracing() {
    // Route `log` records from dependencies into tracing.
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("LogTracer already installed: {}", e);
    }
    let filter = EnvFilter::from_default_env()
        .add_directive("shopcast=info".parse().unwrap_or_default())
        .add_directive("shopcast_core=info".parse().unwrap_or_default())
        .add_directive("shopcast_server=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub)
        .expect("Failed to set global subscriber");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    info!(
        "Shopcast starting. addr={}, in_memory={}, sweepers={}",
        args.server_addr, args.in_memory, !args.no_sweepers
    );

    if let Err(e) = server::run_server(args).await {
        error!("Server error: {:?}", e);
        return Err(e.into());
    }
    info!("Main finished. Goodbye!");
    Ok(())
}
