use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use brewbot_core::tasks::{spawn_claim_cycle_task, spawn_state_cleanup_task};
use brewbot_core::Error;

mod context;
mod server;

use context::ServerContext;
use server::start_trigger_server;

#[derive(Parser, Debug, Clone)]
#[command(name = "brewbot")]
#[command(author, version, about = "Brewbot - weekly coffee voucher claim service")]
pub struct Args {
    /// Address the trigger server binds to
    #[arg(long, default_value = "0.0.0.0:8080")]
    server_addr: String,

    /// Postgres connection URL.
    #[arg(long, default_value = "postgres://brewbot@localhost:5432/brewbot")]
    db_url: String,

    /// Hours between built-in claim sweeps over all accounts
    #[arg(long, default_value = "6")]
    sweep_interval_hours: u64,

    /// Disable the built-in sweep; only external triggers run passes
    #[arg(long, default_value = "false")]
    no_sweep: bool,
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("brewbot=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub).expect("Failed to set global subscriber");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    init_tracing();
    let args = Args::parse();
    info!(
        "Brewbot starting. server_addr={}, sweep_interval={}h, no_sweep={}",
        args.server_addr, args.sweep_interval_hours, args.no_sweep
    );

    if let Err(e) = run_server(args).await {
        error!("Server error: {:?}", e);
    }
    info!("Main finished. Goodbye!");
    Ok(())
}

async fn run_server(args: Args) -> Result<(), Error> {
    let ctx = ServerContext::new(&args).await?;

    let sweep_handle = if args.no_sweep {
        None
    } else {
        Some(spawn_claim_cycle_task(
            ctx.trigger_handler.clone(),
            ctx.credentials.clone(),
            Duration::from_secs(args.sweep_interval_hours * 3600),
        ))
    };
    let cleanup_handle = spawn_state_cleanup_task(
        ctx.store.clone(),
        Duration::from_secs(24 * 3600),
    );

    let addr: SocketAddr = args.server_addr.parse()?;
    let server_shutdown = start_trigger_server(addr, ctx.trigger_handler.clone()).await?;

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {:?}", e);
    }
    info!("Ctrl-C detected; shutting down...");

    let _ = server_shutdown.send(());
    if let Some(handle) = sweep_handle {
        handle.abort();
    }
    cleanup_handle.abort();

    Ok(())
}
