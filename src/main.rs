use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use tokio::signal;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use phrs_register::{
    AppConfig, BatchSummary, ClientFactory, HttpRegistrar, ProxyManager, RegistrarClient,
    RetryPolicy, TaskScheduler, WalletManager,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = phrs_register::setup_logger();
    // Keep guard alive for file logging
    std::mem::forget(_log_guard);
    dotenv().ok();

    let args = Args::parse();
    info!("Loading config from: {}", args.config);

    let config = match AppConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {}", e);
            return Ok(());
        }
    };

    info!("Configuration loaded for chain ID: {}", config.chain_id);

    let token = CancellationToken::new();
    let shutdown = token.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C. Letting in-flight tasks finish...");
            shutdown.cancel();
        }
    });

    // Supervisory loop: a batch that dies from an unexpected top-level error
    // is restarted after a fixed delay instead of crashing the process.
    loop {
        match run_batch(&config, token.clone()).await {
            Ok(summary) => {
                info!(
                    "All {} tasks finished. Success: {} | Failed: {} | Skipped: {}",
                    summary.total(),
                    summary.succeeded,
                    summary.failed_insufficient_funds + summary.failed_exhausted,
                    summary.skipped
                );
                break;
            }
            Err(e) => {
                error!(
                    "Batch failed: {:#}. Restarting in {}s...",
                    e, config.restart_delay_secs
                );
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = sleep(Duration::from_secs(config.restart_delay_secs)) => {}
                }
            }
        }
        if token.is_cancelled() {
            break;
        }
    }

    Ok(())
}

async fn run_batch(config: &AppConfig, token: CancellationToken) -> Result<BatchSummary> {
    let protocol = config.protocol()?;

    let wallets = WalletManager::load_keys(&config.key_file)?;
    if wallets.is_empty() {
        error!("No private keys loaded. Please check {}.", config.key_file);
        return Ok(BatchSummary::default());
    }

    let proxies = match &config.proxy_file {
        Some(path) => {
            let loaded = ProxyManager::load_proxies(path)?;
            ProxyManager::filter_live(
                loaded,
                &config.probe_url,
                Duration::from_secs(config.probe_timeout_secs),
            )
            .await
        }
        None => Vec::new(),
    };

    let rpc_url = config.rpc_url.clone();
    let chain_id = config.chain_id;
    let client_protocol = protocol.clone();
    let factory: ClientFactory = Arc::new(move |key, proxy| {
        HttpRegistrar::connect(&client_protocol, &rpc_url, chain_id, key, proxy)
            .map(|client| Arc::new(client) as Arc<dyn RegistrarClient>)
    });

    let scheduler = TaskScheduler::new(
        protocol,
        RetryPolicy::new(config.max_attempts),
        config.name_style.clone(),
        config.max_concurrency,
    );

    Ok(scheduler
        .run_all(&wallets, config.domain_count, &proxies, factory, token)
        .await)
}
