//! Giftwatch - Headless Server
//!
//! Polls Telegram gift marketplaces and delivers cheap-lot and
//! subscription-floor notifications over a Telegram bot.

mod api;
mod config;

use api::ApiState;
use clap::Parser;
use config::AppConfig;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use giftwatch_alerts::{NotificationSink, TelegramBot};
use giftwatch_engine::{
    AutoBuyGate, CheapLotScanner, Clock, DedupCache, DryRunExecutor, Scheduler, SubscriptionWatcher,
    SystemClock,
};
use giftwatch_market::{
    MarketplaceBuyer, MarketplaceGateway, MergedGateway, MrktClient, PortalClient, PurchaseExecutor,
};
use giftwatch_store::StateStore;

/// Giftwatch CLI
#[derive(Parser, Debug)]
#[command(name = "giftwatch-bot")]
#[command(about = "Telegram gift marketplace watcher", long_about = None)]
struct Args {
    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// State snapshot file path
    #[arg(short, long, default_value = "giftwatch_state.json")]
    state_file: String,

    /// Dashboard API port
    #[arg(long, default_value_t = 8080)]
    dashboard_port: u16,

    /// Dry run (log auto-buys instead of purchasing)
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

fn init_logging(level: &str) {
    let level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(&args.log_level);
    dotenvy::dotenv().ok();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    let store = match StateStore::load(&args.state_file).await {
        Ok(store) => store,
        Err(e) => {
            // Starting empty over a present-but-unreadable file would
            // silently drop every user's configuration.
            error!(path = %args.state_file, "cannot load state file: {e}");
            std::process::exit(1);
        }
    };

    let gateway: Arc<dyn MarketplaceGateway> = match build_gateway(&config) {
        Ok(gateway) => gateway,
        Err(e) => {
            error!("cannot build marketplace clients: {e}");
            std::process::exit(1);
        }
    };

    let executor: Arc<dyn PurchaseExecutor> = if args.dry_run {
        info!("dry-run mode, auto-buys will be logged only");
        Arc::new(DryRunExecutor)
    } else {
        match build_buyer(&config) {
            Ok(buyer) => buyer,
            Err(e) => {
                error!("cannot build purchase clients: {e}");
                std::process::exit(1);
            }
        }
    };

    let bot = Arc::new(TelegramBot::new(&config.bot_token, store.clone()));
    let sink: Arc<dyn NotificationSink> = bot.clone();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let dedup = Arc::new(DedupCache::new(config.engine.dedup_ttl_ms));
    let gate = Arc::new(AutoBuyGate::new(
        store.clone(),
        executor,
        clock.clone(),
        config.engine.autobuy_cooldown_ms,
        config.engine.log_retention,
    ));

    let scanner = Arc::new(CheapLotScanner::new(
        store.clone(),
        gateway.clone(),
        sink.clone(),
        gate.clone(),
        dedup.clone(),
        clock.clone(),
        config.engine.clone(),
    ));
    let watcher = Arc::new(SubscriptionWatcher::new(
        store.clone(),
        gateway.clone(),
        sink,
        gate,
        dedup,
        clock,
        config.engine.clone(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = Scheduler::new(config.check_interval, config.subs_check_interval);
    let (scan_handle, watch_handle) = scheduler.spawn(scanner, watcher, shutdown_rx);

    let bot_handle = tokio::spawn(bot.run());

    let router = api::router(ApiState {
        store: store.clone(),
        gateway,
    });
    let addr = format!("0.0.0.0:{}", args.dashboard_port);
    let api_handle = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => {
            info!(addr = %addr, "dashboard API listening");
            tokio::spawn(async move {
                if let Err(e) = axum::serve(listener, router).await {
                    error!("dashboard API server error: {e}");
                }
            })
        }
        Err(e) => {
            error!(addr = %addr, "cannot bind dashboard API: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("cannot listen for ctrl-c: {e}");
    }
    info!("shutting down");

    let _ = shutdown_tx.send(true);
    let _ = scan_handle.await;
    let _ = watch_handle.await;
    bot_handle.abort();
    api_handle.abort();

    if let Err(e) = store.save_now().await {
        warn!("final state save failed: {e}");
    }
    info!("shutdown complete");
}

fn build_gateway(config: &AppConfig) -> Result<Arc<dyn MarketplaceGateway>, giftwatch_market::GatewayError> {
    let portal = PortalClient::new(
        &config.portal_base_url,
        &config.portal_token,
        config.gateway_timeout,
        config.premarket,
    )?;
    let mrkt = MrktClient::new(
        &config.mrkt_base_url,
        &config.mrkt_token,
        config.gateway_timeout,
        config.premarket,
    )?;
    Ok(Arc::new(MergedGateway::new(portal, mrkt)))
}

fn build_buyer(config: &AppConfig) -> Result<Arc<dyn PurchaseExecutor>, giftwatch_market::GatewayError> {
    let portal = PortalClient::new(
        &config.portal_base_url,
        &config.portal_token,
        config.gateway_timeout,
        config.premarket,
    )?;
    let mrkt = MrktClient::new(
        &config.mrkt_base_url,
        &config.mrkt_token,
        config.gateway_timeout,
        config.premarket,
    )?;
    Ok(Arc::new(MarketplaceBuyer::new(portal, mrkt)))
}
