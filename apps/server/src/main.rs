//! Price Alert Bot - Webhook Server
//!
//! Watches one token's price and messages Telegram chats when it crosses
//! their low/high levels.

mod config;
mod state;
mod webhook;

use clap::Parser;
use config::{AppConfig, Args};
use pricebot_alerts::{AlertEvaluator, AlertStore, CommandHandler, PriceDisplay, TelegramClient};
use pricebot_feeds::http::build_client;
use pricebot_feeds::{standard_chain, ExchangeRateService, PriceService, PriceSource, ProviderUrls};
use state::create_state;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

fn init_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
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

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
    }
}

async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
    }
    warn!("Shutdown signal received");
    let _ = shutdown_tx.send(true);
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let token = config.token.to_token();
    let http = build_client(config.feeds.request_timeout())?;

    let chain = standard_chain(&http, &token, &ProviderUrls::default());
    info!("  Providers: {}", chain.names().join(" -> "));

    let prices: Arc<dyn PriceSource> = Arc::new(PriceService::new(
        token.clone(),
        chain,
        config.feeds.price_ttl(),
    ));

    let display = PriceDisplay::with_rates(Arc::new(ExchangeRateService::new(
        http.clone(),
        &config.feeds.display_currency,
        config.feeds.rate_ttl(),
    )));

    let telegram = Arc::new(TelegramClient::new(http.clone(), &config.telegram.bot_token));
    let store = Arc::new(AlertStore::new());

    if let Some(url) = &config.telegram.webhook_url {
        match telegram
            .set_webhook(url, config.telegram.webhook_secret.as_deref())
            .await
        {
            Ok(()) => info!("Webhook registered at {}", url),
            Err(e) => warn!("Failed to register webhook, continuing: {}", e),
        }
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let evaluator = AlertEvaluator::new(
        Arc::clone(&store),
        Arc::clone(&prices),
        telegram.clone(),
        display.clone(),
    );
    let interval = config.monitor.check_interval();
    let evaluator_handle = tokio::spawn(async move {
        evaluator.run(interval, shutdown_rx).await;
    });

    let mut commands = CommandHandler::new(Arc::clone(&store), prices, display);
    match telegram.get_me().await {
        Ok(username) => {
            info!("  Bot: @{}", username);
            commands = commands.with_bot_username(&username);
        }
        Err(e) => warn!("Failed to look up bot username, accepting any @mention: {}", e),
    }
    let state = create_state(
        commands,
        telegram,
        config.telegram.allowed_chat_id,
        config.telegram.webhook_secret.clone(),
    );
    let app = webhook::create_router(state);

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Webhook server listening on http://{}", addr);
    info!("Press Ctrl+C to stop...");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await?;

    // The sender was dropped with the server future; the evaluator sees it
    if let Err(e) = evaluator_handle.await {
        error!("Alert evaluator task failed: {}", e);
    }
    info!("Dropping alerts for {} chats", store.chat_count());

    Ok(())
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    init_logging(&args.log_level);

    let config = match AppConfig::try_from(args) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("🚀 Price Alert Bot starting...");
    info!("  Token: {}", config.token.symbol.to_uppercase());
    info!("  Check Interval: {}s", config.monitor.check_interval_secs);
    info!("  Price TTL: {}s", config.feeds.price_ttl_secs);
    info!("  Display Currency: {}", config.feeds.display_currency);
    if let Some(chat) = config.telegram.allowed_chat_id {
        info!("  Allowed Chat: {}", chat);
    }

    if let Err(e) = run(config).await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }

    info!("👋 Price Alert Bot stopped");
}
