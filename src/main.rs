// region:    --- Imports
use crate::registry::AuctionRegistry;
use crate::scheduler::AuctionSweeper;
use crate::store::MemoryRecordStore;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Modules
mod auction;
mod bidding;
mod handlers;
mod ledger;
mod registry;
mod resolution;
mod scheduler;
mod store;

// endregion: --- Modules

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // Registry over the in-memory record store
    let store = Arc::new(MemoryRecordStore::new());
    let registry = Arc::new(AuctionRegistry::new(store));
    info!("{:<12} --> registry initialized", "Main");

    // Proactive sweep; SWEEP_INTERVAL_SECS=0 disables it, in which case the
    // lazy close check on each request still ends expired auctions.
    let sweep_secs: u64 = std::env::var("SWEEP_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(1);
    if sweep_secs > 0 {
        AuctionSweeper::new(Arc::clone(&registry), Duration::from_secs(sweep_secs)).start();
        info!("{:<12} --> sweep every {}s", "Main", sweep_secs);
    }

    // CORS for the test pages
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Routes
    let routes_all = Router::new()
        .route("/users", post(handlers::handle_create_user))
        .route(
            "/auctions",
            post(handlers::handle_create_auction).get(handlers::handle_list_auctions),
        )
        .route("/auctions/running", get(handlers::handle_list_running))
        .route("/auctions/:id/start", post(handlers::handle_start_auction))
        .route(
            "/auctions/:id/bids",
            post(handlers::handle_place_bid).get(handlers::handle_get_bid_history),
        )
        .route("/auctions/:id", get(handlers::handle_get_auction))
        .route("/auctions/:id/result", get(handlers::handle_get_result))
        .route(
            "/buyers/:id/auctions",
            get(handlers::handle_list_by_buyer),
        )
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .with_state(registry);

    // Listener
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // Serve
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
