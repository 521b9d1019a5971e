/// Proactive auction sweep.
/// Closes expired auctions even when no request touches them, so a zero-bid
/// auction still ends on time. The sweep is an optimization only: every
/// read and write path performs the same lazy close check, so deployments
/// without this task still behave correctly.
// region:    --- Imports
use crate::registry::AuctionRegistry;
use chrono::Utc;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::debug;

// endregion: --- Imports

// region:    --- Auction Sweeper

pub struct AuctionSweeper {
    registry: Arc<AuctionRegistry>,
    period: Duration,
}

impl AuctionSweeper {
    pub fn new(registry: Arc<AuctionRegistry>, period: Duration) -> Self {
        Self { registry, period }
    }

    /// Spawns the periodic sweep task.
    pub fn start(self) {
        tokio::spawn(async move {
            let mut interval = interval(self.period);
            loop {
                interval.tick().await;
                let closed = self.registry.sweep(Utc::now()).await;
                if closed > 0 {
                    debug!("{:<12} --> closed {} expired auctions", "Sweeper", closed);
                }
            }
        });
    }
}

// endregion: --- Auction Sweeper
