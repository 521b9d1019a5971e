// region:    --- Imports
use crate::auction::model::{AuctionView, Bid};
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

// endregion: --- Imports

// region:    --- Record Store Trait

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

/// Durable record store seam. The relational store itself is an external
/// collaborator; the ledger only requires that an append or transition write
/// either fully commits or fully fails, and calls it inside the per-auction
/// critical section so a failure leaves no partial in-memory mutation.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Appends one accepted bid record.
    async fn append_bid(&self, bid: &Bid) -> Result<(), StoreError>;

    /// Records an auction status transition (start or close) with the
    /// state frozen at that transition.
    async fn record_transition(&self, view: &AuctionView) -> Result<(), StoreError>;
}

// endregion: --- Record Store Trait

// region:    --- In-Memory Store

/// Process-local implementation used by the service binary and tests.
pub struct MemoryRecordStore {
    bids: Mutex<Vec<Bid>>,
    auctions: Mutex<HashMap<i64, AuctionView>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self {
            bids: Mutex::new(Vec::new()),
            auctions: Mutex::new(HashMap::new()),
        }
    }

    /// All bid records persisted so far, across auctions.
    pub async fn bids(&self) -> Vec<Bid> {
        self.bids.lock().await.clone()
    }

    /// Last persisted transition snapshot for one auction.
    pub async fn auction(&self, auction_id: i64) -> Option<AuctionView> {
        self.auctions.lock().await.get(&auction_id).cloned()
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn append_bid(&self, bid: &Bid) -> Result<(), StoreError> {
        self.bids.lock().await.push(bid.clone());
        debug!(
            "{:<12} --> bid {} persisted for auction {}",
            "Store", bid.id, bid.auction_id
        );
        Ok(())
    }

    async fn record_transition(&self, view: &AuctionView) -> Result<(), StoreError> {
        self.auctions.lock().await.insert(view.id, view.clone());
        debug!(
            "{:<12} --> auction {} transition to {} persisted",
            "Store", view.id, view.status
        );
        Ok(())
    }
}

// endregion: --- In-Memory Store
