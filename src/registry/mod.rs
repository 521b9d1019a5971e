/// Auction registry.
/// Owns the id -> ledger map and the user directory. Operations against
/// different auctions proceed fully independently; the registry's own locks
/// are held only for map lookup and insert, never across a ledger operation.
// region:    --- Imports
use crate::auction::error::AuctionError;
use crate::auction::model::{Auction, AuctionStatus, AuctionView, Bid, LineItem, Role, User, Winner};
use crate::ledger::AuctionLedger;
use crate::store::RecordStore;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- User Directory

struct UserDirectory {
    by_id: HashMap<i64, User>,
    usernames: HashSet<String>,
}

// endregion: --- User Directory

// region:    --- Auction Registry

/// Longest accepted bidding window (one year).
const MAX_DURATION_MINUTES: i64 = 366 * 24 * 60;

pub struct AuctionRegistry {
    ledgers: RwLock<HashMap<i64, Arc<AuctionLedger>>>,
    users: RwLock<UserDirectory>,
    next_user_id: AtomicI64,
    next_auction_id: AtomicI64,
    bid_ids: Arc<AtomicI64>,
    store: Arc<dyn RecordStore>,
}

impl AuctionRegistry {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            ledgers: RwLock::new(HashMap::new()),
            users: RwLock::new(UserDirectory {
                by_id: HashMap::new(),
                usernames: HashSet::new(),
            }),
            next_user_id: AtomicI64::new(1),
            next_auction_id: AtomicI64::new(1),
            bid_ids: Arc::new(AtomicI64::new(1)),
            store,
        }
    }

    /// Registers a user. The password hash is opaque here; hashing and
    /// verification belong to the auth service.
    pub async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<i64, AuctionError> {
        if username.trim().is_empty() {
            return Err(AuctionError::InvalidParams(
                "username must not be empty".to_string(),
            ));
        }

        let mut users = self.users.write().await;
        if users.usernames.contains(username) {
            return Err(AuctionError::UsernameTaken(username.to_string()));
        }
        let id = self.next_user_id.fetch_add(1, Ordering::Relaxed);
        users.usernames.insert(username.to_string());
        users.by_id.insert(
            id,
            User {
                id,
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                role,
            },
        );

        info!("{:<12} --> user {} registered as {:?}", "Registry", id, role);
        Ok(id)
    }

    /// Creates an auction in not_started and opens its ledger. Only buyers
    /// may create auctions.
    pub async fn create_auction(
        &self,
        buyer_id: i64,
        title: &str,
        base_price: i64,
        min_decrement: i64,
        duration_minutes: i64,
        items: Vec<LineItem>,
        now: DateTime<Utc>,
    ) -> Result<i64, AuctionError> {
        let buyer = self.user(buyer_id).await?;
        if buyer.role != Role::Buyer {
            return Err(AuctionError::Forbidden);
        }

        if title.trim().is_empty() {
            return Err(AuctionError::InvalidParams(
                "title must not be empty".to_string(),
            ));
        }
        if base_price <= 0 {
            return Err(AuctionError::InvalidParams(
                "base_price must be positive".to_string(),
            ));
        }
        if min_decrement <= 0 {
            return Err(AuctionError::InvalidParams(
                "min_decrement must be positive".to_string(),
            ));
        }
        if duration_minutes <= 0 || duration_minutes > MAX_DURATION_MINUTES {
            return Err(AuctionError::InvalidParams(
                "duration_minutes must be between 1 and one year".to_string(),
            ));
        }
        let items = normalize_items(items)?;

        let auction = Auction {
            id: self.next_auction_id.fetch_add(1, Ordering::Relaxed),
            title: title.to_string(),
            base_price,
            min_decrement,
            duration_minutes,
            created_by: buyer_id,
            items,
            created_at: now,
        };
        let id = auction.id;
        self.open_ledger(auction).await?;

        info!(
            "{:<12} --> auction {} created by buyer {}",
            "Registry", id, buyer_id
        );
        Ok(id)
    }

    /// Installs a ledger for a not-started auction. Fails when a ledger is
    /// already open for that id.
    pub async fn open_ledger(
        &self,
        auction: Auction,
    ) -> Result<Arc<AuctionLedger>, AuctionError> {
        let mut ledgers = self.ledgers.write().await;
        if ledgers.contains_key(&auction.id) {
            return Err(AuctionError::AlreadyOpen(auction.id));
        }
        let ledger = Arc::new(AuctionLedger::open(
            auction,
            Arc::clone(&self.store),
            Arc::clone(&self.bid_ids),
        ));
        ledgers.insert(ledger.auction_id(), Arc::clone(&ledger));
        Ok(ledger)
    }

    /// Explicit buyer activation: only the creator may start the auction.
    pub async fn start_auction(
        &self,
        auction_id: i64,
        caller_id: i64,
        now: DateTime<Utc>,
    ) -> Result<AuctionView, AuctionError> {
        self.user(caller_id).await?;
        let ledger = self.ledger(auction_id).await?;
        if ledger.created_by() != caller_id {
            return Err(AuctionError::Forbidden);
        }
        ledger.start(now).await
    }

    pub async fn place_bid(
        &self,
        auction_id: i64,
        supplier_id: i64,
        amount: i64,
        now: DateTime<Utc>,
    ) -> Result<Bid, AuctionError> {
        let supplier = self.user(supplier_id).await?;
        let ledger = self.ledger(auction_id).await?;
        ledger
            .submit_bid(supplier_id, supplier.role, amount, now)
            .await
    }

    pub async fn auction_view(
        &self,
        auction_id: i64,
        now: DateTime<Utc>,
    ) -> Result<AuctionView, AuctionError> {
        self.ledger(auction_id).await?.snapshot(now).await
    }

    pub async fn bid_history(
        &self,
        auction_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Bid>, AuctionError> {
        self.ledger(auction_id).await?.bid_history(now).await
    }

    pub async fn result(
        &self,
        auction_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<Winner>, AuctionError> {
        self.ledger(auction_id).await?.result(now).await
    }

    /// All auctions, newest first.
    pub async fn list_auctions(&self, now: DateTime<Utc>) -> Result<Vec<AuctionView>, AuctionError> {
        let mut views = Vec::new();
        for ledger in self.all_ledgers().await {
            views.push(ledger.snapshot(now).await?);
        }
        views.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(views)
    }

    pub async fn list_auctions_by_buyer(
        &self,
        buyer_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<AuctionView>, AuctionError> {
        let mut views = self.list_auctions(now).await?;
        views.retain(|v| v.created_by == buyer_id);
        Ok(views)
    }

    pub async fn list_running(&self, now: DateTime<Utc>) -> Result<Vec<AuctionView>, AuctionError> {
        let mut views = self.list_auctions(now).await?;
        views.retain(|v| v.status == AuctionStatus::Running);
        Ok(views)
    }

    /// One proactive pass: closes every running auction whose end time has
    /// passed. Correctness does not depend on this; the lazy check on each
    /// access path closes expired auctions even when no sweep runs.
    pub async fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut closed = 0;
        for ledger in self.all_ledgers().await {
            match ledger.close_if_due(now).await {
                Ok(true) => closed += 1,
                Ok(false) => {}
                Err(e) => warn!(
                    "{:<12} --> sweep failed to close auction {}: {}",
                    "Registry",
                    ledger.auction_id(),
                    e
                ),
            }
        }
        closed
    }

    async fn all_ledgers(&self) -> Vec<Arc<AuctionLedger>> {
        self.ledgers.read().await.values().cloned().collect()
    }

    async fn ledger(&self, auction_id: i64) -> Result<Arc<AuctionLedger>, AuctionError> {
        self.ledgers
            .read()
            .await
            .get(&auction_id)
            .cloned()
            .ok_or(AuctionError::AuctionNotFound(auction_id))
    }

    async fn user(&self, user_id: i64) -> Result<User, AuctionError> {
        self.users
            .read()
            .await
            .by_id
            .get(&user_id)
            .cloned()
            .ok_or(AuctionError::UserNotFound(user_id))
    }
}

fn normalize_items(items: Vec<LineItem>) -> Result<Vec<LineItem>, AuctionError> {
    items
        .into_iter()
        .map(|mut item| {
            if item.description.trim().is_empty() {
                return Err(AuctionError::InvalidParams(
                    "item description must not be empty".to_string(),
                ));
            }
            // Written so NaN fails the check too.
            if !(item.quantity > 0.0) {
                return Err(AuctionError::InvalidParams(
                    "item quantity must be positive".to_string(),
                ));
            }
            if item.uom.trim().is_empty() {
                item.uom = "NOS".to_string();
            }
            Ok(item)
        })
        .collect()
}

// endregion: --- Auction Registry

// region:    --- Tests


// endregion: --- Tests
