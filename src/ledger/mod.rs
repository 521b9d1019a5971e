/// Auction ledger.
/// Sole mutator of one auction's current price, status, bid history and
/// winner. All mutation is serialized behind a per-auction RwLock, so two
/// bids racing below the same price floor resolve by lock order: the loser
/// is re-validated against the updated price and rejected, never dropped.
// region:    --- Imports
use crate::auction::error::AuctionError;
use crate::auction::model::{Auction, AuctionStatus, AuctionView, Bid, Role, Winner};
use crate::bidding::validator::{validate_bid, BidRejection};
use crate::resolution;
use crate::store::RecordStore;
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

// endregion: --- Imports

// region:    --- Ledger State

struct LedgerState {
    auction: Auction,
    status: AuctionStatus,
    current_price: Option<i64>,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    bids: Vec<Bid>,
    winner: Option<Winner>,
}

impl LedgerState {
    /// True when the auction is running past its end time and the lazy
    /// close must fire before the operation proceeds.
    fn close_due(&self, now: DateTime<Utc>) -> bool {
        self.status == AuctionStatus::Running
            && self.end_time.map(|end| now >= end).unwrap_or(false)
    }

    fn view(&self) -> AuctionView {
        AuctionView {
            id: self.auction.id,
            title: self.auction.title.clone(),
            base_price: self.auction.base_price,
            min_decrement: self.auction.min_decrement,
            current_price: self.current_price,
            duration_minutes: self.auction.duration_minutes,
            status: self.status,
            start_time: self.start_time,
            end_time: self.end_time,
            created_by: self.auction.created_by,
            items: self.auction.items.clone(),
            bid_count: self.bids.len(),
            winner: self.winner.clone(),
        }
    }
}

// endregion: --- Ledger State

// region:    --- Auction Ledger

pub struct AuctionLedger {
    auction_id: i64,
    created_by: i64,
    state: RwLock<LedgerState>,
    store: Arc<dyn RecordStore>,
    bid_ids: Arc<AtomicI64>,
}

impl std::fmt::Debug for AuctionLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuctionLedger")
            .field("auction_id", &self.auction_id)
            .field("created_by", &self.created_by)
            .finish_non_exhaustive()
    }
}

impl AuctionLedger {
    /// Initializes a ledger from a not-started auction. The registry owns
    /// the id -> ledger map and rejects a second open for the same id.
    pub fn open(auction: Auction, store: Arc<dyn RecordStore>, bid_ids: Arc<AtomicI64>) -> Self {
        Self {
            auction_id: auction.id,
            created_by: auction.created_by,
            state: RwLock::new(LedgerState {
                auction,
                status: AuctionStatus::NotStarted,
                current_price: None,
                start_time: None,
                end_time: None,
                bids: Vec::new(),
                winner: None,
            }),
            store,
            bid_ids,
        }
    }

    pub fn auction_id(&self) -> i64 {
        self.auction_id
    }

    pub fn created_by(&self) -> i64 {
        self.created_by
    }

    /// Transitions not_started -> running, fixing the bidding window and
    /// initializing the current price from the base price.
    pub async fn start(&self, now: DateTime<Utc>) -> Result<AuctionView, AuctionError> {
        let mut state = self.state.write().await;
        if state.status != AuctionStatus::NotStarted {
            return Err(AuctionError::InvalidTransition {
                from: state.status,
                to: AuctionStatus::Running,
            });
        }

        let base_price = state.auction.base_price;
        // Checked arithmetic: a duration the registry bound did not catch
        // must surface as a typed error, not a panic.
        let end_time = Duration::try_minutes(state.auction.duration_minutes)
            .and_then(|d| now.checked_add_signed(d))
            .ok_or_else(|| {
                AuctionError::InvalidParams("duration_minutes out of range".to_string())
            })?;

        // Persist the transition before committing it, so a store failure
        // leaves the ledger in not_started.
        let mut view = state.view();
        view.status = AuctionStatus::Running;
        view.start_time = Some(now);
        view.end_time = Some(end_time);
        view.current_price = Some(base_price);
        self.store
            .record_transition(&view)
            .await
            .map_err(|e| AuctionError::Unavailable(e.to_string()))?;

        state.status = AuctionStatus::Running;
        state.start_time = Some(now);
        state.end_time = Some(end_time);
        state.current_price = Some(base_price);

        info!(
            "{:<12} --> auction {} running until {}",
            "Ledger", self.auction_id, end_time
        );
        Ok(view)
    }

    /// Admits one bid. This is the single serialization point per auction:
    /// validation, the store append and the price update all happen under
    /// the write lock, and a store failure leaves no partial mutation.
    pub async fn submit_bid(
        &self,
        supplier_id: i64,
        role: Role,
        amount: i64,
        now: DateTime<Utc>,
    ) -> Result<Bid, AuctionError> {
        let mut state = self.state.write().await;

        if state.close_due(now) {
            self.transition_to_ended(&mut state).await?;
            return Err(AuctionError::Expired);
        }

        let current_price = state.current_price.unwrap_or(state.auction.base_price);
        validate_bid(
            state.status,
            current_price,
            state.auction.min_decrement,
            amount,
            role,
        )
        .map_err(|rejection| match rejection {
            BidRejection::NotSupplier => AuctionError::Forbidden,
            BidRejection::NonPositiveAmount => AuctionError::NonPositiveAmount,
            BidRejection::NotRunning => AuctionError::NotRunning,
            BidRejection::BelowDecrementFloor { floor } => {
                debug!(
                    "{:<12} --> auction {}: bid {} above floor {}",
                    "Ledger", self.auction_id, amount, floor
                );
                AuctionError::PriceTooHigh {
                    current_price,
                    floor,
                }
            }
        })?;

        // Server-assigned and monotonically non-decreasing per auction.
        let bid_time = match state.bids.last() {
            Some(last) => last.bid_time.max(now),
            None => now,
        };
        let bid = Bid {
            id: self.bid_ids.fetch_add(1, Ordering::Relaxed),
            auction_id: self.auction_id,
            supplier_id,
            bid_amount: amount,
            bid_time,
        };

        self.store
            .append_bid(&bid)
            .await
            .map_err(|e| AuctionError::Unavailable(e.to_string()))?;

        state.bids.push(bid.clone());
        state.current_price = Some(amount);

        info!(
            "{:<12} --> auction {}: bid {} accepted, current price {}",
            "Ledger", self.auction_id, bid.id, amount
        );
        Ok(bid)
    }

    /// Transitions running -> ended once the end time has passed. Idempotent
    /// when already ended; a call before the end time is a no-op.
    pub async fn close(&self, now: DateTime<Utc>) -> Result<(), AuctionError> {
        let mut state = self.state.write().await;
        match state.status {
            AuctionStatus::NotStarted => Err(AuctionError::InvalidTransition {
                from: AuctionStatus::NotStarted,
                to: AuctionStatus::Ended,
            }),
            AuctionStatus::Ended => Ok(()),
            AuctionStatus::Running => {
                if state.close_due(now) {
                    self.transition_to_ended(&mut state).await?;
                }
                Ok(())
            }
        }
    }

    /// Sweep entry point: closes the auction when due and reports whether a
    /// transition happened. Never fails on a not-started auction.
    pub async fn close_if_due(&self, now: DateTime<Utc>) -> Result<bool, AuctionError> {
        // Cheap read-path check so the sweep does not contend with bidders.
        {
            let state = self.state.read().await;
            if !state.close_due(now) {
                return Ok(false);
            }
        }
        let mut state = self.state.write().await;
        if !state.close_due(now) {
            return Ok(false);
        }
        self.transition_to_ended(&mut state).await?;
        Ok(true)
    }

    /// Read-only view of the current state. Applies the lazy close check
    /// first so a view taken after the end time always reads `ended`.
    pub async fn snapshot(&self, now: DateTime<Utc>) -> Result<AuctionView, AuctionError> {
        {
            let state = self.state.read().await;
            if !state.close_due(now) {
                return Ok(state.view());
            }
        }
        let mut state = self.state.write().await;
        if state.close_due(now) {
            self.transition_to_ended(&mut state).await?;
        }
        Ok(state.view())
    }

    /// Bid history, most recent first.
    pub async fn bid_history(&self, now: DateTime<Utc>) -> Result<Vec<Bid>, AuctionError> {
        self.close_if_due(now).await?;
        let state = self.state.read().await;
        let mut bids = state.bids.clone();
        bids.reverse();
        Ok(bids)
    }

    /// Frozen resolution result. `Ok(None)` means the auction ended with no
    /// qualifying bid.
    pub async fn result(&self, now: DateTime<Utc>) -> Result<Option<Winner>, AuctionError> {
        self.close_if_due(now).await?;
        let state = self.state.read().await;
        if state.status != AuctionStatus::Ended {
            return Err(AuctionError::NotEnded);
        }
        Ok(state.winner.clone())
    }

    /// The single running -> ended transition. Resolution runs here, exactly
    /// once; the persisted snapshot carries the frozen winner. Caller holds
    /// the write lock and has verified the transition is due.
    async fn transition_to_ended(&self, state: &mut LedgerState) -> Result<(), AuctionError> {
        let winner = resolution::resolve(&state.bids);

        let mut view = state.view();
        view.status = AuctionStatus::Ended;
        view.winner = winner.clone();
        self.store
            .record_transition(&view)
            .await
            .map_err(|e| AuctionError::Unavailable(e.to_string()))?;

        state.status = AuctionStatus::Ended;
        state.winner = winner;

        info!(
            "{:<12} --> auction {} ended, winner: {:?}",
            "Ledger",
            self.auction_id,
            state.winner.as_ref().map(|w| w.supplier_id)
        );
        Ok(())
    }
}

// endregion: --- Auction Ledger

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::model::LineItem;
    use crate::store::MemoryRecordStore;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn open_test_ledger(base_price: i64, min_decrement: i64) -> AuctionLedger {
        let auction = Auction {
            id: 1,
            title: "Solar cable procurement".to_string(),
            base_price,
            min_decrement,
            duration_minutes: 10,
            created_by: 100,
            items: vec![LineItem {
                description: "Solar Cable 4mm".to_string(),
                quantity: 100.0,
                uom: "MTR".to_string(),
            }],
            created_at: t0(),
        };
        AuctionLedger::open(
            auction,
            Arc::new(MemoryRecordStore::new()),
            Arc::new(AtomicI64::new(1)),
        )
    }

    #[tokio::test]
    async fn start_fixes_window_and_price() {
        let ledger = open_test_ledger(100, 5);
        let view = ledger.start(t0()).await.unwrap();
        assert_eq!(view.status, AuctionStatus::Running);
        assert_eq!(view.current_price, Some(100));
        assert_eq!(view.start_time, Some(t0()));
        assert_eq!(view.end_time, Some(t0() + Duration::minutes(10)));
    }

    #[tokio::test]
    async fn start_with_out_of_range_duration_is_rejected() {
        let auction = Auction {
            id: 1,
            title: "Solar cable procurement".to_string(),
            base_price: 100,
            min_decrement: 5,
            duration_minutes: i64::MAX,
            created_by: 100,
            items: vec![],
            created_at: t0(),
        };
        let ledger = AuctionLedger::open(
            auction,
            Arc::new(MemoryRecordStore::new()),
            Arc::new(AtomicI64::new(1)),
        );
        // A typed error, never a panic inside the time arithmetic.
        let err = ledger.start(t0()).await.unwrap_err();
        assert!(matches!(err, AuctionError::InvalidParams(_)), "{err}");
        let view = ledger.snapshot(t0()).await.unwrap();
        assert_eq!(view.status, AuctionStatus::NotStarted);
    }

    #[tokio::test]
    async fn start_twice_is_invalid_transition() {
        let ledger = open_test_ledger(100, 5);
        ledger.start(t0()).await.unwrap();
        let err = ledger.start(t0()).await.unwrap_err();
        assert_eq!(
            err,
            AuctionError::InvalidTransition {
                from: AuctionStatus::Running,
                to: AuctionStatus::Running,
            }
        );
    }

    #[tokio::test]
    async fn bid_before_start_is_not_running() {
        let ledger = open_test_ledger(100, 5);
        let err = ledger
            .submit_bid(2, Role::Supplier, 90, t0())
            .await
            .unwrap_err();
        assert_eq!(err, AuctionError::NotRunning);
    }

    // base_price=100, min_decrement=5: 94 rejected, 95 accepted,
    // 92 rejected, 90 accepted.
    #[tokio::test]
    async fn descending_bids_respect_the_decrement_floor() {
        let ledger = open_test_ledger(100, 5);
        ledger.start(t0()).await.unwrap();
        let t1 = t0() + Duration::minutes(1);
        let t2 = t0() + Duration::minutes(2);

        let err = ledger
            .submit_bid(2, Role::Supplier, 96, t1)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AuctionError::PriceTooHigh {
                current_price: 100,
                floor: 95,
            }
        );

        let bid = ledger.submit_bid(2, Role::Supplier, 95, t1).await.unwrap();
        assert_eq!(bid.bid_amount, 95);

        let err = ledger
            .submit_bid(3, Role::Supplier, 92, t2)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AuctionError::PriceTooHigh {
                current_price: 95,
                floor: 90,
            }
        );

        let bid = ledger.submit_bid(3, Role::Supplier, 90, t2).await.unwrap();
        assert_eq!(bid.bid_amount, 90);

        let view = ledger.snapshot(t2).await.unwrap();
        assert_eq!(view.current_price, Some(90));
        assert_eq!(view.bid_count, 2);
    }

    // current_price=95 after a first bid; the racer who acquires the lock
    // first lands 88, dropping the floor to 83, so the second racer's 89
    // loses as PriceTooHigh.
    #[tokio::test]
    async fn losing_racer_is_revalidated_against_the_new_floor() {
        let ledger = open_test_ledger(100, 5);
        ledger.start(t0()).await.unwrap();
        let t1 = t0() + Duration::minutes(1);

        ledger.submit_bid(2, Role::Supplier, 95, t1).await.unwrap();
        ledger.submit_bid(3, Role::Supplier, 88, t1).await.unwrap();
        let err = ledger
            .submit_bid(4, Role::Supplier, 89, t1)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AuctionError::PriceTooHigh {
                current_price: 88,
                floor: 83,
            }
        );
    }

    #[tokio::test]
    async fn bid_after_end_time_expires_and_closes() {
        let ledger = open_test_ledger(100, 5);
        ledger.start(t0()).await.unwrap();
        let late = t0() + Duration::minutes(10);

        let err = ledger
            .submit_bid(2, Role::Supplier, 90, late)
            .await
            .unwrap_err();
        assert_eq!(err, AuctionError::Expired);

        let view = ledger.snapshot(late).await.unwrap();
        assert_eq!(view.status, AuctionStatus::Ended);
    }

    #[tokio::test]
    async fn zero_bid_auction_lazily_closes_unresolved() {
        let ledger = open_test_ledger(100, 5);
        ledger.start(t0()).await.unwrap();

        let late = t0() + Duration::minutes(10);
        let view = ledger.snapshot(late).await.unwrap();
        assert_eq!(view.status, AuctionStatus::Ended);
        assert_eq!(view.winner, None);
        assert_eq!(ledger.result(late).await.unwrap(), None);
    }

    #[tokio::test]
    async fn winner_is_frozen_at_close() {
        let ledger = open_test_ledger(100, 5);
        ledger.start(t0()).await.unwrap();
        let t1 = t0() + Duration::minutes(1);
        ledger.submit_bid(2, Role::Supplier, 95, t1).await.unwrap();
        ledger.submit_bid(3, Role::Supplier, 84, t1).await.unwrap();

        let late = t0() + Duration::minutes(11);
        let winner = ledger.result(late).await.unwrap().unwrap();
        assert_eq!(winner.supplier_id, 3);
        assert_eq!(winner.winning_amount, 84);

        // Idempotent: a second close and a second read see the same result.
        ledger.close(late).await.unwrap();
        assert_eq!(ledger.result(late).await.unwrap().unwrap(), winner);
    }

    #[tokio::test]
    async fn result_before_end_is_not_ended() {
        let ledger = open_test_ledger(100, 5);
        ledger.start(t0()).await.unwrap();
        let err = ledger.result(t0() + Duration::minutes(1)).await.unwrap_err();
        assert_eq!(err, AuctionError::NotEnded);
    }

    #[tokio::test]
    async fn close_on_not_started_is_invalid_transition() {
        let ledger = open_test_ledger(100, 5);
        let err = ledger.close(t0()).await.unwrap_err();
        assert_eq!(
            err,
            AuctionError::InvalidTransition {
                from: AuctionStatus::NotStarted,
                to: AuctionStatus::Ended,
            }
        );
    }

    #[tokio::test]
    async fn bid_times_never_go_backwards() {
        let ledger = open_test_ledger(100, 5);
        ledger.start(t0()).await.unwrap();
        let t2 = t0() + Duration::minutes(2);
        let t1 = t0() + Duration::minutes(1);

        let first = ledger.submit_bid(2, Role::Supplier, 95, t2).await.unwrap();
        // A caller clock reading behind the last accepted bid is clamped.
        let second = ledger.submit_bid(3, Role::Supplier, 90, t1).await.unwrap();
        assert!(second.bid_time >= first.bid_time);
    }
}

// endregion: --- Tests
