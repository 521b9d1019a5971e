/// Winner resolution.
/// Runs exactly once when an auction transitions to ended; the ledger freezes
/// the result. Recomputation over the same history yields the same winner.
// region:    --- Imports
use crate::auction::model::{Bid, Winner};

// endregion: --- Imports

// region:    --- Resolution

/// Computes the winner of a closed auction from its bid history.
///
/// The winner is the bid with the lowest amount; ties break to the earliest
/// `bid_time`. Under the decrement rule every accepted amount is strictly
/// lower than the one before it, so equal amounts cannot occur in a history
/// produced by the validator; the tie-break is defensive only.
///
/// Returns `None` when the history is empty (the auction is unresolved).
pub fn resolve(bids: &[Bid]) -> Option<Winner> {
    let winning = bids
        .iter()
        .min_by_key(|b| (b.bid_amount, b.bid_time, b.id))?;

    debug_assert_eq!(
        bids.iter()
            .filter(|b| b.bid_amount == winning.bid_amount)
            .count(),
        1,
        "equal bid amounts are unreachable under decrement validation"
    );

    Some(Winner {
        supplier_id: winning.supplier_id,
        winning_amount: winning.bid_amount,
        bid_time: winning.bid_time,
    })
}

// endregion: --- Resolution

// region:    --- Tests


// endregion: --- Tests
