/// Bid admission rules.
/// Pure and stateless so the rules are testable without time-dependent state;
/// the ledger applies them inside its critical section before any mutation.
// region:    --- Imports
use crate::auction::model::{AuctionStatus, Role};

// endregion: --- Imports

// region:    --- Validator

/// Why a proposed bid was rejected. The ledger maps `BelowDecrementFloor`
/// onto the `PriceTooHigh` conflict error at its boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BidRejection {
    NotSupplier,
    NotRunning,
    BelowDecrementFloor { floor: i64 },
    NonPositiveAmount,
}

/// Accepts or rejects a proposed bid against the auction's current state.
///
/// A bid qualifies when the caller is a supplier, the auction is running,
/// the amount is positive, and the amount is at or below the decrement
/// floor (`current_price - min_decrement`).
///
/// Checks run in a fixed order: role, amount shape, auction state, floor.
/// A malformed amount is reported as such even when the auction is not
/// running, so callers can fix their input without consulting state.
pub fn validate_bid(
    status: AuctionStatus,
    current_price: i64,
    min_decrement: i64,
    proposed_amount: i64,
    role: Role,
) -> Result<(), BidRejection> {
    if role != Role::Supplier {
        return Err(BidRejection::NotSupplier);
    }
    if proposed_amount <= 0 {
        return Err(BidRejection::NonPositiveAmount);
    }
    if status != AuctionStatus::Running {
        return Err(BidRejection::NotRunning);
    }
    let floor = current_price - min_decrement;
    if proposed_amount > floor {
        return Err(BidRejection::BelowDecrementFloor { floor });
    }
    Ok(())
}

// endregion: --- Validator

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bid_at_the_floor() {
        assert_eq!(
            validate_bid(AuctionStatus::Running, 100, 5, 95, Role::Supplier),
            Ok(())
        );
    }

    #[test]
    fn accepts_bid_below_the_floor() {
        assert_eq!(
            validate_bid(AuctionStatus::Running, 100, 5, 60, Role::Supplier),
            Ok(())
        );
    }

    #[test]
    fn rejects_bid_above_the_floor() {
        assert_eq!(
            validate_bid(AuctionStatus::Running, 100, 5, 96, Role::Supplier),
            Err(BidRejection::BelowDecrementFloor { floor: 95 })
        );
    }

    #[test]
    fn rejects_bid_equal_to_current_price() {
        assert_eq!(
            validate_bid(AuctionStatus::Running, 100, 5, 100, Role::Supplier),
            Err(BidRejection::BelowDecrementFloor { floor: 95 })
        );
    }

    #[test]
    fn rejects_buyer_role() {
        assert_eq!(
            validate_bid(AuctionStatus::Running, 100, 5, 90, Role::Buyer),
            Err(BidRejection::NotSupplier)
        );
    }

    #[test]
    fn rejects_when_not_started() {
        assert_eq!(
            validate_bid(AuctionStatus::NotStarted, 100, 5, 90, Role::Supplier),
            Err(BidRejection::NotRunning)
        );
    }

    #[test]
    fn rejects_when_ended() {
        assert_eq!(
            validate_bid(AuctionStatus::Ended, 100, 5, 90, Role::Supplier),
            Err(BidRejection::NotRunning)
        );
    }

    #[test]
    fn rejects_non_positive_amounts() {
        assert_eq!(
            validate_bid(AuctionStatus::Running, 100, 5, 0, Role::Supplier),
            Err(BidRejection::NonPositiveAmount)
        );
        assert_eq!(
            validate_bid(AuctionStatus::Running, 100, 5, -10, Role::Supplier),
            Err(BidRejection::NonPositiveAmount)
        );
    }

    // Input-shape errors outrank state errors: a non-positive amount is
    // reported as such even on an ended auction.
    #[test]
    fn amount_shape_is_checked_before_state() {
        assert_eq!(
            validate_bid(AuctionStatus::Ended, 100, 5, 0, Role::Supplier),
            Err(BidRejection::NonPositiveAmount)
        );
        assert_eq!(
            validate_bid(AuctionStatus::NotStarted, 100, 5, -1, Role::Supplier),
            Err(BidRejection::NonPositiveAmount)
        );
    }
}

// endregion: --- Tests
