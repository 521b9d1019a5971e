use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role gates capability: only buyers create auctions, only suppliers bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Buyer,
    Supplier,
}

/// Auction lifecycle status. Transitions are monotonic:
/// not_started -> running -> ended, never backwards, never skipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuctionStatus {
    NotStarted,
    Running,
    Ended,
}

impl std::fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AuctionStatus::NotStarted => "not_started",
            AuctionStatus::Running => "running",
            AuctionStatus::Ended => "ended",
        };
        f.write_str(s)
    }
}

// User model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Opaque to the core; hashing and verification live in the auth service.
    pub password_hash: String,
    pub role: Role,
}

/// Procurement line item attached to an auction. Descriptive only; bidding
/// is per auction, not per item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: f64,
    pub uom: String,
}

/// Immutable auction parameters fixed at creation. All prices are in minor
/// currency units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Auction {
    pub id: i64,
    pub title: String,
    pub base_price: i64,
    pub min_decrement: i64,
    pub duration_minutes: i64,
    pub created_by: i64,
    pub items: Vec<LineItem>,
    pub created_at: DateTime<Utc>,
}

// Bid model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bid {
    pub id: i64,
    pub auction_id: i64,
    pub supplier_id: i64,
    pub bid_amount: i64,
    /// Server-assigned, monotonically non-decreasing within one auction.
    pub bid_time: DateTime<Utc>,
}

/// Resolution output, frozen when the auction ends. Absent means the auction
/// ended with no qualifying bid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Winner {
    pub supplier_id: i64,
    pub winning_amount: i64,
    pub bid_time: DateTime<Utc>,
}

/// Read-only view of one auction's state as held by its ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionView {
    pub id: i64,
    pub title: String,
    pub base_price: i64,
    pub min_decrement: i64,
    pub current_price: Option<i64>,
    pub duration_minutes: i64,
    pub status: AuctionStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub created_by: i64,
    pub items: Vec<LineItem>,
    pub bid_count: usize,
    pub winner: Option<Winner>,
}
