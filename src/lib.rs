pub mod auction;
pub mod bidding;
pub mod handlers;
pub mod ledger;
pub mod registry;
pub mod resolution;
pub mod scheduler;
pub mod store;
