// region:    --- Imports
use crate::auction::model::{LineItem, Role};
use crate::registry::AuctionRegistry;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- Requests

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAuctionRequest {
    pub buyer_id: i64,
    pub title: String,
    pub base_price: i64,
    pub min_decrement: i64,
    pub duration_minutes: i64,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartAuctionRequest {
    pub caller_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlaceBidRequest {
    pub supplier_id: i64,
    pub bid_amount: i64,
}

// endregion: --- Requests

// region:    --- Command Handlers

/// User registration
pub async fn handle_create_user(
    State(registry): State<Arc<AuctionRegistry>>,
    Json(req): Json<CreateUserRequest>,
) -> impl IntoResponse {
    info!("{:<12} --> create user: {}", "Command", req.username);
    match registry
        .create_user(&req.username, &req.password_hash, req.role)
        .await
    {
        Ok(user_id) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "user_id": user_id })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Auction creation
pub async fn handle_create_auction(
    State(registry): State<Arc<AuctionRegistry>>,
    Json(req): Json<CreateAuctionRequest>,
) -> impl IntoResponse {
    info!("{:<12} --> create auction: {:?}", "Command", req);
    match registry
        .create_auction(
            req.buyer_id,
            &req.title,
            req.base_price,
            req.min_decrement,
            req.duration_minutes,
            req.items,
            Utc::now(),
        )
        .await
    {
        Ok(auction_id) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "auction_id": auction_id })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Explicit buyer activation
pub async fn handle_start_auction(
    State(registry): State<Arc<AuctionRegistry>>,
    Path(auction_id): Path<i64>,
    Json(req): Json<StartAuctionRequest>,
) -> impl IntoResponse {
    info!("{:<12} --> start auction {}", "Command", auction_id);
    match registry
        .start_auction(auction_id, req.caller_id, Utc::now())
        .await
    {
        Ok(view) => Json(view).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Bid submission
pub async fn handle_place_bid(
    State(registry): State<Arc<AuctionRegistry>>,
    Path(auction_id): Path<i64>,
    Json(req): Json<PlaceBidRequest>,
) -> impl IntoResponse {
    info!(
        "{:<12} --> bid on auction {}: {:?}",
        "Command", auction_id, req
    );
    match registry
        .place_bid(auction_id, req.supplier_id, req.bid_amount, Utc::now())
        .await
    {
        Ok(bid) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "bid_id": bid.id,
                "bid_time": bid.bid_time,
                "current_price": bid.bid_amount,
            })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// Auction state view; the lazy close check runs first.
pub async fn handle_get_auction(
    State(registry): State<Arc<AuctionRegistry>>,
    Path(auction_id): Path<i64>,
) -> impl IntoResponse {
    info!("{:<12} --> auction view id: {}", "HandlerQuery", auction_id);
    match registry.auction_view(auction_id, Utc::now()).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Bid history, most recent first.
pub async fn handle_get_bid_history(
    State(registry): State<Arc<AuctionRegistry>>,
    Path(auction_id): Path<i64>,
) -> impl IntoResponse {
    info!("{:<12} --> bid history id: {}", "HandlerQuery", auction_id);
    match registry.bid_history(auction_id, Utc::now()).await {
        Ok(bids) => Json(bids).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Resolution result; valid only once the auction has ended.
pub async fn handle_get_result(
    State(registry): State<Arc<AuctionRegistry>>,
    Path(auction_id): Path<i64>,
) -> impl IntoResponse {
    info!("{:<12} --> result id: {}", "HandlerQuery", auction_id);
    match registry.result(auction_id, Utc::now()).await {
        Ok(Some(winner)) => Json(serde_json::json!({
            "outcome": "resolved",
            "winner_supplier_id": winner.supplier_id,
            "winning_amount": winner.winning_amount,
            "bid_time": winner.bid_time,
        }))
        .into_response(),
        Ok(None) => Json(serde_json::json!({ "outcome": "unresolved" })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// All auctions, newest first.
pub async fn handle_list_auctions(
    State(registry): State<Arc<AuctionRegistry>>,
) -> impl IntoResponse {
    info!("{:<12} --> list auctions", "HandlerQuery");
    match registry.list_auctions(Utc::now()).await {
        Ok(views) => Json(views).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Running auctions only.
pub async fn handle_list_running(
    State(registry): State<Arc<AuctionRegistry>>,
) -> impl IntoResponse {
    info!("{:<12} --> list running auctions", "HandlerQuery");
    match registry.list_running(Utc::now()).await {
        Ok(views) => Json(views).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Auctions created by one buyer.
pub async fn handle_list_by_buyer(
    State(registry): State<Arc<AuctionRegistry>>,
    Path(buyer_id): Path<i64>,
) -> impl IntoResponse {
    info!(
        "{:<12} --> list auctions of buyer {}",
        "HandlerQuery", buyer_id
    );
    match registry.list_auctions_by_buyer(buyer_id, Utc::now()).await {
        Ok(views) => Json(views).into_response(),
        Err(e) => e.into_response(),
    }
}

// endregion: --- Query Handlers
