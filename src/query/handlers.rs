// region:    --- Imports
use super::{tokenize, AuctionFilter, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::auction::model::Auction;
use crate::bidding::model::Bid;
use crate::error::StoreError;
use crate::ids::{AuctionId, UserId};
use crate::store::Store;
use crate::user::User;
use tracing::info;

// endregion: --- Imports

// region:    --- Query Handlers

/// Auction by id
pub async fn get_auction<S: Store + ?Sized>(
    store: &S,
    auction_id: &AuctionId,
) -> Result<Option<Auction>, StoreError> {
    info!("{:<12} --> get auction id: {}", "Query", auction_id);
    store.get_auction(auction_id).await
}

/// Catalog listing by status, category and creation time
pub async fn list_auctions<S: Store + ?Sized>(
    store: &S,
    filter: AuctionFilter,
) -> Result<Vec<Auction>, StoreError> {
    let filter = filter.normalized();
    info!("{:<12} --> list auctions: {:?}", "Query", filter);
    store.list_auctions(&filter).await
}

/// Free-text product search. Blank text matches nothing.
pub async fn search_auctions<S: Store + ?Sized>(
    store: &S,
    text: &str,
    limit: Option<i64>,
) -> Result<Vec<Auction>, StoreError> {
    info!("{:<12} --> search auctions: {:?}", "Query", text);
    let terms = tokenize(text);
    if terms.is_empty() {
        return Ok(Vec::new());
    }
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    store.search_auctions(&terms, limit).await
}

/// Current highest bid
pub async fn get_highest_bid<S: Store + ?Sized>(
    store: &S,
    auction_id: &AuctionId,
) -> Result<Option<Bid>, StoreError> {
    info!("{:<12} --> highest bid id: {}", "Query", auction_id);
    store.highest_bid(auction_id).await
}

/// Auction bid history, in admission order
pub async fn get_bid_history<S: Store + ?Sized>(
    store: &S,
    auction_id: &AuctionId,
) -> Result<Vec<Bid>, StoreError> {
    info!("{:<12} --> bid history id: {}", "Query", auction_id);
    store.bids_for_auction(auction_id).await
}

/// User bid history, newest first
pub async fn get_user_bids<S: Store + ?Sized>(
    store: &S,
    user_id: &UserId,
) -> Result<Vec<Bid>, StoreError> {
    info!("{:<12} --> user bids id: {}", "Query", user_id);
    store.bids_for_user(user_id).await
}

/// User by id
pub async fn get_user<S: Store + ?Sized>(
    store: &S,
    user_id: &UserId,
) -> Result<Option<User>, StoreError> {
    info!("{:<12} --> get user id: {}", "Query", user_id);
    store.get_user(user_id).await
}

// endregion: --- Query Handlers
