//! Persistence contract shared by the admission engine, the lifecycle
//! controller and the query layer.
//!
//! Implementations must provide per-document atomic conditional writes:
//! [`Store::append_bid`] and [`Store::update_status`] either apply completely
//! or not at all, and report which.

// region:    --- Imports
use crate::auction::model::{Auction, AuctionStatus};
use crate::bidding::model::Bid;
use crate::error::StoreError;
use crate::ids::{AuctionId, UserId};
use crate::query::AuctionFilter;
use crate::schema::{Schema, SchemaDescription};
use crate::user::User;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
// endregion: --- Imports

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Result of a conditional bid append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended,
    /// Nothing was written: the ledger head moved, the amount no longer
    /// exceeds the highest bid, or the auction stopped accepting bids.
    Conflict,
}

#[async_trait]
pub trait Store: Send + Sync + 'static {
    // -- Provisioning

    /// Creates missing collections and indexes. Existing ones are left alone.
    async fn ensure_schema(&self, schema: &Schema) -> Result<(), StoreError>;

    async fn describe_schema(&self, schema: &Schema) -> Result<SchemaDescription, StoreError>;

    // -- Users

    /// `StoreError::Duplicate` if the id is taken.
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, StoreError>;

    // -- Auctions

    /// `StoreError::Duplicate` if the id is taken.
    async fn insert_auction(&self, auction: &Auction) -> Result<(), StoreError>;

    async fn get_auction(&self, id: &AuctionId) -> Result<Option<Auction>, StoreError>;

    /// Ordered by `timestamp`, then `id`.
    async fn list_auctions(&self, filter: &AuctionFilter) -> Result<Vec<Auction>, StoreError>;

    /// Auctions whose `product_name` contains every one of `terms` as a word.
    /// Terms are lowercase.
    async fn search_auctions(&self, terms: &[String], limit: i64)
        -> Result<Vec<Auction>, StoreError>;

    /// Scheduled auctions past `starts_at` and open auctions past `ends_at`.
    async fn due_auctions(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, StoreError>;

    /// Sets `to` only if the stored status is still `from`. Returns whether
    /// the write happened.
    async fn update_status(
        &self,
        id: &AuctionId,
        from: AuctionStatus,
        to: AuctionStatus,
    ) -> Result<bool, StoreError>;

    // -- Bids

    /// The bid with the greatest amount, which is also the ledger head.
    async fn highest_bid(&self, auction_id: &AuctionId) -> Result<Option<Bid>, StoreError>;

    /// Appends `bid` iff, atomically:
    /// - the auction's ledger head sequence is `bid.sequence - 1`,
    /// - `bid.amount` exceeds every recorded amount for the auction,
    /// - the auction is open and `bid.timestamp` is before its `ends_at`.
    ///
    /// A status change never lands between that check and the write.
    /// `StoreError::Duplicate` if `bid.id` is already recorded.
    async fn append_bid(&self, bid: &Bid) -> Result<AppendOutcome, StoreError>;

    /// Ledger order (ascending sequence, so ascending amount).
    async fn bids_for_auction(&self, auction_id: &AuctionId) -> Result<Vec<Bid>, StoreError>;

    /// Newest first; same-second bids by auction id, then latest in ledger
    /// first.
    async fn bids_for_user(&self, user_id: &UserId) -> Result<Vec<Bid>, StoreError>;
}
