//! In-process backend.
//!
//! All documents live behind one `RwLock`. Every conditional write checks and
//! applies under a single write guard that is never held across an `.await`,
//! which gives the same atomicity the SQL backend gets from its unique index.

// region:    --- Imports
use super::{AppendOutcome, Store};
use crate::auction::model::{Auction, AuctionStatus};
use crate::bidding::model::Bid;
use crate::error::StoreError;
use crate::ids::{AuctionId, UserId};
use crate::query::{tokenize, AuctionFilter};
use crate::schema::{Schema, SchemaDescription};
use crate::user::User;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;
use tracing::debug;
// endregion: --- Imports

#[derive(Default)]
struct Inner {
    collections: BTreeSet<String>,
    indexes: BTreeSet<String>,
    users: HashMap<UserId, User>,
    auctions: HashMap<AuctionId, Auction>,
    /// Per-auction ledger in sequence order.
    bids: HashMap<AuctionId, Vec<Bid>>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_auctions(mut auctions: Vec<Auction>) -> Vec<Auction> {
    auctions.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
    auctions
}

#[async_trait]
impl Store for MemoryStore {
    async fn ensure_schema(&self, schema: &Schema) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        for collection in schema.collections {
            inner.collections.insert(collection.name().to_owned());
        }
        for index in schema.indexes {
            inner.indexes.insert(index.name.to_owned());
        }
        Ok(())
    }

    async fn describe_schema(&self, schema: &Schema) -> Result<SchemaDescription, StoreError> {
        let inner = self.inner.read().await;
        let wanted: BTreeSet<&str> = schema.collections.iter().map(|c| c.name()).collect();
        Ok(SchemaDescription {
            collections: inner
                .collections
                .iter()
                .filter(|c| wanted.contains(c.as_str()))
                .cloned()
                .collect(),
            indexes: inner.indexes.iter().cloned().collect(),
        })
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.users.contains_key(&user.id) {
            return Err(StoreError::Duplicate {
                collection: "users",
                id: user.id.to_string(),
            });
        }
        inner.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(id).cloned())
    }

    async fn insert_auction(&self, auction: &Auction) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.auctions.contains_key(&auction.id) {
            return Err(StoreError::Duplicate {
                collection: "auctions",
                id: auction.id.to_string(),
            });
        }
        inner.auctions.insert(auction.id.clone(), auction.clone());
        Ok(())
    }

    async fn get_auction(&self, id: &AuctionId) -> Result<Option<Auction>, StoreError> {
        Ok(self.inner.read().await.auctions.get(id).cloned())
    }

    async fn list_auctions(&self, filter: &AuctionFilter) -> Result<Vec<Auction>, StoreError> {
        let inner = self.inner.read().await;
        let matching = inner
            .auctions
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        Ok(sorted_auctions(matching)
            .into_iter()
            .skip(usize::try_from(filter.offset).unwrap_or(0))
            .take(usize::try_from(filter.limit).unwrap_or(0))
            .collect())
    }

    async fn search_auctions(
        &self,
        terms: &[String],
        limit: i64,
    ) -> Result<Vec<Auction>, StoreError> {
        let inner = self.inner.read().await;
        let matching = inner
            .auctions
            .values()
            .filter(|a| {
                let words = tokenize(&a.product_name);
                terms.iter().all(|t| words.contains(t))
            })
            .cloned()
            .collect();
        Ok(sorted_auctions(matching)
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(0))
            .collect())
    }

    async fn due_auctions(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, StoreError> {
        let inner = self.inner.read().await;
        let mut due: Vec<Auction> = inner
            .auctions
            .values()
            .filter(|a| a.due_transition(now).is_some())
            .cloned()
            .collect();
        due.sort_by(|a, b| a.ends_at.cmp(&b.ends_at).then_with(|| a.id.cmp(&b.id)));
        Ok(due)
    }

    async fn update_status(
        &self,
        id: &AuctionId,
        from: AuctionStatus,
        to: AuctionStatus,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.auctions.get_mut(id) {
            Some(auction) if auction.status == from => {
                auction.status = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn highest_bid(&self, auction_id: &AuctionId) -> Result<Option<Bid>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .bids
            .get(auction_id)
            .and_then(|ledger| ledger.iter().max_by_key(|b| b.amount))
            .cloned())
    }

    async fn append_bid(&self, bid: &Bid) -> Result<AppendOutcome, StoreError> {
        let mut inner = self.inner.write().await;

        let open = inner.auctions.get(&bid.auction_id).is_some_and(|a| {
            a.status == AuctionStatus::Open
                && a.starts_at <= bid.timestamp
                && bid.timestamp < a.ends_at
        });
        if !open {
            debug!(
                "{:<12} --> append rejected, auction not open: {}",
                "Store", bid.auction_id
            );
            return Ok(AppendOutcome::Conflict);
        }

        let (head_sequence, head_amount) = inner
            .bids
            .get(&bid.auction_id)
            .and_then(|ledger| ledger.last())
            .map_or((0, None), |head| (head.sequence, Some(head.amount)));
        if bid.sequence != head_sequence + 1 || head_amount.is_some_and(|a| bid.amount <= a) {
            debug!(
                "{:<12} --> append rejected, head moved: auction={}, head={}, sequence={}",
                "Store", bid.auction_id, head_sequence, bid.sequence
            );
            return Ok(AppendOutcome::Conflict);
        }

        if inner.bids.values().flatten().any(|b| b.id == bid.id) {
            return Err(StoreError::Duplicate {
                collection: "bids",
                id: bid.id.to_string(),
            });
        }

        inner
            .bids
            .entry(bid.auction_id.clone())
            .or_default()
            .push(bid.clone());
        Ok(AppendOutcome::Appended)
    }

    async fn bids_for_auction(&self, auction_id: &AuctionId) -> Result<Vec<Bid>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.bids.get(auction_id).cloned().unwrap_or_default())
    }

    async fn bids_for_user(&self, user_id: &UserId) -> Result<Vec<Bid>, StoreError> {
        let inner = self.inner.read().await;
        let mut bids: Vec<Bid> = inner
            .bids
            .values()
            .flatten()
            .filter(|b| &b.user_id == user_id)
            .cloned()
            .collect();
        bids.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| a.auction_id.cmp(&b.auction_id))
                .then_with(|| b.sequence.cmp(&a.sequence))
        });
        Ok(bids)
    }
}
