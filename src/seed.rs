//! Sample documents for a fresh deployment: three users, one open auction
//! and its first two bids. Seeding is insert-if-absent, so it can run on
//! every start.

use crate::auction::model::{Auction, AuctionStatus, ProductCondition};
use crate::bidding::model::Bid;
use crate::clock::Clock;
use crate::error::StoreError;
use crate::ids::{AuctionId, BidId, UserId};
use crate::money::Amount;
use crate::store::{AppendOutcome, Store};
use crate::user::User;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

const SEED: &str = include_str!("sql/seed.json");

#[derive(Debug, Deserialize)]
struct SeedData {
    users: Vec<User>,
    auctions: Vec<SeedAuction>,
    bids: Vec<SeedBid>,
}

#[derive(Debug, Deserialize)]
struct SeedAuction {
    id: AuctionId,
    product_name: String,
    category: String,
    description: String,
    condition: ProductCondition,
}

#[derive(Debug, Deserialize)]
struct SeedBid {
    id: BidId,
    user_id: UserId,
    auction_id: AuctionId,
    amount: Amount,
}

/// Documents actually written by one [`seed`] call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub auctions: usize,
    pub bids: usize,
}

/// Inserts the sample documents that are not there yet. Seed auctions open
/// now and run for `auction_interval`. Seed bids go through the same
/// conditional append as admitted bids, with server-side timestamps.
pub async fn seed<S: Store + ?Sized>(
    store: &S,
    clock: &dyn Clock,
    auction_interval: Duration,
) -> Result<SeedReport, StoreError> {
    let data: SeedData = serde_json::from_str(SEED).map_err(|e| StoreError::Corrupt {
        collection: "seed",
        id: "seed.json".into(),
        reason: e.to_string(),
    })?;
    let now = clock.now();
    let ends_at = chrono::Duration::from_std(auction_interval)
        .ok()
        .and_then(|interval| now.checked_add_signed(interval))
        .ok_or_else(|| {
            StoreError::Invalid(format!("auction interval out of range: {auction_interval:?}"))
        })?;
    let mut report = SeedReport::default();

    for user in &data.users {
        if insert_if_absent(store.insert_user(user).await)? {
            report.users += 1;
        }
    }

    for seed in data.auctions {
        let auction = Auction {
            id: seed.id,
            product_name: seed.product_name,
            category: seed.category,
            description: seed.description,
            condition: seed.condition,
            status: AuctionStatus::Open,
            timestamp: now,
            starts_at: now,
            ends_at,
        };
        if insert_if_absent(store.insert_auction(&auction).await)? {
            report.auctions += 1;
        }
    }

    for seed in data.bids {
        let ledger = store.bids_for_auction(&seed.auction_id).await?;
        if ledger.iter().any(|b| b.id == seed.id) {
            continue;
        }
        let bid = Bid {
            sequence: ledger.last().map_or(0, |b| b.sequence) + 1,
            id: seed.id,
            user_id: seed.user_id,
            auction_id: seed.auction_id,
            amount: seed.amount,
            timestamp: now,
        };
        match store.append_bid(&bid).await {
            Ok(AppendOutcome::Appended) => report.bids += 1,
            Ok(AppendOutcome::Conflict) => warn!(
                "{:<12} --> seed bid {} skipped, auction {} no longer takes it",
                "Seed", bid.id, bid.auction_id
            ),
            // another seeder recorded it first
            Err(StoreError::Duplicate { .. }) => {}
            Err(e) => return Err(e),
        }
    }

    info!(
        "{:<12} --> inserted users={}, auctions={}, bids={}",
        "Seed", report.users, report.auctions, report.bids
    );
    Ok(report)
}

fn insert_if_absent(result: Result<(), StoreError>) -> Result<bool, StoreError> {
    match result {
        Ok(()) => Ok(true),
        Err(StoreError::Duplicate { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_seed_parses() {
        let data: SeedData = serde_json::from_str(SEED).unwrap();
        assert_eq!(data.users.len(), 3);
        assert_eq!(data.auctions[0].product_name, "iPhone 13 Pro");
        let amounts: Vec<_> = data.bids.iter().map(|b| b.amount.to_string()).collect();
        assert_eq!(amounts, ["800.00", "850.00"]);
    }
}
