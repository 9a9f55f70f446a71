#![allow(dead_code)]

use async_trait::async_trait;
use auction_store::auction::model::{Auction, AuctionStatus, NewAuction, ProductCondition};
use auction_store::bidding::model::Bid;
use auction_store::error::StoreError;
use auction_store::ids::{AuctionId, UserId};
use auction_store::query::AuctionFilter;
use auction_store::schema::{Schema, SchemaDescription};
use auction_store::auction::AuctionLifecycle;
use auction_store::bidding::BidAdmission;
use auction_store::clock::{Clock, ManualClock};
use auction_store::store::{AppendOutcome, MemoryStore, Store};
use auction_store::user::User;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const AUCTION_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Test output goes through the test harness; repeated calls are harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .without_time()
        .with_target(false)
        .with_test_writer()
        .try_init();
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub lifecycle: AuctionLifecycle<MemoryStore>,
    pub admission: BidAdmission<MemoryStore>,
}

impl Fixture {
    pub fn new() -> Self {
        init_tracing();
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(start_time()));
        let dyn_clock: Arc<dyn Clock> = clock.clone();
        Self {
            lifecycle: AuctionLifecycle::new(store.clone(), dyn_clock.clone(), AUCTION_INTERVAL),
            admission: BidAdmission::new(store.clone(), dyn_clock),
            store,
            clock,
        }
    }

    pub async fn user(&self, id: &str) {
        self.store.insert_user(&User::new(id, format!("user {id}"))).await.unwrap();
    }

    pub async fn open_auction(&self, name: &str) -> Auction {
        self.lifecycle.create_auction(new_auction(name)).await.unwrap()
    }

    /// Inserts an auction with a fixed id, as the bootstrap script does.
    pub async fn auction_with_id(&self, id: &str, status: AuctionStatus) -> Auction {
        let now = self.clock.now();
        let auction = Auction {
            id: id.into(),
            product_name: "iPhone 13 Pro".into(),
            category: "Electronics".into(),
            description: "256GB in excellent condition".into(),
            condition: ProductCondition::Used,
            status,
            timestamp: now,
            starts_at: now,
            ends_at: now + chrono::Duration::from_std(AUCTION_INTERVAL).unwrap(),
        };
        self.store.insert_auction(&auction).await.unwrap();
        auction
    }

    pub fn advance(&self, secs: i64) {
        self.clock.advance(chrono::Duration::seconds(secs));
    }
}

pub fn new_auction(name: &str) -> NewAuction {
    NewAuction::new(
        name,
        "Electronics",
        format!("{name} in excellent condition"),
        ProductCondition::Used,
    )
}

/// What [`HookedStore`] does when a bid is appended.
pub enum AppendHook {
    /// Every append loses the write race.
    AlwaysConflict,
    /// The auction is closed right before the append reaches the store.
    CloseFirst,
}

/// A memory store whose bid appends can be interfered with.
pub struct HookedStore {
    pub inner: MemoryStore,
    hook: AppendHook,
    appends: AtomicU32,
}

impl HookedStore {
    pub fn new(hook: AppendHook) -> Self {
        Self {
            inner: MemoryStore::new(),
            hook,
            appends: AtomicU32::new(0),
        }
    }

    pub fn appends(&self) -> u32 {
        self.appends.load(Ordering::SeqCst)
    }
}

/// A hooked store holding user `u1` and one open auction.
pub async fn hooked(hook: AppendHook) -> (Arc<HookedStore>, Arc<ManualClock>, Auction) {
    init_tracing();
    let store = Arc::new(HookedStore::new(hook));
    let clock = Arc::new(ManualClock::new(start_time()));
    store.insert_user(&User::new("u1", "user u1")).await.unwrap();
    let auction = AuctionLifecycle::new(store.clone(), clock.clone(), AUCTION_INTERVAL)
        .create_auction(new_auction("Camera"))
        .await
        .unwrap();
    (store, clock, auction)
}

#[async_trait]
impl Store for HookedStore {
    async fn ensure_schema(&self, schema: &Schema) -> Result<(), StoreError> {
        self.inner.ensure_schema(schema).await
    }

    async fn describe_schema(&self, schema: &Schema) -> Result<SchemaDescription, StoreError> {
        self.inner.describe_schema(schema).await
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        self.inner.insert_user(user).await
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        self.inner.get_user(id).await
    }

    async fn insert_auction(&self, auction: &Auction) -> Result<(), StoreError> {
        self.inner.insert_auction(auction).await
    }

    async fn get_auction(&self, id: &AuctionId) -> Result<Option<Auction>, StoreError> {
        self.inner.get_auction(id).await
    }

    async fn list_auctions(&self, filter: &AuctionFilter) -> Result<Vec<Auction>, StoreError> {
        self.inner.list_auctions(filter).await
    }

    async fn search_auctions(
        &self,
        terms: &[String],
        limit: i64,
    ) -> Result<Vec<Auction>, StoreError> {
        self.inner.search_auctions(terms, limit).await
    }

    async fn due_auctions(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, StoreError> {
        self.inner.due_auctions(now).await
    }

    async fn update_status(
        &self,
        id: &AuctionId,
        from: AuctionStatus,
        to: AuctionStatus,
    ) -> Result<bool, StoreError> {
        self.inner.update_status(id, from, to).await
    }

    async fn highest_bid(&self, auction_id: &AuctionId) -> Result<Option<Bid>, StoreError> {
        self.inner.highest_bid(auction_id).await
    }

    async fn append_bid(&self, bid: &Bid) -> Result<AppendOutcome, StoreError> {
        self.appends.fetch_add(1, Ordering::SeqCst);
        match self.hook {
            AppendHook::AlwaysConflict => Ok(AppendOutcome::Conflict),
            AppendHook::CloseFirst => {
                self.inner
                    .update_status(&bid.auction_id, AuctionStatus::Open, AuctionStatus::Closed)
                    .await?;
                self.inner.append_bid(bid).await
            }
        }
    }

    async fn bids_for_auction(&self, auction_id: &AuctionId) -> Result<Vec<Bid>, StoreError> {
        self.inner.bids_for_auction(auction_id).await
    }

    async fn bids_for_user(&self, user_id: &UserId) -> Result<Vec<Bid>, StoreError> {
        self.inner.bids_for_user(user_id).await
    }
}
