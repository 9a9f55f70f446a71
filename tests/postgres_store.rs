//! Needs a live PostgreSQL: `DATABASE_URL=... cargo test -- --ignored`

mod common;

use auction_store::auction::model::{Auction, AuctionStatus, ProductCondition};
use auction_store::bidding::model::Bid;
use auction_store::database::DatabaseManager;
use auction_store::ids::{AuctionId, BidId};
use auction_store::money::Amount;
use auction_store::query::AuctionFilter;
use auction_store::schema::Schema;
use auction_store::error::StoreError;
use auction_store::store::{AppendOutcome, PgStore, Store};
use auction_store::user::User;
use chrono::{SubsecRound, Utc};
use std::sync::Arc;
use std::time::Duration;

async fn setup_with_db() -> (PgStore, Arc<DatabaseManager>) {
    common::init_tracing();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db = Arc::new(DatabaseManager::connect(&url, 5).await.unwrap());
    let store = PgStore::new(Arc::clone(&db));
    store.ensure_schema(&Schema::declared()).await.unwrap();
    (store, db)
}

async fn setup() -> PgStore {
    setup_with_db().await.0
}

async fn open_auction(store: &PgStore, name: &str) -> Auction {
    let now = Utc::now().trunc_subsecs(0);
    let auction = Auction {
        id: AuctionId::generate(),
        product_name: name.into(),
        category: "Electronics".into(),
        description: format!("{name} in excellent condition"),
        condition: ProductCondition::New,
        status: AuctionStatus::Open,
        timestamp: now,
        starts_at: now,
        ends_at: now + chrono::Duration::minutes(5),
    };
    store.insert_auction(&auction).await.unwrap();
    auction
}

fn bid(auction: &Auction, minor: i64, sequence: i64) -> Bid {
    Bid {
        id: BidId::generate(),
        user_id: "pg-user".into(),
        auction_id: auction.id.clone(),
        amount: Amount::from_minor(minor),
        timestamp: auction.starts_at,
        sequence,
    }
}

#[tokio::test]
#[ignore]
async fn test_pg_provisioning_is_repeatable() {
    let store = setup().await;
    let schema = Schema::declared();
    let first = store.describe_schema(&schema).await.unwrap();
    store.ensure_schema(&schema).await.unwrap();
    let second = store.describe_schema(&schema).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.collections, ["auctions", "bids", "users"]);
    assert!(first.has_index("uq_bids_auction_id_sequence"));
    assert!(first.has_index("idx_auctions_product_name_text"));
}

#[tokio::test]
#[ignore]
async fn test_pg_conditional_append() {
    let store = setup().await;
    let _ = store.insert_user(&User::new("pg-user", "Postgres User")).await;
    let auction = open_auction(&store, "PG Camera").await;

    let first = bid(&auction, 1_000, 1);
    assert_eq!(store.append_bid(&first).await.unwrap(), AppendOutcome::Appended);
    // stale head
    assert_eq!(store.append_bid(&bid(&auction, 2_000, 1)).await.unwrap(), AppendOutcome::Conflict);
    // not above the head amount
    assert_eq!(store.append_bid(&bid(&auction, 1_000, 2)).await.unwrap(), AppendOutcome::Conflict);
    assert_eq!(store.append_bid(&bid(&auction, 2_000, 2)).await.unwrap(), AppendOutcome::Appended);
    // a recorded bid id at a free ledger slot
    let reused = Bid {
        amount: Amount::from_minor(2_500),
        sequence: 3,
        ..first.clone()
    };
    assert!(matches!(
        store.append_bid(&reused).await,
        Err(StoreError::Duplicate { collection: "bids", .. })
    ));

    assert!(store
        .update_status(&auction.id, AuctionStatus::Open, AuctionStatus::Closed)
        .await
        .unwrap());
    assert!(!store
        .update_status(&auction.id, AuctionStatus::Open, AuctionStatus::Closed)
        .await
        .unwrap());
    assert_eq!(store.append_bid(&bid(&auction, 3_000, 3)).await.unwrap(), AppendOutcome::Conflict);

    let ledger = store.bids_for_auction(&auction.id).await.unwrap();
    let amounts: Vec<_> = ledger.iter().map(|b| b.amount.minor()).collect();
    assert_eq!(amounts, [1_000, 2_000]);
    assert_eq!(store.highest_bid(&auction.id).await.unwrap().unwrap().sequence, 2);
}

#[tokio::test]
#[ignore]
async fn test_pg_reads() {
    let store = setup().await;
    let auction = open_auction(&store, "Vintage Polaroid Camera").await;

    let found = store.get_auction(&auction.id).await.unwrap().unwrap();
    assert_eq!(found, auction);

    let terms = vec!["polaroid".to_owned(), "vintage".to_owned()];
    let hits = store.search_auctions(&terms, 500).await.unwrap();
    assert!(hits.iter().any(|a| a.id == auction.id));

    let listed = store
        .list_auctions(&AuctionFilter::default().with_status(AuctionStatus::Open).page(500, 0))
        .await
        .unwrap();
    assert!(listed.iter().any(|a| a.id == auction.id));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn test_pg_close_waits_for_in_flight_append() {
    let (store, db) = setup_with_db().await;
    let auction = open_auction(&store, "PG Desk Lamp").await;

    // another writer holds ledger slot 1 without committing
    let mut holder = db.pool().begin().await.unwrap();
    sqlx::query(
        "INSERT INTO bids (id, user_id, auction_id, amount, timestamp, sequence) VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(BidId::generate().as_str())
    .bind("pg-user")
    .bind(auction.id.as_str())
    .bind(400_i64)
    .bind(auction.starts_at.timestamp())
    .bind(1_i64)
    .execute(&mut *holder)
    .await
    .unwrap();

    let appender = {
        let store = store.clone();
        let candidate = bid(&auction, 500, 1);
        tokio::spawn(async move { store.append_bid(&candidate).await })
    };
    tokio::time::sleep(Duration::from_millis(300)).await;

    let closer = {
        let store = store.clone();
        let id = auction.id.clone();
        tokio::spawn(async move {
            let closed = store
                .update_status(&id, AuctionStatus::Open, AuctionStatus::Closed)
                .await
                .unwrap();
            let seen = store.bids_for_auction(&id).await.unwrap().len();
            (closed, seen)
        })
    };
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!closer.is_finished(), "close must wait for the in-flight append");

    holder.rollback().await.unwrap();
    assert_eq!(appender.await.unwrap().unwrap(), AppendOutcome::Appended);
    let (closed, seen_at_close) = closer.await.unwrap();
    assert!(closed);

    // nothing lands after the close
    let ledger = store.bids_for_auction(&auction.id).await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(seen_at_close, ledger.len());
    assert_eq!(
        store.append_bid(&bid(&auction, 900, 2)).await.unwrap(),
        AppendOutcome::Conflict
    );
}
