// region:    --- Imports
use super::{AppendOutcome, Store};
use crate::auction::model::{Auction, AuctionStatus, ProductCondition};
use crate::bidding::model::Bid;
use crate::database::DatabaseManager;
use crate::error::StoreError;
use crate::ids::{AuctionId, UserId};
use crate::money::Amount;
use crate::query::{queries, AuctionFilter};
use crate::schema::{Schema, SchemaDescription};
use crate::user::User;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::sync::Arc;
use tracing::{debug, info};
// endregion: --- Imports

// region:    --- Rows

#[derive(FromRow)]
struct UserRow {
    id: String,
    name: String,
}

#[derive(FromRow)]
struct AuctionRow {
    id: String,
    product_name: String,
    category: String,
    description: String,
    condition: i16,
    status: i16,
    timestamp: i64,
    starts_at: i64,
    ends_at: i64,
}

#[derive(FromRow)]
struct BidRow {
    id: String,
    user_id: String,
    auction_id: String,
    amount: i64,
    timestamp: i64,
    sequence: i64,
}

#[derive(FromRow)]
struct NameRow {
    name: String,
}

fn from_epoch(
    collection: &'static str,
    id: &str,
    secs: i64,
) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| StoreError::Corrupt {
        collection,
        id: id.to_owned(),
        reason: format!("timestamp {secs} out of range"),
    })
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User::new(row.id, row.name)
    }
}

impl TryFrom<AuctionRow> for Auction {
    type Error = StoreError;

    fn try_from(row: AuctionRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| StoreError::Corrupt {
            collection: "auctions",
            id: row.id.clone(),
            reason,
        };
        let status = AuctionStatus::try_from(row.status).map_err(|e| corrupt(e.to_string()))?;
        let condition =
            ProductCondition::try_from(row.condition).map_err(|e| corrupt(e.to_string()))?;
        let timestamp = from_epoch("auctions", &row.id, row.timestamp)?;
        let starts_at = from_epoch("auctions", &row.id, row.starts_at)?;
        let ends_at = from_epoch("auctions", &row.id, row.ends_at)?;
        Ok(Auction {
            id: AuctionId::from(row.id),
            product_name: row.product_name,
            category: row.category,
            description: row.description,
            condition,
            status,
            timestamp,
            starts_at,
            ends_at,
        })
    }
}

impl TryFrom<BidRow> for Bid {
    type Error = StoreError;

    fn try_from(row: BidRow) -> Result<Self, Self::Error> {
        let timestamp = from_epoch("bids", &row.id, row.timestamp)?;
        Ok(Bid {
            id: row.id.into(),
            user_id: row.user_id.into(),
            auction_id: row.auction_id.into(),
            amount: Amount::from_minor(row.amount),
            timestamp,
            sequence: row.sequence,
        })
    }
}

fn into_auctions(rows: Vec<AuctionRow>) -> Result<Vec<Auction>, StoreError> {
    rows.into_iter().map(Auction::try_from).collect()
}

fn into_bids(rows: Vec<BidRow>) -> Result<Vec<Bid>, StoreError> {
    rows.into_iter().map(Bid::try_from).collect()
}

/// Maps a unique-key violation on insert to `Duplicate`.
fn insert_error(e: sqlx::Error, collection: &'static str, id: &str) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate {
            collection,
            id: id.to_owned(),
        },
        _ => e.into(),
    }
}

// endregion: --- Rows

// region:    --- PgStore

/// PostgreSQL backend.
#[derive(Clone)]
pub struct PgStore {
    db: Arc<DatabaseManager>,
}

impl PgStore {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ensure_schema(&self, schema: &Schema) -> Result<(), StoreError> {
        info!("{:<12} --> ensure schema", "Store");
        self.db.initialize_database(schema).await
    }

    async fn describe_schema(&self, schema: &Schema) -> Result<SchemaDescription, StoreError> {
        let tables: Vec<String> = schema
            .collections
            .iter()
            .map(|c| c.name().to_owned())
            .collect();
        let collections = sqlx::query_as::<_, NameRow>(queries::DESCRIBE_TABLES)
            .bind(tables.as_slice())
            .fetch_all(self.db.pool())
            .await?;
        let indexes = sqlx::query_as::<_, NameRow>(queries::DESCRIBE_INDEXES)
            .bind(tables.as_slice())
            .fetch_all(self.db.pool())
            .await?;
        Ok(SchemaDescription {
            collections: collections.into_iter().map(|r| r.name).collect(),
            indexes: indexes.into_iter().map(|r| r.name).collect(),
        })
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(queries::INSERT_USER)
            .bind(user.id.as_str())
            .bind(&user.name)
            .execute(self.db.pool())
            .await
            .map_err(|e| insert_error(e, "users", user.id.as_str()))?;
        Ok(())
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(queries::GET_USER)
            .bind(id.as_str())
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row.map(User::from))
    }

    async fn insert_auction(&self, auction: &Auction) -> Result<(), StoreError> {
        sqlx::query(queries::INSERT_AUCTION)
            .bind(auction.id.as_str())
            .bind(&auction.product_name)
            .bind(&auction.category)
            .bind(&auction.description)
            .bind(i16::from(auction.condition))
            .bind(i16::from(auction.status))
            .bind(auction.timestamp.timestamp())
            .bind(auction.starts_at.timestamp())
            .bind(auction.ends_at.timestamp())
            .execute(self.db.pool())
            .await
            .map_err(|e| insert_error(e, "auctions", auction.id.as_str()))?;
        Ok(())
    }

    async fn get_auction(&self, id: &AuctionId) -> Result<Option<Auction>, StoreError> {
        sqlx::query_as::<_, AuctionRow>(queries::GET_AUCTION)
            .bind(id.as_str())
            .fetch_optional(self.db.pool())
            .await?
            .map(Auction::try_from)
            .transpose()
    }

    async fn list_auctions(&self, filter: &AuctionFilter) -> Result<Vec<Auction>, StoreError> {
        let rows = sqlx::query_as::<_, AuctionRow>(queries::LIST_AUCTIONS)
            .bind(filter.status.map(i16::from))
            .bind(filter.category.as_deref())
            .bind(filter.created_from.map(|t| t.timestamp()))
            .bind(filter.created_to.map(|t| t.timestamp()))
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(self.db.pool())
            .await?;
        into_auctions(rows)
    }

    async fn search_auctions(
        &self,
        terms: &[String],
        limit: i64,
    ) -> Result<Vec<Auction>, StoreError> {
        let rows = sqlx::query_as::<_, AuctionRow>(queries::SEARCH_AUCTIONS)
            .bind(terms.join(" "))
            .bind(limit)
            .fetch_all(self.db.pool())
            .await?;
        into_auctions(rows)
    }

    async fn due_auctions(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, StoreError> {
        let rows = sqlx::query_as::<_, AuctionRow>(queries::DUE_AUCTIONS)
            .bind(i16::from(AuctionStatus::Scheduled))
            .bind(i16::from(AuctionStatus::Open))
            .bind(now.timestamp())
            .fetch_all(self.db.pool())
            .await?;
        into_auctions(rows)
    }

    async fn update_status(
        &self,
        id: &AuctionId,
        from: AuctionStatus,
        to: AuctionStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(queries::UPDATE_STATUS)
            .bind(id.as_str())
            .bind(i16::from(from))
            .bind(i16::from(to))
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn highest_bid(&self, auction_id: &AuctionId) -> Result<Option<Bid>, StoreError> {
        sqlx::query_as::<_, BidRow>(queries::GET_HIGHEST_BID)
            .bind(auction_id.as_str())
            .fetch_optional(self.db.pool())
            .await?
            .map(Bid::try_from)
            .transpose()
    }

    async fn append_bid(&self, bid: &Bid) -> Result<AppendOutcome, StoreError> {
        let candidate = bid.clone();
        let inserted = self
            .db
            .transaction(move |tx| {
                Box::pin(async move {
                    sqlx::query(queries::LOCK_AUCTION_FOR_BID)
                        .bind(candidate.auction_id.as_str())
                        .execute(&mut **tx)
                        .await?;
                    let inserted = sqlx::query_scalar::<_, String>(queries::APPEND_BID)
                        .bind(candidate.id.as_str())
                        .bind(candidate.user_id.as_str())
                        .bind(candidate.auction_id.as_str())
                        .bind(candidate.amount.minor())
                        .bind(candidate.timestamp.timestamp())
                        .bind(candidate.sequence)
                        .bind(i16::from(AuctionStatus::Open))
                        .fetch_optional(&mut **tx)
                        .await
                        // a bid id already in the ledger
                        .map_err(|e| insert_error(e, "bids", candidate.id.as_str()))?;
                    Ok::<_, StoreError>(inserted)
                })
            })
            .await?;

        match inserted {
            Some(_) => Ok(AppendOutcome::Appended),
            None => {
                debug!(
                    "{:<12} --> append rejected: auction={}, sequence={}",
                    "Store", bid.auction_id, bid.sequence
                );
                Ok(AppendOutcome::Conflict)
            }
        }
    }

    async fn bids_for_auction(&self, auction_id: &AuctionId) -> Result<Vec<Bid>, StoreError> {
        let rows = sqlx::query_as::<_, BidRow>(queries::GET_BID_HISTORY)
            .bind(auction_id.as_str())
            .fetch_all(self.db.pool())
            .await?;
        into_bids(rows)
    }

    async fn bids_for_user(&self, user_id: &UserId) -> Result<Vec<Bid>, StoreError> {
        let rows = sqlx::query_as::<_, BidRow>(queries::GET_USER_BIDS)
            .bind(user_id.as_str())
            .fetch_all(self.db.pool())
            .await?;
        into_bids(rows)
    }
}

// endregion: --- PgStore
