use crate::ids::{AuctionId, BidId, UserId};
use crate::money::Amount;
use chrono::serde::ts_seconds;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An admitted bid. Immutable once persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    pub id: BidId,
    pub user_id: UserId,
    pub auction_id: AuctionId,
    pub amount: Amount,
    /// Assigned at admission, never taken from the client.
    #[serde(with = "ts_seconds")]
    pub timestamp: DateTime<Utc>,
    /// 1-based position in the auction's ledger. A bid with sequence `n + 1`
    /// can only be appended while the ledger head is `n`.
    pub sequence: i64,
}
