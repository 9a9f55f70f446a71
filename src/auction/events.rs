use super::model::AuctionStatus;
use crate::ids::AuctionId;
use chrono::serde::ts_seconds;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    /// Closing time reached.
    Expired,
    /// Closed on request before its closing time.
    Administrative,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum AuctionEvent {
    // start time reached
    Opened {
        auction_id: AuctionId,
        #[serde(with = "ts_seconds")]
        timestamp: DateTime<Utc>,
    },
    // terminal
    Closed {
        auction_id: AuctionId,
        from: AuctionStatus,
        reason: CloseReason,
        #[serde(with = "ts_seconds")]
        timestamp: DateTime<Utc>,
    },
}

impl AuctionEvent {
    pub fn auction_id(&self) -> &AuctionId {
        match self {
            AuctionEvent::Opened { auction_id, .. } | AuctionEvent::Closed { auction_id, .. } => {
                auction_id
            }
        }
    }

    pub fn status(&self) -> AuctionStatus {
        match self {
            AuctionEvent::Opened { .. } => AuctionStatus::Open,
            AuctionEvent::Closed { .. } => AuctionStatus::Closed,
        }
    }
}
