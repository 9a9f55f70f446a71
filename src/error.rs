//! Error types for the store, the bid admission engine and the lifecycle
//! controller.
//!
//! Every error maps onto one [`ErrorKind`] so collaborators can decide between
//! "show the user", "retry" and "back off" without matching on every variant.

use crate::auction::model::AuctionStatus;
use crate::ids::{AuctionId, UserId};
use crate::money::Amount;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Referenced auction or user is absent.
    NotFound,
    /// Non-positive amount, malformed id or document.
    InvalidInput,
    /// Auction not open, bid too low, illegal status transition.
    StateConflict,
    /// Lost an optimistic write race; retryable.
    WriteConflict,
    /// The underlying store failed.
    StorageUnavailable,
}

// region:    --- Store Error

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("invalid store input: {0}")]
    Invalid(String),

    #[error("duplicate {collection} document: {id}")]
    Duplicate {
        collection: &'static str,
        id: String,
    },

    #[error("corrupt {collection} document {id}: {reason}")]
    Corrupt {
        collection: &'static str,
        id: String,
        reason: String,
    },
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Unavailable(_) | StoreError::Corrupt { .. } => {
                ErrorKind::StorageUnavailable
            }
            StoreError::Duplicate { .. } => ErrorKind::StateConflict,
            StoreError::Invalid(_) => ErrorKind::InvalidInput,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

// endregion: --- Store Error

// region:    --- Admission Error

#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("auction not found: {0}")]
    AuctionNotFound(AuctionId),

    #[error("user not found: {0}")]
    UserNotFound(UserId),

    #[error("auction {auction_id} is not accepting bids (status {status:?})")]
    AuctionClosed {
        auction_id: AuctionId,
        status: AuctionStatus,
    },

    #[error("bid amount must be positive, got {0}")]
    InvalidAmount(Amount),

    #[error("bid of {amount} does not exceed the highest bid of {highest}")]
    BidTooLow { amount: Amount, highest: Amount },

    #[error("bid lost the write race {attempts} times, try again")]
    BidConflict { attempts: u32 },

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl AdmissionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdmissionError::AuctionNotFound(_) | AdmissionError::UserNotFound(_) => {
                ErrorKind::NotFound
            }
            AdmissionError::InvalidAmount(_) => ErrorKind::InvalidInput,
            AdmissionError::AuctionClosed { .. } | AdmissionError::BidTooLow { .. } => {
                ErrorKind::StateConflict
            }
            AdmissionError::BidConflict { .. } => ErrorKind::WriteConflict,
            AdmissionError::Storage(e) => e.kind(),
        }
    }
}

// endregion: --- Admission Error

// region:    --- Lifecycle Error

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("auction not found: {0}")]
    AuctionNotFound(AuctionId),

    #[error("invalid auction: {0}")]
    InvalidInput(String),

    #[error("auction {auction_id} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        auction_id: AuctionId,
        from: AuctionStatus,
        to: AuctionStatus,
    },

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl LifecycleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LifecycleError::AuctionNotFound(_) => ErrorKind::NotFound,
            LifecycleError::InvalidInput(_) => ErrorKind::InvalidInput,
            LifecycleError::InvalidTransition { .. } => ErrorKind::StateConflict,
            LifecycleError::Storage(e) => e.kind(),
        }
    }
}

// endregion: --- Lifecycle Error
