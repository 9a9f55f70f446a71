//! Bid admission
//!
//! A bid is validated against the auction's current state and highest bid,
//! then committed with one conditional append that only succeeds while the
//! ledger head is still the one that was read. Losing that race re-reads and
//! re-validates, a bounded number of times.
// region:    --- Imports
use super::model::Bid;
use crate::clock::Clock;
use crate::config::{StoreConfig, DEFAULT_MAX_BID_RETRIES};
use crate::error::AdmissionError;
use crate::ids::{AuctionId, BidId, UserId};
use crate::money::Amount;
use crate::store::{AppendOutcome, Store};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
// endregion: --- Imports

// region:    --- Commands

/// A bid as submitted. Carries no timestamp: admission assigns it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PlaceBidCommand {
    pub auction_id: AuctionId,
    pub user_id: UserId,
    pub amount: Amount,
}

impl PlaceBidCommand {
    pub fn new(
        auction_id: impl Into<AuctionId>,
        user_id: impl Into<UserId>,
        amount: Amount,
    ) -> Self {
        Self {
            auction_id: auction_id.into(),
            user_id: user_id.into(),
            amount,
        }
    }
}

// endregion: --- Commands

// region:    --- Admission

pub struct BidAdmission<S: Store> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    max_retries: u32,
}

impl<S: Store> BidAdmission<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            max_retries: DEFAULT_MAX_BID_RETRIES,
        }
    }

    /// Takes the retry bound from `MAX_BID_RETRIES`.
    pub fn from_config(store: Arc<S>, clock: Arc<dyn Clock>, config: &StoreConfig) -> Self {
        Self::new(store, clock).with_max_retries(config.max_bid_retries)
    }

    /// Retries after the first attempt before giving up with `BidConflict`.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Admits `cmd` or says why not. Rejections are checked in order:
    /// auction exists, auction open at the current time, amount positive,
    /// amount above the highest bid, bidder registered.
    ///
    /// May retry internally; callers should bound it with a timeout. A
    /// timed-out call either admitted the bid in full or wrote nothing.
    pub async fn place_bid(&self, cmd: PlaceBidCommand) -> Result<Bid, AdmissionError> {
        info!("{:<12} --> place bid: {:?}", "Admission", cmd);
        let attempts = self.max_retries.saturating_add(1);
        let mut user_checked = false;

        for attempt in 1..=attempts {
            let auction = self
                .store
                .get_auction(&cmd.auction_id)
                .await?
                .ok_or_else(|| AdmissionError::AuctionNotFound(cmd.auction_id.clone()))?;

            // never cached: a closing time that passed before the sweep ran
            // still rejects
            let now = self.clock.now();
            if !auction.accepts_bids_at(now) {
                return Err(AdmissionError::AuctionClosed {
                    auction_id: auction.id,
                    status: auction.status,
                });
            }

            if !cmd.amount.is_positive() {
                return Err(AdmissionError::InvalidAmount(cmd.amount));
            }

            let head = self.store.highest_bid(&cmd.auction_id).await?;
            let highest = head.as_ref().map_or(Amount::ZERO, |b| b.amount);
            if cmd.amount <= highest {
                return Err(AdmissionError::BidTooLow {
                    amount: cmd.amount,
                    highest,
                });
            }

            if !user_checked {
                if self.store.get_user(&cmd.user_id).await?.is_none() {
                    return Err(AdmissionError::UserNotFound(cmd.user_id.clone()));
                }
                user_checked = true;
            }

            let bid = Bid {
                id: BidId::generate(),
                user_id: cmd.user_id.clone(),
                auction_id: cmd.auction_id.clone(),
                amount: cmd.amount,
                timestamp: now,
                sequence: head.as_ref().map_or(0, |b| b.sequence) + 1,
            };

            match self.store.append_bid(&bid).await? {
                AppendOutcome::Appended => {
                    info!(
                        "{:<12} --> bid admitted: id={}, auction={}, amount={}, sequence={}",
                        "Admission", bid.id, bid.auction_id, bid.amount, bid.sequence
                    );
                    return Ok(bid);
                }
                AppendOutcome::Conflict => {
                    warn!(
                        "{:<12} --> write conflict on auction {}, retry {}/{}",
                        "Admission", cmd.auction_id, attempt, attempts
                    );
                    if attempt < attempts {
                        tokio::time::sleep(Duration::from_millis(u64::from(attempt))).await;
                    }
                }
            }
        }

        Err(AdmissionError::BidConflict { attempts })
    }
}

// endregion: --- Admission
