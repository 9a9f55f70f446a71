//! Auction lifecycle controller
//! 1. Create
//! 2. Administrative close
//! 3. Sweep due transitions
//! 4. Outcome
//!
//! Auctions move SCHEDULED -> OPEN -> CLOSED. Every transition is a
//! conditional write on the stored status, so concurrent sweepers and
//! administrative closes never apply the same move twice or move backwards.
// region:    --- Imports
use super::events::{AuctionEvent, CloseReason};
use super::model::{Auction, AuctionStatus, NewAuction};
use crate::bidding::model::Bid;
use crate::clock::Clock;
use crate::error::LifecycleError;
use crate::ids::AuctionId;
use crate::store::Store;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
// endregion: --- Imports

const MIN_DESCRIPTION_LEN: usize = 10;

/// What a closed (or expired) auction resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AuctionOutcome {
    /// Still scheduled, or open before its closing time.
    Running { status: AuctionStatus },
    /// Highest admitted bid wins.
    Sold(Bid),
    Unsold,
}

pub struct AuctionLifecycle<S: Store> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    auction_interval: Duration,
}

impl<S: Store> AuctionLifecycle<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, auction_interval: Duration) -> Self {
        Self {
            store,
            clock,
            auction_interval,
        }
    }

    /// 1. Create
    pub async fn create_auction(&self, new: NewAuction) -> Result<Auction, LifecycleError> {
        validate(&new)?;
        let now = self.clock.now();
        let starts_at = new.starts_at.unwrap_or(now);
        let duration = new.duration.unwrap_or(self.auction_interval);
        let duration = chrono::Duration::from_std(duration)
            .map_err(|_| LifecycleError::InvalidInput("duration out of range".into()))?;
        if duration < chrono::Duration::seconds(1) {
            return Err(LifecycleError::InvalidInput(
                "duration must be at least one second".into(),
            ));
        }

        let ends_at = starts_at
            .checked_add_signed(duration)
            .ok_or_else(|| LifecycleError::InvalidInput("closing time out of range".into()))?;

        let status = if starts_at <= now {
            AuctionStatus::Open
        } else {
            AuctionStatus::Scheduled
        };
        let auction = Auction {
            id: AuctionId::generate(),
            product_name: new.product_name.trim().to_owned(),
            category: new.category.trim().to_owned(),
            description: new.description,
            condition: new.condition,
            status,
            timestamp: now,
            starts_at,
            ends_at,
        };
        self.store.insert_auction(&auction).await?;

        info!(
            "{:<12} --> auction created: id={}, status={:?}, ends_at={}",
            "Lifecycle", auction.id, auction.status, auction.ends_at
        );
        Ok(auction)
    }

    /// 2. Administrative close. Allowed from SCHEDULED (cancel before start) and
    /// OPEN; closing a closed auction is an `InvalidTransition`.
    pub async fn close_auction(&self, id: &AuctionId) -> Result<AuctionEvent, LifecycleError> {
        // each lost race means the status moved forward, so this ends
        loop {
            let auction = self.load(id).await?;
            let from = auction.status;
            if !from.can_transition_to(AuctionStatus::Closed) {
                return Err(LifecycleError::InvalidTransition {
                    auction_id: id.clone(),
                    from,
                    to: AuctionStatus::Closed,
                });
            }

            if self
                .store
                .update_status(id, from, AuctionStatus::Closed)
                .await?
            {
                let now = self.clock.now();
                let reason = if from == AuctionStatus::Open && now >= auction.ends_at {
                    CloseReason::Expired
                } else {
                    CloseReason::Administrative
                };
                info!(
                    "{:<12} --> auction closed: id={}, from={:?}, reason={:?}",
                    "Lifecycle", id, from, reason
                );
                return Ok(AuctionEvent::Closed {
                    auction_id: id.clone(),
                    from,
                    reason,
                    timestamp: now,
                });
            }
            warn!(
                "{:<12} --> status changed during close, re-reading: {}",
                "Lifecycle", id
            );
        }
    }

    /// 3. Sweep. Applies every transition due at the current clock time. An auction
    /// that is past both boundaries is opened and then closed in one pass.
    pub async fn sweep(&self) -> Result<Vec<AuctionEvent>, LifecycleError> {
        let now = self.clock.now();
        let mut events = Vec::new();

        for mut auction in self.store.due_auctions(now).await? {
            while let Some(next) = auction.due_transition(now) {
                let from = auction.status;
                if !self.store.update_status(&auction.id, from, next).await? {
                    // someone else moved it; their sweep reports it
                    break;
                }
                auction.status = next;
                events.push(match next {
                    AuctionStatus::Open => AuctionEvent::Opened {
                        auction_id: auction.id.clone(),
                        timestamp: now,
                    },
                    _ => AuctionEvent::Closed {
                        auction_id: auction.id.clone(),
                        from,
                        reason: CloseReason::Expired,
                        timestamp: now,
                    },
                });
            }
        }

        if !events.is_empty() {
            info!("{:<12} --> {} transitions applied", "Lifecycle", events.len());
        }
        Ok(events)
    }

    /// 4. Outcome. An open auction past its closing time is resolved even if the sweep
    /// has not closed it yet; admission already rejects bids for it.
    pub async fn outcome(&self, id: &AuctionId) -> Result<AuctionOutcome, LifecycleError> {
        let auction = self.load(id).await?;
        let finished = auction.status == AuctionStatus::Closed
            || (auction.status == AuctionStatus::Open && self.clock.now() >= auction.ends_at);
        if !finished {
            return Ok(AuctionOutcome::Running {
                status: auction.status,
            });
        }

        Ok(match self.store.highest_bid(id).await? {
            Some(bid) => AuctionOutcome::Sold(bid),
            None => AuctionOutcome::Unsold,
        })
    }

    async fn load(&self, id: &AuctionId) -> Result<Auction, LifecycleError> {
        self.store
            .get_auction(id)
            .await
            .map_err(LifecycleError::from)?
            .ok_or_else(|| LifecycleError::AuctionNotFound(id.clone()))
    }
}

fn validate(new: &NewAuction) -> Result<(), LifecycleError> {
    let invalid = |msg: &str| Err(LifecycleError::InvalidInput(msg.to_owned()));
    if new.product_name.trim().is_empty() {
        return invalid("product_name must not be blank");
    }
    if new.category.trim().is_empty() {
        return invalid("category must not be blank");
    }
    if new.description.trim().chars().count() < MIN_DESCRIPTION_LEN {
        return invalid("description must be at least 10 characters");
    }
    Ok(())
}
