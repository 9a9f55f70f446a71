use crate::ids::AuctionId;
use chrono::serde::ts_seconds;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} ordinal {value}")]
pub struct UnknownOrdinal {
    pub kind: &'static str,
    pub value: i16,
}

// region:    --- Status

/// Lifecycle state of an auction. The ordinals of `Open` and `Closed` match
/// the documents already stored by the bootstrap script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
#[repr(i16)]
pub enum AuctionStatus {
    Open = 0,
    Closed = 1,
    Scheduled = 2,
}

impl AuctionStatus {
    /// Position in the forward-only state machine.
    fn rank(self) -> u8 {
        match self {
            AuctionStatus::Scheduled => 0,
            AuctionStatus::Open => 1,
            AuctionStatus::Closed => 2,
        }
    }

    /// Only forward moves are legal; `Closed` is terminal.
    pub fn can_transition_to(self, next: AuctionStatus) -> bool {
        next.rank() > self.rank()
    }

    pub fn is_terminal(self) -> bool {
        self == AuctionStatus::Closed
    }
}

impl From<AuctionStatus> for i16 {
    fn from(status: AuctionStatus) -> Self {
        status as i16
    }
}

impl TryFrom<i16> for AuctionStatus {
    type Error = UnknownOrdinal;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AuctionStatus::Open),
            1 => Ok(AuctionStatus::Closed),
            2 => Ok(AuctionStatus::Scheduled),
            _ => Err(UnknownOrdinal {
                kind: "status",
                value,
            }),
        }
    }
}

// endregion: --- Status

// region:    --- Condition

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
#[repr(i16)]
pub enum ProductCondition {
    New = 0,
    Used = 1,
    Refurbished = 2,
}

impl From<ProductCondition> for i16 {
    fn from(condition: ProductCondition) -> Self {
        condition as i16
    }
}

impl TryFrom<i16> for ProductCondition {
    type Error = UnknownOrdinal;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ProductCondition::New),
            1 => Ok(ProductCondition::Used),
            2 => Ok(ProductCondition::Refurbished),
            _ => Err(UnknownOrdinal {
                kind: "condition",
                value,
            }),
        }
    }
}

// endregion: --- Condition

// region:    --- Auction

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auction {
    pub id: AuctionId,
    pub product_name: String,
    pub category: String,
    pub description: String,
    pub condition: ProductCondition,
    pub status: AuctionStatus,
    /// Creation time.
    #[serde(with = "ts_seconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(with = "ts_seconds")]
    pub starts_at: DateTime<Utc>,
    /// Bids are admitted strictly before this instant.
    #[serde(with = "ts_seconds")]
    pub ends_at: DateTime<Utc>,
}

impl Auction {
    /// Checked against the clock on every admission, independent of whether
    /// the lifecycle sweep has caught up yet.
    pub fn accepts_bids_at(&self, now: DateTime<Utc>) -> bool {
        self.status == AuctionStatus::Open && now >= self.starts_at && now < self.ends_at
    }

    /// The next status this auction is due for at `now`, if any.
    pub fn due_transition(&self, now: DateTime<Utc>) -> Option<AuctionStatus> {
        match self.status {
            AuctionStatus::Scheduled if now >= self.starts_at => Some(AuctionStatus::Open),
            AuctionStatus::Open if now >= self.ends_at => Some(AuctionStatus::Closed),
            _ => None,
        }
    }
}

/// Submission for a new auction. Missing `starts_at` means "now"; missing
/// `duration` means the configured auction interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuction {
    pub product_name: String,
    pub category: String,
    pub description: String,
    pub condition: ProductCondition,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration: Option<std::time::Duration>,
}

impl NewAuction {
    pub fn new(
        product_name: impl Into<String>,
        category: impl Into<String>,
        description: impl Into<String>,
        condition: ProductCondition,
    ) -> Self {
        Self {
            product_name: product_name.into(),
            category: category.into(),
            description: description.into(),
            condition,
            starts_at: None,
            duration: None,
        }
    }

    pub fn starting_at(mut self, starts_at: DateTime<Utc>) -> Self {
        self.starts_at = Some(starts_at);
        self
    }

    pub fn lasting(mut self, duration: std::time::Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

// endregion: --- Auction

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn auction(status: AuctionStatus) -> Auction {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        Auction {
            id: AuctionId::from("A1"),
            product_name: "iPhone 13 Pro".into(),
            category: "Electronics".into(),
            description: "256GB in excellent condition".into(),
            condition: ProductCondition::Used,
            status,
            timestamp: start,
            starts_at: start,
            ends_at: start + Duration::minutes(5),
        }
    }

    #[test]
    fn status_only_moves_forward() {
        use AuctionStatus::*;
        assert!(Scheduled.can_transition_to(Open));
        assert!(Scheduled.can_transition_to(Closed));
        assert!(Open.can_transition_to(Closed));
        assert!(!Open.can_transition_to(Scheduled));
        assert!(!Closed.can_transition_to(Open));
        assert!(!Closed.can_transition_to(Closed));
        assert!(Closed.is_terminal());
    }

    #[test]
    fn status_ordinals_round_trip_through_serde() {
        assert_eq!(serde_json::to_string(&AuctionStatus::Open).unwrap(), "0");
        assert_eq!(
            serde_json::from_str::<AuctionStatus>("1").unwrap(),
            AuctionStatus::Closed
        );
        assert!(serde_json::from_str::<AuctionStatus>("7").is_err());
    }

    #[test]
    fn admission_window_is_half_open() {
        let a = auction(AuctionStatus::Open);
        assert!(a.accepts_bids_at(a.starts_at));
        assert!(a.accepts_bids_at(a.ends_at - Duration::seconds(1)));
        assert!(!a.accepts_bids_at(a.ends_at));
        assert!(!auction(AuctionStatus::Scheduled).accepts_bids_at(a.starts_at));
        assert!(!auction(AuctionStatus::Closed).accepts_bids_at(a.starts_at));
    }

    #[test]
    fn due_transitions_follow_the_boundaries() {
        let scheduled = auction(AuctionStatus::Scheduled);
        assert_eq!(
            scheduled.due_transition(scheduled.starts_at - Duration::seconds(1)),
            None
        );
        assert_eq!(
            scheduled.due_transition(scheduled.starts_at),
            Some(AuctionStatus::Open)
        );

        let open = auction(AuctionStatus::Open);
        assert_eq!(open.due_transition(open.starts_at), None);
        assert_eq!(
            open.due_transition(open.ends_at),
            Some(AuctionStatus::Closed)
        );
        assert_eq!(auction(AuctionStatus::Closed).due_transition(open.ends_at), None);
    }
}
