//! Read paths consumed by the catalog, search and history collaborators.

use crate::auction::model::AuctionStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod handlers;
pub mod queries;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 500;

/// Catalog listing filter. Unset fields do not filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionFilter {
    pub status: Option<AuctionStatus>,
    pub category: Option<String>,
    /// Inclusive lower bound on creation time.
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub created_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on creation time.
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub created_to: Option<DateTime<Utc>>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for AuctionFilter {
    fn default() -> Self {
        Self {
            status: None,
            category: None,
            created_from: None,
            created_to: None,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl AuctionFilter {
    pub fn with_status(mut self, status: AuctionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn created_between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.created_from = Some(from);
        self.created_to = Some(to);
        self
    }

    pub fn page(mut self, limit: i64, offset: i64) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    /// Clamps paging to sane bounds.
    pub fn normalized(mut self) -> Self {
        self.limit = self.limit.clamp(1, MAX_PAGE_SIZE);
        self.offset = self.offset.max(0);
        self
    }

    pub fn matches(&self, auction: &crate::auction::model::Auction) -> bool {
        self.status.map_or(true, |s| auction.status == s)
            && self
                .category
                .as_deref()
                .map_or(true, |c| auction.category == c)
            && self.created_from.map_or(true, |t| auction.timestamp >= t)
            && self.created_to.map_or(true, |t| auction.timestamp < t)
    }
}

/// Splits text into lowercase alphanumeric words, the unit both full-text
/// backends match on.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}
