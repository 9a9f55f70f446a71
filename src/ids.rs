//! Opaque string identifiers for the three collections.
//!
//! Each collection gets its own newtype so an auction id can never be passed
//! where a user id is expected. Users are issued ids by an external identity
//! service; auction and bid ids are generated here.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(UserId, "Identifier of a registered user, issued externally");
string_id!(AuctionId, "Identifier of an auction, `auction-<uuid>`");
string_id!(BidId, "Identifier of an admitted bid, `bid-<uuid>`");

impl AuctionId {
    pub fn generate() -> Self {
        Self(format!("auction-{}", Uuid::new_v4()))
    }
}

impl BidId {
    pub fn generate() -> Self {
        Self(format!("bid-{}", Uuid::new_v4()))
    }
}
