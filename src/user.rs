use crate::ids::UserId;
use serde::{Deserialize, Serialize};

/// A registered bidder. Owned by the identity service; this crate only stores
/// and looks users up so bids can reference them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
}

impl User {
    pub fn new(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}
