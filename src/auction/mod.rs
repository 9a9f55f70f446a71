pub mod events;
pub mod lifecycle;
pub mod model;

pub use events::{AuctionEvent, CloseReason};
pub use lifecycle::{AuctionLifecycle, AuctionOutcome};
pub use model::{Auction, AuctionStatus, NewAuction, ProductCondition};
