pub mod auction;
pub mod bidding;
pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod ids;
pub mod money;
pub mod query;
pub mod scheduler;
pub mod schema;
pub mod seed;
pub mod store;
pub mod user;

pub use auction::{AuctionLifecycle, AuctionOutcome};
pub use bidding::{BidAdmission, PlaceBidCommand};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::StoreConfig;
pub use error::{AdmissionError, ErrorKind, LifecycleError, StoreError};
pub use money::Amount;
pub use store::{MemoryStore, PgStore, Store};
