pub mod commands;
pub mod model;

pub use commands::{BidAdmission, PlaceBidCommand};
pub use model::Bid;
