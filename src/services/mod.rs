pub mod auction_api;
pub mod live_session;

pub use auction_api::{AuctionApi, AuctionResource};
pub use live_session::{LiveSession, SessionEvent};
