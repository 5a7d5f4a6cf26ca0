//! Server side of the leaderboard: score submission against an atomic
//! key-value store.

pub use config::*;
pub use error::*;
pub use service::*;
pub use store::*;

mod config;
mod error;
mod service;
mod store;
