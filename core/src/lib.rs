//! Peg solitaire on the 33-hole cross board: board snapshots and move rules,
//! the leaderboard ranker, a click-driven session and a solver.

#![no_std]

extern crate alloc;

pub use board::*;
pub use engine::*;
pub use error::*;
pub use ranking::*;
pub use session::*;
pub use solver::*;
pub use tile::*;
pub use types::*;

mod board;
mod engine;
mod error;
mod ranking;
mod session;
mod solver;
mod tile;
mod types;
