//! A depth-limited search engine for the board game 'Connect 4'
//!
//! Positions are stored as a pair of bitboards with an incrementally
//! maintained Zobrist hash. The engine runs an alpha-beta minimax search to a
//! fixed depth, scoring leaves with a line-counting heuristic, and caches
//! results for each position and its mirror image in a transposition table
//! that can be shared between worker threads.
//!
//! # Basic Usage
//!
//! ```
//! use connect4_engine::{bitboard::Position, solver::Solver, zobrist::Zobrist};
//!
//!# use std::error::Error;
//!# fn main() -> Result<(), Box<dyn Error>> {
//! let zobrist = Zobrist::new();
//! // red has three in a row along the bottom, and it is red's turn
//! let position = Position::from_moves(&zobrist, "001122")?;
//! let solver = Solver::new(position);
//! let (score, best_move) = solver.solve(4);
//!
//! assert_eq!(best_move, Some(3));
//! assert_eq!(score, connect4_engine::heuristic::WIN_SCORE);
//!# Ok(())
//!# }
//! ```

use static_assertions::*;
pub use anyhow;

pub mod zobrist;

pub mod bitboard;

pub mod heuristic;

pub mod symmetry;

pub mod transposition_table;

pub mod solver;


pub use bitboard::{Color, Position};
pub use heuristic::Score;
pub use solver::Solver;
pub use transposition_table::{Bound, ReplacementPolicy, TTEntry, TranspositionTable};
pub use zobrist::Zobrist;

/// The width of the game board in tiles
pub const WIDTH: usize = 7;

/// The height of the game board in tiles
pub const HEIGHT: usize = 6;

// ensure that the given dimensions fit in a u64 for the bitboard representation
const_assert!(WIDTH * (HEIGHT + 1) < 64);

/// Searches `position` to `depth` plies and returns the column to play
///
/// Returns `None` when the game is already over or `depth` is zero.
pub fn best_move(position: Position<'_>, depth: u32) -> Option<usize> {
    Solver::new(position).best_move(depth)
}
