//! A depth-limited game tree agent for playing the board game 'Connect 4'
//!
//! This agent searches the game tree with alpha-beta pruning, either as a
//! classical minimax over a positional heuristic or as a negamax that scores
//! forced wins by their distance from the start of the game.
//!
//! # Basic Usage
//!
//! ```
//! use connect4_engine::{board::{Board, Player}, config::EngineConfig, engine::Engine};
//!
//!# use std::error::Error;
//!# fn main() -> Result<(), Box<dyn Error>> {
//! // player one has three discs stacked in the centre column
//! let mut board = Board::from_moves("414141")?;
//! let mut engine = Engine::new(EngineConfig::default())?;
//! let (_score, best_move) = engine.search(&mut board, Player::One, 2);
//!
//! assert_eq!(best_move, Some(3));
//!# Ok(())
//!# }
//! ```

use static_assertions::*;
pub use anyhow;

pub mod board;

pub mod win;

pub mod evaluation;

pub mod rollout;

pub mod transposition_table;

pub mod config;

pub mod engine;

mod test;

pub use board::{Board, Cell, Player};
pub use config::{EngineConfig, LeafEvaluator, SearchMode};
pub use engine::Engine;
pub use transposition_table::TranspositionTable;

/// The width of the game board in tiles
pub const WIDTH: usize = 7;

/// The height of the game board in tiles
pub const HEIGHT: usize = 6;

/// The number of aligned tiles needed to win
pub const ALIGNMENT: usize = 4;

/// The number of plies in a game that fills the board
pub const MAX_MOVES: usize = WIDTH * HEIGHT;

// ensure that a position key (plus the side-to-move bit) fits in a u64
const_assert!(WIDTH * (HEIGHT + 1) < 63);
const_assert!(ALIGNMENT <= WIDTH && ALIGNMENT <= HEIGHT);
