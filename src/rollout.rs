//! Monte Carlo evaluation by random playouts
//!
//! Playouts run on private copies of the board, so any number of them may
//! run side by side.

use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;

use crate::board::{Board, Player};
use crate::win::{four_in_a_row, there_is_a_winner};
use crate::WIDTH;

/// Plays uniformly random moves from `board`, `player` moving first
///
/// Returns the sign of the winner (0 for a filled board).
fn playout<R: Rng + ?Sized>(mut board: Board, player: Player, rng: &mut R) -> i32 {
    let mut side = player;
    let mut moves = [0; WIDTH];
    loop {
        let mut count = 0;
        for column in 0..WIDTH {
            if board.is_playable(column) {
                moves[count] = column;
                count += 1;
            }
        }
        if count == 0 {
            return 0;
        }

        board.play(moves[rng.random_range(0..count)], side);
        if four_in_a_row(&board, side) {
            return side.sign();
        }
        side = -side;
    }
}

fn settled(board: &Board) -> Option<f64> {
    match there_is_a_winner(board) {
        Some(winner) => Some(winner.sign() as f64),
        None if board.is_full() => Some(0.0),
        None => None,
    }
}

/// Estimates a position by `samples` random playouts with `player` to move
///
/// The result is `(player one wins - player two wins) / samples`, in
/// `[-1, 1]`. Positions that are already decided score exactly.
pub fn rollout_eval<R: Rng + ?Sized>(board: &Board, player: Player, samples: usize, rng: &mut R) -> f64 {
    if let Some(score) = settled(board) {
        return score;
    }
    if samples == 0 {
        return 0.0;
    }

    let total: i32 = (0..samples)
        .map(|_| playout(board.clone(), player, &mut *rng))
        .sum();
    total as f64 / samples as f64
}

/// Like [`rollout_eval`], with the playouts spread over the rayon pool
///
/// Playout `i` draws from its own generator seeded with `seed + i`, so the
/// result only depends on `seed`, not on scheduling.
pub fn rollout_eval_seeded(board: &Board, player: Player, samples: usize, seed: u64) -> f64 {
    if let Some(score) = settled(board) {
        return score;
    }
    if samples == 0 {
        return 0.0;
    }

    let total: i32 = (0..samples)
        .into_par_iter()
        .map(|i| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
            playout(board.clone(), player, &mut rng)
        })
        .sum();
    total as f64 / samples as f64
}
