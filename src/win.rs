//! Brute force detection of aligned discs
//!
//! Every call rescans the whole grid. The board is small and the search only
//! asks once per node, so no incremental bookkeeping is kept.

use crate::board::{Board, Cell, Player};
use crate::{ALIGNMENT, HEIGHT, WIDTH};

// (column step, row step): vertical, horizontal, diagonal /, diagonal \
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

fn aligned_from(board: &Board, cell: Cell, column: usize, row: usize, (dx, dy): (isize, isize)) -> bool {
    (0..ALIGNMENT as isize).all(|i| {
        let x = column as isize + i * dx;
        let y = row as isize + i * dy;
        x >= 0
            && x < WIDTH as isize
            && y >= 0
            && y < HEIGHT as isize
            && board.get(x as usize, y as usize) == cell
    })
}

/// Checks if `player` has `ALIGNMENT` discs in a line in any direction
pub fn four_in_a_row(board: &Board, player: Player) -> bool {
    let cell = Cell::from(player);
    (0..WIDTH).any(|column| {
        (0..HEIGHT).any(|row| {
            board.get(column, row) == cell
                && DIRECTIONS
                    .iter()
                    .any(|&direction| aligned_from(board, cell, column, row, direction))
        })
    })
}

/// Returns the player with an alignment on the board, if any
///
/// With alternating play both sides can never be aligned at once, so player
/// one is simply checked first.
pub fn there_is_a_winner(board: &Board) -> Option<Player> {
    [Player::One, Player::Two]
        .iter()
        .copied()
        .find(|&player| four_in_a_row(board, player))
}

/// Checks whether playing `column` would give `player` an alignment
///
/// The move is taken back before returning, so the board is left unchanged.
/// A full or out of range column is never a winning move.
pub fn is_winning_move(board: &mut Board, column: usize, player: Player) -> bool {
    match board.play_scoped(column, player) {
        Some(played) => four_in_a_row(&played, player),
        None => false,
    }
}
