//! Static scoring of positions at the search horizon

use crate::board::{Board, Cell, Player};
use crate::win::four_in_a_row;
use crate::{HEIGHT, WIDTH};

/// Score of a won position, larger than any heuristic score
pub const INFINITY: i32 = 10_000_000;

/// Positional value of owning each cell, indexed `[column][row]`
///
/// Central cells take part in more possible alignments and weigh more.
pub const EVAL_TABLE: [[i32; HEIGHT]; WIDTH] = [
    [3, 4, 5, 5, 4, 3],
    [4, 6, 8, 8, 6, 4],
    [5, 8, 11, 11, 8, 5],
    [7, 10, 13, 13, 10, 7],
    [5, 8, 11, 11, 8, 5],
    [4, 6, 8, 8, 6, 4],
    [3, 4, 5, 5, 4, 3],
];

/// Scores a position from player one's point of view
///
/// Won positions score `±INFINITY`. Otherwise the score is the weight of the
/// cells held by player one minus the weight of those held by player two,
/// which ignores threats entirely.
pub fn static_eval(board: &Board) -> i32 {
    if four_in_a_row(board, Player::One) {
        return INFINITY;
    }
    if four_in_a_row(board, Player::Two) {
        return -INFINITY;
    }

    let mut score = 0;
    for (column, weights) in EVAL_TABLE.iter().enumerate() {
        for (row, weight) in weights.iter().enumerate() {
            match board.get(column, row) {
                Cell::PlayerOne => score += weight,
                Cell::PlayerTwo => score -= weight,
                Cell::Empty => {}
            }
        }
    }
    score
}
