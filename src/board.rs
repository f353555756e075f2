use anyhow::{anyhow, Result};

use std::fmt;
use std::ops::{Deref, DerefMut, Neg};

use crate::{win, HEIGHT, MAX_MOVES, WIDTH};

mod static_masks {
    use crate::{HEIGHT, WIDTH};

    pub const fn bottom_mask() -> u64 {
        let mut mask = 0;
        let mut column = 0;
        while column < WIDTH {
            mask |= 1 << (column * (HEIGHT + 1));
            column += 1;
        }
        mask
    }
}

/// One of the two sides of the game
///
/// The discriminants are opposite signs so that negation swaps sides.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
#[repr(i8)]
pub enum Player {
    One = 1,
    Two = -1,
}

impl Player {
    pub fn sign(self) -> i32 {
        self as i8 as i32
    }

    pub fn opponent(self) -> Self {
        -self
    }
}

impl Neg for Player {
    type Output = Player;

    fn neg(self) -> Self::Output {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::One => write!(f, "Player 1"),
            Player::Two => write!(f, "Player 2"),
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
#[repr(i8)]
pub enum Cell {
    PlayerTwo = -1,
    Empty = 0,
    PlayerOne = 1,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn owner(&self) -> Option<Player> {
        match self {
            Cell::PlayerOne => Some(Player::One),
            Cell::PlayerTwo => Some(Player::Two),
            Cell::Empty => None,
        }
    }
}

impl From<Player> for Cell {
    fn from(player: Player) -> Self {
        match player {
            Player::One => Cell::PlayerOne,
            Player::Two => Cell::PlayerTwo,
        }
    }
}

impl Neg for Cell {
    type Output = Cell;

    fn neg(self) -> Self::Output {
        match self {
            Cell::PlayerOne => Cell::PlayerTwo,
            Cell::PlayerTwo => Cell::PlayerOne,
            Cell::Empty => Cell::Empty,
        }
    }
}

/// A Connect 4 grid made of `WIDTH` independent column stacks
///
/// The board is shared by the driver and the search and is mutated in place:
/// every [`play`](Board::play) made while searching is undone by a matching
/// [`take_back`](Board::take_back) before the searching frame returns.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Board {
    cells: [Cell; WIDTH * HEIGHT], // cells are stored left-to-right, bottom-to-top
    heights: [usize; WIDTH],
    num_moves: usize,
    // mask of player one's tiles
    player_one_mask: u64,
    // mask of all tiles
    board_mask: u64,
}

impl Board {
    /// Creates an empty board
    pub fn new() -> Self {
        Self {
            cells: [Cell::Empty; WIDTH * HEIGHT],
            heights: [0; WIDTH],
            num_moves: 0,
            player_one_mask: 0,
            board_mask: 0,
        }
    }

    /// Builds a board from a string of 1-indexed columns, player one moving first
    pub fn from_moves<S: AsRef<str>>(moves: S) -> Result<Self> {
        let mut board = Self::new();
        let mut player = Player::One;

        for column_char in moves.as_ref().chars() {
            match column_char.to_digit(10).map(|c| c as usize) {
                Some(column @ 1..=WIDTH) => {
                    let column = column - 1;
                    if !board.is_playable(column) {
                        return Err(anyhow!("Invalid move, column {} full", column + 1));
                    }
                    // abort if the position is won at any point
                    if win::there_is_a_winner(&board).is_some() {
                        return Err(anyhow!("Invalid position, game is over"));
                    }
                    board.play(column, player);
                    player = -player;
                }
                _ => return Err(anyhow!("could not parse '{}' as a valid move", column_char)),
            }
        }
        Ok(board)
    }

    fn mask(column: usize, row: usize) -> u64 {
        1 << (column * (HEIGHT + 1) + row)
    }

    /// The contents of a cell, row 0 being the bottom of the column
    pub fn get(&self, column: usize, row: usize) -> Cell {
        self.cells[column + WIDTH * row]
    }

    /// The number of discs in a column
    pub fn height(&self, column: usize) -> usize {
        self.heights[column]
    }

    pub fn num_moves(&self) -> usize {
        self.num_moves
    }

    pub fn is_full(&self) -> bool {
        self.num_moves == MAX_MOVES
    }

    pub fn is_playable(&self, column: usize) -> bool {
        column < WIDTH && self.heights[column] < HEIGHT
    }

    /// Columns that still have room, in ascending order
    pub fn valid_moves(&self) -> Vec<usize> {
        (0..WIDTH).filter(|&column| self.is_playable(column)).collect()
    }

    /// Drops a disc for `player` into `column`
    ///
    /// Returns `false` without touching the board if the column is full or
    /// out of range.
    pub fn play(&mut self, column: usize, player: Player) -> bool {
        if !self.is_playable(column) {
            return false;
        }
        let row = self.heights[column];
        self.cells[column + WIDTH * row] = player.into();
        self.heights[column] += 1;
        self.num_moves += 1;

        self.board_mask |= Self::mask(column, row);
        if player == Player::One {
            self.player_one_mask |= Self::mask(column, row);
        }
        true
    }

    /// Removes the top disc of `column`
    ///
    /// Returns `false` if the column is empty or out of range.
    pub fn take_back(&mut self, column: usize) -> bool {
        if column >= WIDTH || self.heights[column] == 0 {
            return false;
        }
        self.heights[column] -= 1;
        let row = self.heights[column];
        self.cells[column + WIDTH * row] = Cell::Empty;
        self.num_moves -= 1;

        self.board_mask &= !Self::mask(column, row);
        self.player_one_mask &= !Self::mask(column, row);
        true
    }

    /// Plays a move that is taken back when the returned guard is dropped
    pub fn play_scoped(&mut self, column: usize, player: Player) -> Option<PlayedMove<'_>> {
        if self.play(column, player) {
            Some(PlayedMove {
                board: self,
                column,
                player,
            })
        } else {
            None
        }
    }

    /// Key for the transposition table
    ///
    /// Each column holds one bit per player one tile plus a sentinel bit
    /// above the stack, so equal keys mean equal positions.
    pub fn key(&self, side: Player) -> u64 {
        let position = self.player_one_mask + self.board_mask + static_masks::bottom_mask();
        match side {
            Player::One => position,
            Player::Two => position | 1 << 63,
        }
    }

    fn top(&self, column: usize) -> Cell {
        match self.heights[column] {
            0 => Cell::Empty,
            height => self.get(column, height - 1),
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..HEIGHT).rev() {
            for column in 0..WIDTH {
                let symbol = match self.get(column, row) {
                    Cell::PlayerOne => 'X',
                    Cell::PlayerTwo => 'O',
                    Cell::Empty => '.',
                };
                write!(f, "{}", symbol)?;
            }
            writeln!(f)?;
        }
        let columns: String = (1..=WIDTH).map(|x| x.to_string()).collect();
        write!(f, "{}", columns)
    }
}

/// A move in progress on a borrowed board, taken back on drop
pub struct PlayedMove<'a> {
    board: &'a mut Board,
    column: usize,
    player: Player,
}

impl PlayedMove<'_> {
    pub fn column(&self) -> usize {
        self.column
    }
}

impl Deref for PlayedMove<'_> {
    type Target = Board;

    fn deref(&self) -> &Self::Target {
        self.board
    }
}

impl DerefMut for PlayedMove<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.board
    }
}

impl Drop for PlayedMove<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }
        // anything played above this move must already have been taken back
        assert_eq!(
            self.board.top(self.column),
            Cell::from(self.player),
            "unbalanced play/take_back in column {}",
            self.column + 1
        );
        self.board.take_back(self.column);
    }
}
