//! An agent to choose moves in Connect 4 by game tree search

use anyhow::Result;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, trace};

use std::time::Instant;

use crate::board::{Board, Player};
use crate::config::{EngineConfig, LeafEvaluator, SearchMode};
use crate::evaluation::{static_eval, INFINITY};
use crate::rollout::rollout_eval_seeded;
use crate::transposition_table::TranspositionTable;
use crate::win::{is_winning_move, there_is_a_winner};
use crate::{MAX_MOVES, WIDTH};

/// The minimum possible negamax score of a position
pub const MIN_SCORE: i32 = -(MAX_MOVES as i32) / 2;
/// The maximum possible negamax score of a position
pub const MAX_SCORE: i32 = (MAX_MOVES as i32 + 1) / 2;

/// Scale applied to rollout estimates so they can be compared with minimax scores
pub const ROLLOUT_SCALE: f64 = 1000.0;

/// Returns the columns ordered from the middle outwards, as
/// the middle columns are often better moves
///
/// The left neighbour is always tried before the right one.
pub const fn move_order() -> [usize; WIDTH] {
    let mut move_order = [0; WIDTH];
    let mut i = 0;
    while i < WIDTH {
        move_order[i] = (WIDTH / 2) + (1 - i % 2) * (i / 2) - (i % 2) * (i / 2 + 1);
        i += 1;
    }
    move_order
}

const MOVE_ORDER: [usize; WIDTH] = move_order();

/// Negamax score of completing an alignment when `num_moves` discs are already down
pub fn win_score(num_moves: usize) -> i32 {
    ((MAX_MOVES + 1 - num_moves) / 2) as i32
}

/// Converts a negamax score to the number of moves the side to move still
/// has to play before the forced result (its own winning move included)
///
/// Returns `None` for a score of 0 or for a score that is out of reach from
/// a position with `num_moves` discs.
pub fn win_distance(score: i32, num_moves: usize) -> Option<usize> {
    if score == 0 {
        return None;
    }
    // the score fixes the ply of the winning disc up to one
    let mut ply = (MAX_MOVES + 2).checked_sub(2 * score.unsigned_abs() as usize)?;
    // odd distances are our own discs, even distances the opponent's
    let own_win = score > 0;
    if ply <= num_moves {
        return None;
    }
    if ((ply - num_moves) % 2 == 1) != own_win {
        ply -= 1;
        if ply <= num_moves {
            return None;
        }
    }
    Some((ply - num_moves + 1) / 2)
}

/// An agent that searches Connect 4 positions to a fixed depth
///
/// # Position Scoring
/// In [`SearchMode::Minimax`] scores are from player one's point of view:
/// `INFINITY` when player one has an alignment, `-INFINITY` when player two
/// has one, and the leaf evaluator's estimate otherwise.
///
/// In [`SearchMode::Negamax`] scores are from the point of view of the side
/// to move and count how early a forced win happens. Completing an alignment
/// with `n` discs already on the board scores `(43 - n) / 2` on a 7x6 board,
/// so a player winning with their 4th disc scores 18. A loss is the negated
/// score of the opponent's win, and positions with no forced result within
/// the search depth score 0.
pub struct Engine {
    config: EngineConfig,
    transposition_table: TranspositionTable,
    rng: StdRng,

    /// The number of nodes visited by the last search (for diagnostics only)
    pub node_count: usize,
}

impl Engine {
    /// Creates a new `Engine`, rejecting invalid configurations
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self {
            transposition_table: TranspositionTable::new(config.table_capacity),
            config,
            rng,
            node_count: 0,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Forgets all cached bounds, for use between independent games
    pub fn clear(&mut self) {
        self.transposition_table.clear();
        trace!("transposition table cleared");
    }

    /// Searches for `player`'s move to the configured depth
    pub fn best_move(&mut self, board: &mut Board, player: Player) -> (i32, Option<usize>) {
        self.search(board, player, self.config.depth_limit)
    }

    /// Searches `depth_limit` plies below the current position
    ///
    /// Returns the score of the best move (see [Position Scoring]) and its
    /// column, which is `None` only if the game is already over. Among equally
    /// scored moves the first one in centre-out order is chosen. The board is
    /// left as it was found. A depth limit of 0 searches one ply.
    ///
    /// [Position Scoring]: #position-scoring
    pub fn search(&mut self, board: &mut Board, player: Player, depth_limit: usize) -> (i32, Option<usize>) {
        let start = Instant::now();
        let depth_limit = depth_limit.max(1);
        self.node_count = 0;

        let (score, column) = match self.config.mode {
            SearchMode::Minimax => self.minimax_root(board, player, depth_limit),
            SearchMode::Negamax => {
                let horizon = (board.num_moves() + depth_limit).min(MAX_MOVES);
                self.negamax_root(board, player, horizon)
            }
        };

        let elapsed = start.elapsed();
        debug!(
            mode = ?self.config.mode,
            depth_limit,
            nodes = self.node_count,
            score,
            column = ?column,
            elapsed = ?elapsed,
            "search finished"
        );
        (score, column)
    }

    fn evaluate_leaf(&mut self, board: &Board, side: Player) -> i32 {
        match self.config.evaluator {
            LeafEvaluator::Heuristic => static_eval(board),
            LeafEvaluator::Rollout { samples } => {
                let seed = self.rng.random::<u64>();
                (rollout_eval_seeded(board, side, samples, seed) * ROLLOUT_SCALE).round() as i32
            }
        }
    }

    fn minimax_root(&mut self, board: &mut Board, side: Player, depth_limit: usize) -> (i32, Option<usize>) {
        self.node_count += 1;

        if let Some(winner) = there_is_a_winner(board) {
            return (winner.sign() * INFINITY, None);
        }

        let mut alpha = -INFINITY;
        let mut beta = INFINITY;
        let mut best: Option<(i32, usize)> = None;
        for &column in MOVE_ORDER.iter() {
            let score = match board.play_scoped(column, side) {
                Some(mut played) => self.minimax(&mut played, -side, alpha, beta, 1, depth_limit),
                None => continue,
            };

            // strict comparison keeps the earliest column on ties
            let improves = match best {
                None => true,
                Some((best_score, _)) => match side {
                    Player::One => score > best_score,
                    Player::Two => score < best_score,
                },
            };
            if improves {
                best = Some((score, column));
            }

            match side {
                Player::One => alpha = alpha.max(score),
                Player::Two => beta = beta.min(score),
            }
            if beta <= alpha {
                break;
            }
        }

        match best {
            Some((score, column)) => (score, Some(column)),
            // full board
            None => (0, None),
        }
    }

    /// Performs the minimax game tree search
    ///
    /// Player one maximises and player two minimises within the
    /// `alpha`..`beta` window.
    fn minimax(
        &mut self,
        board: &mut Board,
        side: Player,
        mut alpha: i32,
        mut beta: i32,
        depth: usize,
        depth_limit: usize,
    ) -> i32 {
        self.node_count += 1;

        if let Some(winner) = there_is_a_winner(board) {
            return winner.sign() * INFINITY;
        }
        if board.is_full() {
            return 0;
        }
        if depth >= depth_limit {
            return self.evaluate_leaf(board, side);
        }

        let mut best: Option<i32> = None;
        for &column in MOVE_ORDER.iter() {
            let score = match board.play_scoped(column, side) {
                Some(mut played) => self.minimax(&mut played, -side, alpha, beta, depth + 1, depth_limit),
                None => continue,
            };

            match side {
                Player::One => {
                    best = Some(best.map_or(score, |best| best.max(score)));
                    alpha = alpha.max(score);
                }
                Player::Two => {
                    best = Some(best.map_or(score, |best| best.min(score)));
                    beta = beta.min(score);
                }
            }
            // the opponent will never let the game reach this node
            if beta <= alpha {
                break;
            }
        }
        best.unwrap_or(0)
    }

    /// Performs a top-level negamax search, bypassing the transposition table
    fn negamax_root(&mut self, board: &mut Board, side: Player, horizon: usize) -> (i32, Option<usize>) {
        self.node_count += 1;
        let num_moves = board.num_moves();

        // the game is already over, scored as the win of the last disc played
        if let Some(winner) = there_is_a_winner(board) {
            let score = win_score(num_moves.saturating_sub(1));
            return (if winner == side { score } else { -score }, None);
        }

        // check for win for current player on this move
        for &column in MOVE_ORDER.iter() {
            if board.is_playable(column) && is_winning_move(board, column, side) {
                return (win_score(num_moves), Some(column));
            }
        }

        // check for draw (no valid moves)
        if num_moves == MAX_MOVES {
            return (0, None);
        }

        // search the next level of the tree and keep track of the best move
        let mut alpha = MIN_SCORE;
        let beta = MAX_SCORE;
        let mut best: Option<(i32, usize)> = None;
        for &column in MOVE_ORDER.iter() {
            let score = match board.play_scoped(column, side) {
                // the search window is flipped for the other player
                Some(mut played) => -self.negamax(&mut played, -side, -beta, -alpha, horizon),
                None => continue,
            };
            if best.map_or(true, |(best_score, _)| score > best_score) {
                best = Some((score, column));
            }
            if score > alpha {
                alpha = score;
            }
        }

        match best {
            Some((score, column)) => (score, Some(column)),
            None => (0, None),
        }
    }

    /// Performs the negamax game tree search
    ///
    /// Returns the score of the position for `side` (see [Position Scoring])
    /// when it lies inside `alpha`..`beta`, or a bound on the far side of the
    /// window otherwise.
    ///
    /// [Position Scoring]: #position-scoring
    fn negamax(&mut self, board: &mut Board, side: Player, mut alpha: i32, mut beta: i32, horizon: usize) -> i32 {
        self.node_count += 1;
        let num_moves = board.num_moves();

        // check for next-move win for current player
        for &column in MOVE_ORDER.iter() {
            if board.is_playable(column) && is_winning_move(board, column, side) {
                return win_score(num_moves);
            }
        }

        // check for draw
        if num_moves == MAX_MOVES {
            return 0;
        }

        // nothing is forced before the horizon
        if num_moves >= horizon {
            return 0;
        }

        // upper bound of score, as we cannot win with the next move
        let mut max = win_score(num_moves + 2);

        // tighten the bound with one stored for this position
        let key = board.key(side);
        if let Some(bound) = self.transposition_table.get(key, horizon) {
            max = max.min(bound);
        }
        if beta > max {
            // clamp beta to calculated upper bound
            beta = max;
            // if the upper bound is lower than alpha, we can prune the exploration
            if alpha >= beta {
                return beta;
            }
        }

        // search the next level of the tree
        for &column in MOVE_ORDER.iter() {
            let score = match board.play_scoped(column, side) {
                // the search window is flipped for the other player
                Some(mut played) => -self.negamax(&mut played, -side, -beta, -alpha, horizon),
                None => continue,
            };
            // if a child node's score is better than beta, we can prune the tree
            // here because a perfect opponent will not pick this branch
            if score >= beta {
                return score;
            }
            if score > alpha {
                alpha = score;
            }
        }

        self.transposition_table.set(key, horizon, alpha);
        alpha
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transposition_table::DEFAULT_CAPACITY;

    fn engine(mode: SearchMode) -> Engine {
        Engine::new(EngineConfig::default().with_mode(mode).with_seed(0)).expect("valid config")
    }

    // plain minimax without pruning, scored like the minimax search mode
    fn reference_minimax(board: &mut Board, side: Player, depth: usize, depth_limit: usize) -> i32 {
        if let Some(winner) = there_is_a_winner(board) {
            return winner.sign() * INFINITY;
        }
        if board.is_full() {
            return 0;
        }
        if depth >= depth_limit {
            return static_eval(board);
        }
        let scores: Vec<i32> = board
            .valid_moves()
            .into_iter()
            .map(|column| {
                board.play(column, side);
                let score = reference_minimax(board, -side, depth + 1, depth_limit);
                board.take_back(column);
                score
            })
            .collect();
        match side {
            Player::One => scores.into_iter().max().unwrap_or(0),
            Player::Two => scores.into_iter().min().unwrap_or(0),
        }
    }

    // full-window negamax value, found by maximising over the children
    fn best_child_value(engine: &mut Engine, board: &mut Board, side: Player, depth_limit: usize) -> i32 {
        board
            .valid_moves()
            .into_iter()
            .map(|column| {
                board.play(column, side);
                let (score, _) = engine.search(board, -side, depth_limit - 1);
                board.take_back(column);
                -score
            })
            .max()
            .expect("position has moves")
    }

    #[test]
    fn move_order_is_centre_out() {
        assert_eq!(move_order(), [3, 2, 4, 1, 5, 0, 6]);
    }

    #[test]
    fn score_range_matches_win_scores() {
        assert_eq!(win_score(0), MAX_SCORE);
        assert_eq!(-win_score(1), MIN_SCORE);
        assert_eq!(win_score(6), 18);
        assert_eq!(win_score(MAX_MOVES - 1), 1);
    }

    #[test]
    fn win_distance_inverts_win_score() {
        for num_moves in 0..MAX_MOVES {
            for ply in num_moves + 1..=MAX_MOVES {
                let distance = ply - num_moves;
                let score = win_score(ply - 1);
                if distance % 2 == 1 {
                    assert_eq!(win_distance(score, num_moves), Some((distance + 1) / 2));
                } else {
                    assert_eq!(win_distance(-score, num_moves), Some(distance / 2));
                }
            }
        }
        assert_eq!(win_distance(0, 10), None);
        assert_eq!(win_distance(MAX_SCORE, 10), None);
    }

    #[test]
    fn minimax_matches_unpruned_search() -> Result<()> {
        for moves in &["", "4", "4453", "3344", "414142", "1234567", "44444"] {
            for &side in &[Player::One, Player::Two] {
                let mut board = Board::from_moves(moves)?;
                let expected = reference_minimax(&mut board, side, 0, 4);
                let mut engine = engine(SearchMode::Minimax);
                let (score, column) = engine.search(&mut board, side, 4);
                assert_eq!(score, expected, "position {:?}, {}", moves, side);
                assert!(column.is_some());
            }
        }
        Ok(())
    }

    #[test]
    fn minimax_picks_first_of_equal_moves() -> Result<()> {
        // at depth 1 only the positional weights separate the moves
        let mut board = Board::new();
        let (score, column) = engine(SearchMode::Minimax).search(&mut board, Player::One, 1);
        assert_eq!((score, column), (7, Some(3)));

        // player two prefers the lowest score, again in the centre
        let (score, column) = engine(SearchMode::Minimax).search(&mut board, Player::Two, 1);
        assert_eq!((score, column), (-7, Some(3)));

        // columns 2 and 4 weigh the same, the left one is visited first
        let mut board = Board::from_moves("444444")?;
        let (score, column) = engine(SearchMode::Minimax).search(&mut board, Player::One, 1);
        assert_eq!((score, column), (5, Some(2)));
        Ok(())
    }

    #[test]
    fn negamax_value_is_best_negated_child() -> Result<()> {
        for moves in &["", "44", "4453", "3344", "1234567"] {
            for &side in &[Player::One, Player::Two] {
                let mut board = Board::from_moves(moves)?;
                let mut root = engine(SearchMode::Negamax);
                let (score, _) = root.search(&mut board, side, 5);
                let mut children = engine(SearchMode::Negamax);
                let expected = best_child_value(&mut children, &mut board, side, 5);
                assert_eq!(score, expected, "position {:?}, {}", moves, side);
            }
        }
        Ok(())
    }

    #[test]
    fn transposition_table_does_not_change_results() -> Result<()> {
        for moves in &["", "4453", "3344", "2252"] {
            let mut board = Board::from_moves(moves)?;
            let mut cached = Engine::new(
                EngineConfig::default()
                    .with_mode(SearchMode::Negamax)
                    .with_table_capacity(DEFAULT_CAPACITY),
            )?;
            let mut uncached = Engine::new(
                EngineConfig::default()
                    .with_mode(SearchMode::Negamax)
                    .with_table_capacity(0),
            )?;
            let a = cached.search(&mut board, Player::One, 5);
            let b = uncached.search(&mut board, Player::One, 5);
            assert_eq!(a, b, "position {:?}", moves);
            // a second search can reuse the stored bounds
            assert_eq!(cached.search(&mut board, Player::One, 5), a);
        }
        Ok(())
    }

    #[test]
    fn immediate_win_scores_maximal_mate_distance() -> Result<()> {
        // player two has three on the bottom row with both ends open
        let mut board = Board::from_moves("7374151")?;
        let (score, column) = engine(SearchMode::Negamax).search(&mut board, Player::Two, 1);
        assert_eq!(column, Some(1));
        assert_eq!(score, win_score(board.num_moves()));

        let (score, column) = engine(SearchMode::Minimax).search(&mut board, Player::Two, 1);
        assert_eq!((score, column), (-INFINITY, Some(1)));
        Ok(())
    }

    #[test]
    fn double_threat_found_by_both_modes() -> Result<()> {
        // playing column 5 leaves two open ends on the bottom row
        let mut board = Board::from_moves("3344")?;
        let (score, column) = engine(SearchMode::Negamax).search(&mut board, Player::One, 4);
        assert_eq!((score, column), (win_score(6), Some(4)));
        assert_eq!(win_distance(score, board.num_moves()), Some(2));

        let (score, column) = engine(SearchMode::Minimax).search(&mut board, Player::One, 4);
        assert_eq!((score, column), (INFINITY, Some(4)));
        Ok(())
    }

    #[test]
    fn forced_loss_is_negative() -> Result<()> {
        // player one threatens both ends of the bottom row and player two cannot block both
        let mut board = Board::from_moves("33445")?;
        let (score, column) = engine(SearchMode::Negamax).search(&mut board, Player::Two, 3);
        assert!(column.is_some());
        assert_eq!(score, -win_score(board.num_moves() + 1));
        Ok(())
    }

    #[test]
    fn quiet_position_scores_zero_within_horizon() {
        let mut board = Board::new();
        let (score, column) = engine(SearchMode::Negamax).search(&mut board, Player::One, 4);
        assert_eq!((score, column), (0, Some(3)));
    }

    #[test]
    fn last_empty_cell_is_a_draw() -> Result<()> {
        let game = "442761225377252342545563474175371666631311";
        let mut board = Board::from_moves(&game[..MAX_MOVES - 1])?;
        for &mode in &[SearchMode::Minimax, SearchMode::Negamax] {
            assert_eq!(engine(mode).search(&mut board, Player::Two, 3), (0, Some(0)));
        }

        let mut board = Board::from_moves(game)?;
        assert!(board.is_full());
        for &mode in &[SearchMode::Minimax, SearchMode::Negamax] {
            assert_eq!(engine(mode).search(&mut board, Player::One, 3), (0, None));
        }
        Ok(())
    }

    #[test]
    fn finished_game_has_no_move() {
        let mut board = Board::new();
        for _ in 0..4 {
            board.play(2, Player::One);
        }
        let (score, column) = engine(SearchMode::Minimax).search(&mut board, Player::Two, 3);
        assert_eq!((score, column), (INFINITY, None));
        let (score, column) = engine(SearchMode::Negamax).search(&mut board, Player::Two, 3);
        assert_eq!(column, None);
        assert!(score < 0);
    }

    #[test]
    fn search_leaves_the_board_unchanged() -> Result<()> {
        for &mode in &[SearchMode::Minimax, SearchMode::Negamax] {
            let mut board = Board::from_moves("4453267")?;
            let before = board.clone();
            let mut engine = engine(mode);
            engine.search(&mut board, Player::Two, 5);
            assert_eq!(board, before);
            assert!(engine.node_count > 1);
        }
        Ok(())
    }

    #[test]
    fn rollout_leaves_still_take_the_win() -> Result<()> {
        let mut board = Board::from_moves("414142")?;
        let mut engine = Engine::new(
            EngineConfig::default()
                .with_evaluator(LeafEvaluator::Rollout { samples: 20 })
                .with_seed(9),
        )?;
        assert_eq!(engine.search(&mut board, Player::One, 2), (INFINITY, Some(3)));
        Ok(())
    }

    #[test]
    fn rollout_leaves_are_reproducible() -> Result<()> {
        let config = EngineConfig::default()
            .with_evaluator(LeafEvaluator::Rollout { samples: 10 })
            .with_seed(17);
        let mut board = Board::from_moves("44")?;
        let a = Engine::new(config.clone())?.search(&mut board, Player::One, 2);
        let b = Engine::new(config)?.search(&mut board, Player::One, 2);
        assert_eq!(a, b);
        assert!(a.0.abs() <= ROLLOUT_SCALE as i32);
        Ok(())
    }

    #[test]
    fn clear_resets_the_cache() -> Result<()> {
        let mut engine = engine(SearchMode::Negamax);
        let mut board = Board::from_moves("4453")?;
        engine.search(&mut board, Player::One, 5);
        assert!(!engine.transposition_table.is_empty());
        engine.clear();
        assert!(engine.transposition_table.is_empty());
        Ok(())
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(Engine::new(EngineConfig::default().with_depth_limit(0)).is_err());
    }
}
