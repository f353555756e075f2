#[cfg(test)]
pub mod test {
    use anyhow::{anyhow, Result};
    use rand::{rngs::StdRng, seq::IndexedRandom, SeedableRng};
    use std::time::{Duration, Instant};

    use crate::engine::win_score;
    use crate::evaluation::INFINITY;
    use crate::rollout::{rollout_eval, rollout_eval_seeded};
    use crate::win::there_is_a_winner;
    use crate::{Board, Engine, EngineConfig, Player, SearchMode};

    fn engine(mode: SearchMode, depth_limit: usize) -> Result<Engine> {
        Engine::new(
            EngineConfig::default()
                .with_mode(mode)
                .with_depth_limit(depth_limit)
                .with_seed(1),
        )
    }

    #[test]
    pub fn centre_column_completed() -> Result<()> {
        // player one stacks the centre column, player two plays elsewhere
        let mut board = Board::from_moves("414142")?;

        let (score, best_move) = engine(SearchMode::Minimax, 4)?.best_move(&mut board, Player::One);
        assert_eq!((score, best_move), (INFINITY, Some(3)));

        let (score, best_move) = engine(SearchMode::Negamax, 4)?.best_move(&mut board, Player::One);
        assert_eq!((score, best_move), (win_score(6), Some(3)));
        assert_eq!(score, 18);

        let column = best_move.ok_or(anyhow!("no move found"))?;
        assert!(board.play(column, Player::One));
        assert_eq!(there_is_a_winner(&board), Some(Player::One));
        Ok(())
    }

    #[test]
    pub fn self_play() -> Result<()> {
        let mut board = Board::new();
        let mut engines = (engine(SearchMode::Minimax, 4)?, engine(SearchMode::Negamax, 5)?);
        let mut player = Player::One;

        let mut times = vec![];
        let mut posis = vec![];

        while there_is_a_winner(&board).is_none() && !board.is_full() {
            let engine = match player {
                Player::One => &mut engines.0,
                Player::Two => &mut engines.1,
            };
            let before = board.clone();
            let start_time = Instant::now();
            let (_score, best_move) = engine.best_move(&mut board, player);
            times.push(start_time.elapsed());
            posis.push(engine.node_count);

            assert_eq!(board, before);
            let column = best_move.ok_or(anyhow!("no move in an unfinished game"))?;
            assert!(board.valid_moves().contains(&column));
            assert!(board.play(column, player));
            player = -player;
        }
        assert!(board.num_moves() <= crate::MAX_MOVES);

        println!(
            "Self-play: {} moves, winner: {:?}\nMean time: {:.6}ms, Mean no. of positions: {}",
            board.num_moves(),
            there_is_a_winner(&board),
            (times.iter().sum::<Duration>() / times.len() as u32).as_secs_f64() * 1000.0,
            posis.iter().sum::<usize>() as f64 / posis.len() as f64,
        );
        Ok(())
    }

    #[test]
    pub fn beats_random_play() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(31);
        let mut engine = engine(SearchMode::Minimax, 5)?;
        let mut board = Board::new();
        let mut player = Player::One;

        while there_is_a_winner(&board).is_none() && !board.is_full() {
            let column = match player {
                Player::One => *board
                    .valid_moves()
                    .choose(&mut rng)
                    .ok_or(anyhow!("no legal moves"))?,
                Player::Two => engine
                    .best_move(&mut board, player)
                    .1
                    .ok_or(anyhow!("no move found"))?,
            };
            assert!(board.play(column, player));
            player = -player;
        }
        println!("{}", board);
        assert_ne!(there_is_a_winner(&board), Some(Player::One));
        Ok(())
    }

    #[test]
    pub fn rollout_estimate_converges() -> Result<()> {
        // player one holds three of the centre column with the fourth cell open
        let board = Board::from_moves("414142")?;
        let expected = rollout_eval_seeded(&board, Player::One, 4000, 1);
        let observed = rollout_eval(&board, Player::One, 400, &mut StdRng::seed_from_u64(5));

        assert!(expected > 0.0);
        assert!(
            (expected - observed).abs() < 0.2,
            "expected {}, observed {}",
            expected,
            observed
        );
        Ok(())
    }
}
