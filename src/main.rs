use anyhow::Result;
use clap::{Parser, ValueEnum};
use indicatif::ProgressBar;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::info;
use tracing_subscriber::EnvFilter;

use std::cmp::Ordering;
use std::io::{stdin, stdout, Write};
use std::time::Duration;

use connect4_engine::engine::win_distance;
use connect4_engine::win::there_is_a_winner;
use connect4_engine::*;

mod display;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Mode {
    Minimax,
    Negamax,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Evaluator {
    Heuristic,
    Rollout,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum First {
    Human,
    Computer,
    Random,
}

/// Play Connect 4 against the computer
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Search algorithm used by the computer
    #[arg(long, value_enum, default_value_t = Mode::Minimax)]
    mode: Mode,

    /// Number of plies the computer looks ahead
    #[arg(long, default_value_t = 7)]
    depth: usize,

    /// How minimax scores positions at the end of its search
    #[arg(long, value_enum, default_value_t = Evaluator::Heuristic)]
    evaluator: Evaluator,

    /// Random playouts per position with the rollout evaluator
    #[arg(long, default_value_t = 100)]
    samples: usize,

    /// Seed for who starts and for rollouts
    #[arg(long)]
    seed: Option<u64>,

    /// Who plays the first disc
    #[arg(long, value_enum, default_value_t = First::Random)]
    first: First,
}

impl Args {
    fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::default()
            .with_mode(match self.mode {
                Mode::Minimax => SearchMode::Minimax,
                Mode::Negamax => SearchMode::Negamax,
            })
            .with_depth_limit(self.depth)
            .with_evaluator(match self.evaluator {
                Evaluator::Heuristic => LeafEvaluator::Heuristic,
                Evaluator::Rollout => LeafEvaluator::Rollout {
                    samples: self.samples,
                },
            });
        config.seed = self.seed;
        config
    }
}

fn describe(mode: SearchMode, score: i32, num_moves: usize) {
    match mode {
        SearchMode::Minimax => println!("Evaluation of the move: {} points", score),
        SearchMode::Negamax => match (score.cmp(&0), win_distance(score, num_moves)) {
            (Ordering::Greater, Some(distance)) => {
                let move_string = if distance == 1 { "move" } else { "moves" };
                println!("Computer can force a win in at most {} {}.", distance, move_string);
            }
            (Ordering::Less, Some(distance)) => {
                let move_string = if distance == 1 { "move" } else { "moves" };
                println!("Human can force a win in at most {} {}.", distance, move_string);
            }
            _ => println!("Neither player can force a win within the search depth"),
        },
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut engine = Engine::new(args.engine_config())?;
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let human = Player::One;
    let computer = Player::Two;
    let mut player = match args.first {
        First::Human => human,
        First::Computer => computer,
        First::Random if rng.random_bool(0.5) => human,
        First::Random => computer,
    };

    let stdin = stdin();
    let mut board = Board::new();
    let mut turn = 1;

    println!("Welcome to Connect 4\n");
    println!("{} starts", if player == human { "Human" } else { "Computer" });

    // game loop
    loop {
        println!("\nTurn number {}", turn);
        display::draw(&board)?;

        if player == human {
            print!("Move input (1-{}) > ", WIDTH);
            stdout().flush()?;
            let mut input_str = String::new();
            if stdin.read_line(&mut input_str)? == 0 {
                // end of input
                return Ok(());
            }

            let column = match input_str.trim().parse::<usize>() {
                Ok(column @ 1..=WIDTH) => column - 1,
                _ => {
                    println!("Invalid column: {}", input_str.trim());
                    // try the move again
                    continue;
                }
            };
            if !board.play(column, human) {
                println!("Invalid move, column {} full", column + 1);
                continue;
            }
        } else {
            let spinner = ProgressBar::new_spinner();
            spinner.set_message("Computer is thinking...");
            spinner.enable_steady_tick(Duration::from_millis(100));
            let (score, best_move) = engine.best_move(&mut board, computer);
            spinner.finish_and_clear();

            // the loop stops before a finished position reaches the engine
            let column = match best_move {
                Some(column) => column,
                None => break,
            };
            info!(score, column = column + 1, nodes = engine.node_count, "computer move");
            describe(engine.config().mode, score, board.num_moves());
            println!("Computer plays column {}", column + 1);
            board.play(column, computer);
        }
        turn += 1;

        // end states
        if let Some(winner) = there_is_a_winner(&board) {
            display::draw(&board)?;
            if winner == human {
                println!("\n\t\tHUMAN WINS");
            } else {
                println!("\n\t\tCOMPUTER WINS");
            }
            break;
        }
        if board.is_full() {
            display::draw(&board)?;
            println!("\n\t\tDRAW");
            break;
        }
        player = -player;
    }
    Ok(())
}
