//! Settings consumed when an [`Engine`](crate::engine::Engine) is built

use anyhow::{anyhow, Result};

use crate::transposition_table::DEFAULT_CAPACITY;
use crate::MAX_MOVES;

/// Which tree search the engine runs
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SearchMode {
    /// Depth-bounded minimax with alpha-beta pruning, scored from player one's
    /// point of view by the leaf evaluator
    Minimax,
    /// Negamax with alpha-beta pruning and a transposition table, scoring
    /// forced wins by how early in the game they happen
    Negamax,
}

/// How minimax scores a position where the search horizon is reached
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum LeafEvaluator {
    /// Weighted cell ownership, see [`static_eval`](crate::evaluation::static_eval)
    Heuristic,
    /// Random playouts, see [`rollout_eval`](crate::rollout::rollout_eval)
    Rollout { samples: usize },
}

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub mode: SearchMode,
    /// Number of plies searched below the root
    pub depth_limit: usize,
    pub evaluator: LeafEvaluator,
    /// Seed for rollouts; `None` seeds from the operating system
    pub seed: Option<u64>,
    /// Number of transposition table slots used by negamax
    pub table_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: SearchMode::Minimax,
            depth_limit: 7,
            evaluator: LeafEvaluator::Heuristic,
            seed: None,
            table_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_depth_limit(mut self, depth_limit: usize) -> Self {
        self.depth_limit = depth_limit;
        self
    }

    pub fn with_evaluator(mut self, evaluator: LeafEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_table_capacity(mut self, table_capacity: usize) -> Self {
        self.table_capacity = table_capacity;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.depth_limit == 0 {
            return Err(anyhow!("depth limit must be at least 1"));
        }
        if self.depth_limit > MAX_MOVES {
            return Err(anyhow!(
                "depth limit {} is deeper than a full game ({} moves)",
                self.depth_limit,
                MAX_MOVES
            ));
        }
        if let LeafEvaluator::Rollout { samples: 0 } = self.evaluator {
            return Err(anyhow!("rollout evaluation needs at least 1 sample"));
        }
        Ok(())
    }
}
