// Move selection policies
//
// A closed set of policies behind one contract: given the board, the side to
// move and the index of that side's move, return a legal `(cell, value)`.
// The phase composite is itself a policy that dispatches on the move index.

use log::{debug, info};
use rand::Rng;
use std::sync::Arc;

use crate::board::GameState;
use crate::config::{Config, PhaseConfig, SearchConfig, StrategyKind};
use crate::error::EngineError;
use crate::evaluator::Evaluator;
use crate::scoring::{cell_score, openness};
use crate::search::{minimax, minimax_parallel};
use crate::types::{Move, Side};

/// Limits applied before running the exact search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    /// Above this many empty cells the least-loss heuristic answers instead
    pub max_empty_cells: usize,
    pub parallel: bool,
    pub min_cells_for_parallel: usize,
}

impl SearchLimits {
    /// No ceiling, sequential search
    pub fn unbounded() -> Self {
        SearchLimits {
            max_empty_cells: usize::MAX,
            parallel: false,
            min_cells_for_parallel: usize::MAX,
        }
    }
}

impl From<&SearchConfig> for SearchLimits {
    fn from(config: &SearchConfig) -> Self {
        SearchLimits {
            max_empty_cells: config.max_minimax_cells,
            parallel: config.parallel,
            min_cells_for_parallel: config.min_cells_for_parallel,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Strategy {
    /// Uniform empty cell, uniform remaining value
    Random,
    /// Most empty neighbours, highest value
    GreedyOpenness,
    /// Lowest current score for the mover, highest value
    GreedyMinimalLoss,
    /// Network picks the cell, highest value
    EvaluatorGuided(Arc<Evaluator>),
    /// Full-width minimax to the end of the game
    ExactMinimax(SearchLimits),
    /// Dispatch on the move index
    Phased(PhasePlan),
}

/// A policy used while the move index is below `until_move`
#[derive(Debug, Clone)]
pub struct Phase {
    pub until_move: Option<usize>,
    pub strategy: Strategy,
}

/// Ordered phases; the first one whose bound exceeds the move index applies,
/// and the last phase covers everything after the final bound
#[derive(Debug, Clone)]
pub struct PhasePlan {
    kind: StrategyKind,
    phases: Vec<Phase>,
}

impl PhasePlan {
    pub fn new(kind: StrategyKind, phases: Vec<Phase>) -> Result<Self, EngineError> {
        if phases.is_empty() {
            return Err(EngineError::Config("phase plan has no phases".to_string()));
        }

        let bounds: Vec<usize> = phases.iter().filter_map(|p| p.until_move).collect();
        if bounds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(EngineError::Config(format!(
                "phase bounds must be strictly increasing, got {:?}",
                bounds
            )));
        }
        if phases[..phases.len() - 1]
            .iter()
            .any(|p| p.until_move.is_none())
        {
            return Err(EngineError::Config(
                "only the last phase may be unbounded".to_string(),
            ));
        }

        Ok(PhasePlan { kind, phases })
    }

    /// Policy responsible for `move_index`
    pub fn select(&self, move_index: usize) -> &Strategy {
        // Construction guarantees at least one phase
        let phase = self
            .phases
            .iter()
            .find(|p| p.until_move.map_or(true, |until| move_index < until))
            .unwrap_or(&self.phases[self.phases.len() - 1]);
        &phase.strategy
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }
}

impl Strategy {
    /// Early game by the network, middle game by least loss, last moves by
    /// exact search
    pub fn combine_main(evaluator: Arc<Evaluator>, limits: SearchLimits) -> Self {
        Self::preset(
            StrategyKind::CombineMain,
            Strategy::EvaluatorGuided(evaluator),
            12,
            limits,
        )
    }

    /// Like `combine_main` but opens with the openness heuristic and starts
    /// the exact search later
    pub fn combine_test(limits: SearchLimits) -> Self {
        Self::preset(
            StrategyKind::CombineTest,
            Strategy::GreedyOpenness,
            14,
            limits,
        )
    }

    fn preset(kind: StrategyKind, opening: Strategy, search_from: usize, limits: SearchLimits) -> Self {
        let phases = vec![
            Phase {
                until_move: Some(7),
                strategy: opening,
            },
            Phase {
                until_move: Some(search_from),
                strategy: Strategy::GreedyMinimalLoss,
            },
            Phase {
                until_move: None,
                strategy: Strategy::ExactMinimax(limits),
            },
        ];
        Strategy::Phased(PhasePlan { kind, phases })
    }

    /// Builds the named policy from configuration
    pub fn from_kind(
        kind: StrategyKind,
        config: &Config,
        evaluator: &Arc<Evaluator>,
    ) -> Result<Self, EngineError> {
        let limits = SearchLimits::from(&config.search);
        let strategy = match kind {
            StrategyKind::Random => Strategy::Random,
            StrategyKind::HighestOpen => Strategy::GreedyOpenness,
            StrategyKind::LeastLoss => Strategy::GreedyMinimalLoss,
            StrategyKind::NeuralNet => Strategy::EvaluatorGuided(Arc::clone(evaluator)),
            StrategyKind::Minimax => Strategy::ExactMinimax(limits),
            StrategyKind::CombineMain => Strategy::combine_main(Arc::clone(evaluator), limits),
            StrategyKind::CombineTest => Strategy::combine_test(limits),
            StrategyKind::Phased => {
                let phases = config
                    .strategy
                    .phases
                    .iter()
                    .map(|phase| Self::phase_from_config(phase, config, evaluator))
                    .collect::<Result<Vec<_>, _>>()?;
                Strategy::Phased(PhasePlan::new(StrategyKind::Phased, phases)?)
            }
        };
        Ok(strategy)
    }

    /// Builds the policy selected by `[strategy] active`
    pub fn from_config(config: &Config, evaluator: &Arc<Evaluator>) -> Result<Self, EngineError> {
        Self::from_kind(config.strategy.active, config, evaluator)
    }

    fn phase_from_config(
        phase: &PhaseConfig,
        config: &Config,
        evaluator: &Arc<Evaluator>,
    ) -> Result<Phase, EngineError> {
        if phase.strategy == StrategyKind::Phased {
            return Err(EngineError::Config(
                "a phase cannot itself be phased".to_string(),
            ));
        }
        Ok(Phase {
            until_move: phase.until_move,
            strategy: Self::from_kind(phase.strategy, config, evaluator)?,
        })
    }

    /// Configuration name of this policy
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::Random => StrategyKind::Random.as_str(),
            Strategy::GreedyOpenness => StrategyKind::HighestOpen.as_str(),
            Strategy::GreedyMinimalLoss => StrategyKind::LeastLoss.as_str(),
            Strategy::EvaluatorGuided(_) => StrategyKind::NeuralNet.as_str(),
            Strategy::ExactMinimax(_) => StrategyKind::Minimax.as_str(),
            Strategy::Phased(plan) => plan.kind.as_str(),
        }
    }

    /// The non-composite policy that will answer for `move_index`
    pub fn resolve(&self, move_index: usize) -> &Strategy {
        match self {
            Strategy::Phased(plan) => plan.select(move_index).resolve(move_index),
            other => other,
        }
    }

    /// Chooses a legal move for `side`. The board may be mutated during the
    /// call but is restored before returning.
    pub fn decide(
        &self,
        state: &mut GameState,
        side: Side,
        move_index: usize,
    ) -> Result<Move, EngineError> {
        match self {
            Strategy::Random => decide_random(state, side),
            Strategy::GreedyOpenness => decide_openness(state, side),
            Strategy::GreedyMinimalLoss => decide_minimal_loss(state, side),
            Strategy::EvaluatorGuided(evaluator) => {
                let value = highest_value(state, side)?;
                let cell = evaluator
                    .select_cell(state, side.opponent())
                    .ok_or(EngineError::NoLegalMove(side))?;
                Ok(Move::new(cell, value))
            }
            Strategy::ExactMinimax(limits) => decide_minimax(state, side, limits),
            Strategy::Phased(plan) => {
                let strategy = plan.select(move_index);
                debug!(
                    "Move {}: {} delegates to {}",
                    move_index,
                    plan.kind.as_str(),
                    strategy.label()
                );
                strategy.decide(state, side, move_index)
            }
        }
    }
}

fn highest_value(state: &GameState, side: Side) -> Result<u8, EngineError> {
    state
        .highest_remaining(side)
        .ok_or(EngineError::NoLegalMove(side))
}

fn decide_random(state: &GameState, side: Side) -> Result<Move, EngineError> {
    let cells: Vec<_> = state.empty_cells().collect();
    let values: Vec<u8> = state.remaining(side).collect();
    if cells.is_empty() || values.is_empty() {
        return Err(EngineError::NoLegalMove(side));
    }

    let mut rng = rand::rng();
    let cell = cells[rng.random_range(0..cells.len())];
    let value = values[rng.random_range(0..values.len())];
    Ok(Move::new(cell, value))
}

fn decide_openness(state: &GameState, side: Side) -> Result<Move, EngineError> {
    let value = highest_value(state, side)?;

    let mut best: Option<(usize, usize)> = None;
    for cell in state.empty_cells() {
        let open = openness(state, cell);
        if best.map_or(true, |(_, b)| open > b) {
            best = Some((cell, open));
        }
    }

    let (cell, _) = best.ok_or(EngineError::NoLegalMove(side))?;
    Ok(Move::new(cell, value))
}

/// Puts the highest value where the mover currently scores worst, denying
/// that spot to the opponent
fn decide_minimal_loss(state: &GameState, side: Side) -> Result<Move, EngineError> {
    let value = highest_value(state, side)?;

    let mut best: Option<(usize, i32)> = None;
    for cell in state.empty_cells() {
        let score = cell_score(state, cell, side);
        if best.map_or(true, |(_, b)| score < b) {
            best = Some((cell, score));
        }
    }

    let (cell, _) = best.ok_or(EngineError::NoLegalMove(side))?;
    Ok(Move::new(cell, value))
}

fn decide_minimax(
    state: &mut GameState,
    side: Side,
    limits: &SearchLimits,
) -> Result<Move, EngineError> {
    let empty = state.empty_count();
    if empty > limits.max_empty_cells {
        info!(
            "Minimax skipped: {} empty cells exceeds ceiling {}, using least loss",
            empty, limits.max_empty_cells
        );
        return decide_minimal_loss(state, side);
    }

    let result = if limits.parallel && empty >= limits.min_cells_for_parallel {
        minimax_parallel(state, side)?
    } else {
        minimax(state, side, side)?
    };

    info!(
        "Minimax: value {} over {} nodes ({} empty cells)",
        result.value, result.nodes, empty
    );
    result.best.ok_or(EngineError::NoLegalMove(side))
}
