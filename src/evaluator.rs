//! Fixed-shape feed-forward network that ranks cells for placement.
//!
//! The network maps a `2 × TOTAL_CELLS` board encoding through one hidden
//! layer to one preference per cell. There are no bias terms; each layer is a
//! dense matrix-vector product followed by the logistic sigmoid. Weights are
//! produced elsewhere (the bundled trained set, a file, or a seeded random
//! draw) and are frozen once the evaluator is built.

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::board::GameState;
use crate::config::EvaluatorConfig;
use crate::error::EngineError;
use crate::types::{CellId, Side, TOTAL_CELLS};

/// Input layer width: one value channel and one occupancy channel per cell
pub const INPUT_SIZE: usize = 2 * TOTAL_CELLS;
/// Output layer width: one preference per cell
pub const OUTPUT_SIZE: usize = TOTAL_CELLS;

/// Trained 50-unit weights compiled into the binary
const BUNDLED_WEIGHTS: &str = include_str!("../weights/neural_net.json");

/// Weight pair in row-major order: `w0` is `hidden × INPUT_SIZE`,
/// `w1` is `OUTPUT_SIZE × hidden`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub w0: Vec<Vec<f64>>,
    pub w1: Vec<Vec<f64>>,
}

impl Weights {
    /// Uniform weights in `[-1, 1)` drawn from a seeded generator
    pub fn random(hidden: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut matrix = |rows: usize, cols: usize| -> Vec<Vec<f64>> {
            (0..rows)
                .map(|_| (0..cols).map(|_| rng.random_range(-1.0..1.0)).collect())
                .collect()
        };

        let w0 = matrix(hidden, INPUT_SIZE);
        let w1 = matrix(OUTPUT_SIZE, hidden);
        Weights { w0, w1 }
    }

    /// The trained weights shipped with the bot
    pub fn bundled() -> Result<Self, EngineError> {
        serde_json::from_str(BUNDLED_WEIGHTS)
            .map_err(|e| EngineError::Weights(format!("bundled weights are corrupt: {}", e)))
    }

    /// All-zero weights of the given hidden size
    pub fn zeros(hidden: usize) -> Self {
        Weights {
            w0: vec![vec![0.0; INPUT_SIZE]; hidden],
            w1: vec![vec![0.0; hidden]; OUTPUT_SIZE],
        }
    }

    /// Reads a JSON weights file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path.as_ref())?;
        serde_json::from_str(&contents)
            .map_err(|e| EngineError::Weights(format!("failed to parse weights file: {}", e)))
    }

    /// Writes the weights as JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), EngineError> {
        let json = serde_json::to_string(self)
            .map_err(|e| EngineError::Weights(format!("failed to serialize weights: {}", e)))?;
        fs::write(path.as_ref(), json)?;
        Ok(())
    }

    pub fn hidden_size(&self) -> usize {
        self.w0.len()
    }
}

/// Frozen network ready for inference
#[derive(Debug, Clone)]
pub struct Evaluator {
    hidden: usize,
    /// Flattened `hidden × INPUT_SIZE`
    w0: Vec<f64>,
    /// Flattened `OUTPUT_SIZE × hidden`
    w1: Vec<f64>,
}

impl Evaluator {
    /// Validates the shapes and freezes the weights
    pub fn new(weights: Weights) -> Result<Self, EngineError> {
        let hidden = weights.hidden_size();
        if hidden == 0 {
            return Err(EngineError::Weights("hidden layer is empty".to_string()));
        }
        if let Some(row) = weights.w0.iter().position(|r| r.len() != INPUT_SIZE) {
            return Err(EngineError::Weights(format!(
                "w0 row {} has {} columns, expected {}",
                row,
                weights.w0[row].len(),
                INPUT_SIZE
            )));
        }
        if weights.w1.len() != OUTPUT_SIZE {
            return Err(EngineError::Weights(format!(
                "w1 has {} rows, expected {}",
                weights.w1.len(),
                OUTPUT_SIZE
            )));
        }
        if let Some(row) = weights.w1.iter().position(|r| r.len() != hidden) {
            return Err(EngineError::Weights(format!(
                "w1 row {} has {} columns, expected {}",
                row,
                weights.w1[row].len(),
                hidden
            )));
        }

        Ok(Evaluator {
            hidden,
            w0: weights.w0.into_iter().flatten().collect(),
            w1: weights.w1.into_iter().flatten().collect(),
        })
    }

    /// Builds the evaluator described by the configuration: a weights file
    /// if one is set, else seeded random weights if a seed is set, else the
    /// bundled weights
    pub fn from_config(config: &EvaluatorConfig) -> Result<Self, EngineError> {
        let weights = match (&config.weights_path, config.seed) {
            (Some(path), _) => {
                info!("Loading evaluator weights from {}", path);
                Weights::from_file(path)?
            }
            (None, Some(seed)) => {
                info!(
                    "Using random evaluator weights (hidden {}, seed {})",
                    config.hidden_size, seed
                );
                Weights::random(config.hidden_size, seed)
            }
            (None, None) => Weights::bundled()?,
        };
        Self::new(weights)
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden
    }

    /// Encodes the board from the vantage point opposite to `opponent`:
    /// tokens owned by `opponent` carry negated values, neutral and empty
    /// cells are indistinguishable
    pub fn encode(state: &GameState, opponent: Side) -> Vec<f64> {
        let mut input = vec![0.0; INPUT_SIZE];
        for cell in 0..TOTAL_CELLS {
            match state.token_at(cell) {
                Some(token) if token.side.is_player() => {
                    let value = if token.side == opponent {
                        -(token.value as f64)
                    } else {
                        token.value as f64
                    };
                    input[cell] = sigmoid(value);
                    input[TOTAL_CELLS + cell] = 1.0;
                }
                _ => {
                    input[cell] = 0.0;
                    input[TOTAL_CELLS + cell] = -1.0;
                }
            }
        }
        input
    }

    /// Runs the network on an encoded board
    pub fn forward(&self, input: &[f64]) -> Vec<f64> {
        debug_assert_eq!(input.len(), INPUT_SIZE);
        let hidden = dense_sigmoid(&self.w0, input);
        dense_sigmoid(&self.w1, &hidden)
    }

    /// Picks the empty cell with the strictly greatest output. Earlier cells
    /// win ties; occupied cells are never chosen whatever their output.
    pub fn select_cell(&self, state: &GameState, opponent: Side) -> Option<CellId> {
        let output = self.forward(&Self::encode(state, opponent));

        let mut best: Option<(CellId, f64)> = None;
        for cell in state.empty_cells() {
            let score = output[cell];
            if best.map_or(score > f64::NEG_INFINITY, |(_, b)| score > b) {
                best = Some((cell, score));
            }
        }
        best.map(|(cell, _)| cell)
    }
}

/// `sigmoid(matrix · input)` for a row-major matrix with `input.len()` columns
fn dense_sigmoid(matrix: &[f64], input: &[f64]) -> Vec<f64> {
    matrix
        .chunks_exact(input.len())
        .map(|row| sigmoid(row.iter().zip(input).map(|(w, x)| w * x).sum()))
        .collect()
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
