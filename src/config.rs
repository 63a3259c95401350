// Configuration module for reading BlackHole.toml
// This module provides OOP-style configuration management for the Black Hole bot

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub strategy: StrategyConfig,
    pub search: SearchConfig,
    pub evaluator: EvaluatorConfig,
    pub protocol: ProtocolConfig,
    pub referee: RefereeConfig,
    pub debug: DebugConfig,
}

/// Names of the selectable move policies
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Random,
    HighestOpen,
    LeastLoss,
    NeuralNet,
    Minimax,
    /// neural_net -> least_loss -> minimax
    CombineMain,
    /// highest_open -> least_loss -> minimax
    CombineTest,
    /// Thresholds taken from `[[strategy.phases]]`
    Phased,
}

impl StrategyKind {
    pub fn all() -> [StrategyKind; 8] {
        [
            StrategyKind::Random,
            StrategyKind::HighestOpen,
            StrategyKind::LeastLoss,
            StrategyKind::NeuralNet,
            StrategyKind::Minimax,
            StrategyKind::CombineMain,
            StrategyKind::CombineTest,
            StrategyKind::Phased,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Random => "random",
            StrategyKind::HighestOpen => "highest_open",
            StrategyKind::LeastLoss => "least_loss",
            StrategyKind::NeuralNet => "neural_net",
            StrategyKind::Minimax => "minimax",
            StrategyKind::CombineMain => "combine_main",
            StrategyKind::CombineTest => "combine_test",
            StrategyKind::Phased => "phased",
        }
    }

    pub fn from_name(name: &str) -> Option<StrategyKind> {
        Self::all().into_iter().find(|k| k.as_str() == name)
    }
}

/// Active policy and, for `phased`, its move-index thresholds
#[derive(Debug, Deserialize, Clone)]
pub struct StrategyConfig {
    pub active: StrategyKind,
    #[serde(default)]
    pub phases: Vec<PhaseConfig>,
}

/// One phase: `strategy` is used while the move index is below `until_move`.
/// The last phase may leave `until_move` unset to cover the rest of the game.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PhaseConfig {
    pub until_move: Option<usize>,
    pub strategy: StrategyKind,
}

/// Exact endgame search limits
#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Minimax is only run with at most this many empty cells; above it the
    /// least-loss heuristic answers instead
    pub max_minimax_cells: usize,
    /// Split the top-level branches across the rayon pool
    pub parallel: bool,
    pub min_cells_for_parallel: usize,
}

/// Network shape and weight source
#[derive(Debug, Deserialize, Clone)]
pub struct EvaluatorConfig {
    /// Hidden layer width for random weights
    pub hidden_size: usize,
    /// Draw random weights from this seed instead of the bundled set
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub weights_path: Option<String>,
}

/// Line protocol constants
#[derive(Debug, Deserialize, Clone)]
pub struct ProtocolConfig {
    pub start_signal: String,
    pub quit_signal: String,
    pub rounds: usize,
}

/// Local two-bot harness settings
#[derive(Debug, Deserialize, Clone)]
pub struct RefereeConfig {
    pub neutral_cells: Vec<String>,
    pub randomize_neutral: bool,
    pub matches: usize,
    pub first: StrategyKind,
    pub second: StrategyKind,
}

/// Debug configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the BlackHole.toml configuration file
    ///
    /// # Returns
    /// * `Result<Config, String>` - Parsed configuration or error message
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file: {}", e))
    }

    /// Loads default configuration from BlackHole.toml in the working directory
    pub fn load_default() -> Result<Self, String> {
        Self::from_file("BlackHole.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in BlackHole.toml
    pub fn default_hardcoded() -> Self {
        Config {
            strategy: StrategyConfig {
                active: StrategyKind::CombineMain,
                phases: vec![
                    PhaseConfig {
                        until_move: Some(7),
                        strategy: StrategyKind::HighestOpen,
                    },
                    PhaseConfig {
                        until_move: Some(12),
                        strategy: StrategyKind::LeastLoss,
                    },
                    PhaseConfig {
                        until_move: None,
                        strategy: StrategyKind::Minimax,
                    },
                ],
            },
            search: SearchConfig {
                max_minimax_cells: 8,
                parallel: true,
                min_cells_for_parallel: 6,
            },
            evaluator: EvaluatorConfig {
                hidden_size: 50,
                seed: None,
                weights_path: None,
            },
            protocol: ProtocolConfig {
                start_signal: "Start".to_string(),
                quit_signal: "Quit".to_string(),
                rounds: 15,
            },
            referee: RefereeConfig {
                neutral_cells: ["H1", "F2", "A3", "C4", "D5"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                randomize_neutral: true,
                matches: 35,
                first: StrategyKind::CombineMain,
                second: StrategyKind::CombineTest,
            },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "black_hole_debug.jsonl".to_string(),
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default()
            .unwrap_or_else(|e| {
                log::warn!("Could not load BlackHole.toml ({}), using hardcoded defaults", e);
                Self::default_hardcoded()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest_config() -> Config {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("BlackHole.toml");
        Config::from_file(path).expect("BlackHole.toml should be parseable")
    }

    #[test]
    fn test_config_can_be_created() {
        let config = Config::default_hardcoded();
        assert_eq!(config.protocol.rounds, 15);
        assert_eq!(config.evaluator.hidden_size, 50);
        assert_eq!(config.referee.neutral_cells.len(), 5);
    }

    #[test]
    fn test_black_hole_toml_can_be_parsed() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("BlackHole.toml");
        let result = Config::from_file(path);
        assert!(
            result.is_ok(),
            "Failed to parse BlackHole.toml: {:?}",
            result.err()
        );
    }

    #[test]
    fn test_all_config_values_match_hardcoded_defaults() {
        let file_config = manifest_config();
        let hardcoded_config = Config::default_hardcoded();

        // Strategy
        assert_eq!(file_config.strategy.active, hardcoded_config.strategy.active);
        assert_eq!(file_config.strategy.phases, hardcoded_config.strategy.phases);

        // Search
        assert_eq!(
            file_config.search.max_minimax_cells,
            hardcoded_config.search.max_minimax_cells
        );
        assert_eq!(file_config.search.parallel, hardcoded_config.search.parallel);
        assert_eq!(
            file_config.search.min_cells_for_parallel,
            hardcoded_config.search.min_cells_for_parallel
        );

        // Evaluator
        assert_eq!(
            file_config.evaluator.hidden_size,
            hardcoded_config.evaluator.hidden_size
        );
        assert_eq!(file_config.evaluator.seed, hardcoded_config.evaluator.seed);
        assert_eq!(
            file_config.evaluator.weights_path,
            hardcoded_config.evaluator.weights_path
        );

        // Protocol
        assert_eq!(
            file_config.protocol.start_signal,
            hardcoded_config.protocol.start_signal
        );
        assert_eq!(
            file_config.protocol.quit_signal,
            hardcoded_config.protocol.quit_signal
        );
        assert_eq!(file_config.protocol.rounds, hardcoded_config.protocol.rounds);

        // Referee
        assert_eq!(
            file_config.referee.neutral_cells,
            hardcoded_config.referee.neutral_cells
        );
        assert_eq!(file_config.referee.first, hardcoded_config.referee.first);
        assert_eq!(file_config.referee.second, hardcoded_config.referee.second);

        // Debug
        assert_eq!(file_config.debug.enabled, hardcoded_config.debug.enabled);
        assert_eq!(
            file_config.debug.log_file_path,
            hardcoded_config.debug.log_file_path
        );
    }

    #[test]
    fn test_strategy_kind_names_round_trip() {
        for kind in StrategyKind::all() {
            assert_eq!(StrategyKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(StrategyKind::from_name("alpha_beta"), None);
    }

    #[test]
    fn test_phases_parse_from_toml() {
        let config: StrategyConfig = toml::from_str(
            r#"
            active = "phased"

            [[phases]]
            until_move = 3
            strategy = "random"

            [[phases]]
            strategy = "minimax"
            "#,
        )
        .unwrap();

        assert_eq!(config.active, StrategyKind::Phased);
        assert_eq!(
            config.phases,
            vec![
                PhaseConfig {
                    until_move: Some(3),
                    strategy: StrategyKind::Random
                },
                PhaseConfig {
                    until_move: None,
                    strategy: StrategyKind::Minimax
                },
            ]
        );
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        // Test with a non-existent file
        let result = Config::from_file("nonexistent.toml");
        assert!(result.is_err());
    }
}
