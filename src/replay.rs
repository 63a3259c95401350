// Replay module for re-checking logged decisions
//
// This module provides functionality to:
// 1. Parse JSONL match logs
// 2. Rebuild each logged position from its neutral cells and move history
// 3. Ask the logged strategy again and compare with the move that was played
// 4. Generate a summary report

use log::{info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::board::GameState;
use crate::config::{Config, StrategyKind};
use crate::evaluator::Evaluator;
use crate::match_log::MatchLogEntry;
use crate::strategy::Strategy;
use crate::topology::Topology;
use crate::types::{Move, Side};

/// Result of replaying a single logged move
#[derive(Debug, Clone)]
pub struct ReplayResult {
    pub move_index: usize,
    pub side: Side,
    /// Policy that actually answered at this move index
    pub strategy: &'static str,
    pub original_move: String,
    pub replayed_move: String,
    pub matches: bool,
    pub computation_time_us: u128,
}

/// Statistics for a complete replay session
#[derive(Debug, Default)]
pub struct ReplayStats {
    pub total_moves: usize,
    pub matches: usize,
    pub mismatches: usize,
    pub match_rate: f64,
}

/// Why an entry was not compared
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skip {
    /// The answering policy is random, so a mismatch means nothing
    Random,
    Failed(String),
}

/// Replay engine for analyzing match logs
pub struct ReplayEngine {
    config: Config,
    evaluator: Arc<Evaluator>,
    topology: Arc<Topology>,
    verbose: bool,
}

impl ReplayEngine {
    /// Creates a new replay engine; the evaluator is rebuilt from `config`
    pub fn new(config: Config, verbose: bool) -> Result<Self, String> {
        let evaluator = Evaluator::from_config(&config.evaluator).map_err(|e| e.to_string())?;
        Ok(ReplayEngine {
            config,
            evaluator: Arc::new(evaluator),
            topology: Arc::new(Topology::new()),
            verbose,
        })
    }

    /// Loads all log entries from a JSONL file
    pub fn load_log_file<P: AsRef<Path>>(&self, log_path: P) -> Result<Vec<MatchLogEntry>, String> {
        let file = File::open(log_path.as_ref())
            .map_err(|e| format!("Failed to open log file: {}", e))?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| format!("Failed to read line {}: {}", line_num + 1, e))?;

            if line.trim().is_empty() {
                continue;
            }

            let entry: MatchLogEntry = serde_json::from_str(&line)
                .map_err(|e| format!("Failed to parse JSON on line {}: {}", line_num + 1, e))?;

            entries.push(entry);
        }

        info!("Loaded {} log entries", entries.len());
        Ok(entries)
    }

    /// Position the logged move was chosen in
    pub fn rebuild(&self, entry: &MatchLogEntry) -> Result<GameState, String> {
        let mut state = GameState::new(Arc::clone(&self.topology));
        for (index, name) in entry.neutral.iter().enumerate() {
            state
                .place_neutral(name, index)
                .map_err(|e| format!("Bad neutral cell {}: {}", name, e))?;
        }
        for played in &entry.history {
            let mv = Move::parse(&played.text, &self.topology)
                .map_err(|e| format!("Bad history move {}: {}", played.text, e))?;
            state
                .apply(played.side, mv)
                .map_err(|e| format!("History move {} does not apply: {}", played.text, e))?;
        }
        Ok(state)
    }

    /// Replays a single log entry and compares the result
    pub fn replay_entry(&self, entry: &MatchLogEntry) -> Result<ReplayResult, Skip> {
        let kind = StrategyKind::from_name(&entry.strategy)
            .ok_or_else(|| Skip::Failed(format!("Unknown strategy '{}'", entry.strategy)))?;
        let strategy = Strategy::from_kind(kind, &self.config, &self.evaluator)
            .map_err(|e| Skip::Failed(e.to_string()))?;

        let answering = strategy.resolve(entry.move_index);
        if matches!(answering, Strategy::Random) {
            return Err(Skip::Random);
        }

        let mut state = self.rebuild(entry).map_err(Skip::Failed)?;

        let start_time = Instant::now();
        let replayed = strategy
            .decide(&mut state, entry.side, entry.move_index)
            .map_err(|e| Skip::Failed(e.to_string()))?;
        let computation_time = start_time.elapsed().as_micros();

        let replayed_move = replayed.to_text(&self.topology);
        let matches = replayed_move == entry.chosen_move;

        if self.verbose {
            if matches {
                info!(
                    "Move {}: ✓ MATCH - {} ({}, {}µs)",
                    entry.move_index,
                    replayed_move,
                    answering.label(),
                    computation_time
                );
            } else {
                warn!(
                    "Move {}: ✗ MISMATCH - Original: {}, Replayed: {} ({}, {}µs)",
                    entry.move_index,
                    entry.chosen_move,
                    replayed_move,
                    answering.label(),
                    computation_time
                );
            }
        }

        Ok(ReplayResult {
            move_index: entry.move_index,
            side: entry.side,
            strategy: answering.label(),
            original_move: entry.chosen_move.clone(),
            replayed_move,
            matches,
            computation_time_us: computation_time,
        })
    }

    /// Replays all entries, leaving out the ones that cannot be compared
    pub fn replay_all(&self, entries: &[MatchLogEntry]) -> Vec<ReplayResult> {
        entries
            .iter()
            .filter_map(|entry| self.keep(entry, self.replay_entry(entry)))
            .collect()
    }

    /// Replays the entries with the given move indices
    pub fn replay_moves(
        &self,
        entries: &[MatchLogEntry],
        move_indices: &[usize],
    ) -> Result<Vec<ReplayResult>, String> {
        let mut results = Vec::new();

        for &index in move_indices {
            let entry = entries
                .iter()
                .find(|e| e.move_index == index)
                .ok_or_else(|| format!("Move {} not found in log file", index))?;

            if let Some(result) = self.keep(entry, self.replay_entry(entry)) {
                results.push(result);
            }
        }

        Ok(results)
    }

    /// Checks that the logged move at each index is one of the acceptable ones
    pub fn validate_expected_moves(
        &self,
        entries: &[MatchLogEntry],
        expected_moves: &[(usize, Vec<String>)],
    ) -> Result<(), String> {
        for (index, acceptable) in expected_moves {
            let entry = entries
                .iter()
                .find(|e| e.move_index == *index)
                .ok_or_else(|| format!("Move {} not found in log", index))?;

            if !acceptable.contains(&entry.chosen_move) {
                return Err(format!(
                    "Move {}: Expected one of {:?}, but got {}",
                    index, acceptable, entry.chosen_move
                ));
            }
        }

        Ok(())
    }

    fn keep(
        &self,
        entry: &MatchLogEntry,
        outcome: Result<ReplayResult, Skip>,
    ) -> Option<ReplayResult> {
        match outcome {
            Ok(result) => Some(result),
            Err(Skip::Random) => {
                info!("Move {}: random policy, skipped", entry.move_index);
                None
            }
            Err(Skip::Failed(e)) => {
                warn!("Failed to replay move {}: {}", entry.move_index, e);
                None
            }
        }
    }

    /// Generates statistics from replay results
    pub fn generate_stats(&self, results: &[ReplayResult]) -> ReplayStats {
        let total_moves = results.len();
        let matches = results.iter().filter(|r| r.matches).count();
        let mismatches = total_moves - matches;
        let match_rate = if total_moves > 0 {
            (matches as f64 / total_moves as f64) * 100.0
        } else {
            0.0
        };

        ReplayStats {
            total_moves,
            matches,
            mismatches,
            match_rate,
        }
    }

    /// Prints a detailed report of replay results
    pub fn print_report(&self, results: &[ReplayResult]) {
        let stats = self.generate_stats(results);

        println!("\n═══════════════════════════════════════════════════════════");
        println!("                    REPLAY REPORT");
        println!("═══════════════════════════════════════════════════════════");
        println!("Total Moves:    {}", stats.total_moves);
        println!("Matches:        {} ({:.1}%)", stats.matches, stats.match_rate);
        println!("Mismatches:     {}", stats.mismatches);
        println!("═══════════════════════════════════════════════════════════\n");

        if !results.is_empty() {
            let avg_time: f64 = results
                .iter()
                .map(|r| r.computation_time_us as f64)
                .sum::<f64>()
                / results.len() as f64;
            println!("Average Computation Time:   {:.1}µs\n", avg_time);
        }

        let mismatches: Vec<_> = results.iter().filter(|r| !r.matches).collect();
        if !mismatches.is_empty() {
            println!("═══════════════════════════════════════════════════════════");
            println!("                  DETAILED MISMATCHES");
            println!("═══════════════════════════════════════════════════════════");

            for result in mismatches {
                println!(
                    "Move {} ({}, {}): {} → {} ({}µs)",
                    result.move_index,
                    result.side,
                    result.strategy,
                    result.original_move,
                    result.replayed_move,
                    result.computation_time_us
                );
            }
            println!();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::match_log::LoggedMove;

    fn entry(strategy: &str, history: &[(Side, &str)]) -> MatchLogEntry {
        MatchLogEntry {
            move_index: history.iter().filter(|(s, _)| *s == Side::Second).count(),
            side: Side::Second,
            chosen_move: "B6=15".to_string(),
            strategy: strategy.to_string(),
            neutral: ["H1", "F2", "A3", "C4", "D5"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            history: history
                .iter()
                .map(|&(side, text)| LoggedMove {
                    side,
                    text: text.to_string(),
                })
                .collect(),
            timestamp: String::new(),
        }
    }

    fn engine() -> ReplayEngine {
        ReplayEngine::new(Config::default_hardcoded(), false).unwrap()
    }

    #[test]
    fn test_rebuild_applies_history() {
        let engine = engine();
        let state = engine
            .rebuild(&entry("least_loss", &[(Side::First, "A1=15")]))
            .unwrap();
        assert_eq!(state.empty_count(), 30);
        let a1 = state.topology().parse_name("A1").unwrap();
        assert_eq!(state.token_at(a1).map(|t| t.side), Some(Side::First));
    }

    #[test]
    fn test_rebuild_rejects_conflicting_history() {
        let engine = engine();
        let bad = entry("least_loss", &[(Side::First, "A1=15"), (Side::Second, "A1=14")]);
        assert!(engine.rebuild(&bad).is_err());
    }

    #[test]
    fn test_random_entries_are_skipped() {
        let engine = engine();
        assert_eq!(
            engine.replay_entry(&entry("random", &[])).unwrap_err(),
            Skip::Random
        );
        assert!(matches!(
            engine.replay_entry(&entry("zigzag", &[])),
            Err(Skip::Failed(_))
        ));
    }

    #[test]
    fn test_replay_detects_mismatch() {
        let engine = engine();
        let logged = entry("highest_open", &[(Side::First, "A1=15")]);
        let result = engine.replay_entry(&logged).unwrap();
        assert_eq!(result.strategy, "highest_open");
        // A3 and C4 are neutral, so B6 is the first cell with six empty neighbours
        assert_eq!(result.replayed_move, "B6=15");
        assert!(result.matches);

        let mut wrong = logged.clone();
        wrong.chosen_move = "G2=15".to_string();
        let result = engine.replay_entry(&wrong).unwrap();
        assert!(!result.matches);

        let stats = engine.generate_stats(&engine.replay_all(&[logged, wrong]));
        assert_eq!(stats.total_moves, 2);
        assert_eq!(stats.matches, 1);
        assert!((stats.match_rate - 50.0).abs() < 1e-9);
    }
}
