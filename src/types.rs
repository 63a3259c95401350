// Black Hole game types
// Fixed board constants, sides, tokens and moves shared by every module

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::EngineError;
use crate::topology::Topology;

/// Number of rows of the triangular board
pub const ROWS: usize = 8;
/// Number of cells on the board (8 + 7 + ... + 1)
pub const TOTAL_CELLS: usize = ROWS * (ROWS + 1) / 2;
/// Number of neutral blocking tokens placed during the preamble
pub const NEUTRAL_COUNT: usize = 5;
/// Each competing side owns one token of every value in `1..=TOKENS_PER_SIDE`
pub const TOKENS_PER_SIDE: u8 = 15;
/// Score of a cell before any neighbouring token is counted
pub const BASELINE_SCORE: i32 = 75;
/// One placement per side per round
pub const ROUNDS: usize = TOKENS_PER_SIDE as usize;

/// Stable index of a cell in the topology arena (row-major construction order)
pub type CellId = usize;

/// The two competing participants plus the neutral blocker
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    First,
    Second,
    Neutral,
}

impl Side {
    /// Returns the competing side facing this one. Neutral has no opponent.
    pub fn opponent(self) -> Side {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
            Side::Neutral => Side::Neutral,
        }
    }

    /// True for First and Second
    pub fn is_player(self) -> bool {
        !matches!(self, Side::Neutral)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::First => "first",
            Side::Second => "second",
            Side::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A placeable unit. Neutral tokens carry value 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
    pub side: Side,
    pub value: u8,
}

/// A decision: put the side's token of `value` on `cell`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub cell: CellId,
    pub value: u8,
}

impl Move {
    pub fn new(cell: CellId, value: u8) -> Self {
        Move { cell, value }
    }

    /// Parses the protocol form `<CellName>=<Value>`, e.g. `C4=15`
    pub fn parse(text: &str, topology: &Topology) -> Result<Move, EngineError> {
        let (name, value) = text
            .trim()
            .split_once('=')
            .ok_or_else(|| EngineError::MalformedMove(text.to_string()))?;

        let cell = topology.parse_name(name)?;
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(EngineError::MalformedMove(text.to_string()));
        }
        // Only overflow can fail past the digit check
        let value: u32 = value.parse().unwrap_or(u32::MAX);

        if value == 0 || value > TOKENS_PER_SIDE as u32 {
            return Err(EngineError::InvalidValue(value));
        }

        Ok(Move::new(cell, value as u8))
    }

    /// Renders the move in protocol form
    pub fn to_text(&self, topology: &Topology) -> String {
        format!("{}={}", topology.name(self.cell), self.value)
    }
}
