// Game state: occupancy of the board and the three token pools
//
// The state owns the cell -> token mapping and, per side, the value -> cell
// mapping. Both are kept in sync by `place`/`unplace`; nothing else mutates them.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::error::EngineError;
use crate::topology::Topology;
use crate::types::{CellId, Move, Side, Token, NEUTRAL_COUNT, TOKENS_PER_SIDE};

const POOL: usize = TOKENS_PER_SIDE as usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    topology: Arc<Topology>,
    occupancy: Vec<Option<Token>>,
    /// Where each First token sits, indexed by `value - 1`
    first: [Option<CellId>; POOL],
    second: [Option<CellId>; POOL],
    neutral: [Option<CellId>; NEUTRAL_COUNT],
}

impl GameState {
    /// Creates an empty board over the given topology
    pub fn new(topology: Arc<Topology>) -> Self {
        let occupancy = vec![None; topology.len()];
        GameState {
            topology,
            occupancy,
            first: [None; POOL],
            second: [None; POOL],
            neutral: [None; NEUTRAL_COUNT],
        }
    }

    /// Empty 8-row board with a freshly built topology
    pub fn standard() -> Self {
        Self::new(Arc::new(Topology::new()))
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn shared_topology(&self) -> Arc<Topology> {
        Arc::clone(&self.topology)
    }

    /// Blocks the named cell with neutral token `index` (preamble only)
    pub fn place_neutral(&mut self, name: &str, index: usize) -> Result<CellId, EngineError> {
        let cell = self.topology.parse_name(name)?;

        if self.occupancy[cell].is_some() {
            return Err(EngineError::AlreadyOccupied(name.to_string()));
        }
        let slot = self.neutral.get_mut(index).ok_or_else(|| {
            EngineError::ProtocolViolation(format!("neutral token index {} out of range", index))
        })?;
        if slot.is_some() {
            return Err(EngineError::ProtocolViolation(format!(
                "neutral token {} placed twice",
                index
            )));
        }

        *slot = Some(cell);
        self.occupancy[cell] = Some(Token {
            side: Side::Neutral,
            value: 0,
        });
        Ok(cell)
    }

    /// Binds `side`'s token of `value` to `cell`
    pub fn place(&mut self, side: Side, value: u8, cell: CellId) -> Result<(), EngineError> {
        if !side.is_player() {
            return Err(EngineError::NeutralMove);
        }
        if value == 0 || value > TOKENS_PER_SIDE {
            return Err(EngineError::InvalidValue(value as u32));
        }
        match self.occupancy.get(cell) {
            None => return Err(EngineError::CellOutOfRange(cell)),
            Some(Some(_)) => return Err(EngineError::CellOccupied(self.topology.name(cell))),
            Some(None) => {}
        }

        let slot = &mut self.pool_mut(side)[value as usize - 1];
        if slot.is_some() {
            return Err(EngineError::TokenAlreadyPlaced { side, value });
        }

        *slot = Some(cell);
        self.occupancy[cell] = Some(Token { side, value });
        Ok(())
    }

    /// Applies a move for `side`
    pub fn apply(&mut self, side: Side, mv: Move) -> Result<(), EngineError> {
        self.place(side, mv.value, mv.cell)
    }

    /// Takes `side`'s token of `value` back off the board, returning the freed cell
    pub fn unplace(&mut self, side: Side, value: u8) -> Result<CellId, EngineError> {
        if side == Side::Neutral {
            return Err(EngineError::NeutralTokenFixed);
        }
        if value == 0 || value > TOKENS_PER_SIDE {
            return Err(EngineError::InvalidValue(value as u32));
        }

        let cell = self.pool_mut(side)[value as usize - 1]
            .take()
            .ok_or(EngineError::TokenNotPlaced { side, value })?;
        self.occupancy[cell] = None;
        Ok(cell)
    }

    /// Places a token for the lifetime of the returned guard. The token is
    /// taken back when the guard drops, on every exit path.
    pub fn place_scoped(
        &mut self,
        side: Side,
        value: u8,
        cell: CellId,
    ) -> Result<Placement<'_>, EngineError> {
        self.place(side, value, cell)?;
        Ok(Placement {
            state: self,
            side,
            value,
        })
    }

    pub fn token_at(&self, cell: CellId) -> Option<Token> {
        self.occupancy.get(cell).copied().flatten()
    }

    /// False for occupied cells and for indices outside the board
    pub fn is_empty_cell(&self, cell: CellId) -> bool {
        matches!(self.occupancy.get(cell), Some(None))
    }

    /// Cell currently holding `side`'s token of `value`
    pub fn spot_of(&self, side: Side, value: u8) -> Option<CellId> {
        match side {
            Side::Neutral => None,
            _ => self
                .pool(side)
                .get((value as usize).wrapping_sub(1))
                .copied()
                .flatten(),
        }
    }

    /// Cells without a token, in construction order
    pub fn empty_cells(&self) -> impl Iterator<Item = CellId> + '_ {
        self.occupancy
            .iter()
            .enumerate()
            .filter(|(_, token)| token.is_none())
            .map(|(cell, _)| cell)
    }

    pub fn empty_count(&self) -> usize {
        self.occupancy.iter().filter(|t| t.is_none()).count()
    }

    /// Values `side` has not placed yet, ascending
    pub fn remaining(&self, side: Side) -> impl Iterator<Item = u8> + '_ {
        let pool: &[Option<CellId>] = match side {
            Side::Neutral => &[],
            _ => self.pool(side),
        };
        pool.iter()
            .enumerate()
            .filter(|(_, spot)| spot.is_none())
            .map(|(i, _)| i as u8 + 1)
    }

    pub fn highest_remaining(&self, side: Side) -> Option<u8> {
        self.remaining(side).last()
    }

    /// Number of First and Second tokens on the board
    pub fn placed_count(&self) -> usize {
        self.first
            .iter()
            .chain(self.second.iter())
            .filter(|spot| spot.is_some())
            .count()
    }

    pub fn neutral_cells(&self) -> impl Iterator<Item = CellId> + '_ {
        self.neutral.iter().flatten().copied()
    }

    /// Every `(cell, value)` pair `side` could play, cells outer, values ascending
    pub fn legal_moves(&self, side: Side) -> Vec<Move> {
        let values: Vec<u8> = self.remaining(side).collect();
        self.empty_cells()
            .flat_map(|cell| values.iter().map(move |&value| Move::new(cell, value)))
            .collect()
    }

    fn pool(&self, side: Side) -> &[Option<CellId>; POOL] {
        match side {
            Side::Second => &self.second,
            _ => &self.first,
        }
    }

    fn pool_mut(&mut self, side: Side) -> &mut [Option<CellId>; POOL] {
        match side {
            Side::Second => &mut self.second,
            _ => &mut self.first,
        }
    }
}

/// A token placed on the board for the duration of a search step.
/// Dereferences to the state so recursion can continue on it.
pub struct Placement<'a> {
    state: &'a mut GameState,
    side: Side,
    value: u8,
}

impl Deref for Placement<'_> {
    type Target = GameState;

    fn deref(&self) -> &GameState {
        self.state
    }
}

impl DerefMut for Placement<'_> {
    fn deref_mut(&mut self) -> &mut GameState {
        self.state
    }
}

impl Drop for Placement<'_> {
    fn drop(&mut self) {
        let released = self.state.unplace(self.side, self.value);
        debug_assert!(released.is_ok(), "scoped token vanished: {:?}", released);
    }
}
