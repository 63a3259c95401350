// Exact endgame search
//
// Full-width minimax to the end of the game, no pruning. Moves are enumerated
// as empty cells (construction order) x remaining values (ascending), and only
// a strict improvement replaces the running best, so the first enumerated
// optimal move is returned. The board is mutated in place through scoped
// placements and is left exactly as found.

use log::debug;
use rayon::prelude::*;

use crate::board::GameState;
use crate::error::EngineError;
use crate::scoring::cell_score;
use crate::types::{CellId, Move, Side, BASELINE_SCORE};

/// Outcome of a search: the minimax value, the move achieving it at the
/// root (none at terminal positions) and the number of visited nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    pub value: i32,
    pub best: Option<Move>,
    pub nodes: u64,
}

/// Searches with `side_to_move` on move, scoring leaves for `maximizing_for`
pub fn minimax(
    state: &mut GameState,
    side_to_move: Side,
    maximizing_for: Side,
) -> Result<SearchResult, EngineError> {
    let values: Vec<u8> = state.remaining(side_to_move).collect();
    let cells: Vec<CellId> = state.empty_cells().collect();

    // Both sides place in lockstep, so the side to move running dry means
    // the board is down to its final empty cell
    if values.is_empty() || cells.is_empty() {
        return Ok(SearchResult {
            value: terminal_value(state, maximizing_for),
            best: None,
            nodes: 1,
        });
    }

    let maximizing = side_to_move == maximizing_for;
    let mut best_value = if maximizing { i32::MIN } else { i32::MAX };
    let mut best = None;
    let mut nodes = 1;

    for &cell in &cells {
        for &value in &values {
            let child = {
                let mut placed = state.place_scoped(side_to_move, value, cell)?;
                minimax(&mut placed, side_to_move.opponent(), maximizing_for)?
            };
            nodes += child.nodes;

            let improves = if maximizing {
                child.value > best_value
            } else {
                child.value < best_value
            };
            if improves {
                best_value = child.value;
                best = Some(Move::new(cell, value));
            }
        }
    }

    Ok(SearchResult {
        value: best_value,
        best,
        nodes,
    })
}

/// Same result as `minimax(state, side, side)`, with each root branch searched
/// on its own copy of the board across the rayon pool
pub fn minimax_parallel(state: &GameState, side: Side) -> Result<SearchResult, EngineError> {
    let moves = state.legal_moves(side);
    if moves.is_empty() {
        return minimax(&mut state.clone(), side, side);
    }

    debug!(
        "Parallel minimax over {} root moves on {} threads",
        moves.len(),
        rayon::current_num_threads()
    );

    let children: Vec<(Move, SearchResult)> = moves
        .par_iter()
        .map(|&mv| -> Result<(Move, SearchResult), EngineError> {
            let mut branch = state.clone();
            branch.apply(side, mv)?;
            let child = minimax(&mut branch, side.opponent(), side)?;
            Ok((mv, child))
        })
        .collect::<Result<_, EngineError>>()?;

    // Reduce in enumeration order so ties resolve as in the sequential search
    let mut result = SearchResult {
        value: i32::MIN,
        best: None,
        nodes: 1,
    };
    for (mv, child) in children {
        result.nodes += child.nodes;
        if child.value > result.value {
            result.value = child.value;
            result.best = Some(mv);
        }
    }
    Ok(result)
}

fn terminal_value(state: &GameState, side: Side) -> i32 {
    state
        .empty_cells()
        .next()
        .map(|cell| cell_score(state, cell, side))
        .unwrap_or(BASELINE_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NEUTRAL_COUNT;

    /// Standard neutral cells, then both sides fill empty cells in order
    /// with ascending values until each has `left` values remaining
    fn endgame(left: u8) -> GameState {
        let mut state = GameState::standard();
        for (i, name) in ["H1", "F2", "A3", "C4", "D5"].iter().enumerate() {
            state.place_neutral(name, i).unwrap();
        }
        for value in 1..=(15 - left) {
            for side in [Side::First, Side::Second] {
                let cell = state.empty_cells().next().unwrap();
                state.place(side, value, cell).unwrap();
            }
        }
        state
    }

    #[test]
    fn test_terminal_position_scores_last_cell() {
        let mut state = endgame(0);
        assert_eq!(state.empty_count(), 1);
        let last = state.empty_cells().next().unwrap();

        let result = minimax(&mut state, Side::First, Side::First).unwrap();
        assert_eq!(result.best, None);
        assert_eq!(result.nodes, 1);
        assert_eq!(result.value, cell_score(&state, last, Side::First));
    }

    #[test]
    fn test_single_round_left_matches_hand_enumeration() {
        let mut state = endgame(1);
        assert_eq!(state.empty_count(), 3);

        // First picks a cell, Second picks one of the other two; the third
        // stays empty and is scored for First
        let cells: Vec<CellId> = state.empty_cells().collect();
        let mut expected = i32::MIN;
        let mut expected_cell = None;
        for &a in &cells {
            let mut worst = i32::MAX;
            for &b in cells.iter().filter(|&&b| b != a) {
                state.place(Side::First, 15, a).unwrap();
                state.place(Side::Second, 15, b).unwrap();
                let left = state.empty_cells().next().unwrap();
                worst = worst.min(cell_score(&state, left, Side::First));
                state.unplace(Side::Second, 15).unwrap();
                state.unplace(Side::First, 15).unwrap();
            }
            if worst > expected {
                expected = worst;
                expected_cell = Some(a);
            }
        }

        let result = minimax(&mut state, Side::First, Side::First).unwrap();
        assert_eq!(result.value, expected);
        assert_eq!(result.best.map(|m| m.cell), expected_cell);
        assert_eq!(result.best.map(|m| m.value), Some(15));
        // root + 3 first moves + 3 * 2 second moves
        assert_eq!(result.nodes, 1 + 3 + 6);
    }

    #[test]
    fn test_search_leaves_board_untouched() {
        let mut state = endgame(2);
        let before = state.clone();
        minimax(&mut state, Side::First, Side::First).unwrap();
        assert_eq!(state, before);
    }

    #[test]
    fn test_search_is_deterministic() {
        let mut state = endgame(2);
        let first = minimax(&mut state, Side::First, Side::First).unwrap();
        let second = minimax(&mut state, Side::First, Side::First).unwrap();
        assert_eq!(first, second);
        assert!(first.best.is_some());
    }

    #[test]
    fn test_ties_keep_first_enumerated_move() {
        let mut state = endgame(2);

        // Value of every root move, in enumeration order
        let mut children = Vec::new();
        for mv in state.legal_moves(Side::First) {
            let mut placed = state.place_scoped(Side::First, mv.value, mv.cell).unwrap();
            let child = minimax(&mut placed, Side::Second, Side::First).unwrap();
            children.push((mv, child.value));
        }
        let best_value = children.iter().map(|&(_, v)| v).max().unwrap();
        let first_best = children
            .iter()
            .find(|&&(_, v)| v == best_value)
            .map(|&(mv, _)| mv);

        let result = minimax(&mut state, Side::First, Side::First).unwrap();
        assert_eq!(result.value, best_value);
        assert_eq!(result.best, first_best);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let state = endgame(2);
        let sequential = minimax(&mut state.clone(), Side::First, Side::First).unwrap();
        let parallel = minimax_parallel(&state, Side::First).unwrap();
        assert_eq!(parallel, sequential);

        let mut state = endgame(2);
        let cell = state.empty_cells().next().unwrap();
        state.place(Side::First, 14, cell).unwrap();
        let sequential = minimax(&mut state.clone(), Side::Second, Side::Second).unwrap();
        let parallel = minimax_parallel(&state, Side::Second).unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_empty_count_at_endgame_fixture() {
        let state = endgame(2);
        assert_eq!(state.empty_count(), 36 - NEUTRAL_COUNT - 26);
    }
}
