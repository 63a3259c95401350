// Scoring rule
//
// A cell scores the baseline plus the values of the scorer's own neighbouring
// tokens minus the values of the opponent's. Neutral and empty neighbours
// count for nothing. Scores are computed on demand; the board mutates during
// search so nothing is cached.

use crate::board::GameState;
use crate::types::{CellId, Side, Token, BASELINE_SCORE};

/// Score of `cell` for `side` on the current board
pub fn cell_score(state: &GameState, cell: CellId, side: Side) -> i32 {
    score_from_neighbors(
        side,
        state
            .topology()
            .neighbors(cell)
            .iter()
            .map(|&n| state.token_at(n)),
    )
}

/// Applies the scoring rule to an arbitrary set of neighbour contents
pub fn score_from_neighbors<I>(side: Side, neighbors: I) -> i32
where
    I: IntoIterator<Item = Option<Token>>,
{
    neighbors
        .into_iter()
        .flatten()
        .fold(BASELINE_SCORE, |score, token| {
            if token.side == side {
                score + token.value as i32
            } else if token.side.is_player() {
                score - token.value as i32
            } else {
                score
            }
        })
}

/// Number of empty neighbours around `cell`
pub fn openness(state: &GameState, cell: CellId) -> usize {
    state
        .topology()
        .neighbors(cell)
        .iter()
        .filter(|&&n| state.is_empty_cell(n))
        .count()
}

/// Final score for `side`: the score of the first (normally the only)
/// remaining empty cell, or `None` on a full board
pub fn final_score(state: &GameState, side: Side) -> Option<i32> {
    state
        .empty_cells()
        .next()
        .map(|cell| cell_score(state, cell, side))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(side: Side, value: u8) -> Option<Token> {
        Some(Token { side, value })
    }

    #[test]
    fn test_empty_neighbourhood_scores_baseline() {
        let state = GameState::standard();
        for cell in 0..state.topology().len() {
            assert_eq!(cell_score(&state, cell, Side::First), BASELINE_SCORE);
        }
    }

    #[test]
    fn test_three_cell_line() {
        // A - B - C with B empty; X owns 10 on A, Y owns 4 on C
        let neighbors_of_b = [token(Side::First, 10), token(Side::Second, 4)];
        assert_eq!(score_from_neighbors(Side::First, neighbors_of_b), 81);
        assert_eq!(score_from_neighbors(Side::Second, neighbors_of_b), 69);
    }

    #[test]
    fn test_neutral_and_empty_neighbours_are_ignored() {
        let neighbors = [
            token(Side::Neutral, 0),
            None,
            token(Side::First, 5),
            None,
        ];
        assert_eq!(score_from_neighbors(Side::First, neighbors), 80);
        assert_eq!(score_from_neighbors(Side::Second, neighbors), 70);
    }

    #[test]
    fn test_order_of_neighbours_does_not_matter() {
        let mut neighbors = vec![
            token(Side::First, 15),
            token(Side::Second, 9),
            token(Side::Neutral, 0),
            None,
            token(Side::Second, 2),
            token(Side::First, 1),
        ];
        let expected = score_from_neighbors(Side::First, neighbors.clone());
        assert_eq!(expected, 75 + 15 - 9 - 2 + 1);

        for _ in 0..neighbors.len() {
            neighbors.rotate_left(1);
            assert_eq!(score_from_neighbors(Side::First, neighbors.clone()), expected);
        }
        neighbors.reverse();
        assert_eq!(score_from_neighbors(Side::First, neighbors), expected);
    }

    #[test]
    fn test_cell_score_on_board() {
        let mut state = GameState::standard();
        let a1 = state.topology().parse_name("A1").unwrap();
        let a2 = state.topology().parse_name("A2").unwrap();
        let b1 = state.topology().parse_name("B1").unwrap();

        state.place(Side::First, 5, a2).unwrap();
        assert_eq!(cell_score(&state, a1, Side::First), 75 + 5);
        assert_eq!(cell_score(&state, a1, Side::Second), 75 - 5);

        state.place(Side::Second, 3, b1).unwrap();
        assert_eq!(cell_score(&state, a1, Side::First), 75 + 5 - 3);
        assert_eq!(cell_score(&state, a1, Side::Second), 75 - 5 + 3);
    }

    #[test]
    fn test_openness() {
        let mut state = GameState::standard();
        let b2 = state.topology().parse_name("B2").unwrap();
        assert_eq!(openness(&state, b2), 6);
        state.place_neutral("A2", 0).unwrap();
        let c1 = state.topology().parse_name("C1").unwrap();
        state.place(Side::First, 1, c1).unwrap();
        assert_eq!(openness(&state, b2), 4);
    }
}
