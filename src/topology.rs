// Triangular board topology
//
// Cells live in an arena addressed by `CellId` (row-major construction order).
// Adjacency is stored as index lists and never changes after construction.

use crate::error::EngineError;
use crate::types::{CellId, ROWS};

/// One grid position with its precomputed neighbours
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    neighbors: Vec<CellId>,
}

impl Cell {
    /// Display name: row letter followed by the 1-based column, e.g. `A1`
    pub fn name(&self) -> String {
        format!("{}{}", (b'A' + self.row as u8) as char, self.col + 1)
    }

    pub fn neighbors(&self) -> &[CellId] {
        &self.neighbors
    }
}

/// Fixed adjacency structure of the 8-row triangle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    cells: Vec<Cell>,
    row_starts: [CellId; ROWS],
}

impl Default for Topology {
    fn default() -> Self {
        Self::new()
    }
}

impl Topology {
    /// Builds all cells row by row, then wires up neighbours
    pub fn new() -> Self {
        let mut cells = Vec::new();
        let mut row_starts = [0; ROWS];

        for (row, start) in row_starts.iter_mut().enumerate() {
            *start = cells.len();
            for col in 0..Self::row_len(row) {
                cells.push(Cell {
                    row,
                    col,
                    neighbors: Vec::with_capacity(6),
                });
            }
        }

        let mut topology = Topology { cells, row_starts };
        topology.connect();
        topology
    }

    fn row_len(row: usize) -> usize {
        ROWS - row
    }

    /// Links each cell to up-left, up-right, left, right, down-left, down-right
    /// when those positions exist
    fn connect(&mut self) {
        for id in 0..self.cells.len() {
            let (row, col) = (self.cells[id].row, self.cells[id].col);
            let mut neighbors = Vec::with_capacity(6);

            if row > 0 {
                neighbors.extend(self.id_of(row - 1, col));
                neighbors.extend(self.id_of(row - 1, col + 1));
            }
            if col > 0 {
                neighbors.extend(self.id_of(row, col - 1));
            }
            neighbors.extend(self.id_of(row, col + 1));
            if row + 1 < ROWS {
                if col > 0 {
                    neighbors.extend(self.id_of(row + 1, col - 1));
                }
                neighbors.extend(self.id_of(row + 1, col));
            }

            self.cells[id].neighbors = neighbors;
        }
    }

    /// Number of cells on the board
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id]
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn neighbors(&self, id: CellId) -> &[CellId] {
        self.cells[id].neighbors()
    }

    /// Arena index of `(row, col)`, if that position is on the board
    pub fn id_of(&self, row: usize, col: usize) -> Option<CellId> {
        if row < ROWS && col < Self::row_len(row) {
            Some(self.row_starts[row] + col)
        } else {
            None
        }
    }

    pub fn name(&self, id: CellId) -> String {
        self.cells[id].name()
    }

    /// Resolves a protocol cell name (`A1` .. `H1`). The column is 1-based
    /// without leading zeros.
    pub fn parse_name(&self, name: &str) -> Result<CellId, EngineError> {
        let unknown = || EngineError::UnknownCell(name.to_string());

        let mut chars = name.chars();
        let letter = chars.next().ok_or_else(unknown)?;
        let digits = chars.as_str();

        if !letter.is_ascii_uppercase()
            || digits.is_empty()
            || digits.starts_with('0')
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(unknown());
        }

        let row = (letter as u8 - b'A') as usize;
        let col: usize = digits.parse().map_err(|_| unknown())?;

        self.id_of(row, col - 1).ok_or_else(unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TOTAL_CELLS;

    #[test]
    fn test_builds_36_cells_in_row_major_order() {
        let topology = Topology::new();
        assert_eq!(topology.len(), TOTAL_CELLS);
        assert_eq!(topology.name(0), "A1");
        assert_eq!(topology.name(7), "A8");
        assert_eq!(topology.name(8), "B1");
        assert_eq!(topology.name(TOTAL_CELLS - 1), "H1");
    }

    #[test]
    fn test_corner_and_inner_neighbors() {
        let topology = Topology::new();
        let names = |name: &str| -> Vec<String> {
            let id = topology.parse_name(name).unwrap();
            topology
                .neighbors(id)
                .iter()
                .map(|&n| topology.name(n))
                .collect()
        };

        assert_eq!(names("A1"), vec!["A2", "B1"]);
        assert_eq!(names("A8"), vec!["A7", "B7"]);
        assert_eq!(names("H1"), vec!["G1", "G2"]);
        assert_eq!(names("B2"), vec!["A2", "A3", "B1", "B3", "C1", "C2"]);
    }

    #[test]
    fn test_adjacency_is_symmetric() {
        let topology = Topology::new();
        for id in 0..topology.len() {
            for &n in topology.neighbors(id) {
                assert!(
                    topology.neighbors(n).contains(&id),
                    "{} lists {} but not the reverse",
                    topology.name(id),
                    topology.name(n)
                );
            }
        }
    }

    #[test]
    fn test_neighbor_count_bounds() {
        let topology = Topology::new();
        let total_links: usize = (0..topology.len())
            .map(|id| topology.neighbors(id).len())
            .inspect(|&count| assert!((2..=6).contains(&count)))
            .sum();
        // 3 * 28 undirected edges in an 8-row triangle, counted from both ends
        assert_eq!(total_links, 2 * 84);
    }

    #[test]
    fn test_parse_name_round_trip() {
        let topology = Topology::new();
        for id in 0..topology.len() {
            assert_eq!(topology.parse_name(&topology.name(id)).unwrap(), id);
        }
    }

    #[test]
    fn test_parse_name_rejects_off_board() {
        let topology = Topology::new();
        for bad in ["", "A", "A0", "A01", "A9", "B8", "H2", "I1", "a1", "A1x", "1A"] {
            assert!(
                matches!(topology.parse_name(bad), Err(EngineError::UnknownCell(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }
}
