//! Per-edge traffic costs.
//!
//! Costs are stored as one `[up, down, left, right]` tuple per cell, which is
//! the layout the planning service and grid files use. Writes always go through
//! the canonical wall and are mirrored into the neighbouring cell, so both
//! sides of a wall always report the same cost.

use crate::constants::DEFAULT_EDGE_COST;
use crate::types::{Cell, DirectedEdge, Direction};

/// Cost table for a `cols` x `rows` grid.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficCosts {
    cols: i32,
    rows: i32,
    /// Row-major cost tuples
    cells: Vec<[u8; 4]>,
}

impl TrafficCosts {
    /// Creates a table with every edge at the default cost.
    pub fn new(cols: i32, rows: i32) -> Self {
        Self {
            cols,
            rows,
            cells: vec![[DEFAULT_EDGE_COST; 4]; (cols * rows) as usize],
        }
    }

    /// Builds a table from `[y][x][direction]` rows.
    ///
    /// Returns `None` if the nested shape does not match `cols` x `rows`.
    pub fn from_rows(cols: i32, rows: i32, table: &[Vec<[u8; 4]>]) -> Option<Self> {
        if table.len() != rows as usize || table.iter().any(|row| row.len() != cols as usize) {
            return None;
        }
        Some(Self {
            cols,
            rows,
            cells: table.iter().flatten().copied().collect(),
        })
    }

    /// Exports the table as `[y][x][direction]` rows.
    pub fn to_rows(&self) -> Vec<Vec<[u8; 4]>> {
        self.cells
            .chunks(self.cols as usize)
            .map(|row| row.to_vec())
            .collect()
    }

    /// Cost of crossing `edge`, read through its canonical form.
    ///
    /// Walls with no cell inside the grid report the default cost.
    pub fn get(&self, edge: DirectedEdge) -> u8 {
        let canonical = edge.canonical();
        let mirror = canonical.mirror();
        self.slot(canonical)
            .or_else(|| self.slot(mirror))
            .unwrap_or(DEFAULT_EDGE_COST)
    }

    /// Sets the cost of `edge` on both sides of the wall.
    pub fn set(&mut self, edge: DirectedEdge, cost: u8) {
        let canonical = edge.canonical();
        for side in [canonical, canonical.mirror()] {
            if let Some(index) = self.index_of(side.from) {
                self.cells[index][side.direction.index()] = cost;
            }
        }
    }

    /// The raw `[up, down, left, right]` tuple of `cell`.
    pub fn cell(&self, cell: Cell) -> Option<[u8; 4]> {
        self.index_of(cell).map(|index| self.cells[index])
    }

    /// Every canonical wall that has at least one side inside the grid.
    pub fn canonical_edges(&self) -> Vec<DirectedEdge> {
        let mut edges = Vec::new();
        for y in 0..self.rows {
            for x in 0..self.cols {
                let cell = Cell::new(x, y);
                for direction in Direction::ALL {
                    let edge = DirectedEdge::new(cell, direction);
                    if edge.is_canonical() {
                        edges.push(edge);
                    }
                }
            }
        }
        edges
    }

    /// Copies each canonical slot into its mirror slot. Returns the number of
    /// mirror slots that disagreed.
    pub fn sync_mirrors(&mut self) -> usize {
        let mut repaired = 0;
        for edge in self.canonical_edges() {
            let cost = self.cells[edge.from.index(self.cols)][edge.direction.index()];
            let mirror = edge.mirror();
            if let Some(index) = self.index_of(mirror.from) {
                let slot = &mut self.cells[index][mirror.direction.index()];
                if *slot != cost {
                    *slot = cost;
                    repaired += 1;
                }
            }
        }
        repaired
    }

    fn slot(&self, edge: DirectedEdge) -> Option<u8> {
        self.index_of(edge.from)
            .map(|index| self.cells[index][edge.direction.index()])
    }

    fn index_of(&self, cell: Cell) -> Option<usize> {
        cell.in_bounds(self.cols, self.rows)
            .then(|| cell.index(self.cols))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_table_is_all_default() {
        let table = TrafficCosts::new(4, 3);
        assert_eq!(table.to_rows().len(), 3);
        assert!(table
            .to_rows()
            .iter()
            .flatten()
            .all(|tuple| *tuple == [1, 1, 1, 1]));
    }

    #[test]
    fn test_set_writes_both_sides_of_wall() {
        let mut table = TrafficCosts::new(5, 5);
        table.set(DirectedEdge::new(Cell::new(3, 2), Direction::Left), 4);

        assert_eq!(table.cell(Cell::new(2, 2)).unwrap()[Direction::Right.index()], 4);
        assert_eq!(table.cell(Cell::new(3, 2)).unwrap()[Direction::Left.index()], 4);
        assert_eq!(table.get(DirectedEdge::new(Cell::new(2, 2), Direction::Right)), 4);
    }

    #[test]
    fn test_boundary_wall_has_single_slot() {
        let mut table = TrafficCosts::new(3, 3);
        let edge = DirectedEdge::new(Cell::new(2, 1), Direction::Right);
        table.set(edge, 0);
        assert_eq!(table.get(edge), 0);
        assert_eq!(table.cell(Cell::new(2, 1)).unwrap(), [1, 1, 1, 0]);
    }

    #[test]
    fn test_from_rows_rejects_wrong_shape() {
        let rows = vec![vec![[1u8; 4]; 3]; 2];
        assert!(TrafficCosts::from_rows(3, 2, &rows).is_some());
        assert!(TrafficCosts::from_rows(3, 3, &rows).is_none());
        assert!(TrafficCosts::from_rows(2, 2, &rows).is_none());
    }

    #[test]
    fn test_sync_mirrors_copies_canonical_slot() {
        let mut rows = vec![vec![[1u8; 4]; 3]; 3];
        // (0,0) right = 3, but (1,0) left still says 1.
        rows[0][0][Direction::Right.index()] = 3;
        let mut table = TrafficCosts::from_rows(3, 3, &rows).unwrap();

        assert_eq!(table.sync_mirrors(), 1);
        assert_eq!(table.cell(Cell::new(1, 0)).unwrap()[Direction::Left.index()], 3);
        assert_eq!(table.sync_mirrors(), 0);
    }

    #[test]
    fn test_canonical_edge_count() {
        // 3x3: 9 right + 9 down + 3 outer left + 3 outer up.
        let table = TrafficCosts::new(3, 3);
        assert_eq!(table.canonical_edges().len(), 24);
    }
}
