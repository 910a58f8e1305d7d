//! The editable routing scenario.
//!
//! [`GridModel`] owns every entity on the grid and is the only place they are
//! mutated. Each successful mutation bumps [`GridModel::revision`], which the
//! session uses to drop routes computed against an older grid.
//!
//! Roadblocks and traffic costs are coupled: a roadblocked wall always costs 0
//! and a 0-cost wall always has a roadblock. [`GridModel::enforce_invariants`]
//! re-establishes that coupling after structural changes.

use crate::constants::{
    BLOCKED_EDGE_COST, CELL_SIZE, DEFAULT_EDGE_COST, DEFAULT_GRID_DIMENSION, MAX_DESTINATIONS,
    MAX_EDGE_COST, MAX_GRID_DIMENSION, MAX_RANDOM_TUNNEL_COST, MAX_STORES, MIN_EDGE_COST,
    MIN_GRID_DIMENSION,
};
use crate::error::{GridError, Result};
use crate::traffic::TrafficCosts;
use crate::types::{Cell, DirectedEdge, Direction, GridSnapshot, Tunnel};
use rand::seq::SliceRandom;
use rand::Rng;

/// Counts of repairs made by one [`GridModel::enforce_invariants`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvariantReport {
    /// Roadblocks rewritten into canonical form
    pub normalized: usize,
    /// Roadblocks dropped as duplicates of another
    pub deduplicated: usize,
    /// Roadblocks dropped because their wall left the grid
    pub out_of_bounds: usize,
    /// Zero-cost walls without a roadblock, restored to the default cost
    pub orphaned_zeros: usize,
    /// Costs above the maximum, clamped
    pub clamped: usize,
}

impl InvariantReport {
    /// Returns true if the pass changed nothing.
    pub fn is_clean(&self) -> bool {
        *self == InvariantReport::default()
    }
}

/// Stores, destinations, tunnels, roadblocks and traffic costs of one grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridModel {
    rows: i32,
    cols: i32,
    cell_size: f32,
    stores: Vec<Cell>,
    destinations: Vec<Cell>,
    tunnels: Vec<Tunnel>,
    /// Canonical edges only
    roadblocks: Vec<DirectedEdge>,
    traffic: TrafficCosts,
    revision: u64,
}

impl Default for GridModel {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_DIMENSION, DEFAULT_GRID_DIMENSION)
    }
}

impl GridModel {
    /// Creates an empty grid. Dimensions are clamped to the allowed range.
    pub fn new(rows: i32, cols: i32) -> Self {
        let rows = clamp_dimension(rows);
        let cols = clamp_dimension(cols);
        Self {
            rows,
            cols,
            cell_size: CELL_SIZE,
            stores: Vec::new(),
            destinations: Vec::new(),
            tunnels: Vec::new(),
            roadblocks: Vec::new(),
            traffic: TrafficCosts::new(cols, rows),
            revision: 0,
        }
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Width and height of the grid in world units.
    pub fn content_size(&self) -> (f32, f32) {
        (
            self.cols as f32 * self.cell_size,
            self.rows as f32 * self.cell_size,
        )
    }

    pub fn stores(&self) -> &[Cell] {
        &self.stores
    }

    pub fn destinations(&self) -> &[Cell] {
        &self.destinations
    }

    pub fn tunnels(&self) -> &[Tunnel] {
        &self.tunnels
    }

    /// Roadblocked walls, each in canonical form.
    pub fn roadblocks(&self) -> &[DirectedEdge] {
        &self.roadblocks
    }

    pub fn traffic(&self) -> &TrafficCosts {
        &self.traffic
    }

    /// Counter bumped by every successful mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Cost of crossing `edge`.
    pub fn cost(&self, edge: DirectedEdge) -> u8 {
        self.traffic.get(edge)
    }

    /// Returns true if a roadblock sits on the wall of `edge`.
    pub fn is_blocked(&self, edge: DirectedEdge) -> bool {
        self.roadblocks.contains(&edge.canonical())
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.in_bounds(self.cols, self.rows)
    }

    /// Flags `cell` as a store.
    ///
    /// Adding an existing store is a no-op. Fails with `CapacityExceeded` once
    /// [`MAX_STORES`] exist and with `CellOccupied` if the cell is a destination.
    pub fn add_store(&mut self, cell: Cell) -> Result<()> {
        if self.stores.contains(&cell) {
            return Ok(());
        }
        self.check_in_bounds(cell)?;
        if self.stores.len() >= MAX_STORES {
            return Err(GridError::CapacityExceeded {
                what: "stores",
                limit: MAX_STORES,
            });
        }
        if self.destinations.contains(&cell) {
            return Err(GridError::CellOccupied { cell });
        }
        self.stores.push(cell);
        self.touch();
        Ok(())
    }

    /// Flags `cell` as a destination. Same rules as [`GridModel::add_store`]
    /// with a limit of [`MAX_DESTINATIONS`].
    pub fn add_destination(&mut self, cell: Cell) -> Result<()> {
        if self.destinations.contains(&cell) {
            return Ok(());
        }
        self.check_in_bounds(cell)?;
        if self.destinations.len() >= MAX_DESTINATIONS {
            return Err(GridError::CapacityExceeded {
                what: "destinations",
                limit: MAX_DESTINATIONS,
            });
        }
        if self.stores.contains(&cell) {
            return Err(GridError::CellOccupied { cell });
        }
        self.destinations.push(cell);
        self.touch();
        Ok(())
    }

    /// Connects `start` and `end` with a tunnel.
    ///
    /// Returns `Ok(false)` without changing anything when both ends are the
    /// same cell. Parallel tunnels between the same pair are allowed.
    pub fn add_tunnel(&mut self, start: Cell, end: Cell, cost: u32) -> Result<bool> {
        if start == end {
            return Ok(false);
        }
        self.check_in_bounds(start)?;
        self.check_in_bounds(end)?;
        self.tunnels.push(Tunnel::new(start, end, cost));
        self.touch();
        Ok(true)
    }

    /// Sets the cost of crossing a wall in either direction.
    pub fn set_edge_cost(&mut self, edge: DirectedEdge, cost: u8) -> Result<()> {
        check_cost(cost)?;
        let edge = self.owned_canonical(edge)?;
        if self.is_blocked(edge) {
            return Err(GridError::EdgeBlocked(edge));
        }
        self.traffic.set(edge, cost);
        self.touch();
        Ok(())
    }

    /// Places a roadblock on the wall of `edge` and makes it impassable.
    ///
    /// Returns `Ok(false)` if the wall was already blocked.
    pub fn toggle_roadblock(&mut self, edge: DirectedEdge) -> Result<bool> {
        let edge = self.owned_canonical(edge)?;
        if self.roadblocks.contains(&edge) {
            return Ok(false);
        }
        self.roadblocks.push(edge);
        self.traffic.set(edge, BLOCKED_EDGE_COST);
        self.touch();
        Ok(true)
    }

    /// Lifts the roadblock on the wall of `edge`, restoring the default cost.
    ///
    /// Returns `Ok(false)` if the wall was not blocked.
    pub fn remove_roadblock(&mut self, edge: DirectedEdge) -> Result<bool> {
        let edge = self.owned_canonical(edge)?;
        let before = self.roadblocks.len();
        self.roadblocks.retain(|blocked| *blocked != edge);
        if self.roadblocks.len() == before {
            return Ok(false);
        }
        self.traffic.set(edge, DEFAULT_EDGE_COST);
        self.touch();
        Ok(true)
    }

    /// Replaces the four costs `[up, down, left, right]` of `cell`.
    ///
    /// A roadblocked side must be given as 0; every other side must lie in
    /// `1..=4`. Nothing is written unless all four values are acceptable.
    pub fn set_cell_costs(&mut self, cell: Cell, costs: [u8; 4]) -> Result<()> {
        self.check_in_bounds(cell)?;
        for direction in Direction::ALL {
            let edge = DirectedEdge::new(cell, direction).canonical();
            let cost = costs[direction.index()];
            if self.is_blocked(edge) {
                if cost != BLOCKED_EDGE_COST {
                    return Err(GridError::EdgeBlocked(edge));
                }
            } else {
                check_cost(cost)?;
            }
        }
        for direction in Direction::ALL {
            let edge = DirectedEdge::new(cell, direction);
            if !self.is_blocked(edge) {
                self.traffic.set(edge, costs[direction.index()]);
            }
        }
        self.touch();
        Ok(())
    }

    /// Removes every store, destination, tunnel and roadblock touching `cell`.
    ///
    /// Walls freed from a roadblock go back to the default cost. Returns true
    /// if anything was removed.
    pub fn delete_at(&mut self, cell: Cell) -> bool {
        let before = self.entity_count();

        self.stores.retain(|store| *store != cell);
        self.destinations.retain(|destination| *destination != cell);
        self.tunnels.retain(|tunnel| !tunnel.touches(cell));

        let (freed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.roadblocks)
            .into_iter()
            .partition(|edge| edge.touches(cell));
        self.roadblocks = kept;
        for edge in freed {
            self.traffic.set(edge, DEFAULT_EDGE_COST);
        }

        let removed = self.entity_count() != before;
        if removed {
            self.touch();
        }
        removed
    }

    /// Changes the grid size, clamping both dimensions.
    ///
    /// Entities outside the new bounds are dropped, every cost returns to the
    /// default and the surviving roadblocks are re-applied.
    pub fn resize(&mut self, rows: i32, cols: i32) {
        self.rows = clamp_dimension(rows);
        self.cols = clamp_dimension(cols);
        let (cols, rows) = (self.cols, self.rows);
        let inside = |cell: &Cell| cell.in_bounds(cols, rows);

        self.stores.retain(inside);
        self.destinations.retain(inside);
        self.tunnels
            .retain(|tunnel| inside(&tunnel.start) && inside(&tunnel.end));
        self.roadblocks.retain(|edge| inside(&edge.from));
        self.traffic = TrafficCosts::new(cols, rows);

        self.enforce_invariants();
        self.touch();
        log::info!("Resized grid to {}x{}", cols, rows);
    }

    /// Removes every entity and restores default costs. Dimensions are kept.
    pub fn reset(&mut self) {
        self.stores.clear();
        self.destinations.clear();
        self.tunnels.clear();
        self.roadblocks.clear();
        self.traffic = TrafficCosts::new(self.cols, self.rows);
        self.touch();
    }

    /// Re-establishes the roadblock and cost invariants.
    ///
    /// Roadblocks are canonicalized, deduplicated, dropped if their wall left
    /// the grid and forced to cost 0. Zero-cost walls without a roadblock are
    /// restored to the default cost and costs above the maximum are clamped.
    /// Running the pass twice in a row changes nothing the second time.
    pub fn enforce_invariants(&mut self) -> InvariantReport {
        let mut report = InvariantReport::default();

        // Canonical slots are authoritative.
        self.traffic.sync_mirrors();

        let mut kept: Vec<DirectedEdge> = Vec::with_capacity(self.roadblocks.len());
        for edge in self.roadblocks.drain(..) {
            let canonical = edge.canonical();
            if canonical != edge {
                report.normalized += 1;
            }
            if !canonical.from.in_bounds(self.cols, self.rows) {
                report.out_of_bounds += 1;
            } else if kept.contains(&canonical) {
                report.deduplicated += 1;
            } else {
                kept.push(canonical);
            }
        }
        self.roadblocks = kept;

        for edge in &self.roadblocks {
            self.traffic.set(*edge, BLOCKED_EDGE_COST);
        }

        for edge in self.traffic.canonical_edges() {
            let cost = self.traffic.get(edge);
            if cost == BLOCKED_EDGE_COST && !self.roadblocks.contains(&edge) {
                log::warn!("Wall {} had cost 0 without a roadblock", edge);
                self.traffic.set(edge, DEFAULT_EDGE_COST);
                report.orphaned_zeros += 1;
            } else if cost > MAX_EDGE_COST {
                self.traffic.set(edge, MAX_EDGE_COST);
                report.clamped += 1;
            }
        }

        if !report.is_clean() {
            log::info!("Grid invariants repaired: {:?}", report);
        }
        report
    }

    /// Fills the grid with a random scenario.
    ///
    /// Places 1-3 stores, 3-10 destinations, 0-2 tunnels and 2-6 roadblocked
    /// cells (1-3 blocked sides each) on distinct cells, then gives about 30%
    /// of the cells random costs on their open sides. Counts shrink on grids
    /// too small to hold them.
    pub fn generate_random<R: Rng>(&mut self, rng: &mut R) {
        self.stores.clear();
        self.destinations.clear();
        self.tunnels.clear();
        self.roadblocks.clear();
        self.traffic = TrafficCosts::new(self.cols, self.rows);

        let mut free: Vec<Cell> = (0..self.rows)
            .flat_map(|y| (0..self.cols).map(move |x| Cell::new(x, y)))
            .collect();
        free.shuffle(rng);

        let store_count = rng.gen_range(1..=MAX_STORES);
        self.stores = take_cells(&mut free, store_count);

        let destination_count = rng.gen_range(3..=MAX_DESTINATIONS);
        self.destinations = take_cells(&mut free, destination_count);

        for _ in 0..rng.gen_range(0..=2) {
            let ends = take_cells(&mut free, 2);
            if let &[start, end] = ends.as_slice() {
                let cost = rng.gen_range(1..=MAX_RANDOM_TUNNEL_COST);
                self.tunnels.push(Tunnel::new(start, end, cost));
            }
        }

        let blocked_cells = take_cells(&mut free, rng.gen_range(2..=6));
        for cell in blocked_cells {
            let mut directions = Direction::ALL;
            directions.shuffle(rng);
            let count = rng.gen_range(1..=3);
            for direction in &directions[..count] {
                let edge = DirectedEdge::new(cell, *direction).canonical();
                if !self.roadblocks.contains(&edge) {
                    self.roadblocks.push(edge);
                }
            }
        }

        for y in 0..self.rows {
            for x in 0..self.cols {
                if !rng.gen_bool(0.3) {
                    continue;
                }
                for direction in Direction::ALL {
                    let edge = DirectedEdge::new(Cell::new(x, y), direction);
                    if !self.is_blocked(edge) {
                        self.traffic
                            .set(edge, rng.gen_range(MIN_EDGE_COST..=MAX_EDGE_COST));
                    }
                }
            }
        }

        self.enforce_invariants();
        self.touch();
        log::info!(
            "Generated random grid: {} stores, {} destinations, {} tunnels, {} roadblocks",
            self.stores.len(),
            self.destinations.len(),
            self.tunnels.len(),
            self.roadblocks.len()
        );
    }

    /// Structural snapshot for export.
    pub fn to_snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            rows: self.rows,
            cols: self.cols,
            stores: self.stores.clone(),
            destinations: self.destinations.clone(),
            tunnels: self.tunnels.clone(),
            roadblocks: self.roadblocks.clone(),
            traffic_costs: self.traffic.to_rows(),
        }
    }

    /// Builds a grid from an imported snapshot.
    ///
    /// A missing cost table means all default costs. The result has its
    /// invariants enforced before it is returned.
    pub fn from_snapshot(snapshot: &GridSnapshot) -> Result<Self> {
        let rows = clamp_dimension(snapshot.rows);
        let cols = clamp_dimension(snapshot.cols);
        let mut grid = GridModel::new(rows, cols);

        if !snapshot.traffic_costs.is_empty() {
            grid.traffic = TrafficCosts::from_rows(cols, rows, &snapshot.traffic_costs)
                .ok_or_else(|| {
                    GridError::ImportFormatError(format!(
                        "traffic cost table does not match a {}x{} grid",
                        cols, rows
                    ))
                })?;
        }

        for cell in &snapshot.stores {
            if !grid.stores.contains(cell) {
                grid.stores.push(*cell);
            }
        }
        for cell in &snapshot.destinations {
            if !grid.destinations.contains(cell) {
                grid.destinations.push(*cell);
            }
        }
        if grid.stores.len() > MAX_STORES {
            return Err(GridError::ImportFormatError(format!(
                "more than {} stores",
                MAX_STORES
            )));
        }
        if grid.destinations.len() > MAX_DESTINATIONS {
            return Err(GridError::ImportFormatError(format!(
                "more than {} destinations",
                MAX_DESTINATIONS
            )));
        }

        let outside = |cell: &Cell| !cell.in_bounds(cols, rows);
        let tunnel_cells = snapshot.tunnels.iter().flat_map(|t| [t.start, t.end]);
        let roadblock_owners = snapshot.roadblocks.iter().map(|edge| edge.canonical().from);
        if let Some(cell) = grid
            .stores
            .iter()
            .chain(&grid.destinations)
            .copied()
            .chain(tunnel_cells)
            .chain(roadblock_owners)
            .find(outside)
        {
            return Err(GridError::ImportFormatError(format!(
                "cell {} is outside the grid",
                cell
            )));
        }

        if let Some(cell) = grid
            .stores
            .iter()
            .find(|store| grid.destinations.contains(store))
        {
            return Err(GridError::ImportFormatError(format!(
                "cell {} is both a store and a destination",
                cell
            )));
        }

        if let Some(tunnel) = snapshot.tunnels.iter().find(|t| t.start == t.end) {
            return Err(GridError::ImportFormatError(format!(
                "tunnel at {} starts and ends in the same cell",
                tunnel.start
            )));
        }

        grid.tunnels = snapshot.tunnels.clone();
        grid.roadblocks = snapshot.roadblocks.clone();
        grid.enforce_invariants();
        Ok(grid)
    }

    /// Replaces this grid with an imported snapshot. On error the grid is
    /// left unchanged.
    pub fn import(&mut self, snapshot: &GridSnapshot) -> Result<()> {
        let mut imported = GridModel::from_snapshot(snapshot)?;
        imported.revision = self.revision;
        *self = imported;
        self.touch();
        log::info!(
            "Imported {}x{} grid with {} roadblocks",
            self.cols,
            self.rows,
            self.roadblocks.len()
        );
        Ok(())
    }

    /// Parses the textual `up,down,left,right` cost form.
    pub fn parse_cell_costs(text: &str) -> Result<[u8; 4]> {
        let parts: Vec<&str> = text.split(',').map(str::trim).collect();
        let invalid =
            || GridError::InvalidRange("Please enter exactly 4 numbers separated by commas".into());
        if parts.len() != 4 {
            return Err(invalid());
        }
        let mut costs = [0u8; 4];
        for (slot, part) in costs.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| invalid())?;
        }
        Ok(costs)
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn entity_count(&self) -> usize {
        self.stores.len() + self.destinations.len() + self.tunnels.len() + self.roadblocks.len()
    }

    fn check_in_bounds(&self, cell: Cell) -> Result<()> {
        if self.contains(cell) {
            Ok(())
        } else {
            Err(GridError::OutOfBounds { cell })
        }
    }

    /// Canonical form of `edge`, provided its wall belongs to this grid.
    fn owned_canonical(&self, edge: DirectedEdge) -> Result<DirectedEdge> {
        let canonical = edge.canonical();
        self.check_in_bounds(canonical.from)?;
        Ok(canonical)
    }
}

fn clamp_dimension(value: i32) -> i32 {
    value.clamp(MIN_GRID_DIMENSION, MAX_GRID_DIMENSION)
}

fn check_cost(cost: u8) -> Result<()> {
    if (MIN_EDGE_COST..=MAX_EDGE_COST).contains(&cost) {
        Ok(())
    } else {
        Err(GridError::InvalidRange(format!(
            "Please enter a number between {} and {}",
            MIN_EDGE_COST, MAX_EDGE_COST
        )))
    }
}

fn take_cells(free: &mut Vec<Cell>, count: usize) -> Vec<Cell> {
    let count = count.min(free.len());
    free.split_off(free.len() - count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn edge(x: i32, y: i32, direction: Direction) -> DirectedEdge {
        DirectedEdge::new(Cell::new(x, y), direction)
    }

    /// Every roadblock costs 0 and every 0-cost wall is roadblocked.
    fn assert_coupled(grid: &GridModel) {
        for blocked in grid.roadblocks() {
            assert!(blocked.is_canonical());
            assert_eq!(grid.cost(*blocked), 0, "roadblock {blocked} not at cost 0");
        }
        for wall in grid.traffic().canonical_edges() {
            let cost = grid.cost(wall);
            if cost == 0 {
                assert!(grid.is_blocked(wall), "orphaned zero at {wall}");
            } else {
                assert!((1..=4).contains(&cost), "cost {cost} at {wall}");
            }
        }
    }

    #[test]
    fn test_new_grid_defaults() {
        let grid = GridModel::default();
        assert_eq!((grid.rows(), grid.cols()), (10, 10));
        assert_eq!(grid.cell_size(), 50.0);
        assert_eq!(grid.content_size(), (500.0, 500.0));
        assert_eq!(grid.revision(), 0);
        assert_coupled(&grid);
    }

    #[test]
    fn test_store_capacity() {
        let mut grid = GridModel::default();
        for x in 0..3 {
            grid.add_store(Cell::new(x, 0)).unwrap();
        }
        let err = grid.add_store(Cell::new(5, 5)).unwrap_err();
        assert!(matches!(err, GridError::CapacityExceeded { limit: 3, .. }));
        assert_eq!(grid.stores().len(), 3);

        // Re-adding an existing store is still fine at capacity.
        let revision = grid.revision();
        assert!(grid.add_store(Cell::new(1, 0)).is_ok());
        assert_eq!(grid.stores().len(), 3);
        assert_eq!(grid.revision(), revision);
    }

    #[test]
    fn test_destination_capacity() {
        let mut grid = GridModel::default();
        for x in 0..10 {
            grid.add_destination(Cell::new(x, 1)).unwrap();
        }
        let err = grid.add_destination(Cell::new(0, 2)).unwrap_err();
        assert!(matches!(err, GridError::CapacityExceeded { limit: 10, .. }));
        assert_eq!(grid.destinations().len(), 10);
    }

    #[test]
    fn test_store_and_destination_are_exclusive() {
        let mut grid = GridModel::default();
        grid.add_store(Cell::new(2, 2)).unwrap();
        assert_eq!(
            grid.add_destination(Cell::new(2, 2)),
            Err(GridError::CellOccupied {
                cell: Cell::new(2, 2)
            })
        );
        grid.add_destination(Cell::new(3, 3)).unwrap();
        assert!(grid.add_store(Cell::new(3, 3)).is_err());
    }

    #[test]
    fn test_out_of_bounds_placement() {
        let mut grid = GridModel::new(5, 5);
        assert!(matches!(
            grid.add_store(Cell::new(5, 0)),
            Err(GridError::OutOfBounds { .. })
        ));
        assert!(grid.stores().is_empty());
    }

    #[test]
    fn test_tunnels() {
        let mut grid = GridModel::default();
        assert_eq!(grid.add_tunnel(Cell::new(1, 1), Cell::new(1, 1), 5), Ok(false));
        assert!(grid.tunnels().is_empty());

        assert_eq!(grid.add_tunnel(Cell::new(1, 1), Cell::new(7, 7), 5), Ok(true));
        assert_eq!(grid.add_tunnel(Cell::new(1, 1), Cell::new(7, 7), 3), Ok(true));
        assert_eq!(grid.tunnels().len(), 2);
    }

    #[test]
    fn test_edge_cost_range() {
        let mut grid = GridModel::default();
        let wall = edge(2, 2, Direction::Right);
        assert!(matches!(
            grid.set_edge_cost(wall, 0),
            Err(GridError::InvalidRange(_))
        ));
        assert!(matches!(
            grid.set_edge_cost(wall, 5),
            Err(GridError::InvalidRange(_))
        ));
        grid.set_edge_cost(wall, 4).unwrap();
        assert_eq!(grid.cost(wall), 4);
    }

    #[test]
    fn test_cost_is_shared_by_mirror_pair() {
        let mut grid = GridModel::default();
        grid.set_edge_cost(edge(4, 3, Direction::Left), 3).unwrap();
        assert_eq!(grid.cost(edge(3, 3, Direction::Right)), 3);
        assert_eq!(grid.cost(edge(4, 3, Direction::Left)), 3);

        grid.set_edge_cost(edge(3, 3, Direction::Right), 2).unwrap();
        assert_eq!(grid.cost(edge(4, 3, Direction::Left)), 2);
    }

    #[test]
    fn test_blocked_edit_is_rejected() {
        let mut grid = GridModel::default();
        let wall = edge(2, 4, Direction::Right);
        assert_eq!(grid.toggle_roadblock(wall), Ok(true));
        assert_eq!(grid.cost(wall), 0);

        assert_eq!(grid.set_edge_cost(wall, 3), Err(GridError::EdgeBlocked(wall)));
        assert_eq!(grid.cost(wall), 0);

        // The mirror form names the same wall.
        assert!(grid.set_edge_cost(edge(3, 4, Direction::Left), 3).is_err());
    }

    #[test]
    fn test_roadblock_add_is_idempotent_and_removable() {
        let mut grid = GridModel::default();
        let wall = edge(5, 5, Direction::Up);
        assert_eq!(grid.toggle_roadblock(wall), Ok(true));
        assert_eq!(grid.toggle_roadblock(wall.mirror()), Ok(false));
        assert_eq!(grid.roadblocks(), &[edge(5, 4, Direction::Down)]);

        assert_eq!(grid.remove_roadblock(wall), Ok(true));
        assert_eq!(grid.cost(wall), 1);
        assert_eq!(grid.remove_roadblock(wall), Ok(false));

        grid.set_edge_cost(wall, 3).unwrap();
        assert_eq!(grid.cost(wall), 3);
        assert_coupled(&grid);
    }

    #[test]
    fn test_boundary_roadblock() {
        let mut grid = GridModel::new(4, 4);
        let wall = edge(0, 2, Direction::Left);
        grid.toggle_roadblock(wall).unwrap();
        assert!(grid.is_blocked(wall));
        assert_coupled(&grid);

        assert!(grid.toggle_roadblock(edge(-1, 2, Direction::Right)).is_err());
    }

    #[test]
    fn test_set_cell_costs() {
        let mut grid = GridModel::default();
        let cell = Cell::new(3, 3);
        grid.set_cell_costs(cell, [2, 3, 4, 1]).unwrap();
        assert_eq!(grid.cost(edge(3, 3, Direction::Up)), 2);
        assert_eq!(grid.cost(edge(3, 4, Direction::Up)), 3);
        assert_eq!(grid.cost(edge(2, 3, Direction::Right)), 4);

        grid.toggle_roadblock(edge(3, 3, Direction::Right)).unwrap();
        assert!(matches!(
            grid.set_cell_costs(cell, [1, 1, 1, 2]),
            Err(GridError::EdgeBlocked(_))
        ));
        assert!(matches!(
            grid.set_cell_costs(cell, [0, 1, 1, 0]),
            Err(GridError::InvalidRange(_))
        ));
        // Nothing was written by the rejected calls.
        assert_eq!(grid.cost(edge(3, 3, Direction::Up)), 2);

        grid.set_cell_costs(cell, [4, 4, 4, 0]).unwrap();
        assert_eq!(grid.cost(edge(3, 3, Direction::Up)), 4);
        assert_coupled(&grid);
    }

    #[test]
    fn test_parse_cell_costs() {
        assert_eq!(GridModel::parse_cell_costs("1, 2,3 ,4"), Ok([1, 2, 3, 4]));
        assert!(GridModel::parse_cell_costs("1,2,3").is_err());
        assert!(GridModel::parse_cell_costs("1,2,3,4,5").is_err());
        assert!(GridModel::parse_cell_costs("1,x,3,4").is_err());
        assert!(GridModel::parse_cell_costs("1,-2,3,4").is_err());
    }

    #[test]
    fn test_delete_at_frees_roadblocks() {
        let mut grid = GridModel::default();
        let cell = Cell::new(4, 4);
        grid.add_store(cell).unwrap();
        grid.add_tunnel(Cell::new(0, 0), cell, 5).unwrap();
        grid.toggle_roadblock(edge(4, 4, Direction::Down)).unwrap();
        grid.toggle_roadblock(edge(3, 4, Direction::Right)).unwrap();
        grid.toggle_roadblock(edge(8, 8, Direction::Right)).unwrap();

        assert!(grid.delete_at(cell));
        assert!(grid.stores().is_empty());
        assert!(grid.tunnels().is_empty());
        assert_eq!(grid.roadblocks(), &[edge(8, 8, Direction::Right)]);
        assert_eq!(grid.cost(edge(4, 4, Direction::Down)), 1);
        assert_eq!(grid.cost(edge(4, 4, Direction::Left)), 1);
        assert_coupled(&grid);

        let revision = grid.revision();
        assert!(!grid.delete_at(cell));
        assert_eq!(grid.revision(), revision);
    }

    #[test]
    fn test_resize_prunes_and_keeps_coupling() {
        let mut grid = GridModel::default();
        grid.add_store(Cell::new(7, 1)).unwrap();
        grid.add_store(Cell::new(2, 1)).unwrap();
        grid.add_destination(Cell::new(5, 5)).unwrap();
        grid.add_destination(Cell::new(4, 9)).unwrap();
        grid.add_tunnel(Cell::new(0, 0), Cell::new(6, 0), 5).unwrap();
        grid.toggle_roadblock(edge(4, 2, Direction::Right)).unwrap();
        grid.toggle_roadblock(edge(6, 2, Direction::Down)).unwrap();
        grid.set_edge_cost(edge(1, 1, Direction::Down), 4).unwrap();

        grid.resize(10, 5);
        assert_eq!(grid.cols(), 5);
        assert_eq!(grid.stores(), &[Cell::new(2, 1)]);
        assert_eq!(grid.destinations(), &[Cell::new(4, 9)]);
        assert!(grid.tunnels().is_empty());
        assert_eq!(grid.roadblocks(), &[edge(4, 2, Direction::Right)]);
        assert_eq!(grid.cost(edge(1, 1, Direction::Down)), 1);
        assert_coupled(&grid);
    }

    #[test]
    fn test_resize_clamps() {
        let mut grid = GridModel::default();
        grid.resize(1, 99);
        assert_eq!((grid.rows(), grid.cols()), (3, 20));
    }

    #[test]
    fn test_enforce_invariants_repairs_and_is_idempotent() {
        let mut rows = vec![vec![[1u8; 4]; 4]; 4];
        // Orphaned zero on (0,0) down, out-of-range cost on (2,2) right.
        rows[0][0][Direction::Down.index()] = 0;
        rows[2][2][Direction::Right.index()] = 9;
        let snapshot = GridSnapshot {
            rows: 4,
            cols: 4,
            stores: vec![],
            destinations: vec![],
            tunnels: vec![],
            roadblocks: vec![
                edge(2, 1, Direction::Left),
                edge(1, 1, Direction::Right),
                edge(3, 3, Direction::Up),
            ],
            traffic_costs: rows,
        };
        let mut grid = GridModel::from_snapshot(&snapshot).unwrap();

        assert_eq!(
            grid.roadblocks(),
            &[edge(1, 1, Direction::Right), edge(3, 2, Direction::Down)]
        );
        assert_eq!(grid.cost(edge(0, 0, Direction::Down)), 1);
        assert_eq!(grid.cost(edge(2, 2, Direction::Right)), 4);
        assert_coupled(&grid);

        let before = grid.clone();
        assert!(grid.enforce_invariants().is_clean());
        assert_eq!(grid, before);
    }

    #[test]
    fn test_snapshot_export_import() {
        let mut grid = GridModel::new(6, 8);
        grid.add_store(Cell::new(0, 0)).unwrap();
        grid.add_destination(Cell::new(7, 5)).unwrap();
        grid.add_tunnel(Cell::new(1, 1), Cell::new(6, 4), 3).unwrap();
        grid.toggle_roadblock(edge(3, 3, Direction::Down)).unwrap();
        grid.set_edge_cost(edge(2, 2, Direction::Right), 4).unwrap();

        let json = grid.to_snapshot().to_json().unwrap();
        let imported = GridModel::from_snapshot(&GridSnapshot::from_json(&json).unwrap()).unwrap();
        assert_eq!(imported.to_snapshot(), grid.to_snapshot());
    }

    #[test]
    fn test_import_without_costs_uses_defaults() {
        let snapshot = GridSnapshot::from_json(
            r#"{"rows": 5, "cols": 5, "roadblocks": [{"from": {"x": 1, "y": 1}, "direction": "down"}]}"#,
        )
        .unwrap();
        let grid = GridModel::from_snapshot(&snapshot).unwrap();
        assert_eq!(grid.cost(edge(1, 1, Direction::Down)), 0);
        assert_eq!(grid.cost(edge(2, 2, Direction::Down)), 1);
        assert_coupled(&grid);
    }

    #[test]
    fn test_import_accepts_mirror_form_roadblock_on_far_edge() {
        let snapshot = GridSnapshot::from_json(
            r#"{"rows": 4, "cols": 4, "roadblocks": [{"from": {"x": 4, "y": 1}, "direction": "left"}]}"#,
        )
        .unwrap();
        let grid = GridModel::from_snapshot(&snapshot).unwrap();
        assert_eq!(grid.roadblocks(), &[edge(3, 1, Direction::Right)]);
        assert_eq!(grid.cost(edge(3, 1, Direction::Right)), 0);
    }

    #[test]
    fn test_import_counts_distinct_stores_against_limit() {
        let mut snapshot = GridSnapshot::from_json(r#"{"rows": 5, "cols": 5}"#).unwrap();
        snapshot.stores = vec![
            Cell::new(0, 0),
            Cell::new(1, 0),
            Cell::new(0, 0),
            Cell::new(2, 0),
        ];
        let grid = GridModel::from_snapshot(&snapshot).unwrap();
        assert_eq!(
            grid.stores(),
            &[Cell::new(0, 0), Cell::new(1, 0), Cell::new(2, 0)]
        );

        snapshot.stores.push(Cell::new(3, 0));
        assert!(matches!(
            GridModel::from_snapshot(&snapshot),
            Err(GridError::ImportFormatError(_))
        ));
    }

    #[test]
    fn test_import_rejects_bad_snapshots() {
        let mut grid = GridModel::default();
        grid.add_store(Cell::new(1, 1)).unwrap();
        let before = grid.clone();

        let mut snapshot = GridSnapshot::from_json(r#"{"rows": 4, "cols": 4}"#).unwrap();
        snapshot.stores = vec![Cell::new(4, 0)];
        assert!(matches!(
            grid.import(&snapshot),
            Err(GridError::ImportFormatError(_))
        ));

        snapshot.stores = vec![Cell::new(1, 1)];
        snapshot.destinations = vec![Cell::new(1, 1)];
        assert!(grid.import(&snapshot).is_err());

        snapshot.destinations = vec![];
        snapshot.traffic_costs = vec![vec![[1; 4]; 3]; 4];
        assert!(grid.import(&snapshot).is_err());

        snapshot.traffic_costs.clear();
        snapshot.tunnels = vec![Tunnel::new(Cell::new(2, 2), Cell::new(2, 2), 3)];
        assert!(matches!(
            grid.import(&snapshot),
            Err(GridError::ImportFormatError(_))
        ));
        snapshot.tunnels.clear();

        assert_eq!(grid, before);

        snapshot.traffic_costs.clear();
        grid.import(&snapshot).unwrap();
        assert_eq!(grid.rows(), 4);
        assert!(grid.revision() > before.revision());
    }

    #[test]
    fn test_generate_random_satisfies_limits_and_invariants() {
        for seed in 0..25 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut grid = GridModel::default();
            grid.generate_random(&mut rng);

            assert!((1..=3).contains(&grid.stores().len()));
            assert!((3..=10).contains(&grid.destinations().len()));
            assert!(grid.tunnels().len() <= 2);
            assert!(!grid.roadblocks().is_empty());
            for tunnel in grid.tunnels() {
                assert!((1..=10).contains(&tunnel.cost));
            }

            let mut occupied: Vec<Cell> = grid
                .stores()
                .iter()
                .chain(grid.destinations())
                .copied()
                .chain(grid.tunnels().iter().flat_map(|t| [t.start, t.end]))
                .collect();
            let count = occupied.len();
            occupied.sort();
            occupied.dedup();
            assert_eq!(occupied.len(), count, "entities overlap for seed {seed}");

            assert_coupled(&grid);
        }
    }

    #[test]
    fn test_generate_random_on_smallest_grid() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut grid = GridModel::new(3, 3);
        grid.generate_random(&mut rng);
        assert!(!grid.stores().is_empty());
        assert!(grid.stores().len() + grid.destinations().len() <= 9);
        assert_coupled(&grid);
    }

    #[test]
    fn test_reset_keeps_dimensions() {
        let mut grid = GridModel::new(5, 7);
        grid.add_store(Cell::new(1, 1)).unwrap();
        grid.toggle_roadblock(edge(1, 1, Direction::Down)).unwrap();
        grid.reset();
        assert_eq!((grid.rows(), grid.cols()), (5, 7));
        assert!(grid.stores().is_empty());
        assert!(grid.roadblocks().is_empty());
        assert_eq!(grid.cost(edge(1, 1, Direction::Down)), 1);
    }
}
