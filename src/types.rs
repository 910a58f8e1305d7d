//! Core data types for the delivery grid.
//!
//! This module defines cells, directions, walls (directed edges between cells),
//! tunnels, planned routes, and the structural snapshot used for import and export.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One grid square, addressed by integer column `x` and row `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    /// Column index
    pub x: i32,
    /// Row index
    pub y: i32,
}

impl Cell {
    /// Creates a cell at column `x`, row `y`.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns true if the cell lies inside a `cols` x `rows` grid.
    pub fn in_bounds(&self, cols: i32, rows: i32) -> bool {
        self.x >= 0 && self.x < cols && self.y >= 0 && self.y < rows
    }

    /// Returns the adjacent cell in `direction`. The result may be outside the grid.
    pub fn step(&self, direction: Direction) -> Cell {
        let (dx, dy) = direction.offset();
        Cell::new(self.x + dx, self.y + dy)
    }

    /// Row-major index into a grid with `cols` columns.
    pub(crate) fn index(&self, cols: i32) -> usize {
        (self.y * cols + self.x) as usize
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// One of the four axis directions a vehicle can leave a cell in.
///
/// The declaration order matches the traffic tuple layout `[up, down, left, right]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Towards row `y - 1`
    Up,
    /// Towards row `y + 1`
    Down,
    /// Towards column `x - 1`
    Left,
    /// Towards column `x + 1`
    Right,
}

impl Direction {
    /// All directions in traffic tuple order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Slot of this direction inside a traffic tuple.
    pub fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    /// Cell offset `(dx, dy)` of one step in this direction.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// The direction pointing back across the same wall.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Lowercase name used in plans and on the wire.
    pub fn name(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    /// Direction of a single orthogonal step from `from` to `to`, if there is one.
    pub fn between(from: Cell, to: Cell) -> Option<Direction> {
        match (to.x - from.x, to.y - from.y) {
            (0, -1) => Some(Direction::Up),
            (0, 1) => Some(Direction::Down),
            (-1, 0) => Some(Direction::Left),
            (1, 0) => Some(Direction::Right),
            _ => None,
        }
    }
}

/// A wall: the side of `from` facing `direction`.
///
/// Two adjacent cells describe the same wall from both sides, e.g. `(x,y) right`
/// and `(x+1,y) left`. [`DirectedEdge::canonical`] picks the single authoritative
/// form: the lower-indexed cell using `right` or `down`. `left` on column 0 and
/// `up` on row 0 have no mirror and are canonical as they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DirectedEdge {
    /// Cell the wall is described from
    pub from: Cell,
    /// Side of `from` the wall is on
    pub direction: Direction,
}

impl DirectedEdge {
    /// Creates an edge on the `direction` side of `from`.
    pub const fn new(from: Cell, direction: Direction) -> Self {
        Self { from, direction }
    }

    /// Returns the canonical representation of the same physical wall.
    pub fn canonical(self) -> DirectedEdge {
        match self.direction {
            Direction::Left if self.from.x > 0 => {
                DirectedEdge::new(self.from.step(Direction::Left), Direction::Right)
            }
            Direction::Up if self.from.y > 0 => {
                DirectedEdge::new(self.from.step(Direction::Up), Direction::Down)
            }
            _ => self,
        }
    }

    /// Returns true if this is already the canonical form.
    pub fn is_canonical(self) -> bool {
        self.canonical() == self
    }

    /// The same wall seen from the neighbouring cell. May lie outside the grid.
    pub fn mirror(self) -> DirectedEdge {
        DirectedEdge::new(self.from.step(self.direction), self.direction.opposite())
    }

    /// The two cells on either side of the wall, `from` first.
    pub fn cells(self) -> (Cell, Cell) {
        (self.from, self.from.step(self.direction))
    }

    /// Returns true if `cell` is on either side of this wall.
    pub fn touches(self, cell: Cell) -> bool {
        let (a, b) = self.cells();
        a == cell || b == cell
    }
}

impl fmt::Display for DirectedEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.from, self.direction.name())
    }
}

/// A shortcut between two non-adjacent cells with its own traversal cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tunnel {
    /// First endpoint
    pub start: Cell,
    /// Second endpoint
    pub end: Cell,
    /// Cost of travelling through the tunnel
    #[serde(default = "default_tunnel_cost")]
    pub cost: u32,
}

fn default_tunnel_cost() -> u32 {
    crate::constants::DEFAULT_TUNNEL_COST
}

impl Tunnel {
    /// Creates a tunnel between `start` and `end`.
    pub fn new(start: Cell, end: Cell, cost: u32) -> Self {
        Self { start, end, cost }
    }

    /// Returns true if either endpoint is `cell`.
    pub fn touches(&self, cell: Cell) -> bool {
        self.start == cell || self.end == cell
    }
}

/// A path from a store to a destination, produced by the planning service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Origin store
    pub store: Cell,
    /// Delivery target
    pub destination: Cell,
    /// Visited cells in order, starting at the store
    #[serde(default)]
    pub path: Vec<Cell>,
    /// Total cost reported by the planner
    pub cost: u32,
    /// Search nodes expanded, when the planner reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded: Option<u64>,
}

impl Route {
    /// Comma-separated direction plan, e.g. `right,right,down`.
    ///
    /// Tunnel jumps between non-adjacent cells produce no entry.
    pub fn plan(&self) -> String {
        self.path
            .windows(2)
            .filter_map(|pair| Direction::between(pair[0], pair[1]))
            .map(Direction::name)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Structural snapshot of a grid, as written to and read from JSON files.
///
/// Missing fields fall back to defaults so hand-written files stay loadable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSnapshot {
    /// Number of rows
    #[serde(default = "default_dimension")]
    pub rows: i32,
    /// Number of columns
    #[serde(default = "default_dimension")]
    pub cols: i32,
    /// Store cells
    #[serde(default)]
    pub stores: Vec<Cell>,
    /// Destination cells
    #[serde(default)]
    pub destinations: Vec<Cell>,
    /// Tunnels
    #[serde(default)]
    pub tunnels: Vec<Tunnel>,
    /// Roadblocked walls
    #[serde(default)]
    pub roadblocks: Vec<DirectedEdge>,
    /// Traffic costs indexed `[y][x][direction]`; empty means all default
    #[serde(default)]
    pub traffic_costs: Vec<Vec<[u8; 4]>>,
}

fn default_dimension() -> i32 {
    crate::constants::DEFAULT_GRID_DIMENSION
}

impl GridSnapshot {
    /// Serialize the snapshot to a pretty JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a snapshot from a JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
