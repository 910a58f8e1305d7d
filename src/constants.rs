//! Shared application-wide constants.
//! Centralizes the grid limits, playback timings, and interaction thresholds.

// Grid dimensions
/// Smallest allowed number of rows or columns.
pub const MIN_GRID_DIMENSION: i32 = 3;
/// Largest allowed number of rows or columns.
pub const MAX_GRID_DIMENSION: i32 = 20;
/// Rows and columns of a freshly created grid.
pub const DEFAULT_GRID_DIMENSION: i32 = 10;
/// Side length of one cell in world units (grid pixels).
pub const CELL_SIZE: f32 = 50.0;

// Entity limits
/// Maximum number of stores on a grid.
pub const MAX_STORES: usize = 3;
/// Maximum number of destinations on a grid.
pub const MAX_DESTINATIONS: usize = 10;

// Traffic costs
/// Cost of an edge nobody has edited.
pub const DEFAULT_EDGE_COST: u8 = 1;
/// Cost stored for a roadblocked (impassable) edge.
pub const BLOCKED_EDGE_COST: u8 = 0;
/// Smallest cost a user may assign to an edge.
pub const MIN_EDGE_COST: u8 = 1;
/// Largest cost a user may assign to an edge.
pub const MAX_EDGE_COST: u8 = 4;
/// Traversal cost of a tunnel painted by hand.
pub const DEFAULT_TUNNEL_COST: u32 = 5;
/// Upper bound (inclusive) for generated tunnel costs.
pub const MAX_RANDOM_TUNNEL_COST: u32 = 10;

// Canvas interactions
/// Fraction of the cell size within which a click snaps to a grid line.
pub const EDGE_THRESHOLD_RATIO: f32 = 0.3;
/// Lower zoom bound.
pub const MIN_ZOOM: f32 = 0.5;
/// Upper zoom bound.
pub const MAX_ZOOM: f32 = 3.0;
/// Scale multiplier applied per zoom-in notch.
pub const ZOOM_IN_FACTOR: f32 = 1.05;
/// Scale multiplier applied per zoom-out notch.
pub const ZOOM_OUT_FACTOR: f32 = 0.95;

// Playback
/// Delay between two marker steps.
pub const DEFAULT_CADENCE_MS: u64 = 200;
/// Pause inserted between consecutive routes when playing all of them.
pub const ROUTE_PAUSE_MS: u64 = 500;
/// Slowest cadence selectable from the UI.
pub const MAX_CADENCE_MS: u64 = 2000;
/// Fastest cadence selectable from the UI.
pub const MIN_CADENCE_MS: u64 = 20;
