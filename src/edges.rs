//! Hit testing of world coordinates against grid cells and walls.
//!
//! Wall hits are always returned in canonical form, so clicking either side of
//! a physical wall yields the same [`DirectedEdge`].

use crate::constants::EDGE_THRESHOLD_RATIO;
use crate::types::{Cell, DirectedEdge, Direction};
use egui::Pos2;

/// Returns the cell containing `world`, or `None` outside the grid.
pub fn resolve_cell(world: Pos2, cell_size: f32, cols: i32, rows: i32) -> Option<Cell> {
    let cell = Cell::new(
        (world.x / cell_size).floor() as i32,
        (world.y / cell_size).floor() as i32,
    );
    cell.in_bounds(cols, rows).then_some(cell)
}

/// Returns the wall the user most likely meant when clicking at `world`.
///
/// Clicks within `0.3 * cell_size` of a grid line pick the wall on that line,
/// vertical lines winning ties. Clicks deeper inside a cell pick the nearest
/// of the cell's four sides. Returns `None` when the wall has no cell inside
/// the grid on either side.
pub fn resolve_edge(world: Pos2, cell_size: f32, cols: i32, rows: i32) -> Option<DirectedEdge> {
    let v_line = (world.x / cell_size).round();
    let dist_v = (world.x - v_line * cell_size).abs();
    let h_line = (world.y / cell_size).round();
    let dist_h = (world.y - h_line * cell_size).abs();
    let threshold = EDGE_THRESHOLD_RATIO * cell_size;

    if dist_v < threshold && dist_v <= dist_h {
        let row = (world.y / cell_size).floor() as i32;
        return wall_on_line(Cell::new(v_line as i32 - 1, row), Direction::Right, cols, rows);
    }
    if dist_h < threshold {
        let col = (world.x / cell_size).floor() as i32;
        return wall_on_line(Cell::new(col, h_line as i32 - 1), Direction::Down, cols, rows);
    }

    let cell = resolve_cell(world, cell_size, cols, rows)?;
    let u = (world.x - cell.x as f32 * cell_size) / cell_size;
    let v = (world.y - cell.y as f32 * cell_size) / cell_size;

    // Ties resolve in left, right, up, down order.
    let candidates = [
        (u, Direction::Left),
        (1.0 - u, Direction::Right),
        (v, Direction::Up),
        (1.0 - v, Direction::Down),
    ];
    let mut nearest = candidates[0];
    for candidate in &candidates[1..] {
        if candidate.0 < nearest.0 {
            nearest = *candidate;
        }
    }
    Some(DirectedEdge::new(cell, nearest.1).canonical())
}

/// Canonical wall on a grid line, given the cell before the line and the
/// direction (`Right` or `Down`) that crosses it.
fn wall_on_line(before: Cell, forward: Direction, cols: i32, rows: i32) -> Option<DirectedEdge> {
    if before.in_bounds(cols, rows) {
        return Some(DirectedEdge::new(before, forward));
    }
    let after = before.step(forward);
    after
        .in_bounds(cols, rows)
        .then(|| DirectedEdge::new(after, forward.opposite()))
}
