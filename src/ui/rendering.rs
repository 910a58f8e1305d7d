//! Canvas rendering for the grid, its entities and route playback.
//!
//! Drawing only reads the session; nothing here mutates the grid or the
//! sequencer.

use super::state::GridApp;
use crate::constants::DEFAULT_EDGE_COST;
use crate::types::{Cell, DirectedEdge, Direction};
use eframe::egui;
use eframe::epaint::StrokeKind;

const STORE_COLOR: egui::Color32 = egui::Color32::from_rgb(66, 133, 244);
const DESTINATION_COLOR: egui::Color32 = egui::Color32::from_rgb(52, 168, 83);
const ROADBLOCK_COLOR: egui::Color32 = egui::Color32::from_rgb(219, 68, 55);
const TUNNEL_COLOR: egui::Color32 = egui::Color32::from_rgb(156, 39, 176);
const ROUTE_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 193, 7);
const MARKER_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 112, 67);

/// World-space endpoints of the wall described by `edge`.
pub(crate) fn wall_segment(edge: DirectedEdge, cell_size: f32) -> [egui::Pos2; 2] {
    let x0 = edge.from.x as f32 * cell_size;
    let y0 = edge.from.y as f32 * cell_size;
    let (x1, y1) = (x0 + cell_size, y0 + cell_size);
    match edge.direction {
        Direction::Up => [egui::pos2(x0, y0), egui::pos2(x1, y0)],
        Direction::Down => [egui::pos2(x0, y1), egui::pos2(x1, y1)],
        Direction::Left => [egui::pos2(x0, y0), egui::pos2(x0, y1)],
        Direction::Right => [egui::pos2(x1, y0), egui::pos2(x1, y1)],
    }
}

/// World-space center of `cell`.
pub(crate) fn cell_center(cell: Cell, cell_size: f32) -> egui::Pos2 {
    egui::pos2(
        (cell.x as f32 + 0.5) * cell_size,
        (cell.y as f32 + 0.5) * cell_size,
    )
}

impl GridApp {
    /// Renders every grid layer onto the canvas.
    ///
    /// Layers are drawn back to front: cells and grid lines, cost labels,
    /// tunnels, roadblocks, stores and destinations, the playing route and
    /// finally the marker. Does nothing while the grid is hidden.
    pub fn render_grid_elements(&self, painter: &egui::Painter) {
        if !self.canvas.show_grid {
            return;
        }
        self.draw_cells(painter);
        if self.settings.show_costs {
            self.draw_costs(painter);
        }
        self.draw_tunnels(painter);
        self.draw_roadblocks(painter);
        self.draw_entities(painter);
        self.draw_active_route(painter);
        self.draw_marker(painter);
    }

    fn scale(&self) -> f32 {
        self.canvas.viewport.scale()
    }

    fn draw_cells(&self, painter: &egui::Painter) {
        let grid = self.session.grid();
        let size = grid.cell_size();
        let (width, height) = grid.content_size();
        let rect = egui::Rect::from_min_max(
            self.world_to_screen(egui::Pos2::ZERO),
            self.world_to_screen(egui::pos2(width, height)),
        );

        let (fill, line) = if self.dark_mode {
            (egui::Color32::from_gray(32), egui::Color32::from_gray(80))
        } else {
            (egui::Color32::from_gray(245), egui::Color32::from_gray(190))
        };
        painter.rect_filled(rect, 0.0, fill);

        let stroke = egui::Stroke::new(1.0, line);
        for x in 0..=grid.cols() {
            let wx = x as f32 * size;
            painter.line_segment(
                [
                    self.world_to_screen(egui::pos2(wx, 0.0)),
                    self.world_to_screen(egui::pos2(wx, height)),
                ],
                stroke,
            );
        }
        for y in 0..=grid.rows() {
            let wy = y as f32 * size;
            painter.line_segment(
                [
                    self.world_to_screen(egui::pos2(0.0, wy)),
                    self.world_to_screen(egui::pos2(width, wy)),
                ],
                stroke,
            );
        }

        if let Some(start) = self.interaction.tunnel_start {
            let min = self.world_to_screen(egui::pos2(start.x as f32 * size, start.y as f32 * size));
            let max = self.world_to_screen(egui::pos2(
                (start.x + 1) as f32 * size,
                (start.y + 1) as f32 * size,
            ));
            painter.rect_stroke(
                egui::Rect::from_min_max(min, max),
                2.0,
                egui::Stroke::new(2.0, TUNNEL_COLOR),
                StrokeKind::Inside,
            );
        }
    }

    /// Labels walls whose cost differs from the default.
    fn draw_costs(&self, painter: &egui::Painter) {
        let grid = self.session.grid();
        let size = grid.cell_size();
        let font = egui::FontId::proportional((10.0 * self.scale()).clamp(7.0, 18.0));
        let color = if self.dark_mode {
            egui::Color32::from_gray(200)
        } else {
            egui::Color32::from_gray(60)
        };
        for edge in grid.traffic().canonical_edges() {
            let cost = grid.cost(edge);
            if cost == DEFAULT_EDGE_COST || grid.is_blocked(edge) {
                continue;
            }
            let [a, b] = wall_segment(edge, size);
            painter.text(
                self.world_to_screen(a.lerp(b, 0.5)),
                egui::Align2::CENTER_CENTER,
                cost.to_string(),
                font.clone(),
                color,
            );
        }
    }

    fn draw_tunnels(&self, painter: &egui::Painter) {
        let size = self.session.grid().cell_size();
        let stroke = egui::Stroke::new(2.0 * self.scale(), TUNNEL_COLOR);
        let font = egui::FontId::proportional((11.0 * self.scale()).clamp(8.0, 20.0));
        for tunnel in self.session.grid().tunnels() {
            let a = self.world_to_screen(cell_center(tunnel.start, size));
            let b = self.world_to_screen(cell_center(tunnel.end, size));
            painter.extend(egui::Shape::dashed_line(
                &[a, b],
                stroke,
                6.0 * self.scale(),
                4.0 * self.scale(),
            ));
            for end in [a, b] {
                painter.circle_filled(end, 4.0 * self.scale(), TUNNEL_COLOR);
            }
            painter.text(
                a.lerp(b, 0.5),
                egui::Align2::CENTER_BOTTOM,
                tunnel.cost.to_string(),
                font.clone(),
                TUNNEL_COLOR,
            );
        }
    }

    fn draw_roadblocks(&self, painter: &egui::Painter) {
        let size = self.session.grid().cell_size();
        let stroke = egui::Stroke::new(4.0 * self.scale(), ROADBLOCK_COLOR);
        for edge in self.session.grid().roadblocks() {
            let [a, b] = wall_segment(*edge, size);
            painter.line_segment([self.world_to_screen(a), self.world_to_screen(b)], stroke);
        }
    }

    fn draw_entities(&self, painter: &egui::Painter) {
        let size = self.session.grid().cell_size();
        let half = size * 0.35 * self.scale();
        let font = egui::FontId::proportional((16.0 * self.scale()).clamp(8.0, 32.0));

        for store in self.session.grid().stores() {
            let center = self.world_to_screen(cell_center(*store, size));
            painter.rect_filled(
                egui::Rect::from_center_size(center, egui::vec2(half * 2.0, half * 2.0)),
                3.0,
                STORE_COLOR,
            );
            painter.text(
                center,
                egui::Align2::CENTER_CENTER,
                "S",
                font.clone(),
                egui::Color32::WHITE,
            );
        }
        for destination in self.session.grid().destinations() {
            let center = self.world_to_screen(cell_center(*destination, size));
            painter.circle_filled(center, half, DESTINATION_COLOR);
            painter.text(
                center,
                egui::Align2::CENTER_CENTER,
                "D",
                font.clone(),
                egui::Color32::WHITE,
            );
        }
    }

    /// Only the route currently being played is drawn.
    fn draw_active_route(&self, painter: &egui::Painter) {
        let Some(route) = self.session.playing_route() else {
            return;
        };
        let size = self.session.grid().cell_size();
        let stroke = egui::Stroke::new(3.0 * self.scale(), ROUTE_COLOR);
        for pair in route.path.windows(2) {
            let a = self.world_to_screen(cell_center(pair[0], size));
            let b = self.world_to_screen(cell_center(pair[1], size));
            if Direction::between(pair[0], pair[1]).is_some() {
                painter.line_segment([a, b], stroke);
            } else {
                // Tunnel hop
                painter.extend(egui::Shape::dashed_line(
                    &[a, b],
                    stroke,
                    5.0 * self.scale(),
                    5.0 * self.scale(),
                ));
            }
        }
    }

    fn draw_marker(&self, painter: &egui::Painter) {
        let Some(cell) = self.session.marker() else {
            return;
        };
        let size = self.session.grid().cell_size();
        let center = self.world_to_screen(cell_center(cell, size));
        let radius = size * 0.25 * self.scale();
        painter.circle_filled(center, radius, MARKER_COLOR);
        painter.circle_stroke(center, radius, egui::Stroke::new(1.5, egui::Color32::BLACK));
    }
}
