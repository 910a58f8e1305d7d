//! Canvas interaction and navigation functionality.
//!
//! This module handles panning, zooming and turning clicks into grid edits
//! according to the active [`EditMode`].

use super::state::{CellCostEditor, EdgeCostEditor, EditMode, GridApp};
use crate::constants::DEFAULT_TUNNEL_COST;
use crate::edges::{resolve_cell, resolve_edge};
use crate::error::GridError;
use crate::types::{Cell, DirectedEdge, Direction};
use eframe::egui;

impl GridApp {
    /// Draws the canvas and processes pointer input on it.
    pub fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        self.canvas.origin = response.rect.min;

        if self.canvas.show_grid && self.canvas.needs_centering {
            let (width, height) = self.session.grid().content_size();
            self.canvas
                .viewport
                .center_on(response.rect.size(), egui::vec2(width, height));
            self.canvas.needs_centering = false;
        }

        self.handle_canvas_panning(ui, &response);
        self.handle_canvas_zoom(ui, &response);

        if !self.canvas.viewport.is_dragging() {
            if response.clicked() {
                if let Some(pos) = response.interact_pointer_pos() {
                    let world = self.screen_to_world(pos);
                    self.handle_primary_click(world);
                }
            } else if response.secondary_clicked() {
                if let Some(pos) = response.interact_pointer_pos() {
                    let world = self.screen_to_world(pos);
                    self.handle_secondary_click(world);
                }
            }
        }

        self.render_grid_elements(&painter);
    }

    /// Converts an absolute screen position to grid world coordinates.
    pub fn screen_to_world(&self, screen_pos: egui::Pos2) -> egui::Pos2 {
        let local = screen_pos - self.canvas.origin.to_vec2();
        self.canvas.viewport.screen_to_world(local)
    }

    /// Converts grid world coordinates to an absolute screen position.
    pub fn world_to_screen(&self, world_pos: egui::Pos2) -> egui::Pos2 {
        self.canvas.viewport.world_to_screen(world_pos) + self.canvas.origin.to_vec2()
    }

    /// Pans with the middle button, Cmd/Ctrl+primary drag, or a primary drag
    /// in [`EditMode::Move`].
    pub fn handle_canvas_panning(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let move_mode = self.interaction.mode == EditMode::Move;
        let should_pan = ui.input(|i| {
            i.pointer.middle_down()
                || (i.pointer.primary_down() && (i.modifiers.command || move_mode))
        });

        if should_pan && (response.dragged() || self.canvas.viewport.is_dragging()) {
            if let Some(current_pos) = response.interact_pointer_pos() {
                let local = current_pos - self.canvas.origin.to_vec2();
                if self.canvas.viewport.is_dragging() {
                    self.canvas.viewport.drag_to(local);
                } else {
                    self.canvas.viewport.begin_drag(local);
                }
            }
        } else if self.canvas.viewport.is_dragging() {
            self.canvas.viewport.end_drag();
        }
    }

    /// Zooms one notch per scroll frame, anchored at the pointer.
    pub fn handle_canvas_zoom(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let scroll_delta = ui.input(|i| i.smooth_scroll_delta.y);
        if scroll_delta == 0.0 {
            return;
        }
        let Some(mouse_pos) = ui.input(|i| i.pointer.hover_pos()) else {
            return;
        };
        if !response.rect.contains(mouse_pos) {
            return;
        }
        let anchor = mouse_pos - self.canvas.origin.to_vec2();
        self.canvas.viewport.zoom(anchor, scroll_delta > 0.0);
    }

    /// Applies a primary click at `world` according to the edit mode.
    pub fn handle_primary_click(&mut self, world: egui::Pos2) {
        let grid = self.session.grid();
        let (size, cols, rows) = (grid.cell_size(), grid.cols(), grid.rows());
        let cell = resolve_cell(world, size, cols, rows);
        let edge = resolve_edge(world, size, cols, rows);

        match self.interaction.mode {
            EditMode::Move => {}
            EditMode::AddStore => {
                if let Some(cell) = cell {
                    let result = self.session.add_store(cell);
                    self.report(result);
                }
            }
            EditMode::AddDestination => {
                if let Some(cell) = cell {
                    let result = self.session.add_destination(cell);
                    self.report(result);
                }
            }
            EditMode::AddTunnel => {
                if let Some(cell) = cell {
                    self.place_tunnel_endpoint(cell);
                }
            }
            EditMode::AddRoadblock => {
                if let Some(edge) = edge {
                    let result = self.session.toggle_roadblock(edge);
                    self.report(result);
                }
            }
            EditMode::EditEdgeCost => {
                if let Some(edge) = edge {
                    self.open_edge_editor(edge);
                }
            }
            EditMode::EditCellCosts => {
                if let Some(cell) = cell {
                    self.open_cell_editor(cell);
                }
            }
            EditMode::Delete => {
                if let Some(cell) = cell {
                    if self.session.delete_at(cell) {
                        self.status = Some(format!("Cleared cell {}", cell));
                    }
                }
            }
        }
    }

    /// Applies a secondary click at `world`. Only roadblock mode uses it.
    pub fn handle_secondary_click(&mut self, world: egui::Pos2) {
        match self.interaction.mode {
            EditMode::AddRoadblock => {
                let grid = self.session.grid();
                if let Some(edge) =
                    resolve_edge(world, grid.cell_size(), grid.cols(), grid.rows())
                {
                    let result = self.session.remove_roadblock(edge);
                    self.report(result);
                }
            }
            EditMode::Move
            | EditMode::AddStore
            | EditMode::AddDestination
            | EditMode::AddTunnel
            | EditMode::EditEdgeCost
            | EditMode::EditCellCosts
            | EditMode::Delete => {}
        }
    }

    /// Switches edit mode, dropping any half-finished gesture.
    pub fn select_mode(&mut self, mode: EditMode) {
        self.interaction.mode = mode;
        self.interaction.tunnel_start = None;
        self.interaction.edge_editor = None;
        self.interaction.cell_editor = None;
        if !self.canvas.show_grid {
            self.reveal_grid();
        }
    }

    fn place_tunnel_endpoint(&mut self, cell: Cell) {
        match self.interaction.tunnel_start.take() {
            None => self.interaction.tunnel_start = Some(cell),
            Some(start) if start == cell => {}
            Some(start) => {
                let result = self.session.add_tunnel(start, cell, DEFAULT_TUNNEL_COST);
                self.report(result);
            }
        }
    }

    fn open_edge_editor(&mut self, edge: DirectedEdge) {
        let edge = edge.canonical();
        if self.session.grid().is_blocked(edge) {
            self.report::<()>(Err(GridError::EdgeBlocked(edge)));
            return;
        }
        let cost = self.session.grid().cost(edge);
        self.interaction.edge_editor = Some(EdgeCostEditor {
            edge,
            text: cost.to_string(),
        });
    }

    fn open_cell_editor(&mut self, cell: Cell) {
        let grid = self.session.grid();
        let costs: Vec<String> = Direction::ALL
            .iter()
            .map(|direction| grid.cost(DirectedEdge::new(cell, *direction)).to_string())
            .collect();
        self.interaction.cell_editor = Some(CellCostEditor {
            cell,
            text: costs.join(","),
        });
    }

    /// Applies the edge cost dialog. The dialog stays open on error.
    pub fn apply_edge_editor(&mut self) {
        let Some(editor) = self.interaction.edge_editor.clone() else {
            return;
        };
        let result = editor
            .text
            .trim()
            .parse::<u8>()
            .map_err(|_| GridError::InvalidRange("Please enter a number between 1 and 4".into()))
            .and_then(|cost| self.session.set_edge_cost(editor.edge, cost));
        if self.report(result).is_some() {
            self.interaction.edge_editor = None;
        }
    }

    /// Applies the cell cost dialog. The dialog stays open on error.
    pub fn apply_cell_editor(&mut self) {
        let Some(editor) = self.interaction.cell_editor.clone() else {
            return;
        };
        let result = crate::grid::GridModel::parse_cell_costs(&editor.text)
            .and_then(|costs| self.session.set_cell_costs(editor.cell, costs));
        if self.report(result).is_some() {
            self.interaction.cell_editor = None;
        }
    }
}
