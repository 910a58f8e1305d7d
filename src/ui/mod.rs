//! User interface for the grid editor.
//!
//! # Module Organization
//!
//! - `state` - Application state structures and the main GridApp
//! - `canvas` - Canvas navigation and click handling per edit mode
//! - `rendering` - Drawing the grid, its entities and route playback
//! - `file_ops` - Grid and route file operations for native and WASM

mod canvas;
mod file_ops;
mod rendering;
mod state;


pub use state::{EditMode, GridApp};

use crate::config::EditorSettings;
use crate::constants::{MAX_CADENCE_MS, MAX_GRID_DIMENSION, MIN_CADENCE_MS, MIN_GRID_DIMENSION};
use crate::planner::Strategy;
use eframe::egui;

impl eframe::App for GridApp {
    /// Persist editor preferences between restarts.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        match self.settings.to_json() {
            Ok(json) => storage.set_string(EditorSettings::STORAGE_KEY, json),
            Err(err) => log::error!("Failed to serialize editor settings: {err}"),
        }
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.run_frame(ctx);
    }
}

impl GridApp {
    /// Runs one frame: playback, async results, then the whole layout.
    pub fn run_frame(&mut self, ctx: &egui::Context) {
        let visuals = if self.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        };
        ctx.set_visuals(visuals);

        let now_ms = ctx.input(|i| (i.time * 1000.0) as u64);
        self.session.tick(now_ms);

        self.handle_pending_operations(ctx);
        self.handle_planning_results();

        egui::TopBottomPanel::top("top_toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui);
        });

        egui::SidePanel::right("controls_panel")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.draw_controls_panel(ui, ctx);
                });
            });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.draw_status_bar(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_canvas(ui);
        });

        self.draw_cost_dialogs(ctx);

        if let Some(due) = self.session.sequencer().next_due_ms() {
            let wait = due.saturating_sub(now_ms);
            ctx.request_repaint_after(std::time::Duration::from_millis(wait));
        }
    }

    fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Export Grid").clicked() {
                self.export_grid();
            }
            if ui.button("Import Grid").clicked() {
                self.import_grid();
            }
            if ui.button("Load Routes").clicked() {
                self.load_routes();
            }

            ui.separator();

            if ui.button("Generate Random").clicked() {
                self.session.generate_random(&mut rand::thread_rng());
                self.interaction.tunnel_start = None;
                self.reveal_grid();
                self.status = Some("Generated a random grid".into());
            }
            if ui.button("Reset Grid").clicked() {
                self.session.reset_grid();
                self.interaction.tunnel_start = None;
                self.interaction.edge_editor = None;
                self.interaction.cell_editor = None;
                self.status = Some("Grid reset".into());
            }
            if ui.button("Reset View").clicked() {
                self.canvas.viewport.reset_view();
                self.canvas.needs_centering = true;
            }

            ui.separator();

            let theme_label = if self.dark_mode { "Light mode" } else { "Dark mode" };
            if ui.button(theme_label).clicked() {
                self.dark_mode = !self.dark_mode;
            }
        });
    }

    fn draw_controls_panel(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.heading("Grid");
        ui.horizontal(|ui| {
            ui.label("Rows");
            ui.add(
                egui::DragValue::new(&mut self.interaction.pending_rows)
                    .range(MIN_GRID_DIMENSION..=MAX_GRID_DIMENSION),
            );
            ui.label("Cols");
            ui.add(
                egui::DragValue::new(&mut self.interaction.pending_cols)
                    .range(MIN_GRID_DIMENSION..=MAX_GRID_DIMENSION),
            );
            if ui.button("Apply").clicked() {
                self.session
                    .resize(self.interaction.pending_rows, self.interaction.pending_cols);
                self.interaction.tunnel_start = None;
                self.reveal_grid();
            }
        });

        ui.separator();
        ui.heading("Edit mode");
        for mode in EditMode::ALL {
            if ui
                .selectable_label(self.interaction.mode == mode, mode.label())
                .clicked()
            {
                self.select_mode(mode);
            }
        }
        ui.weak(self.interaction.mode.hint());
        if let Some(start) = self.interaction.tunnel_start {
            ui.label(format!("Tunnel starts at {}", start));
        }
        ui.checkbox(&mut self.settings.show_costs, "Show edge costs");

        ui.separator();
        ui.heading("Planning");
        egui::ComboBox::from_id_salt("strategy")
            .selected_text(self.settings.strategy.display_name())
            .show_ui(ui, |ui| {
                for strategy in Strategy::ALL {
                    ui.selectable_value(&mut self.settings.strategy, strategy, strategy.display_name());
                }
            });
        ui.horizontal(|ui| {
            let idle = self.planning.in_flight.is_none();
            if ui.add_enabled(idle, egui::Button::new("Plan routes")).clicked() {
                self.start_planning(ctx);
            }
            if !idle {
                ui.spinner();
            }
        });

        ui.separator();
        ui.heading("Playback");
        if ui
            .add(
                egui::Slider::new(&mut self.settings.cadence_ms, MIN_CADENCE_MS..=MAX_CADENCE_MS)
                    .text("ms per step"),
            )
            .changed()
        {
            self.session.set_cadence_ms(self.settings.cadence_ms);
        }
        ui.horizontal(|ui| {
            let has_routes = !self.session.routes().is_empty();
            if ui.add_enabled(has_routes, egui::Button::new("Play all")).clicked() {
                self.session.play_all();
            }
            if ui.button("Stop").clicked() {
                self.session.stop();
            }
            if ui.button("Reset").clicked() {
                self.session.reset_playback();
            }
        });

        let playing = self
            .session
            .sequencer()
            .is_active()
            .then(|| self.session.sequencer().current_route());
        let mut play_index = None;
        for (index, route) in self.session.routes().iter().enumerate() {
            ui.horizontal(|ui| {
                let text = format!(
                    "{} → {}  cost {}",
                    route.store, route.destination, route.cost
                );
                if playing == Some(index) {
                    ui.strong(text);
                } else {
                    ui.label(text);
                }
                if ui.small_button("Play").clicked() {
                    play_index = Some(index);
                }
            });
        }
        if let Some(index) = play_index {
            let result = self.session.play_one(index);
            self.report(result);
        }

        if !self.session.results().is_empty() {
            ui.separator();
            egui::CollapsingHeader::new("Results")
                .default_open(false)
                .show(ui, |ui| {
                    let report = self.session.results().report(self.session.grid());
                    ui.monospace(report);
                });
        }
    }

    fn draw_status_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if let Some(error) = self.error.clone() {
                ui.colored_label(ui.visuals().error_fg_color, error);
                if ui.small_button("✖").clicked() {
                    self.error = None;
                }
            } else if let Some(status) = &self.status {
                ui.label(status.as_str());
            } else {
                let grid = self.session.grid();
                ui.weak(format!(
                    "{}x{} grid, {} stores, {} destinations",
                    grid.cols(),
                    grid.rows(),
                    grid.stores().len(),
                    grid.destinations().len()
                ));
            }
        });
    }

    fn draw_cost_dialogs(&mut self, ctx: &egui::Context) {
        if let Some(editor) = &mut self.interaction.edge_editor {
            let mut apply = false;
            let mut cancel = false;
            egui::Window::new(format!("Cost of {}", editor.edge))
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label("Cost (1-4)");
                    let response = ui.text_edit_singleline(&mut editor.text);
                    if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        apply = true;
                    }
                    ui.horizontal(|ui| {
                        apply |= ui.button("Apply").clicked();
                        cancel = ui.button("Cancel").clicked();
                    });
                });
            if cancel {
                self.interaction.edge_editor = None;
            } else if apply {
                self.apply_edge_editor();
            }
        }

        if let Some(editor) = &mut self.interaction.cell_editor {
            let mut apply = false;
            let mut cancel = false;
            egui::Window::new(format!("Costs around {}", editor.cell))
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label("up,down,left,right (1-4 each)");
                    let response = ui.text_edit_singleline(&mut editor.text);
                    if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        apply = true;
                    }
                    ui.horizontal(|ui| {
                        apply |= ui.button("Apply").clicked();
                        cancel = ui.button("Cancel").clicked();
                    });
                });
            if cancel {
                self.interaction.cell_editor = None;
            } else if apply {
                self.apply_cell_editor();
            }
        }
    }

    /// Sends the current grid to the planner in the background.
    ///
    /// Pre-flight errors (no stores, no destinations) are shown without
    /// contacting the planner. Only one call is in flight at a time.
    pub fn start_planning(&mut self, ctx: &egui::Context) {
        if self.planning.in_flight.is_some() {
            return;
        }
        let result = self.session.plan_request(self.settings.strategy);
        let Some(plan) = self.report(result) else {
            return;
        };

        let request = plan.request.clone();
        let planner = self.planner.clone();
        let sender = self.planning.sender.clone();
        let ctx = ctx.clone();
        self.planning.in_flight = Some(plan);
        self.status = Some(format!("Planning with {}...", request.strategy.display_name()));

        #[cfg(not(target_arch = "wasm32"))]
        {
            tokio::task::spawn_blocking(move || {
                let _ = sender.send(planner.plan(&request));
                ctx.request_repaint();
            });
        }

        #[cfg(target_arch = "wasm32")]
        {
            wasm_bindgen_futures::spawn_local(async move {
                let _ = sender.send(planner.plan(&request));
                ctx.request_repaint();
            });
        }
    }

    /// Applies planner replies that arrived since the last frame.
    pub fn handle_planning_results(&mut self) {
        let outcomes: Vec<_> = self.planning.receiver.try_iter().collect();
        for outcome in outcomes {
            let Some(plan) = self.planning.in_flight.take() else {
                log::debug!("Dropping planner reply with no request in flight");
                continue;
            };
            let strategy = plan.request.strategy;
            let result = self.session.accept_plan(&plan, outcome);
            if let Some(count) = self.report(result) {
                self.status = Some(format!(
                    "{} found {} routes",
                    strategy.display_name(),
                    count
                ));
            } else {
                self.status = None;
            }
        }
    }
}
