//! # Delivery Grid
//!
//! An interactive editor for delivery-routing scenarios on a rectangular grid
//! of cells, plus a playback engine for the routes a planning service returns.
//!
//! ## Features
//! - Stores, destinations, tunnels and roadblocks placed by clicking
//! - Per-wall traffic costs, edited one wall or one cell at a time
//! - Random scenario generation and JSON import/export
//! - Route planning through a pluggable [`RoutePlanner`]
//! - Animated playback of routes with a configurable cadence
//! - Canvas panning and zooming

#![deny(unsafe_code)]

pub mod config;
pub mod constants;
pub mod edges;
pub mod error;
pub mod grid;
pub mod planner;
pub mod sequencer;
pub mod session;
pub mod traffic;
pub mod types;
pub mod viewport;
mod ui;

pub use config::EditorSettings;
pub use error::{GridError, Result};
pub use grid::GridModel;
pub use planner::{OfflinePlanner, PlanningRequest, PlanningResponse, RoutePlanner, Strategy};
pub use sequencer::{PlaybackMode, Sequencer, SequencerEvent};
pub use session::Session;
pub use types::*;
pub use ui::{EditMode, GridApp};

#[cfg(not(target_arch = "wasm32"))]
use std::sync::Arc;

/// Runs the editor without a planning service.
///
/// Routes can still be replayed from files. Must be called from within a
/// tokio runtime, which file dialogs and planning calls are spawned on.
///
/// # Example
///
/// ```no_run
/// #[tokio::main]
/// async fn main() -> Result<(), eframe::Error> {
///     delivery_grid::run_app()
/// }
/// ```
#[cfg(not(target_arch = "wasm32"))]
pub fn run_app() -> std::result::Result<(), eframe::Error> {
    run_app_with_planner(Arc::new(OfflinePlanner))
}

/// Runs the editor, sending planning requests to `planner`.
#[cfg(not(target_arch = "wasm32"))]
pub fn run_app_with_planner(planner: Arc<dyn RoutePlanner>) -> std::result::Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("Delivery Grid"),
        ..Default::default()
    };
    eframe::run_native(
        "Delivery Grid",
        options,
        Box::new(move |cc| Ok(Box::new(GridApp::new(cc, planner)))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_default() {
        let session = Session::default();
        assert_eq!(session.grid().rows(), constants::DEFAULT_GRID_DIMENSION);
        assert_eq!(session.grid().cols(), constants::DEFAULT_GRID_DIMENSION);
        assert!(session.routes().is_empty());
        assert!(session.marker().is_none());
        assert!(!session.sequencer().is_active());
    }

    #[test]
    fn test_offline_planner_refuses() {
        let mut grid = GridModel::new(4, 4);
        grid.add_store(Cell::new(0, 0)).unwrap();
        grid.add_destination(Cell::new(3, 3)).unwrap();
        let request = PlanningRequest::for_grid(&grid, Strategy::UC).unwrap();

        assert!(OfflinePlanner.plan(&request).is_err());
    }
}
