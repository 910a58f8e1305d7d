//! Application state management structures.
//!
//! This module contains the state structures behind the editor window: canvas
//! navigation, the active edit mode and its in-progress gestures, async file
//! operations and in-flight planning calls.

use crate::config::EditorSettings;
use crate::planner::{OfflinePlanner, PlanningResponse, RoutePlanner};
use crate::session::{PendingPlan, Session};
use crate::types::{Cell, DirectedEdge};
use crate::viewport::Viewport;
use eframe::egui;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

/// What a primary click on the canvas does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    /// Drag to pan; clicks do nothing
    Move,
    /// Click a cell to place a store
    AddStore,
    /// Click a cell to place a destination
    AddDestination,
    /// Click two cells to connect them
    AddTunnel,
    /// Click a wall to block it, secondary click to unblock
    AddRoadblock,
    /// Click a wall to edit its cost
    EditEdgeCost,
    /// Click a cell to edit its four costs
    EditCellCosts,
    /// Click a cell to remove everything on it
    Delete,
}

impl EditMode {
    /// All modes in toolbar order.
    pub const ALL: [EditMode; 8] = [
        EditMode::Move,
        EditMode::AddStore,
        EditMode::AddDestination,
        EditMode::AddTunnel,
        EditMode::AddRoadblock,
        EditMode::EditEdgeCost,
        EditMode::EditCellCosts,
        EditMode::Delete,
    ];

    /// Button label.
    pub fn label(self) -> &'static str {
        match self {
            EditMode::Move => "Move",
            EditMode::AddStore => "Add Store",
            EditMode::AddDestination => "Add Destination",
            EditMode::AddTunnel => "Add Tunnel",
            EditMode::AddRoadblock => "Add Roadblock",
            EditMode::EditEdgeCost => "Edit Edge Cost",
            EditMode::EditCellCosts => "Edit Cell Costs",
            EditMode::Delete => "Delete",
        }
    }

    /// Short usage hint shown under the mode list.
    pub fn hint(self) -> &'static str {
        match self {
            EditMode::Move => "Drag to pan, scroll to zoom.",
            EditMode::AddStore => "Click a cell to add a store (max 3).",
            EditMode::AddDestination => "Click a cell to add a destination (max 10).",
            EditMode::AddTunnel => "Click the start cell, then the end cell.",
            EditMode::AddRoadblock => "Click a wall to block it, right-click to unblock.",
            EditMode::EditEdgeCost => "Click a wall to set its cost (1-4).",
            EditMode::EditCellCosts => "Click a cell to set up,down,left,right costs.",
            EditMode::Delete => "Click a cell to remove what is on it.",
        }
    }
}

/// State related to canvas navigation and display.
pub struct CanvasState {
    /// Pan and zoom of the grid
    pub viewport: Viewport,
    /// Whether the grid is drawn at all
    pub show_grid: bool,
    /// Center the grid on the next frame
    pub needs_centering: bool,
    /// Screen position of the canvas' top-left corner, captured every frame
    pub origin: egui::Pos2,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            viewport: Viewport::new(),
            show_grid: false,
            needs_centering: true,
            origin: egui::Pos2::ZERO,
        }
    }
}

/// Text buffer for the single-edge cost dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeCostEditor {
    pub edge: DirectedEdge,
    pub text: String,
}

/// Text buffer for the four-cost cell dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct CellCostEditor {
    pub cell: Cell,
    pub text: String,
}

/// State related to user interactions with the grid.
pub struct InteractionState {
    /// Active edit mode
    pub mode: EditMode,
    /// First endpoint of a tunnel being placed
    pub tunnel_start: Option<Cell>,
    /// Open edge cost dialog, if any
    pub edge_editor: Option<EdgeCostEditor>,
    /// Open cell cost dialog, if any
    pub cell_editor: Option<CellCostEditor>,
    /// Rows typed into the resize fields
    pub pending_rows: i32,
    /// Columns typed into the resize fields
    pub pending_cols: i32,
}

impl Default for InteractionState {
    fn default() -> Self {
        Self {
            mode: EditMode::Move,
            tunnel_start: None,
            edge_editor: None,
            cell_editor: None,
            pending_rows: crate::constants::DEFAULT_GRID_DIMENSION,
            pending_cols: crate::constants::DEFAULT_GRID_DIMENSION,
        }
    }
}

/// State related to file operations.
///
/// File dialogs run asynchronously and report back through the channel.
pub struct FileState {
    /// Operation requested this frame
    pub pending_operation: Option<PendingFileOperation>,
    /// Channel for receiving file operation results from async contexts
    pub file_operation_sender: Option<Sender<FileOperationResult>>,
    pub file_operation_receiver: Option<Receiver<FileOperationResult>>,
}

impl Default for FileState {
    fn default() -> Self {
        let (sender, receiver) = channel();
        Self {
            pending_operation: None,
            file_operation_sender: Some(sender),
            file_operation_receiver: Some(receiver),
        }
    }
}

/// File operations the user can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingFileOperation {
    /// Save the grid snapshot to a file
    ExportGrid,
    /// Replace the grid with a snapshot from a file
    ImportGrid,
    /// Replay routes from a planning response file
    LoadRoutes,
}

/// Messages sent from async file operations back to the main app.
#[derive(Debug)]
pub enum FileOperationResult {
    /// Export finished, with the path or file name written
    ExportCompleted(String),
    /// A grid file was read: path and content
    GridLoaded(String, String),
    /// A routes file was read: path and content
    RoutesLoaded(String, String),
    /// Operation failed with an error message
    OperationFailed(String),
}

/// State of planning calls.
pub struct PlanningState {
    /// Request awaiting an answer
    pub in_flight: Option<PendingPlan>,
    pub sender: Sender<Result<PlanningResponse, String>>,
    pub receiver: Receiver<Result<PlanningResponse, String>>,
}

impl Default for PlanningState {
    fn default() -> Self {
        let (sender, receiver) = channel();
        Self {
            in_flight: None,
            sender,
            receiver,
        }
    }
}

/// The main application structure.
///
/// Implements `eframe::App`; owns the editing session and all UI state.
pub struct GridApp {
    /// Grid, routes and playback
    pub session: Session,
    /// Backend used for planning calls
    pub planner: Arc<dyn RoutePlanner>,
    /// Persisted preferences
    pub settings: EditorSettings,
    /// Canvas navigation and display state
    pub canvas: CanvasState,
    /// User interaction state
    pub interaction: InteractionState,
    /// File operations state
    pub file: FileState,
    /// Planning calls state
    pub planning: PlanningState,
    /// Message shown in the error banner
    pub error: Option<String>,
    /// Short confirmation shown in the status line
    pub status: Option<String>,
    /// Whether dark mode visuals are enabled (not persisted)
    pub dark_mode: bool,
}

impl Default for GridApp {
    fn default() -> Self {
        Self::with_planner(Arc::new(OfflinePlanner), EditorSettings::default())
    }
}

impl GridApp {
    /// Creates the app with a planner and previously saved settings.
    pub fn with_planner(planner: Arc<dyn RoutePlanner>, settings: EditorSettings) -> Self {
        let mut session = Session::default();
        session.set_cadence_ms(settings.cadence_ms);
        Self {
            session,
            planner,
            settings,
            canvas: CanvasState::default(),
            interaction: InteractionState::default(),
            file: FileState::default(),
            planning: PlanningState::default(),
            error: None,
            status: None,
            dark_mode: true,
        }
    }

    /// Creates the app from an eframe creation context, restoring settings.
    pub fn new(cc: &eframe::CreationContext<'_>, planner: Arc<dyn RoutePlanner>) -> Self {
        Self::with_planner(planner, EditorSettings::load(cc.storage))
    }

    /// Shows the error of a failed operation. Returns the value on success.
    pub fn report<T>(&mut self, result: crate::error::Result<T>) -> Option<T> {
        match result {
            Ok(value) => {
                self.error = None;
                Some(value)
            }
            Err(err) => {
                log::warn!("{}", err);
                self.error = Some(err.to_string());
                None
            }
        }
    }

    /// Makes the grid visible and recenters it on the next frame.
    pub fn reveal_grid(&mut self) {
        self.canvas.show_grid = true;
        self.canvas.needs_centering = true;
    }
}
