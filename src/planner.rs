//! Boundary to the route planning service.
//!
//! Route search itself happens elsewhere. This module builds the request the
//! service expects, checks what comes back against the grid it was asked
//! about, and keeps a log of the results per search strategy.

use crate::error::{GridError, Result};
use crate::grid::GridModel;
use crate::types::{Cell, DirectedEdge, Route, Tunnel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Search strategies understood by the planning service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Strategy {
    /// Breadth-first
    #[default]
    BF,
    /// Depth-first
    DF,
    /// Uniform-cost
    UC,
    /// A*
    AS1,
    /// Greedy best-first
    G1,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::BF,
        Strategy::DF,
        Strategy::UC,
        Strategy::AS1,
        Strategy::G1,
    ];

    /// Wire name sent to the service.
    pub fn code(self) -> &'static str {
        match self {
            Strategy::BF => "BF",
            Strategy::DF => "DF",
            Strategy::UC => "UC",
            Strategy::AS1 => "AS1",
            Strategy::G1 => "G1",
        }
    }

    /// Human readable name.
    pub fn display_name(self) -> &'static str {
        match self {
            Strategy::BF => "BF Search",
            Strategy::DF => "DF Search",
            Strategy::UC => "UC Search",
            Strategy::AS1 => "A* Search",
            Strategy::G1 => "Greedy Search",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Grid description in the shape the planning service reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub rows: i32,
    pub cols: i32,
    /// `[y][x][direction]`, direction order up, down, left, right
    pub traffic: Vec<Vec<[u8; 4]>>,
    pub stores: Vec<Cell>,
    pub destinations: Vec<Cell>,
    pub tunnels: Vec<Tunnel>,
    pub roadblocks: Vec<DirectedEdge>,
}

impl GridConfig {
    pub fn from_grid(grid: &GridModel) -> Self {
        Self {
            rows: grid.rows(),
            cols: grid.cols(),
            traffic: grid.traffic().to_rows(),
            stores: grid.stores().to_vec(),
            destinations: grid.destinations().to_vec(),
            tunnels: grid.tunnels().to_vec(),
            roadblocks: grid.roadblocks().to_vec(),
        }
    }
}

/// Body of a planning call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningRequest {
    pub grid: GridConfig,
    pub strategy: Strategy,
}

impl PlanningRequest {
    /// Builds a request for `grid`, refusing grids that cannot produce routes.
    pub fn for_grid(grid: &GridModel, strategy: Strategy) -> Result<Self> {
        if grid.stores().is_empty() {
            return Err(GridError::PlanningFailed(
                "Please add at least one store".into(),
            ));
        }
        if grid.destinations().is_empty() {
            return Err(GridError::PlanningFailed(
                "Please add at least one destination".into(),
            ));
        }
        Ok(Self {
            grid: GridConfig::from_grid(grid),
            strategy,
        })
    }
}

/// Reply from the planning service. Route files use the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub routes: Vec<Route>,
}

impl PlanningResponse {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A route planning backend.
///
/// `Err` carries a transport-level description (service unreachable, bad
/// reply); a reachable service reporting failure answers `Ok` with
/// `success == false`.
pub trait RoutePlanner: Send + Sync {
    fn plan(&self, request: &PlanningRequest) -> std::result::Result<PlanningResponse, String>;
}

/// Planner used when no service is configured. Every call fails, leaving
/// route files as the way to get routes.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflinePlanner;

impl RoutePlanner for OfflinePlanner {
    fn plan(&self, request: &PlanningRequest) -> std::result::Result<PlanningResponse, String> {
        log::warn!(
            "No planning service configured, cannot run {}",
            request.strategy.code()
        );
        Err("no planning service is configured; load a routes file instead".into())
    }
}

/// Turns a planning outcome into routes for `grid`.
pub fn interpret_response(
    outcome: std::result::Result<PlanningResponse, String>,
    grid: &GridModel,
) -> Result<Vec<Route>> {
    let response = outcome.map_err(|err| GridError::PlanningFailed(format!("Error: {}", err)))?;
    if !response.success {
        let message = if response.message.is_empty() {
            "Planning failed".to_string()
        } else {
            response.message
        };
        return Err(GridError::PlanningFailed(message));
    }
    if response.routes.is_empty() {
        return Err(GridError::PlanningFailed(
            "No routes found. Check if destinations are reachable.".into(),
        ));
    }
    validate_routes(grid, &response.routes)?;
    Ok(response.routes)
}

/// Checks that every cell a route mentions lies inside `grid`.
pub fn validate_routes(grid: &GridModel, routes: &[Route]) -> Result<()> {
    for (index, route) in routes.iter().enumerate() {
        let cells = [route.store, route.destination]
            .into_iter()
            .chain(route.path.iter().copied());
        for cell in cells {
            if !grid.contains(cell) {
                return Err(GridError::ImportFormatError(format!(
                    "route {} visits {} outside the {}x{} grid",
                    index,
                    cell,
                    grid.cols(),
                    grid.rows()
                )));
            }
        }
    }
    Ok(())
}

/// Routes of one strategy run.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyResult {
    pub strategy: Strategy,
    pub routes: Vec<Route>,
}

/// Latest routes per strategy, oldest run first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultsLog {
    runs: Vec<StrategyResult>,
}

impl ResultsLog {
    /// Stores the routes of a run. A rerun of the same strategy replaces its
    /// earlier result and moves it to the end.
    pub fn record(&mut self, strategy: Strategy, routes: Vec<Route>) {
        self.runs.retain(|run| run.strategy != strategy);
        self.runs.push(StrategyResult { strategy, routes });
    }

    pub fn routes_for(&self, strategy: Strategy) -> &[Route] {
        self.runs
            .iter()
            .find(|run| run.strategy == strategy)
            .map(|run| run.routes.as_slice())
            .unwrap_or(&[])
    }

    pub fn runs(&self) -> &[StrategyResult] {
        &self.runs
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn clear(&mut self) {
        self.runs.clear();
    }

    /// Plain-text summary of the grid and every recorded run.
    pub fn report(&self, grid: &GridModel) -> String {
        let mut out = format!(
            "Grid created: {}x{}, Stores={}, Destinations={}, Tunnels={}, Blocked roads: {}\n\n",
            grid.cols(),
            grid.rows(),
            grid.stores().len(),
            grid.destinations().len(),
            grid.tunnels().len(),
            grid.roadblocks().len()
        );

        let rule = "========================================";
        let thin = "------------------------------------";
        for run in &self.runs {
            out.push_str(&format!(
                "\n{rule}\nAlgorithm: {}\n{rule}\n\n",
                run.strategy.display_name()
            ));

            let mut by_store: BTreeMap<Cell, Vec<&Route>> = BTreeMap::new();
            for route in &run.routes {
                by_store.entry(route.store).or_default().push(route);
            }
            for (store, routes) in by_store {
                out.push_str(&format!("{thin}\nTRUCK AT STORE {}\n{thin}\n", store));
                for route in routes {
                    let expanded = route
                        .expanded
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| "N/A".to_string());
                    out.push_str(&format!(
                        "Delivers to :\n{} plan={} | cost={} | expanded={}\n",
                        route.destination,
                        route.plan(),
                        route.cost,
                        expanded
                    ));
                }
                out.push('\n');
            }
        }
        out
    }
}
