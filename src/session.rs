//! Editing session: the grid together with the routes planned for it.
//!
//! All grid mutations go through [`Session`] so that a successful edit drops
//! the routes and stops playback before control returns to the caller.
//! Failed edits leave both the grid and the routes as they were.

use crate::error::{GridError, Result};
use crate::grid::GridModel;
use crate::planner::{interpret_response, PlanningRequest, PlanningResponse, ResultsLog, Strategy};
use crate::sequencer::{Emitted, Sequencer, SequencerEvent};
use crate::types::{Cell, DirectedEdge, GridSnapshot, Route};
use rand::Rng;

/// A planning request tagged with the grid revision it describes.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPlan {
    pub request: PlanningRequest,
    pub revision: u64,
}

#[derive(Debug, Default)]
pub struct Session {
    grid: GridModel,
    routes: Vec<Route>,
    results: ResultsLog,
    sequencer: Sequencer,
    /// Where the delivery vehicle is drawn, if anywhere
    marker: Option<Cell>,
}

impl Session {
    pub fn new(grid: GridModel) -> Self {
        Self {
            grid,
            ..Self::default()
        }
    }

    pub fn grid(&self) -> &GridModel {
        &self.grid
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn results(&self) -> &ResultsLog {
        &self.results
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn marker(&self) -> Option<Cell> {
        self.marker
    }

    /// The route being played, if playback is running.
    pub fn playing_route(&self) -> Option<&Route> {
        if self.sequencer.is_active() {
            self.routes.get(self.sequencer.current_route())
        } else {
            None
        }
    }

    /// Applies `edit` to the grid. If the grid changed, routes and results
    /// are dropped and playback stops before this returns.
    pub fn edit<T>(&mut self, edit: impl FnOnce(&mut GridModel) -> Result<T>) -> Result<T> {
        let before = self.grid.revision();
        let outcome = edit(&mut self.grid);
        if self.grid.revision() != before {
            self.clear_routes();
        }
        outcome
    }

    pub fn add_store(&mut self, cell: Cell) -> Result<()> {
        self.edit(|grid| grid.add_store(cell))
    }

    pub fn add_destination(&mut self, cell: Cell) -> Result<()> {
        self.edit(|grid| grid.add_destination(cell))
    }

    pub fn add_tunnel(&mut self, start: Cell, end: Cell, cost: u32) -> Result<bool> {
        self.edit(|grid| grid.add_tunnel(start, end, cost))
    }

    pub fn set_edge_cost(&mut self, edge: DirectedEdge, cost: u8) -> Result<()> {
        self.edit(|grid| grid.set_edge_cost(edge, cost))
    }

    pub fn toggle_roadblock(&mut self, edge: DirectedEdge) -> Result<bool> {
        self.edit(|grid| grid.toggle_roadblock(edge))
    }

    pub fn remove_roadblock(&mut self, edge: DirectedEdge) -> Result<bool> {
        self.edit(|grid| grid.remove_roadblock(edge))
    }

    pub fn set_cell_costs(&mut self, cell: Cell, costs: [u8; 4]) -> Result<()> {
        self.edit(|grid| grid.set_cell_costs(cell, costs))
    }

    pub fn delete_at(&mut self, cell: Cell) -> bool {
        self.edit(|grid| Ok(grid.delete_at(cell))).unwrap_or(false)
    }

    pub fn resize(&mut self, rows: i32, cols: i32) {
        self.mutate(|grid| grid.resize(rows, cols));
    }

    pub fn reset_grid(&mut self) {
        self.mutate(GridModel::reset);
    }

    pub fn generate_random<R: Rng>(&mut self, rng: &mut R) {
        self.mutate(|grid| grid.generate_random(rng));
    }

    pub fn import_grid(&mut self, snapshot: &GridSnapshot) -> Result<()> {
        self.edit(|grid| grid.import(snapshot))
    }

    pub fn export_grid(&self) -> GridSnapshot {
        self.grid.to_snapshot()
    }

    /// Prepares a planning call for the current grid.
    pub fn plan_request(&self, strategy: Strategy) -> Result<PendingPlan> {
        let request = PlanningRequest::for_grid(&self.grid, strategy)?;
        log::info!(
            "Planning with {} on a {}x{} grid",
            strategy.code(),
            self.grid.cols(),
            self.grid.rows()
        );
        Ok(PendingPlan {
            request,
            revision: self.grid.revision(),
        })
    }

    /// Takes the outcome of a planning call and starts playing its routes.
    ///
    /// An outcome for an older grid revision is discarded. On any error the
    /// current routes and playback are left alone. Returns the route count.
    pub fn accept_plan(
        &mut self,
        plan: &PendingPlan,
        outcome: std::result::Result<PlanningResponse, String>,
    ) -> Result<usize> {
        if plan.revision != self.grid.revision() {
            log::warn!(
                "Discarding {} result for grid revision {} (now {})",
                plan.request.strategy.code(),
                plan.revision,
                self.grid.revision()
            );
            return Err(GridError::PlanningFailed(
                "The grid changed while planning. Please plan again.".into(),
            ));
        }
        let routes = interpret_response(outcome, &self.grid)?;
        log::info!(
            "{} found {} routes",
            plan.request.strategy.display_name(),
            routes.len()
        );
        self.results.record(plan.request.strategy, routes.clone());
        Ok(self.start_routes(routes))
    }

    /// Loads routes computed elsewhere and starts playing them.
    pub fn load_routes(&mut self, response: PlanningResponse) -> Result<usize> {
        let routes = interpret_response(Ok(response), &self.grid)?;
        log::info!("Loaded {} routes from file", routes.len());
        Ok(self.start_routes(routes))
    }

    pub fn play_all(&mut self) {
        self.sequencer.play_all(&self.routes);
    }

    pub fn play_one(&mut self, index: usize) -> Result<()> {
        self.sequencer.play_one(index, &self.routes)
    }

    pub fn stop(&mut self) {
        let emitted = self.sequencer.stop();
        self.apply(emitted);
    }

    pub fn reset_playback(&mut self) {
        let emitted = self.sequencer.reset();
        self.apply(emitted);
    }

    pub fn set_cadence_ms(&mut self, cadence_ms: u64) {
        self.sequencer.set_cadence_ms(cadence_ms);
    }

    /// Advances playback to `now_ms` and moves the marker. Returns true if
    /// anything fired.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        let emitted = self.sequencer.advance(now_ms);
        let fired = !emitted.is_empty();
        for event in emitted {
            self.apply(event);
        }
        fired
    }

    fn apply(&mut self, emitted: Emitted) {
        self.marker = match emitted.event {
            SequencerEvent::PositionUpdate { route, step } => self
                .routes
                .get(route)
                .and_then(|route| route.path.get(step))
                .copied(),
            SequencerEvent::RouteComplete { route } => {
                self.routes.get(route).map(|route| route.store)
            }
            SequencerEvent::Complete => None,
        };
    }

    fn start_routes(&mut self, routes: Vec<Route>) -> usize {
        self.stop();
        self.routes = routes;
        self.sequencer.play_all(&self.routes);
        self.routes.len()
    }

    fn mutate(&mut self, change: impl FnOnce(&mut GridModel)) {
        change(&mut self.grid);
        self.clear_routes();
    }

    fn clear_routes(&mut self) {
        if !self.routes.is_empty() {
            log::debug!("Grid changed, dropping {} routes", self.routes.len());
        }
        self.stop();
        self.routes.clear();
        self.results.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn session() -> Session {
        let mut session = Session::new(GridModel::new(5, 5));
        session.add_store(Cell::new(0, 0)).unwrap();
        session.add_destination(Cell::new(2, 0)).unwrap();
        session
    }

    fn response() -> PlanningResponse {
        PlanningResponse {
            success: true,
            message: String::new(),
            routes: vec![Route {
                store: Cell::new(0, 0),
                destination: Cell::new(2, 0),
                path: vec![Cell::new(0, 0), Cell::new(1, 0), Cell::new(2, 0)],
                cost: 2,
                expanded: Some(3),
            }],
        }
    }

    fn planned(session: &mut Session) -> PendingPlan {
        let plan = session.plan_request(Strategy::UC).unwrap();
        assert_eq!(session.accept_plan(&plan, Ok(response())), Ok(1));
        plan
    }

    #[test]
    fn test_plan_starts_playback_and_moves_marker() {
        let mut session = session();
        planned(&mut session);
        assert!(session.sequencer().is_active());
        assert_eq!(session.results().routes_for(Strategy::UC).len(), 1);

        session.tick(0);
        assert_eq!(session.marker(), Some(Cell::new(0, 0)));
        assert!(session.playing_route().is_some());
        session.tick(200);
        assert_eq!(session.marker(), Some(Cell::new(1, 0)));
        session.tick(400);
        // Final step, route completion and playback completion all fire at 400.
        assert_eq!(session.marker(), None);
        assert!(!session.sequencer().is_active());
        assert!(session.playing_route().is_none());
    }

    #[test]
    fn test_route_completion_returns_marker_to_store() {
        let mut session = session();
        let mut routes = response();
        routes.routes.push(routes.routes[0].clone());
        session.load_routes(routes).unwrap();

        session.tick(400);
        assert_eq!(session.marker(), Some(Cell::new(0, 0)));
        assert!(session.sequencer().is_active());
    }

    #[test]
    fn test_successful_edit_clears_routes() {
        let mut session = session();
        planned(&mut session);
        session.tick(0);

        session
            .set_edge_cost(DirectedEdge::new(Cell::new(3, 3), Direction::Right), 2)
            .unwrap();
        assert!(session.routes().is_empty());
        assert!(session.results().is_empty());
        assert!(!session.sequencer().is_active());
        assert_eq!(session.marker(), None);
    }

    #[test]
    fn test_failed_edit_keeps_routes() {
        let mut session = session();
        let wall = DirectedEdge::new(Cell::new(3, 3), Direction::Right);
        session.toggle_roadblock(wall).unwrap();
        planned(&mut session);

        assert!(matches!(
            session.set_edge_cost(wall, 2),
            Err(GridError::EdgeBlocked(_))
        ));
        assert!(session.add_store(Cell::new(9, 9)).is_err());
        assert!(!session.delete_at(Cell::new(4, 4)));
        assert_eq!(session.routes().len(), 1);
        assert!(session.sequencer().is_active());
    }

    #[test]
    fn test_noop_edit_keeps_routes() {
        let mut session = session();
        planned(&mut session);
        session.add_store(Cell::new(0, 0)).unwrap();
        assert_eq!(session.add_tunnel(Cell::new(1, 1), Cell::new(1, 1), 5), Ok(false));
        assert_eq!(session.routes().len(), 1);
    }

    #[test]
    fn test_structural_changes_clear_routes() {
        let mut session = session();
        planned(&mut session);
        session.resize(6, 6);
        assert!(session.routes().is_empty());

        planned(&mut session);
        session.generate_random(&mut StdRng::seed_from_u64(3));
        assert!(session.routes().is_empty());

        session.reset_grid();
        assert!(session.grid().stores().is_empty());
    }

    #[test]
    fn test_stale_plan_is_discarded() {
        let mut session = session();
        let plan = session.plan_request(Strategy::BF).unwrap();
        session.add_destination(Cell::new(4, 4)).unwrap();

        let err = session.accept_plan(&plan, Ok(response())).unwrap_err();
        assert!(matches!(err, GridError::PlanningFailed(_)));
        assert!(session.routes().is_empty());
        assert!(session.results().is_empty());
    }

    #[test]
    fn test_failed_plan_keeps_previous_routes() {
        let mut session = session();
        planned(&mut session);
        let plan = session.plan_request(Strategy::DF).unwrap();
        assert!(session
            .accept_plan(&plan, Err("timeout".into()))
            .is_err());
        assert_eq!(session.routes().len(), 1);
        assert!(session.results().routes_for(Strategy::DF).is_empty());
    }

    #[test]
    fn test_load_routes_rejects_foreign_grid() {
        let mut session = session();
        let mut foreign = response();
        foreign.routes[0].path.push(Cell::new(7, 0));
        assert!(matches!(
            session.load_routes(foreign),
            Err(GridError::ImportFormatError(_))
        ));
        assert!(session.routes().is_empty());
    }

    #[test]
    fn test_play_one_and_stop() {
        let mut session = session();
        planned(&mut session);
        session.stop();
        assert!(!session.sequencer().is_active());

        assert!(session.play_one(3).is_err());
        session.play_one(0).unwrap();
        session.tick(session.sequencer().now_ms());
        assert_eq!(session.marker(), Some(Cell::new(0, 0)));

        session.reset_playback();
        assert_eq!(session.marker(), None);
        assert_eq!(session.sequencer().current_step(), 0);
    }

    #[test]
    fn test_import_through_session() {
        let mut session = session();
        planned(&mut session);
        let snapshot = session.export_grid();
        session.import_grid(&snapshot).unwrap();
        assert!(session.routes().is_empty());
        assert_eq!(session.grid().stores(), &[Cell::new(0, 0)]);
    }
}
