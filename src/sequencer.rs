//! Route playback.
//!
//! The sequencer steps a marker along previously planned routes. It keeps at
//! most one scheduled tick and runs on a logical millisecond clock supplied by
//! the caller through [`Sequencer::advance`], so the same code drives both the
//! frame loop and the tests.
//!
//! ```text
//! Idle --play--> Playing(route, step) --path done--> Pausing(next) --500ms--> Playing(next, 0)
//!                       |                                                          |
//!                       +------------------ last route / single route -------------+--> Idle
//! ```

use crate::constants::{DEFAULT_CADENCE_MS, MAX_CADENCE_MS, MIN_CADENCE_MS, ROUTE_PAUSE_MS};
use crate::error::{GridError, Result};
use crate::types::Route;

/// Whether playback continues into the following routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    /// Every route in order, pausing between routes
    All,
    /// One route, then stop
    Single,
}

/// Notifications produced while playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerEvent {
    /// The marker reached `path[step]` of route `route`
    PositionUpdate { route: usize, step: usize },
    /// Route `route` finished; the marker returns to its store
    RouteComplete { route: usize },
    /// Playback ended, either naturally or through [`Sequencer::stop`]
    Complete,
}

/// An event stamped with the logical time it fired at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Emitted {
    pub at_ms: u64,
    pub event: SequencerEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Playing { route: usize, step: usize },
    Pausing { next_route: usize },
}

/// Playback state machine.
#[derive(Debug, Clone)]
pub struct Sequencer {
    cadence_ms: u64,
    phase: Phase,
    mode: PlaybackMode,
    /// Path length of every route being played
    route_lengths: Vec<usize>,
    /// Due time of the single scheduled tick
    pending_due: Option<u64>,
    now_ms: u64,
    current_route: usize,
    current_step: usize,
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new(DEFAULT_CADENCE_MS)
    }
}

impl Sequencer {
    pub fn new(cadence_ms: u64) -> Self {
        Self {
            cadence_ms: cadence_ms.clamp(MIN_CADENCE_MS, MAX_CADENCE_MS),
            phase: Phase::Idle,
            mode: PlaybackMode::All,
            route_lengths: Vec::new(),
            pending_due: None,
            now_ms: 0,
            current_route: 0,
            current_step: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Index of the route being played, or the last one played.
    pub fn current_route(&self) -> usize {
        self.current_route
    }

    /// Index of the next step to be shown on the current route.
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn cadence_ms(&self) -> u64 {
        self.cadence_ms
    }

    /// Changes the step interval. Takes effect from the next scheduled step.
    pub fn set_cadence_ms(&mut self, cadence_ms: u64) {
        self.cadence_ms = cadence_ms.clamp(MIN_CADENCE_MS, MAX_CADENCE_MS);
    }

    /// Logical time of the scheduled tick, if any.
    pub fn next_due_ms(&self) -> Option<u64> {
        self.pending_due
    }

    /// Current logical time.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Plays every route in order, starting now.
    ///
    /// An empty route list does nothing.
    pub fn play_all(&mut self, routes: &[Route]) {
        if routes.is_empty() {
            log::debug!("No routes to play");
            return;
        }
        self.start(routes, PlaybackMode::All, 0);
        log::info!("Playing all {} routes", routes.len());
    }

    /// Plays route `index` alone, starting now.
    ///
    /// Any scheduled step is cancelled first. An index outside `routes` is
    /// rejected and the current playback carries on untouched.
    pub fn play_one(&mut self, index: usize, routes: &[Route]) -> Result<()> {
        if index >= routes.len() {
            log::warn!("Cannot play route {}: only {} routes", index, routes.len());
            return Err(GridError::InvalidIndex {
                index,
                len: routes.len(),
            });
        }
        self.start(routes, PlaybackMode::Single, index);
        log::info!("Playing route {}", index);
        Ok(())
    }

    /// Cancels any scheduled step and goes idle.
    ///
    /// Safe from any state; always yields a `Complete` event.
    pub fn stop(&mut self) -> Emitted {
        if self.is_active() {
            log::info!("Playback stopped at route {}", self.current_route);
        }
        self.pending_due = None;
        self.phase = Phase::Idle;
        Emitted {
            at_ms: self.now_ms,
            event: SequencerEvent::Complete,
        }
    }

    /// [`Sequencer::stop`] plus rewinding to the first route.
    pub fn reset(&mut self) -> Emitted {
        let emitted = self.stop();
        self.current_route = 0;
        self.current_step = 0;
        emitted
    }

    /// Moves the clock to `now_ms` and fires every tick due by then.
    ///
    /// Ticks fire at their scheduled time, so a late call still yields the
    /// same event times as a punctual one. The clock never moves backwards.
    pub fn advance(&mut self, now_ms: u64) -> Vec<Emitted> {
        let mut emitted = Vec::new();
        while let Some(due) = self.pending_due {
            if due > now_ms {
                break;
            }
            self.pending_due = None;
            self.now_ms = self.now_ms.max(due);
            self.tick(&mut emitted);
        }
        self.now_ms = self.now_ms.max(now_ms);
        emitted
    }

    fn start(&mut self, routes: &[Route], mode: PlaybackMode, route: usize) {
        self.pending_due = None;
        self.route_lengths = routes.iter().map(|route| route.path.len()).collect();
        self.mode = mode;
        self.current_route = route;
        self.current_step = 0;
        self.phase = Phase::Playing { route, step: 0 };
        self.schedule(0);
    }

    fn schedule(&mut self, delay_ms: u64) {
        self.pending_due = Some(self.now_ms + delay_ms);
    }

    fn tick(&mut self, emitted: &mut Vec<Emitted>) {
        let (route, step) = match self.phase {
            Phase::Idle => return,
            Phase::Playing { route, step } => (route, step),
            Phase::Pausing { next_route } => (next_route, 0),
        };
        self.current_route = route;

        let len = self.route_lengths.get(route).copied().unwrap_or(0);
        let mut step = step;
        if step < len {
            self.emit(emitted, SequencerEvent::PositionUpdate { route, step });
            step += 1;
        }
        self.current_step = step;

        if step < len {
            self.phase = Phase::Playing { route, step };
            self.schedule(self.cadence_ms);
            return;
        }

        self.emit(emitted, SequencerEvent::RouteComplete { route });
        let next_route = route + 1;
        if self.mode == PlaybackMode::All && next_route < self.route_lengths.len() {
            self.phase = Phase::Pausing { next_route };
            self.schedule(ROUTE_PAUSE_MS);
        } else {
            self.phase = Phase::Idle;
            self.emit(emitted, SequencerEvent::Complete);
            log::info!("Playback complete");
        }
    }

    fn emit(&self, emitted: &mut Vec<Emitted>, event: SequencerEvent) {
        emitted.push(Emitted {
            at_ms: self.now_ms,
            event,
        });
    }
}
