use crate::route::{Route, RouteSample};
use crate::scenario::{Incident, Scenario};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::time::Instant;

/// Converts a speed in km/h to m/s.
fn kmh_to_mps(speed: f64) -> f64 {
    speed * 1000.0 / 3600.0
}

/// The attributes of a simulation clock.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClockConfig {
    /// The vehicle's speed before the scenario's multiplier, in km/h.
    pub base_speed_kmh: f64,
    /// The number of scaled seconds that pass per second of tick time.
    pub time_scale: f64,
    /// How close progress must be to an incident's position to trigger it.
    pub incident_window: f64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            base_speed_kmh: 50.0,
            time_scale: 60.0,
            incident_window: 0.05,
        }
    }
}

/// The phase of a simulation run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// Not started; progress is zero.
    #[default]
    Idle,
    /// Moving along the route.
    Running,
    /// Stopped at the incident with the given index.
    Dwelling { incident: usize },
    /// Arrived at the end of the route.
    Completed,
}

/// The state of one simulation run.
///
/// States are values: [SimulationState::tick] returns the next state rather
/// than mutating in place, so a run can be replayed from synthetic time steps.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationState {
    /// The current phase.
    phase: Phase,
    /// The fraction of the route travelled.
    progress: f64,
    /// The speed applied on the last tick, in km/h.
    current_speed_kmh: f64,
    /// Scaled seconds left at the current incident; zero when not dwelling.
    remaining_dwell_seconds: f64,
    /// Tick time since the run started, in s.
    elapsed_simulated_seconds: f64,
    /// Scaled time since the run started, in s.
    elapsed_scaled_seconds: f64,
    /// Distance travelled along the route, in m.
    traveled_distance: f64,
    /// Distance left to travel, in m.
    remaining_distance: f64,
    /// Scaled seconds to arrival at the current speed, if moving.
    eta_seconds: Option<f64>,
    /// Indices of the incidents already dwelt at.
    served: SmallVec<[usize; 4]>,
}

impl SimulationState {
    /// Creates an idle state for the given route.
    pub fn new(route: &Route) -> Self {
        Self {
            remaining_distance: route.length(),
            ..Default::default()
        }
    }

    /// Returns the running state, if this one is idle.
    pub fn start(&self) -> Self {
        let mut next = self.clone();
        if next.phase == Phase::Idle {
            next.phase = Phase::Running;
        }
        next
    }

    /// Advances the clock by `dt` seconds of tick time.
    ///
    /// Idle and completed states are returned unchanged. Negative and NaN
    /// time steps are treated as zero.
    pub fn tick(&self, dt: f64, scenario: &Scenario, route: &Route, config: &ClockConfig) -> Self {
        let mut next = self.clone();
        if !self.is_active() {
            return next;
        }

        let dt = if dt > 0.0 { dt } else { 0.0 };
        let scaled = dt * config.time_scale;
        next.elapsed_simulated_seconds += dt;
        next.elapsed_scaled_seconds += scaled;

        match self.phase {
            Phase::Dwelling { incident } => {
                next.current_speed_kmh = 0.0;
                next.remaining_dwell_seconds -= scaled;
                if next.remaining_dwell_seconds <= 0.0 {
                    log::debug!("Dwell at incident {incident} complete");
                    next.remaining_dwell_seconds = 0.0;
                    next.phase = Phase::Running;
                }
            }
            Phase::Running => match self.pending_incident(scenario, config) {
                Some((idx, incident)) => {
                    log::debug!(
                        "Reached {:?} incident {idx} at progress {:.3}",
                        incident.kind,
                        self.progress
                    );
                    next.phase = Phase::Dwelling { incident: idx };
                    next.remaining_dwell_seconds = f64::max(incident.dwell_seconds, 0.0);
                    next.current_speed_kmh = 0.0;
                    next.served.push(idx);
                }
                None => {
                    let speed = config.base_speed_kmh * scenario.speed_multiplier;
                    next.current_speed_kmh = speed;
                    next.advance(kmh_to_mps(speed) * scaled, route.length());
                }
            },
            Phase::Idle | Phase::Completed => unreachable!(),
        }

        next.update_telemetry(route.length());
        next
    }

    /// The first incident surrounding the current progress that hasn't
    /// been dwelt at yet.
    fn pending_incident<'a>(
        &self,
        scenario: &'a Scenario,
        config: &ClockConfig,
    ) -> Option<(usize, &'a Incident)> {
        scenario
            .incidents_at(self.progress, config.incident_window)
            .find(|(idx, _)| !self.served.contains(idx))
    }

    /// Moves `dist` metres along a route of the given length.
    fn advance(&mut self, dist: f64, length: f64) {
        self.progress = if length > 0.0 {
            f64::min(self.progress + f64::max(dist, 0.0) / length, 1.0)
        } else {
            1.0
        };
        if self.progress >= 1.0 {
            log::info!(
                "Route completed after {:.0} scaled seconds",
                self.elapsed_scaled_seconds
            );
            self.phase = Phase::Completed;
        }
    }

    /// Updates the derived distances and arrival time.
    fn update_telemetry(&mut self, length: f64) {
        self.traveled_distance = self.progress * length;
        self.remaining_distance = (1.0 - self.progress) * length;
        let speed = kmh_to_mps(self.current_speed_kmh);
        self.eta_seconds = if self.phase == Phase::Completed {
            Some(0.0)
        } else if speed > 0.0 {
            Some(self.remaining_distance / speed)
        } else {
            None
        };
    }

    /// Whether the clock is ticking in this state.
    pub fn is_active(&self) -> bool {
        matches!(self.phase, Phase::Running | Phase::Dwelling { .. })
    }

    /// The current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The fraction of the route travelled, from 0 to 1.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// The speed applied on the last tick, in km/h.
    pub fn current_speed_kmh(&self) -> f64 {
        self.current_speed_kmh
    }

    /// Scaled seconds left at the current incident.
    pub fn remaining_dwell_seconds(&self) -> f64 {
        self.remaining_dwell_seconds
    }

    /// Tick time since the run started, in s.
    pub fn elapsed_simulated_seconds(&self) -> f64 {
        self.elapsed_simulated_seconds
    }

    /// Scaled time since the run started, in s.
    pub fn elapsed_scaled_seconds(&self) -> f64 {
        self.elapsed_scaled_seconds
    }

    /// Distance travelled along the route, in m.
    pub fn traveled_distance(&self) -> f64 {
        self.traveled_distance
    }

    /// Distance left to travel, in m.
    pub fn remaining_distance(&self) -> f64 {
        self.remaining_distance
    }

    /// Scaled seconds to arrival at the current speed,
    /// or `None` while stopped.
    pub fn eta_seconds(&self) -> Option<f64> {
        self.eta_seconds
    }

    /// Whether the vehicle is stopped at an incident.
    pub fn is_at_incident(&self) -> bool {
        matches!(self.phase, Phase::Dwelling { .. })
    }

    /// A short description of where the vehicle is, for display.
    pub fn describe_location(&self, origin: &str, destination: &str) -> String {
        if self.progress < 0.1 {
            format!("Leaving {origin}")
        } else if self.progress > 0.9 {
            format!("Arriving at {destination}")
        } else {
            format!(
                "En route - {:.1} km remaining",
                self.remaining_distance / 1000.0
            )
        }
    }
}

/// Formats an arrival time as whole minutes or seconds.
pub fn format_eta(eta_seconds: Option<f64>) -> String {
    match eta_seconds {
        Some(eta) if eta >= 60.0 => format!("{}m", (eta / 60.0).floor()),
        Some(eta) => format!("{}s", eta.floor()),
        None => "--".to_string(),
    }
}

/// A trip simulation, paced by the caller one frame at a time.
pub struct Simulation {
    /// The route being travelled.
    route: Route,
    /// The traffic scenario.
    scenario: Scenario,
    /// The clock attributes.
    config: ClockConfig,
    /// The state of the current run.
    state: SimulationState,
    /// Whether frames currently advance the clock.
    playing: bool,
    /// The time of the previous frame, while playing.
    last_frame: Option<Instant>,
    /// Incremented whenever the run is reset.
    epoch: u64,
    /// The number of ticks in the current run.
    frame: usize,
}

impl Simulation {
    /// Creates a new, idle simulation.
    pub fn new(route: Route, scenario: Scenario, config: ClockConfig) -> Self {
        let state = SimulationState::new(&route);
        Self {
            route,
            scenario,
            config,
            state,
            playing: false,
            last_frame: None,
            epoch: 0,
            frame: 0,
        }
    }

    /// Starts the run, or resumes it after a pause.
    /// Does nothing once the route is completed.
    pub fn start(&mut self) {
        if self.state.phase() == Phase::Completed {
            return;
        }
        if self.state.phase() == Phase::Idle {
            log::info!(
                "Starting '{}' over {:.0} m",
                self.scenario.id,
                self.route.length()
            );
            self.state = self.state.start();
        }
        self.playing = true;
    }

    /// Pauses the run without discarding any state.
    pub fn pause(&mut self) {
        self.playing = false;
        self.last_frame = None;
    }

    /// Stops the run and returns to the idle state.
    pub fn reset(&mut self) {
        log::info!("Resetting simulation (epoch {})", self.epoch + 1);
        self.state = SimulationState::new(&self.route);
        self.playing = false;
        self.last_frame = None;
        self.frame = 0;
        self.epoch += 1;
    }

    /// Replaces the route and resets the run.
    pub fn set_route(&mut self, route: Route) {
        self.route = route;
        self.reset();
    }

    /// Replaces the scenario and resets the run.
    pub fn set_scenario(&mut self, scenario: Scenario) {
        self.scenario = scenario;
        self.reset();
    }

    /// Advances the simulation by `dt` seconds, if it's playing.
    pub fn step(&mut self, dt: f64) {
        if !self.playing {
            return;
        }
        self.state = self
            .state
            .tick(dt, &self.scenario, &self.route, &self.config);
        self.frame += 1;
        if !self.state.is_active() {
            self.playing = false;
            self.last_frame = None;
        }
    }

    /// Advances the simulation by the wall-clock time since the previous frame.
    /// The first frame after starting advances by zero.
    pub fn frame(&mut self, now: Instant) {
        if !self.playing {
            return;
        }
        let dt = self
            .last_frame
            .map(|last| now.saturating_duration_since(last).as_secs_f64())
            .unwrap_or(0.0);
        self.last_frame = Some(now);
        self.step(dt);
    }

    /// Samples the route at the current progress.
    pub fn sample(&self) -> RouteSample {
        self.route.sample(self.state.progress())
    }

    /// Whether frames currently advance the clock.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// The state of the current run.
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// The route being travelled.
    pub fn route(&self) -> &Route {
        &self.route
    }

    /// The traffic scenario.
    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// The clock attributes.
    pub fn config(&self) -> &ClockConfig {
        &self.config
    }

    /// Identifies the current run; responses requested during an earlier
    /// epoch are stale.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The number of ticks in the current run.
    pub fn frame_count(&self) -> usize {
        self.frame
    }
}
