//! Tests that run a whole trip through the simulation clock.

use assert_approx_eq::assert_approx_eq;
use route_sim::scenario::preset;
use route_sim::{
    ClockConfig, GeoPoint, Incident, IncidentKind, Phase, Route, Scenario, Simulation,
};

fn hermosillo() -> Route {
    Route::line(
        GeoPoint::new(29.0729, -110.9559),
        GeoPoint::new(29.0969, -110.9544),
    )
}

/// A 0.6 multiplier with a single 20 s incident halfway along.
#[test]
fn vehicle_stops_at_incident() {
    let scenario = Scenario::new("traffic", "Heavy traffic", 0.6).with_incident(Incident::new(
        0.45,
        IncidentKind::Traffic,
        20.0,
    ));
    let mut sim = Simulation::new(hermosillo(), scenario, ClockConfig::default());
    sim.start();

    // One scaled second per tick
    let dt = 1.0 / 60.0;
    let mut stopped_for = 0.0;
    let mut resumed = false;
    while sim.is_playing() {
        sim.step(dt);
        let state = sim.state();
        if state.current_speed_kmh() == 0.0 {
            assert!(state.progress() > 0.40 && state.progress() < 0.50);
            assert!(!resumed, "stopped twice");
            stopped_for += dt * 60.0;
        } else {
            assert_approx_eq!(state.current_speed_kmh(), 30.0);
            if stopped_for > 0.0 {
                resumed = true;
            }
        }
    }

    assert!(resumed);
    // The tick that reaches the incident also stops the vehicle
    assert!((20.0..=22.0).contains(&stopped_for), "{stopped_for}");
    assert_eq!(sim.state().phase(), Phase::Completed);
    assert_eq!(sim.state().progress(), 1.0);
}

/// Test that progress increases monotonically to completion.
#[test]
fn progress_is_monotonic() {
    for id in ["normal", "traffic", "accident", "construction", "rain", "emergency"] {
        let mut sim = Simulation::new(hermosillo(), preset(id).clone(), ClockConfig::default());
        sim.start();

        let mut progress = 0.0;
        let mut ticks = 0;
        while sim.is_playing() {
            sim.step(0.05);
            let state = sim.state();
            assert!(state.progress() >= progress);
            assert!(state.progress() <= 1.0);
            assert_approx_eq!(
                state.traveled_distance() + state.remaining_distance(),
                sim.route().length(),
                1e-6
            );
            progress = state.progress();
            ticks += 1;
            assert!(ticks < 100_000, "{id} never completed");
        }

        assert_eq!(sim.state().phase(), Phase::Completed);
        assert_eq!(sim.state().eta_seconds(), Some(0.0));
        assert_eq!(sim.sample().position, sim.route().last());
    }
}

/// Test that a faster scenario arrives sooner.
#[test]
fn faster_scenarios_arrive_sooner() {
    let elapsed = |id: &str| {
        let mut sim = Simulation::new(hermosillo(), preset(id).clone(), ClockConfig::default());
        sim.start();
        while sim.is_playing() {
            sim.step(0.05);
        }
        sim.state().elapsed_scaled_seconds()
    };
    assert!(elapsed("emergency") < elapsed("normal"));
    assert!(elapsed("normal") < elapsed("accident"));
}

/// Test that a run can be replayed from its serialized state.
#[test]
fn state_round_trips_mid_dwell() {
    let route = hermosillo();
    let scenario = preset("accident");
    let config = ClockConfig::default();
    let mut state = route_sim::SimulationState::new(&route).start();
    while !state.is_at_incident() {
        state = state.tick(1.0 / 60.0, scenario, &route, &config);
    }
    let json = serde_json::to_string(&state).unwrap();
    let restored: route_sim::SimulationState = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.phase(), state.phase());
    assert_approx_eq!(restored.progress(), state.progress());

    let (a, b) = (
        restored.tick(0.5, scenario, &route, &config),
        state.tick(0.5, scenario, &route, &config),
    );
    assert_eq!(a.phase(), b.phase());
    assert_approx_eq!(a.remaining_dwell_seconds(), b.remaining_dwell_seconds());
}
