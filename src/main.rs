use route_sim::scenario::{preset, LANDMARKS};
use route_sim::{format_eta, load_streets, ClockConfig, Route, RouteWorker, Simulation};

const STREETS: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "properties": { "highway": "primary", "name": "Blvd. Luis Encinas" },
            "geometry": { "type": "LineString", "coordinates": [
                [-110.9610, 29.0745], [-110.9598, 29.0790], [-110.9585, 29.0841], [-110.9570, 29.0890]
            ] }
        },
        {
            "type": "Feature",
            "properties": { "highway": "secondary", "name": "Calle Reforma" },
            "geometry": { "type": "LineString", "coordinates": [
                [-110.9575, 29.0905], [-110.9562, 29.0932], [-110.9550, 29.0955]
            ] }
        }
    ]
}"#;

fn main() -> anyhow::Result<()> {
    let origin = &LANDMARKS[0];
    let destination = &LANDMARKS[1];
    let streets = load_streets(STREETS)?;

    let worker = RouteWorker::spawn()?;
    let composed = futures_lite::future::block_on(worker.compose_route(
        origin.pos,
        destination.pos,
        route_sim::streets::source_routes(&streets),
        20,
    ))?;
    println!(
        "Composed {} points, {:.0} m from {} to {}",
        composed.route.len(),
        composed.length,
        origin.name,
        destination.name,
    );

    let route: Route = composed.route;
    let mut sim = Simulation::new(route, preset("traffic").clone(), ClockConfig::default());
    sim.start();

    let dt = 1.0 / 60.0;
    while sim.is_playing() {
        sim.step(dt);
        if sim.frame_count() % 60 == 0 || !sim.is_playing() {
            let state = sim.state();
            let sample = sim.sample();
            println!(
                "{:>5} | {:>5.1}% | {:>5.1} km/h | ETA {:>4} | ({:.5}, {:.5}) | {}",
                sim.frame_count(),
                state.progress() * 100.0,
                state.current_speed_kmh(),
                format_eta(state.eta_seconds()),
                sample.position.lat,
                sample.position.lon,
                state.describe_location(origin.name, destination.name),
            );
        }
    }
    Ok(())
}
