pub use cgmath;
pub use math::GeoPoint;
pub use route::{Route, RouteComposer, RouteSample};
pub use scenario::{Incident, IncidentKind, Landmark, Scenario};
pub use simulation::{format_eta, ClockConfig, Phase, Simulation, SimulationState};
use slotmap::new_key_type;
pub use slotmap::{Key, KeyData};
pub use streets::{load_streets, RoadClass, Street};
pub use util::Interval;
pub use worker::RouteWorker;

pub mod math;
mod route;
pub mod scenario;
mod simulation;
pub mod streets;
mod util;
pub mod worker;

new_key_type! {
    /// Unique ID of a request made through a [RouteWorker].
    pub struct RequestId;
}
