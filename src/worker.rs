//! Runs route computations on a dedicated thread.
//!
//! The worker announces itself with a [Response::ready] message, then answers
//! each [Request] with exactly one [Response] carrying the same correlation id.
//! A bad request yields an error response; it never stops the worker.

use crate::math::{nearest, route_length};
use crate::route::RouteComposer;
use anyhow::{anyhow, Context, Result};
use futures_channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures_lite::future::block_on;
use futures_lite::StreamExt;
use serde_json::Value;
use std::thread::{self, JoinHandle};

pub use client::RouteWorker;
pub use protocol::*;

mod client;
mod protocol;

/// The caller's end of a running worker.
pub struct WorkerChannel {
    /// Serialized [Request]s to the worker.
    pub requests: UnboundedSender<String>,
    /// Serialized [Response]s from the worker, starting with the ready signal.
    pub responses: UnboundedReceiver<String>,
    /// The worker thread, which exits once `requests` is closed.
    pub thread: JoinHandle<()>,
}

/// Spawns a worker thread.
pub fn spawn_worker() -> Result<WorkerChannel> {
    let (requests, request_rx) = unbounded();
    let (response_tx, responses) = unbounded();
    let thread = thread::Builder::new()
        .name("route-worker".to_string())
        .spawn(move || run(request_rx, response_tx))
        .context("couldn't spawn the route worker thread")?;
    Ok(WorkerChannel {
        requests,
        responses,
        thread,
    })
}

/// The worker's message loop.
fn run(mut requests: UnboundedReceiver<String>, responses: UnboundedSender<String>) {
    let send = |response: &Response| match serde_json::to_string(response) {
        Ok(raw) => responses.unbounded_send(raw).is_ok(),
        Err(err) => {
            log::warn!("Couldn't serialize response: {err}");
            true
        }
    };

    if !send(&Response::ready()) {
        return;
    }
    while let Some(raw) = block_on(requests.next()) {
        if !send(&handle_message(&raw)) {
            // Nobody is listening any more
            break;
        }
    }
    log::debug!("Route worker shutting down");
}

/// Handles one serialized request.
pub fn handle_message(raw: &str) -> Response {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            log::warn!("Malformed worker message: {err}");
            return Response::failure(None, format!("malformed message: {err}"));
        }
    };

    // Recovered up front so that even a broken envelope can be answered
    let correlation_id = value
        .get("correlationId")
        .and_then(Value::as_str)
        .map(str::to_string);

    match handle_request(value) {
        Ok((operation, payload)) => Response::success(operation, payload, correlation_id),
        Err(err) => {
            log::warn!("Request {correlation_id:?} failed: {err:#}");
            Response::failure(correlation_id, format!("{err:#}"))
        }
    }
}

fn handle_request(value: Value) -> Result<(Operation, Value)> {
    let request: Request =
        serde_json::from_value(value).context("malformed request envelope")?;
    let operation: Operation = request.operation.parse()?;
    let payload = dispatch(operation, request.payload)
        .with_context(|| format!("{} failed", operation.name()))?;
    Ok((operation, payload))
}

/// Performs an operation on a deserialized payload.
fn dispatch(operation: Operation, payload: Value) -> Result<Value> {
    log::debug!("Dispatching {}", operation.name());
    let output = match operation {
        Operation::ComposeRoute => {
            let input: ComposeRouteInput = serde_json::from_value(payload)?;
            let route = RouteComposer::default().compose(
                input.origin,
                input.destination,
                &input.source_routes,
                input.max_points,
            );
            serde_json::to_value(ComposedRoute {
                length: route.length(),
                route,
            })?
        }
        Operation::SimplifyRoute => {
            let input: SimplifyRouteInput = serde_json::from_value(payload)?;
            let route = input.route.simplify(input.tolerance_meters);
            serde_json::to_value(SimplifiedRoute {
                original_count: input.route.len(),
                simplified_count: route.len(),
                route,
            })?
        }
        Operation::InterpolatePosition => {
            let input: InterpolatePositionInput = serde_json::from_value(payload)?;
            serde_json::to_value(input.route.sample(input.progress))?
        }
        Operation::ComputeDistance => {
            let input: ComputeDistanceInput = serde_json::from_value(payload)?;
            serde_json::to_value(ComputedDistance {
                distance_meters: route_length(input.route.points()),
            })?
        }
        Operation::NearestPoint => {
            let input: NearestPointInput = serde_json::from_value(payload)?;
            let found = nearest(input.target, &input.candidates)
                .ok_or_else(|| anyhow!("candidates must not be empty"))?;
            serde_json::to_value(found)?
        }
    };
    Ok(output)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::GeoPoint;
    use crate::route::Route;
    use serde_json::json;

    fn route() -> Route {
        Route::new(vec![
            GeoPoint::new(29.0729, -110.9559),
            GeoPoint::new(29.0892, -110.9614),
            GeoPoint::new(29.0969, -110.9544),
        ])
        .unwrap()
    }

    fn request(operation: &str, payload: Value, id: &str) -> String {
        json!({ "operation": operation, "payload": payload, "correlationId": id }).to_string()
    }

    #[test]
    fn unknown_operation() {
        let response = handle_message(&request("teleport", json!({}), "req-1"));
        assert_eq!(response.result_tag, ERROR_TAG);
        assert_eq!(response.correlation_id.as_deref(), Some("req-1"));
        assert!(response.error.unwrap().contains("teleport"));
        assert_eq!(response.payload, Value::Null);
    }

    #[test]
    fn malformed_messages() {
        let response = handle_message("not json at all");
        assert_eq!(response.result_tag, ERROR_TAG);
        assert_eq!(response.correlation_id, None);

        // Missing payload fields
        let response = handle_message(&request("simplifyRoute", json!({}), "req-2"));
        assert_eq!(response.correlation_id.as_deref(), Some("req-2"));
        assert!(response.error.is_some());

        // Empty routes are rejected
        let response = handle_message(&request("computeDistance", json!({ "route": [] }), "req-3"));
        assert!(response.error.is_some());

        // Missing operation still echoes the id
        let response = handle_message(r#"{ "payload": {}, "correlationId": "req-4" }"#);
        assert_eq!(response.correlation_id.as_deref(), Some("req-4"));
        assert!(response.error.is_some());
    }

    #[test]
    fn compute_distance_matches_in_process() {
        let route = route();
        let response = handle_message(&request("computeDistance", json!({ "route": route }), "d"));
        assert_eq!(response.result_tag, "distanceComputed");
        let output: ComputedDistance = serde_json::from_value(response.payload).unwrap();
        assert_eq!(output.distance_meters, route_length(route.points()));
    }

    #[test]
    fn interpolate_matches_in_process() {
        let route = route();
        let response = handle_message(&request(
            "interpolatePosition",
            json!({ "route": route, "progress": 0.3 }),
            "i",
        ));
        let sample: crate::RouteSample = serde_json::from_value(response.payload).unwrap();
        assert_eq!(sample, route.sample(0.3));
    }

    #[test]
    fn simplify_counts() {
        let route = route();
        let response = handle_message(&request(
            "simplifyRoute",
            json!({ "route": route, "toleranceMeters": 100000.0 }),
            "s",
        ));
        let output: SimplifiedRoute = serde_json::from_value(response.payload).unwrap();
        assert_eq!(output.original_count, 3);
        assert_eq!(output.simplified_count, 2);
    }

    #[test]
    fn nearest_point() {
        let response = handle_message(&request(
            "nearestPoint",
            json!({ "target": [29.0892, -110.9614], "candidates": route() }),
            "n",
        ));
        let found: crate::math::Nearest = serde_json::from_value(response.payload).unwrap();
        assert_eq!(found.index, 1);
        assert_eq!(found.distance, 0.0);

        let response = handle_message(&request(
            "nearestPoint",
            json!({ "target": [29.0892, -110.9614], "candidates": [] }),
            "n2",
        ));
        assert_eq!(response.result_tag, ERROR_TAG);
        assert_eq!(response.correlation_id.as_deref(), Some("n2"));
    }

    #[test]
    fn compose_without_sources() {
        let response = handle_message(&request(
            "composeRoute",
            json!({ "origin": [29.0729, -110.9559], "destination": [29.0969, -110.9544], "sourceRoutes": [] }),
            "c",
        ));
        let output: ComposedRoute = serde_json::from_value(response.payload).unwrap();
        assert_eq!(output.route.len(), 2);
        assert_eq!(output.length, output.route.length());
    }
}
