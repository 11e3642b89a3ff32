//! The messages exchanged with the route worker.
//!
//! Every message crosses the thread boundary as a JSON string, so the two
//! sides never share memory.

use crate::math::GeoPoint;
use crate::route::Route;
use anyhow::bail;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// The result tag of the message a worker sends once it's ready.
pub const READY_TAG: &str = "ready";

/// The result tag of a failed request.
pub const ERROR_TAG: &str = "error";

/// The operations a worker can perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    ComposeRoute,
    SimplifyRoute,
    InterpolatePosition,
    ComputeDistance,
    NearestPoint,
}

impl Operation {
    /// The name of the operation on the wire.
    pub fn name(self) -> &'static str {
        match self {
            Operation::ComposeRoute => "composeRoute",
            Operation::SimplifyRoute => "simplifyRoute",
            Operation::InterpolatePosition => "interpolatePosition",
            Operation::ComputeDistance => "computeDistance",
            Operation::NearestPoint => "nearestPoint",
        }
    }

    /// The tag of a successful response to the operation.
    pub fn result_tag(self) -> &'static str {
        match self {
            Operation::ComposeRoute => "routeComposed",
            Operation::SimplifyRoute => "routeSimplified",
            Operation::InterpolatePosition => "positionInterpolated",
            Operation::ComputeDistance => "distanceComputed",
            Operation::NearestPoint => "nearestPointFound",
        }
    }
}

impl FromStr for Operation {
    type Err = anyhow::Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Ok(match name {
            "composeRoute" => Operation::ComposeRoute,
            "simplifyRoute" => Operation::SimplifyRoute,
            "interpolatePosition" => Operation::InterpolatePosition,
            "computeDistance" => Operation::ComputeDistance,
            "nearestPoint" => Operation::NearestPoint,
            _ => bail!("Unknown operation: {name}"),
        })
    }
}

/// A request to the worker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// The name of the operation; see [Operation::name].
    pub operation: String,
    /// The operation's input.
    pub payload: Value,
    /// Echoed back in the response.
    pub correlation_id: String,
}

impl Request {
    pub fn new(operation: Operation, payload: Value, correlation_id: String) -> Self {
        Self {
            operation: operation.name().to_string(),
            payload,
            correlation_id,
        }
    }
}

/// A message from the worker: either a response to a request,
/// or the unsolicited ready signal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// Identifies the kind of message.
    pub result_tag: String,
    /// The operation's output; null on failure.
    #[serde(default)]
    pub payload: Value,
    /// The id of the request being answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// A human readable description of a failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    /// The ready signal.
    pub fn ready() -> Self {
        Self {
            result_tag: READY_TAG.to_string(),
            payload: Value::Null,
            correlation_id: None,
            error: None,
        }
    }

    /// A successful response.
    pub fn success(operation: Operation, payload: Value, correlation_id: Option<String>) -> Self {
        Self {
            result_tag: operation.result_tag().to_string(),
            payload,
            correlation_id,
            error: None,
        }
    }

    /// A failed response.
    pub fn failure(correlation_id: Option<String>, error: String) -> Self {
        Self {
            result_tag: ERROR_TAG.to_string(),
            payload: Value::Null,
            correlation_id,
            error: Some(error),
        }
    }

    /// Whether this is the ready signal.
    pub fn is_ready(&self) -> bool {
        self.result_tag == READY_TAG
    }
}

fn default_max_points() -> usize {
    20
}

/// Input to [Operation::ComposeRoute].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeRouteInput {
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    #[serde(default)]
    pub source_routes: Vec<Route>,
    #[serde(default = "default_max_points")]
    pub max_points: usize,
}

/// Output of [Operation::ComposeRoute].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposedRoute {
    pub route: Route,
    /// The length of the route in m.
    pub length: f64,
}

/// Input to [Operation::SimplifyRoute].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplifyRouteInput {
    pub route: Route,
    pub tolerance_meters: f64,
}

/// Output of [Operation::SimplifyRoute].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplifiedRoute {
    pub route: Route,
    pub original_count: usize,
    pub simplified_count: usize,
}

/// Input to [Operation::InterpolatePosition].
/// The output is a [crate::RouteSample].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpolatePositionInput {
    pub route: Route,
    pub progress: f64,
}

/// Input to [Operation::ComputeDistance].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeDistanceInput {
    pub route: Route,
}

/// Output of [Operation::ComputeDistance].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedDistance {
    pub distance_meters: f64,
}

/// Input to [Operation::NearestPoint].
/// The output is a [crate::math::Nearest].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearestPointInput {
    pub target: GeoPoint,
    pub candidates: Vec<GeoPoint>,
}
