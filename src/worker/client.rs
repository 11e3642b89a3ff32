use super::protocol::*;
use super::{spawn_worker, WorkerChannel};
use crate::math::{GeoPoint, Nearest};
use crate::route::{Route, RouteSample};
use crate::RequestId;
use anyhow::{anyhow, bail, Context, Result};
use futures_channel::mpsc::{UnboundedReceiver, UnboundedSender};
use futures_channel::oneshot;
use futures_lite::future::block_on;
use futures_lite::StreamExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use slotmap::{Key, KeyData, SlotMap};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

/// A handle to a route worker running on its own thread.
///
/// Each call returns a future that resolves once the worker answers.
/// Calls made before the worker is ready are queued and sent when it is.
pub struct RouteWorker {
    shared: Arc<Mutex<Shared>>,
    requests: UnboundedSender<String>,
    worker: Option<JoinHandle<()>>,
    listener: Option<JoinHandle<()>>,
}

/// State shared with the listener thread.
struct Shared {
    /// Whether the worker has sent its ready signal.
    ready: bool,
    /// Requests waiting for the ready signal.
    queued: Vec<String>,
    /// Requests awaiting a response.
    pending: SlotMap<RequestId, Pending>,
    /// Advanced by [RouteWorker::discard_pending].
    epoch: u64,
}

struct Pending {
    operation: Operation,
    reply: oneshot::Sender<Result<Value>>,
}

impl RouteWorker {
    /// Spawns a worker and the thread that listens to it.
    pub fn spawn() -> Result<Self> {
        let WorkerChannel {
            requests,
            responses,
            thread,
        } = spawn_worker()?;
        Self::attach(requests, responses, Some(thread))
    }

    /// Starts listening to a worker reachable through the given channels.
    fn attach(
        requests: UnboundedSender<String>,
        responses: UnboundedReceiver<String>,
        worker: Option<JoinHandle<()>>,
    ) -> Result<Self> {
        let shared = Arc::new(Mutex::new(Shared {
            ready: false,
            queued: vec![],
            pending: SlotMap::with_key(),
            epoch: 0,
        }));
        let listener = {
            let shared = Arc::clone(&shared);
            let requests = requests.clone();
            thread::Builder::new()
                .name("route-worker-listener".to_string())
                .spawn(move || listen(shared, requests, responses))
                .context("couldn't spawn the route worker listener")?
        };
        Ok(Self {
            shared,
            requests,
            worker,
            listener: Some(listener),
        })
    }

    /// Whether the worker has signalled that it's ready.
    pub fn is_ready(&self) -> bool {
        lock(&self.shared).ready
    }

    /// The number of requests awaiting a response.
    pub fn in_flight(&self) -> usize {
        lock(&self.shared).pending.len()
    }

    /// The current epoch.
    pub fn epoch(&self) -> u64 {
        lock(&self.shared).epoch
    }

    /// Gives up on every outstanding request.
    ///
    /// Their futures resolve to an error, and any response that arrives for
    /// them later is dropped. Returns the new epoch.
    pub fn discard_pending(&self) -> u64 {
        let mut shared = lock(&self.shared);
        shared.epoch += 1;
        let discarded = shared.pending.len();
        // Dropping the reply senders cancels the futures
        shared.pending.clear();
        shared.queued.clear();
        log::debug!(
            "Discarded {} pending requests, now at epoch {}",
            discarded,
            shared.epoch
        );
        shared.epoch
    }

    /// Composes a route between two points; see [crate::RouteComposer::compose].
    pub fn compose_route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        source_routes: Vec<Route>,
        max_points: usize,
    ) -> impl Future<Output = Result<ComposedRoute>> {
        self.call(
            Operation::ComposeRoute,
            ComposeRouteInput {
                origin,
                destination,
                source_routes,
                max_points,
            },
        )
    }

    /// Simplifies a route; see [Route::simplify].
    pub fn simplify_route(
        &self,
        route: Route,
        tolerance_meters: f64,
    ) -> impl Future<Output = Result<SimplifiedRoute>> {
        self.call(
            Operation::SimplifyRoute,
            SimplifyRouteInput {
                route,
                tolerance_meters,
            },
        )
    }

    /// Samples a route; see [Route::sample].
    pub fn interpolate_position(
        &self,
        route: Route,
        progress: f64,
    ) -> impl Future<Output = Result<RouteSample>> {
        self.call(
            Operation::InterpolatePosition,
            InterpolatePositionInput { route, progress },
        )
    }

    /// Measures the length of a route in m.
    pub fn compute_distance(&self, route: Route) -> impl Future<Output = Result<f64>> {
        let result = self.call::<_, ComputedDistance>(
            Operation::ComputeDistance,
            ComputeDistanceInput { route },
        );
        async move { Ok(result.await?.distance_meters) }
    }

    /// Finds the candidate closest to `target`.
    pub fn nearest_point(
        &self,
        target: GeoPoint,
        candidates: Vec<GeoPoint>,
    ) -> impl Future<Output = Result<Nearest>> {
        self.call(
            Operation::NearestPoint,
            NearestPointInput { target, candidates },
        )
    }

    /// Sends a request, returning a future that resolves to its output.
    fn call<I: Serialize, T: DeserializeOwned>(
        &self,
        operation: Operation,
        input: I,
    ) -> impl Future<Output = Result<T>> {
        let (reply, receiver) = oneshot::channel();
        let sent = self.send(operation, input, reply);
        async move {
            sent?;
            let payload = receiver
                .await
                .map_err(|_| anyhow!("{} request discarded", operation.name()))??;
            serde_json::from_value(payload)
                .with_context(|| format!("unexpected {} output", operation.name()))
        }
    }

    fn send<I: Serialize>(
        &self,
        operation: Operation,
        input: I,
        reply: oneshot::Sender<Result<Value>>,
    ) -> Result<()> {
        let payload = serde_json::to_value(input)?;
        let mut shared = lock(&self.shared);
        let epoch = shared.epoch;
        let id = shared.pending.insert(Pending { operation, reply });
        let raw = serde_json::to_string(&Request::new(
            operation,
            payload,
            correlation_id(epoch, id),
        ))?;
        if !shared.ready {
            shared.queued.push(raw);
            return Ok(());
        }
        if self.requests.unbounded_send(raw).is_err() {
            shared.pending.remove(id);
            bail!("the route worker has stopped");
        }
        Ok(())
    }
}

impl Drop for RouteWorker {
    fn drop(&mut self) {
        self.requests.close_channel();
        for handle in [self.worker.take(), self.listener.take()].into_iter().flatten() {
            if handle.join().is_err() {
                log::warn!("A route worker thread panicked");
            }
        }
    }
}

fn correlation_id(epoch: u64, id: RequestId) -> String {
    format!("{}:{}", epoch, id.data().as_ffi())
}

fn parse_correlation_id(raw: &str) -> Option<(u64, RequestId)> {
    let (epoch, ffi) = raw.split_once(':')?;
    let epoch = epoch.parse().ok()?;
    let ffi = ffi.parse().ok()?;
    Some((epoch, KeyData::from_ffi(ffi).into()))
}

/// Resolves pending requests as responses come in.
fn listen(
    shared: Arc<Mutex<Shared>>,
    requests: UnboundedSender<String>,
    mut responses: UnboundedReceiver<String>,
) {
    while let Some(raw) = block_on(responses.next()) {
        let response: Response = match serde_json::from_str(&raw) {
            Ok(response) => response,
            Err(err) => {
                log::warn!("Malformed worker response: {err}");
                continue;
            }
        };

        let mut shared = lock(&shared);
        if response.is_ready() {
            log::info!("Route worker ready");
            shared.ready = true;
            for raw in shared.queued.drain(..) {
                // Fails only once the client is being dropped
                let _ = requests.unbounded_send(raw);
            }
            continue;
        }

        let Some((epoch, id)) = response
            .correlation_id
            .as_deref()
            .and_then(parse_correlation_id)
        else {
            log::warn!(
                "Worker response without a usable correlation id: {:?}",
                response.error
            );
            continue;
        };
        if epoch != shared.epoch {
            log::debug!("Dropping stale response from epoch {epoch}");
            continue;
        }
        let Some(pending) = shared.pending.remove(id) else {
            log::debug!("Dropping response to an unknown request");
            continue;
        };

        let result = match response.error {
            Some(error) => Err(anyhow!(error)),
            None if response.result_tag != pending.operation.result_tag() => Err(anyhow!(
                "expected {} but the worker answered {}",
                pending.operation.result_tag(),
                response.result_tag
            )),
            None => Ok(response.payload),
        };
        // The caller may have stopped waiting
        let _ = pending.reply.send(result);
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}
