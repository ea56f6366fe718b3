//! Serialized path request coordinator.
//!
//! Any number of callers can submit requests; a single worker task runs
//! them one at a time, in submission order, against the one [`Pathfinder`]
//! it owns. The search itself is CPU-bound and runs on the blocking pool;
//! the pathfinder moves into that blocking task and back, so node search
//! state never has two writers and needs no lock.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;
use waygrid_core::{FailureReason, PathResult, Pathfinder, WorldPoint};

/// Queue depth above which each new submission logs a warning.
pub const DEFAULT_BACKLOG_WARN_THRESHOLD: u64 = 64;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("path coordinator is closed")]
    Closed,
    #[error("path worker failed: {0}")]
    WorkerFailed(String),
}

/// Identity assigned to every accepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub backlog_warn_threshold: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            backlog_warn_threshold: DEFAULT_BACKLOG_WARN_THRESHOLD,
        }
    }
}

type Completion = Box<dyn FnOnce(PathResult) + Send + 'static>;

struct PathRequest {
    id: RequestId,
    start: WorldPoint,
    goal: WorldPoint,
    completion: Completion,
}

#[derive(Debug, Default)]
struct StatsCounters {
    submitted: AtomicU64,
    completed: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl StatsCounters {
    fn begin(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    fn finish(&self, success: bool) {
        if success {
            self.succeeded.fetch_add(1, Ordering::SeqCst);
        } else {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
        self.completed.fetch_add(1, Ordering::SeqCst);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn snapshot(&self) -> CoordinatorStats {
        let submitted = self.submitted.load(Ordering::SeqCst);
        let completed = self.completed.load(Ordering::SeqCst);
        let in_flight = self.in_flight.load(Ordering::SeqCst);
        CoordinatorStats {
            submitted,
            completed,
            succeeded: self.succeeded.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            queued: submitted
                .saturating_sub(completed)
                .saturating_sub(in_flight as u64),
            in_flight,
            peak_in_flight: self.peak_in_flight.load(Ordering::SeqCst),
        }
    }
}

/// Point-in-time view of coordinator activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorStats {
    pub submitted: u64,
    pub completed: u64,
    pub succeeded: u64,
    pub failed: u64,
    /// Accepted but not yet started
    pub queued: u64,
    pub in_flight: usize,
    /// Highest in-flight count ever observed; a serialized worker keeps this at 1
    pub peak_in_flight: usize,
}

/// Owning handle to the request queue and its worker.
pub struct PathCoordinator {
    sender: mpsc::UnboundedSender<PathRequest>,
    stats: Arc<StatsCounters>,
    worker: JoinHandle<Result<Pathfinder, CoordinatorError>>,
    config: CoordinatorConfig,
}

impl PathCoordinator {
    /// Start the worker on the current tokio runtime.
    pub fn spawn(pathfinder: Pathfinder) -> Self {
        Self::with_config(pathfinder, CoordinatorConfig::default())
    }

    pub fn with_config(pathfinder: Pathfinder, config: CoordinatorConfig) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let stats = Arc::new(StatsCounters::default());
        let worker = tokio::spawn(run_worker(pathfinder, receiver, stats.clone()));

        tracing::info!(
            backlog_warn_threshold = config.backlog_warn_threshold,
            "Path coordinator started"
        );
        Self {
            sender,
            stats,
            worker,
            config,
        }
    }

    /// Queue a request; `completion` runs on the worker once the search is done.
    ///
    /// Never blocks. Completions run in submission order.
    pub fn submit<F>(&self, start: WorldPoint, goal: WorldPoint, completion: F) -> Result<RequestId, CoordinatorError>
    where
        F: FnOnce(PathResult) + Send + 'static,
    {
        let id = RequestId::new();
        // Count before sending so the worker can never complete an uncounted request
        self.stats.submitted.fetch_add(1, Ordering::SeqCst);
        let request = PathRequest {
            id,
            start,
            goal,
            completion: Box::new(completion),
        };
        if self.sender.send(request).is_err() {
            self.stats.submitted.fetch_sub(1, Ordering::SeqCst);
            return Err(CoordinatorError::Closed);
        }

        let queued = self.stats.snapshot().queued;
        if queued > self.config.backlog_warn_threshold {
            tracing::warn!(%id, queued, "Path request backlog is growing");
        } else {
            tracing::debug!(%id, queued, "Queued path request");
        }
        Ok(id)
    }

    /// Queue a request and get a future for its result.
    pub fn request(&self, start: WorldPoint, goal: WorldPoint) -> Result<PathTicket, CoordinatorError> {
        let (tx, rx) = oneshot::channel();
        let id = self.submit(start, goal, move |result| {
            // Receiver may have been dropped by an uninterested caller
            let _ = tx.send(result);
        })?;
        Ok(PathTicket { id, receiver: rx })
    }

    pub fn stats(&self) -> CoordinatorStats {
        self.stats.snapshot()
    }

    /// Stop accepting requests, finish everything already queued and hand
    /// the pathfinder back.
    ///
    /// Fails with [`CoordinatorError::WorkerFailed`] if a search or a
    /// completion panicked along the way. After a search panic every request
    /// still queued completes with [`FailureReason::Aborted`].
    pub async fn shutdown(self) -> Result<Pathfinder, CoordinatorError> {
        let Self {
            sender,
            stats,
            worker,
            ..
        } = self;
        drop(sender);

        let outcome = match worker.await {
            Ok(outcome) => outcome,
            Err(err) => Err(CoordinatorError::WorkerFailed(err.to_string())),
        };
        let stats = stats.snapshot();
        tracing::info!(
            completed = stats.completed,
            succeeded = stats.succeeded,
            failed = stats.failed,
            ok = outcome.is_ok(),
            "Path coordinator stopped"
        );
        outcome
    }
}

/// Future resolving to the result of one queued request.
///
/// Resolves to [`CoordinatorError::Closed`] only if the worker task itself
/// was lost before reaching the request.
#[derive(Debug)]
pub struct PathTicket {
    id: RequestId,
    receiver: oneshot::Receiver<PathResult>,
}

impl PathTicket {
    pub fn id(&self) -> RequestId {
        self.id
    }
}

impl Future for PathTicket {
    type Output = Result<PathResult, CoordinatorError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.map_err(|_| CoordinatorError::Closed))
    }
}

async fn run_worker(
    mut pathfinder: Pathfinder,
    mut receiver: mpsc::UnboundedReceiver<PathRequest>,
    stats: Arc<StatsCounters>,
) -> Result<Pathfinder, CoordinatorError> {
    // First completion panic; later requests still run, shutdown reports it
    let mut failure = None;

    while let Some(request) = receiver.recv().await {
        let PathRequest {
            id,
            start,
            goal,
            completion,
        } = request;

        stats.begin();
        let searched = tokio::task::spawn_blocking(move || {
            let result = pathfinder.search(start, goal);
            (pathfinder, result)
        })
        .await;
        let (returned, result) = match searched {
            Ok(searched) => searched,
            Err(err) => {
                // The pathfinder went down with the search; nothing else can run
                tracing::error!(%id, error = %err, "Path search panicked; abandoning queue");
                let _ = complete_request(&stats, id, PathResult::failed(FailureReason::Aborted, 0), completion);
                let abandoned = abandon_queue(&mut receiver, &stats).await;
                return Err(CoordinatorError::WorkerFailed(format!(
                    "search for request {id} failed: {err}; {abandoned} queued requests abandoned"
                )));
            }
        };
        pathfinder = returned;

        if let Err(err) = complete_request(&stats, id, result, completion) {
            tracing::error!(%id, error = %err, "Path request completion failed");
            failure.get_or_insert(err);
        }
        tokio::task::yield_now().await;
    }

    tracing::debug!("Path request queue drained");
    match failure {
        Some(err) => Err(err),
        None => Ok(pathfinder),
    }
}

/// Close the queue and fail every request still in it, in order.
///
/// Each abandoned request still goes through [`complete_request`], so its
/// completion runs and the stats settle.
async fn abandon_queue(receiver: &mut mpsc::UnboundedReceiver<PathRequest>, stats: &StatsCounters) -> usize {
    receiver.close();
    let mut abandoned = 0;
    while let Some(request) = receiver.recv().await {
        let id = request.id;
        tracing::warn!(%id, "Abandoning queued path request");
        stats.begin();
        if let Err(err) = complete_request(stats, id, PathResult::failed(FailureReason::Aborted, 0), request.completion) {
            tracing::error!(%id, error = %err, "Path request completion failed");
        }
        abandoned += 1;
    }
    abandoned
}

/// The one place a request finishes: stats are settled first so anyone
/// woken by the completion sees them up to date.
fn complete_request(
    stats: &StatsCounters,
    id: RequestId,
    result: PathResult,
    completion: Completion,
) -> Result<(), CoordinatorError> {
    stats.finish(result.success);
    tracing::debug!(
        %id,
        success = result.success,
        nodes_visited = result.nodes_visited,
        "Completed path request"
    );

    catch_unwind(AssertUnwindSafe(move || completion(result)))
        .map_err(|_| CoordinatorError::WorkerFailed(format!("completion for request {id} panicked")))
}
