// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound action queue.
//!
//! # Lanes
//!
//! Requests are routed to one of two lanes: chat actions and history
//! fetches. Each lane is a FIFO queue drained by its own worker, with at
//! most `lane_concurrency` requests in flight. With the default concurrency
//! of one, requests of a lane run strictly one after another and their
//! completions are delivered in submission order. The two lanes run
//! independently, so a slow history page never holds up a sent message.
//!
//! # Lifecycle
//!
//! ```text
//! start() ──► queue N ──► stop() ──► (no queue) ──► start() ──► queue N+1
//! ```
//!
//! `stop()` drops queued work that has not started. Requests already on the
//! wire finish and deliver their completion through the guarded executor.
//! Enqueueing while stopped is a caller bug and fails fast with
//! [`ActionError::NotStarted`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::sync::{mpsc, oneshot, watch, Semaphore};
use tracing::{debug, error, warn};

use cs_core::protocol::{Parameter, ServerErrorCode, ServerPath};

use crate::executor::GuardedCallbackExecutor;
use crate::transport::{Transport, TransportError, TransportRequest};

/// Error type for action requests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// The loop was not started (or was stopped) when the request arrived.
    #[error("action loop is not running")]
    NotStarted,

    /// Non-retryable transport failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A transient failure persisted through every retry.
    #[error("gave up after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: TransportError,
    },

    /// The server rejected the request.
    #[error("server error: {0}")]
    Server(ServerErrorCode),

    /// The response could not be interpreted.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The request was dropped before completing (loop stopped or session
    /// destroyed).
    #[error("request cancelled")]
    Cancelled,

    /// The request was rejected locally before it was enqueued.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type for action requests.
pub type ActionResult<T> = Result<T, ActionError>;

/// Completion invoked exactly once with the request's outcome.
pub type Completion = Box<dyn FnOnce(ActionResult<Value>) + Send>;

/// Which lane a request runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    Action,
    History,
}

/// One outbound request.
pub struct ActionRequest {
    lane: Lane,
    path: ServerPath,
    params: Map<String, Value>,
    completion: Option<Completion>,
}

impl ActionRequest {
    /// Creates a request on the action lane addressed to the action path.
    pub fn action() -> Self {
        ActionRequest::new(Lane::Action, ServerPath::Action)
    }

    /// Creates a request on the history lane addressed to the history path.
    pub fn history() -> Self {
        ActionRequest::new(Lane::History, ServerPath::History)
    }

    pub fn new(lane: Lane, path: ServerPath) -> Self {
        ActionRequest {
            lane,
            path,
            params: Map::new(),
            completion: None,
        }
    }

    /// Sets a parameter.
    pub fn param(mut self, key: Parameter, value: impl Into<Value>) -> Self {
        self.params.insert(key.as_wire().to_string(), value.into());
        self
    }

    /// Sets the completion, replacing any previous one.
    pub fn on_complete(mut self, completion: impl FnOnce(ActionResult<Value>) + Send + 'static) -> Self {
        self.completion = Some(Box::new(completion));
        self
    }

    pub fn lane(&self) -> Lane {
        self.lane
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }
}

impl fmt::Debug for ActionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRequest")
            .field("lane", &self.lane)
            .field("path", &self.path)
            .field("params", &self.params)
            .field("has_completion", &self.completion.is_some())
            .finish()
    }
}

/// Bounded exponential backoff for transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
        }
    }
}

/// Identifies one started queue. A restart yields a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueueId(u64);

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "queue-{}", self.0)
    }
}

struct LoopQueue {
    id: QueueId,
    action: mpsc::UnboundedSender<ActionRequest>,
    history: mpsc::UnboundedSender<ActionRequest>,
    stop: watch::Sender<bool>,
}

impl LoopQueue {
    fn sender(&self, lane: Lane) -> &mpsc::UnboundedSender<ActionRequest> {
        match lane {
            Lane::Action => &self.action,
            Lane::History => &self.history,
        }
    }
}

/// Shared by every worker of the loop.
struct Worker {
    transport: Arc<dyn Transport>,
    executor: GuardedCallbackExecutor,
    policy: RetryPolicy,
}

/// Stoppable two-lane request queue with retry.
pub struct ActionRequestLoop {
    worker: Arc<Worker>,
    lane_concurrency: usize,
    queue: Mutex<Option<LoopQueue>>,
    next_queue_id: AtomicU64,
}

impl ActionRequestLoop {
    pub fn new(
        transport: Arc<dyn Transport>,
        executor: GuardedCallbackExecutor,
        policy: RetryPolicy,
        lane_concurrency: usize,
    ) -> Self {
        ActionRequestLoop {
            worker: Arc::new(Worker {
                transport,
                executor,
                policy,
            }),
            lane_concurrency: lane_concurrency.max(1),
            queue: Mutex::new(None),
            next_queue_id: AtomicU64::new(1),
        }
    }

    /// Starts the loop if it is not running and returns the active queue id.
    ///
    /// Calling this on a running loop leaves the queue and its pending work
    /// untouched. Must be called from within a tokio runtime.
    pub fn start(&self) -> QueueId {
        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(active) = queue.as_ref() {
            return active.id;
        }

        let id = QueueId(self.next_queue_id.fetch_add(1, Ordering::Relaxed));
        let (stop, stop_rx) = watch::channel(false);
        let (action, action_rx) = mpsc::unbounded_channel();
        let (history, history_rx) = mpsc::unbounded_channel();

        for (lane, rx) in [(Lane::Action, action_rx), (Lane::History, history_rx)] {
            tokio::spawn(run_lane(
                lane,
                rx,
                stop_rx.clone(),
                Arc::clone(&self.worker),
                self.lane_concurrency,
            ));
        }

        debug!(%id, "action loop started");
        *queue = Some(LoopQueue {
            id,
            action,
            history,
            stop,
        });
        id
    }

    /// Stops the loop. Returns false if it was not running.
    pub fn stop(&self) -> bool {
        let queue = self.queue.lock().unwrap_or_else(|e| e.into_inner()).take();
        match queue {
            Some(queue) => {
                let _ = queue.stop.send(true);
                debug!(id = %queue.id, "action loop stopped");
                true
            }
            None => false,
        }
    }

    /// Returns the id of the running queue, if any.
    pub fn queue_id(&self) -> Option<QueueId> {
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|q| q.id)
    }

    pub fn is_running(&self) -> bool {
        self.queue_id().is_some()
    }

    /// Appends a request to its lane.
    ///
    /// On error the request is dropped and its completion never runs. Once
    /// accepted, the completion runs exactly once: with the response, or
    /// with [`ActionError::Cancelled`] if the loop stops before the request
    /// is sent.
    pub fn enqueue(&self, request: ActionRequest) -> ActionResult<()> {
        let queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        let Some(active) = queue.as_ref() else {
            error!(?request, "enqueue on a stopped action loop");
            return Err(ActionError::NotStarted);
        };
        active
            .sender(request.lane)
            .send(request)
            .map_err(|_| ActionError::NotStarted)
    }

    /// Enqueues a request and waits for its outcome.
    ///
    /// Any completion already set on the request is replaced.
    pub async fn submit(&self, request: ActionRequest) -> ActionResult<Value> {
        let (tx, rx) = oneshot::channel();
        self.enqueue(request.on_complete(move |result| {
            let _ = tx.send(result);
        }))?;
        rx.await.unwrap_or(Err(ActionError::Cancelled))
    }
}

impl Drop for ActionRequestLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_lane(
    lane: Lane,
    mut rx: mpsc::UnboundedReceiver<ActionRequest>,
    mut stop: watch::Receiver<bool>,
    worker: Arc<Worker>,
    concurrency: usize,
) {
    let permits = Arc::new(Semaphore::new(concurrency));
    loop {
        let request = tokio::select! {
            biased;
            _ = stop.changed() => break,
            request = rx.recv() => match request {
                Some(request) => request,
                None => break,
            },
        };

        let permit = tokio::select! {
            biased;
            _ = stop.changed() => {
                worker.cancel(request);
                break;
            }
            permit = Arc::clone(&permits).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => {
                    worker.cancel(request);
                    break;
                }
            },
        };

        let worker = Arc::clone(&worker);
        let stop = stop.clone();
        tokio::spawn(async move {
            worker.execute(request, stop).await;
            drop(permit);
        });
    }

    // Everything still queued gets its terminal outcome.
    rx.close();
    let mut cancelled = 0;
    while let Ok(request) = rx.try_recv() {
        worker.cancel(request);
        cancelled += 1;
    }
    debug!(?lane, cancelled, "lane worker exiting");
}

impl Worker {
    fn cancel(&self, request: ActionRequest) {
        if let Some(completion) = request.completion {
            self.executor
                .execute(move || completion(Err(ActionError::Cancelled)));
        }
    }

    async fn execute(&self, request: ActionRequest, stop: watch::Receiver<bool>) {
        let ActionRequest {
            path,
            params,
            completion,
            ..
        } = request;
        let result = self.perform(path, params, &stop).await;
        if let Err(e) = &result {
            debug!(?path, "request failed: {}", e);
        }
        if let Some(completion) = completion {
            self.executor.execute(move || completion(result));
        }
    }

    async fn perform(
        &self,
        path: ServerPath,
        params: Map<String, Value>,
        stop: &watch::Receiver<bool>,
    ) -> ActionResult<Value> {
        let mut attempts = 0;
        let mut delay = self.policy.initial_delay;
        loop {
            attempts += 1;
            let request = TransportRequest {
                path,
                params: params.clone(),
            };
            let err = match self.transport.send(request).await {
                Ok(body) => return interpret(body),
                Err(e) => e,
            };

            if !err.is_transient() {
                return Err(ActionError::Transport(err));
            }
            if attempts > self.policy.max_retries {
                return Err(ActionError::RetriesExhausted {
                    attempts,
                    source: err,
                });
            }
            if *stop.borrow() {
                return Err(ActionError::Transport(err));
            }

            warn!(?path, attempts, "transient failure, retrying in {:?}: {}", delay, err);
            tokio::time::sleep(delay).await;
            delay = next_delay(delay, self.policy.max_delay);
        }
    }
}

/// Doubles `delay`, capped at `max`.
fn next_delay(delay: Duration, max: Duration) -> Duration {
    std::cmp::min(delay.saturating_mul(2), max)
}

/// Maps a response body to the request outcome.
fn interpret(body: Value) -> ActionResult<Value> {
    if !body.is_object() {
        return Err(ActionError::MalformedResponse(format!(
            "expected an object, got {body}"
        )));
    }
    if let Some(code) = ServerErrorCode::from_response(&body) {
        return Err(ActionError::Server(code));
    }
    Ok(body)
}

#[cfg(test)]
#[path = "action_loop_tests.rs"]
mod tests;
