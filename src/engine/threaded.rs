//! In-process engine
//!
//! Runs on its own thread with a dedicated single-threaded runtime, the same
//! way a native engine calls back from threads the client does not own.
//! Requests are answered by a pluggable [`Responder`].

use super::NativeEngine;
use crate::bridge::{CompletionSink, CorrelationHandle};
use crate::cluster::{ClusterTopology, SharedTopology};
use crate::error::RequestErrorKind;
use crate::protocol::{CommandRequest, RawResponse};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// How the engine answers one request
#[derive(Debug, Clone, PartialEq)]
pub enum EngineReply {
    Success(RawResponse),
    Failure {
        kind: RequestErrorKind,
        message: String,
    },
    /// Answer after a delay, without holding up other requests
    Delayed(Duration, Box<EngineReply>),
    /// Never answer
    Silent,
}

impl EngineReply {
    pub fn failure(kind: RequestErrorKind, message: impl Into<String>) -> Self {
        EngineReply::Failure {
            kind,
            message: message.into(),
        }
    }

    pub fn delayed(delay: Duration, reply: EngineReply) -> Self {
        EngineReply::Delayed(delay, Box::new(reply))
    }

    /// Total delay before the answer, and the answer itself
    fn settle(self) -> (Duration, EngineReply) {
        let mut delay = Duration::ZERO;
        let mut reply = self;
        while let EngineReply::Delayed(extra, inner) = reply {
            delay = delay.saturating_add(extra);
            reply = *inner;
        }
        (delay, reply)
    }
}

/// Produces the answer to each request, called on the engine thread
pub trait Responder: Send + 'static {
    fn respond(&mut self, request: &CommandRequest) -> EngineReply;
}

impl<F> Responder for F
where
    F: FnMut(&CommandRequest) -> EngineReply + Send + 'static,
{
    fn respond(&mut self, request: &CommandRequest) -> EngineReply {
        self(request)
    }
}

/// A request handed to the engine thread
struct Job {
    handle: CorrelationHandle,
    request: CommandRequest,
}

/// Engine running on a dedicated thread
pub struct ThreadedEngine {
    /// Channel to the engine thread, taken on close
    jobs: Mutex<Option<mpsc::UnboundedSender<Job>>>,

    /// Used to fail submissions once the thread is gone
    completions: CompletionSink,

    topology: SharedTopology,
}

impl ThreadedEngine {
    /// Start the engine thread
    pub fn spawn<R: Responder>(
        completions: CompletionSink,
        topology: SharedTopology,
        responder: R,
    ) -> anyhow::Result<Self> {
        let (jobs_tx, jobs_rx) = mpsc::unbounded_channel();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let loop_completions = completions.clone();
        std::thread::Builder::new()
            .name("ferrumlink-engine".to_string())
            .spawn(move || {
                runtime.block_on(Self::run_engine_loop(jobs_rx, loop_completions, responder));
            })?;

        info!("Engine thread started");

        Ok(ThreadedEngine {
            jobs: Mutex::new(Some(jobs_tx)),
            completions,
            topology,
        })
    }

    /// The main loop that runs in the engine's thread
    ///
    /// Delayed answers still pending when the job channel closes are
    /// delivered before the loop returns.
    async fn run_engine_loop<R: Responder>(
        mut jobs: mpsc::UnboundedReceiver<Job>,
        completions: CompletionSink,
        mut responder: R,
    ) {
        info!("Engine loop starting");
        let mut delayed = JoinSet::new();

        loop {
            tokio::select! {
                job = jobs.recv() => {
                    let Some(job) = job else { break };
                    debug!(
                        handle = %job.handle,
                        command = %job.request.request_type,
                        "Engine received request"
                    );
                    let (delay, reply) = responder.respond(&job.request).settle();
                    if delay.is_zero() {
                        Self::deliver(&completions, job.handle, reply);
                    } else {
                        let completions = completions.clone();
                        delayed.spawn(async move {
                            tokio::time::sleep(delay).await;
                            Self::deliver(&completions, job.handle, reply);
                        });
                    }
                }
                Some(_) = delayed.join_next(), if !delayed.is_empty() => {}
            }
        }

        if !delayed.is_empty() {
            info!(pending = delayed.len(), "Engine draining delayed replies");
        }
        while delayed.join_next().await.is_some() {}

        info!("Engine shutting down");
    }

    fn deliver(completions: &CompletionSink, handle: CorrelationHandle, reply: EngineReply) {
        match reply {
            EngineReply::Success(raw) => completions.success(handle, raw),
            EngineReply::Failure { kind, message } => completions.failure(handle, message, kind),
            EngineReply::Silent | EngineReply::Delayed(..) => {
                debug!(handle = %handle, "Engine left request unanswered")
            }
        }
    }
}

impl NativeEngine for ThreadedEngine {
    fn submit(&self, handle: CorrelationHandle, request: &CommandRequest) {
        let job = Job {
            handle,
            request: request.clone(),
        };

        let sent = match self.jobs.lock().as_ref() {
            Some(jobs) => jobs.send(job).is_ok(),
            None => false,
        };

        if !sent {
            error!(handle = %handle, "Engine thread is gone, failing request");
            self.completions
                .failure(handle, "engine is not running", RequestErrorKind::Disconnect);
        }
    }

    fn topology(&self) -> Arc<ClusterTopology> {
        self.topology.snapshot()
    }

    fn close(&self) {
        if self.jobs.lock().take().is_some() {
            info!("Engine closed");
        }
    }
}

impl Drop for ThreadedEngine {
    fn drop(&mut self) {
        debug!("Engine dropped");
    }
}
