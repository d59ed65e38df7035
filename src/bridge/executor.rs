//! Command executor
//!
//! Submits requests to the engine and awaits their completions. Any number
//! of tasks may share one executor; completions may arrive in any order and
//! each one reaches the caller whose handle it names.

use super::{Completion, CompletionSink, CorrelationHandle, CorrelationTable};
use crate::cluster::{reconcile, ClusterTopology, ClusterValue, Route, RouteSelector};
use crate::config::ExecutorConfig;
use crate::engine::NativeEngine;
use crate::error::{DecodeError, Error, Result};
use crate::protocol::{CommandRequest, RawResponse, RequestType, RouteDescriptor};
use crate::response::Reply;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Awaitable front end over a [`NativeEngine`]
pub struct CommandExecutor {
    engine: Arc<dyn NativeEngine>,

    table: Arc<CorrelationTable>,

    selector: RouteSelector,

    config: ExecutorConfig,

    /// Cancelled once by `close`
    closed: CancellationToken,
}

impl CommandExecutor {
    /// Create an executor around the engine built by `build`
    ///
    /// `build` receives the sink the engine must report completions to.
    pub fn new<E, F>(config: ExecutorConfig, build: F) -> Self
    where
        E: NativeEngine,
        F: FnOnce(CompletionSink) -> E,
    {
        let table = Arc::new(CorrelationTable::new(config.shard_amount()));
        let engine = build(CompletionSink::new(table.clone()));
        Self::assemble(config, table, Arc::new(engine))
    }

    /// Like [`new`](Self::new) for engines whose start-up can fail
    pub fn connect<E, F>(config: ExecutorConfig, build: F) -> anyhow::Result<Self>
    where
        E: NativeEngine,
        F: FnOnce(CompletionSink) -> anyhow::Result<E>,
    {
        let table = Arc::new(CorrelationTable::new(config.shard_amount()));
        let engine = build(CompletionSink::new(table.clone()))?;
        Ok(Self::assemble(config, table, Arc::new(engine)))
    }

    fn assemble(config: ExecutorConfig, table: Arc<CorrelationTable>, engine: Arc<dyn NativeEngine>) -> Self {
        info!(
            timeout = ?config.request_timeout(),
            shards = config.shard_amount(),
            "Command executor ready"
        );
        CommandExecutor {
            engine,
            table,
            selector: RouteSelector::new(),
            config,
            closed: CancellationToken::new(),
        }
    }

    /// Submit one request and wait for its raw completion
    pub async fn submit(
        &self,
        request_type: RequestType,
        args: Vec<Bytes>,
        route: Option<&Route>,
    ) -> Result<RawResponse> {
        if self.closed.is_cancelled() {
            return Err(Error::Closing("executor closed".to_string()));
        }

        let mut request = CommandRequest::new(request_type, args);
        if let Some(route) = route {
            request.route = Some(self.describe(route)?);
        }

        let (handle, rx) = self.table.register();

        // `close` may have run between the check above and the registration
        if self.closed.is_cancelled() {
            // Never reaches the engine, so nothing will complete it
            let _ = self.table.complete(handle, Err(Error::Closing("executor closed".to_string())));
            return Err(Error::Closing("executor closed".to_string()));
        }

        debug!(handle = %handle, command = %request_type, "Submitting request");
        self.engine.submit(handle, &request);

        self.wait(handle, rx).await
    }

    /// Resolve `route` against the engine's current topology
    fn describe(&self, route: &Route) -> Result<RouteDescriptor> {
        let topology = self.engine.topology();
        if topology.is_empty() {
            return Ok(RouteDescriptor {
                route: route.clone(),
                destinations: Vec::new(),
            });
        }

        let destinations = self.selector.resolve(route, &topology);
        if destinations.is_empty() {
            return Err(Error::Unroutable(route.to_string()));
        }

        Ok(RouteDescriptor {
            route: route.clone(),
            destinations: destinations.into_iter().collect(),
        })
    }

    async fn wait(&self, handle: CorrelationHandle, mut rx: oneshot::Receiver<Completion>) -> Result<RawResponse> {
        let received = match self.config.request_timeout() {
            Some(limit) => match tokio::time::timeout(limit, &mut rx).await {
                Ok(received) => received,
                Err(_) => {
                    if self.table.abandon(handle) {
                        warn!(handle = %handle, ?limit, "Request deadline exceeded");
                        return Err(Error::DeadlineExceeded(limit));
                    }
                    // The completion claimed the entry first and is already sent
                    rx.await
                }
            },
            None => rx.await,
        };

        match received {
            Ok(completion) => completion,
            Err(_) => Err(Error::Closing("completion channel dropped".to_string())),
        }
    }

    /// Submit and decode a single-node reply
    pub async fn execute<T, F>(&self, request_type: RequestType, args: Vec<Bytes>, decode: F) -> Result<Reply<T>>
    where
        F: FnOnce(RawResponse) -> std::result::Result<Reply<T>, DecodeError>,
    {
        let raw = self.submit(request_type, args, None).await?;
        Ok(decode(raw)?)
    }

    /// Submit with an explicit route and reconcile the per-node answers
    pub async fn execute_with_route<T, F>(
        &self,
        request_type: RequestType,
        args: Vec<Bytes>,
        route: &Route,
        decode: F,
    ) -> Result<ClusterValue<T>>
    where
        T: Default,
        F: Fn(RawResponse) -> std::result::Result<Reply<T>, DecodeError>,
    {
        let raw = self.submit(request_type, args, Some(route)).await?;
        Ok(reconcile(raw, route, decode)?)
    }

    /// Stop the executor, failing every waiting caller with `reason`
    ///
    /// Idempotent. Completions the engine still owes are discarded on arrival.
    pub fn close(&self, reason: &str) {
        if self.closed.is_cancelled() {
            return;
        }
        self.closed.cancel();

        let failed = self.table.fail_all(&Error::Closing(reason.to_string()));
        self.engine.close();
        info!(failed, reason, "Command executor closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Completes when the executor is closed
    pub async fn closed(&self) {
        self.closed.cancelled().await
    }

    /// Requests the engine has not completed yet, abandoned ones included
    pub fn pending_requests(&self) -> usize {
        self.table.len()
    }

    /// Callers currently waiting on a completion
    pub fn waiting_requests(&self) -> usize {
        self.table.waiting()
    }

    pub fn topology(&self) -> Arc<ClusterTopology> {
        self.engine.topology()
    }

    pub fn is_cluster(&self) -> bool {
        !self.engine.topology().is_empty()
    }
}

impl fmt::Debug for CommandExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandExecutor")
            .field("config", &self.config)
            .field("pending", &self.table.len())
            .field("closed", &self.closed.is_cancelled())
            .finish()
    }
}

impl Drop for CommandExecutor {
    fn drop(&mut self) {
        self.close("executor dropped");
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::cluster::{ClusterNode, NodeAddress, SlotRange, SlotScope};
    use crate::error::RequestErrorKind;
    use crate::response::decode_string;
    use parking_lot::Mutex;
    use std::time::Duration;

    /// Engine that only records submissions; tests complete them by hand
    #[derive(Clone, Default)]
    pub(crate) struct ManualEngine {
        pub(crate) submitted: Arc<Mutex<Vec<(CorrelationHandle, CommandRequest)>>>,
        pub(crate) topology: Arc<ClusterTopology>,
    }

    impl ManualEngine {
        pub(crate) fn count(&self) -> usize {
            self.submitted.lock().len()
        }

        pub(crate) fn take(&self) -> Vec<(CorrelationHandle, CommandRequest)> {
            std::mem::take(&mut *self.submitted.lock())
        }

        pub(crate) async fn wait_for(&self, count: usize) {
            while self.count() < count {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        }
    }

    impl NativeEngine for ManualEngine {
        fn submit(&self, handle: CorrelationHandle, request: &CommandRequest) {
            self.submitted.lock().push((handle, request.clone()));
        }

        fn topology(&self) -> Arc<ClusterTopology> {
            self.topology.clone()
        }
    }

    pub(crate) fn manual(config: ExecutorConfig, engine: &ManualEngine) -> (CommandExecutor, CompletionSink) {
        let mut sink = None;
        let executor = CommandExecutor::new(config, |s| {
            sink = Some(s);
            engine.clone()
        });
        (executor, sink.unwrap())
    }

    #[tokio::test]
    async fn test_out_of_order_completions_reach_their_callers() {
        let engine = ManualEngine::default();
        let (executor, sink) = manual(ExecutorConfig::default(), &engine);
        let executor = Arc::new(executor);

        let mut tasks = Vec::new();
        for i in 0..16 {
            let executor = executor.clone();
            tasks.push(tokio::spawn(async move {
                let sentinel = format!("key-{}", i);
                let reply = executor
                    .execute(RequestType::Get, vec![Bytes::from(sentinel.clone())], decode_string)
                    .await
                    .unwrap();
                assert_eq!(reply.value(), &format!("value-{}", sentinel));
            }));
        }

        engine.wait_for(16).await;
        let mut submitted = engine.take();
        submitted.reverse();
        for (handle, request) in submitted {
            let key = request.arg_str(0).unwrap().to_string();
            sink.success(handle, RawResponse::bulk_string(format!("value-{}", key)));
        }

        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(executor.pending_requests(), 0);
    }

    #[tokio::test]
    async fn test_engine_failure_is_surfaced() {
        let engine = ManualEngine::default();
        let (executor, sink) = manual(ExecutorConfig::default(), &engine);

        let call = executor.submit(RequestType::Get, vec![Bytes::from("k")], None);
        let complete = async {
            engine.wait_for(1).await;
            let (handle, _) = engine.take().remove(0);
            sink.failure(handle, "connection reset", RequestErrorKind::Disconnect);
        };
        let (result, ()) = tokio::join!(call, complete);

        let err = result.unwrap_err();
        assert_eq!(err.kind(), Some(RequestErrorKind::Disconnect));
        assert_eq!(err.to_string(), "disconnected: connection reset");
    }

    #[tokio::test]
    async fn test_deadline_then_late_completion() {
        let engine = ManualEngine::default();
        let config = ExecutorConfig::default().with_request_timeout(Duration::from_millis(20));
        let (executor, sink) = manual(config, &engine);

        let result = executor.submit(RequestType::Ping, Vec::new(), None).await;
        assert_eq!(result, Err(Error::DeadlineExceeded(Duration::from_millis(20))));
        assert_eq!(executor.pending_requests(), 1);
        assert_eq!(executor.waiting_requests(), 0);

        let (handle, _) = engine.take().remove(0);
        sink.success(handle, RawResponse::simple_string("PONG"));
        assert_eq!(executor.pending_requests(), 0);
    }

    #[tokio::test]
    async fn test_close_fails_waiting_and_later_calls() {
        let engine = ManualEngine::default();
        let (executor, sink) = manual(ExecutorConfig::default(), &engine);

        let call = executor.submit(RequestType::Get, vec![Bytes::from("k")], None);
        let shutdown = async {
            engine.wait_for(1).await;
            executor.close("shutting down");
        };
        let (result, ()) = tokio::join!(call, shutdown);
        assert_eq!(result, Err(Error::Closing("shutting down".to_string())));
        assert!(executor.is_closed());

        let again = executor.submit(RequestType::Get, vec![Bytes::from("k")], None).await;
        assert!(matches!(again, Err(Error::Closing(_))));
        assert_eq!(engine.count(), 1);

        // The engine's late completion is dropped quietly
        let (handle, _) = engine.take().remove(0);
        sink.success(handle, RawResponse::Nil);
        assert_eq!(executor.pending_requests(), 0);
    }

    #[tokio::test]
    async fn test_route_is_resolved_before_submission() {
        let topology = ClusterTopology::new(vec![ClusterNode::primary(
            NodeAddress::new("10.0.0.1", 6379),
            vec![SlotRange::new(0, 16383)],
        )]);
        let engine = ManualEngine {
            topology: Arc::new(topology),
            ..Default::default()
        };
        let (executor, sink) = manual(ExecutorConfig::default(), &engine);

        let route = Route::slot_key("user:1");
        let call = executor.submit(RequestType::Get, vec![Bytes::from("user:1")], Some(&route));
        let complete = async {
            engine.wait_for(1).await;
            let (handle, request) = engine.take().remove(0);
            let descriptor = request.route.unwrap();
            assert_eq!(descriptor.route, route);
            assert_eq!(descriptor.destinations, vec![NodeAddress::new("10.0.0.1", 6379)]);
            sink.success(handle, RawResponse::Nil);
        };
        let (result, ()) = tokio::join!(call, complete);
        assert_eq!(result, Ok(RawResponse::Nil));
        assert!(executor.is_cluster());
    }

    #[tokio::test]
    async fn test_unroutable_slot_is_rejected_locally() {
        let topology = ClusterTopology::new(vec![ClusterNode::primary(
            NodeAddress::new("10.0.0.1", 6379),
            vec![SlotRange::new(0, 100)],
        )]);
        let engine = ManualEngine {
            topology: Arc::new(topology),
            ..Default::default()
        };
        let (executor, _sink) = manual(ExecutorConfig::default(), &engine);

        let route = Route::SlotId(9000, SlotScope::Primary);
        let result = executor.submit(RequestType::Get, vec![Bytes::from("k")], Some(&route)).await;
        assert!(matches!(result, Err(Error::Unroutable(_))));
        assert_eq!(engine.count(), 0);
        assert_eq!(executor.pending_requests(), 0);
    }
}
