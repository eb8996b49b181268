//! Worker loop tests against the in-memory store and queue.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use engine::{
    Dispatcher, EngineError, Flow, FlowStore, MemoryStore, NodeExecutor, PollOutcome, ResultMap,
    Run, RunState, RunStore, Worker, WorkerConfig,
};
use nodes::mock::MockHttpCaller;
use nodes::{Method, NodeDefinition, NodeOutcome};
use queue::{MemoryRunQueue, RunQueue};

struct Harness {
    store: Arc<MemoryStore>,
    queue: Arc<MemoryRunQueue>,
    http: Arc<MockHttpCaller>,
    dispatcher: Dispatcher,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let queue = Arc::new(MemoryRunQueue::new());
        let http = Arc::new(MockHttpCaller::responding(json!({ "ok": true })));
        let dispatcher = Dispatcher::new(store.clone(), store.clone(), queue.clone());
        Self { store, queue, http, dispatcher }
    }

    fn worker(&self) -> Worker {
        self.worker_with_runs(self.store.clone())
    }

    fn worker_with_runs(&self, runs: Arc<dyn RunStore>) -> Worker {
        Worker::new(
            self.store.clone(),
            runs,
            self.queue.clone(),
            NodeExecutor::new(self.http.clone()),
            fast_config(),
        )
    }

    async fn flow(&self, nodes: Vec<NodeDefinition>) -> Uuid {
        self.store.insert_flow(Flow::new("test", nodes)).await
    }
}

fn fast_config() -> WorkerConfig {
    WorkerConfig {
        idle_interval: Duration::from_millis(5),
        error_backoff: Duration::from_millis(10),
    }
}

async fn wait_for_state(store: &MemoryStore, run_id: Uuid, state: RunState) {
    for _ in 0..400 {
        if store.get_run(run_id).await.map(|r| r.state).ok() == Some(state) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("run {run_id} never reached {state}");
}

// ---------------------------------------------------------------------------
// Single poll
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_queue_polls_idle() {
    let h = Harness::new();
    assert_eq!(h.worker().poll_once().await.unwrap(), PollOutcome::Idle);
}

#[tokio::test]
async fn processed_run_is_written_exactly_twice() {
    let h = Harness::new();
    let flow_id = h
        .flow(vec![NodeDefinition::log("n1", Some("hi")), NodeDefinition::delay("n2", 10)])
        .await;
    let run_id = h.dispatcher.submit(flow_id, json!({})).await.unwrap();

    let outcome = h.worker().poll_once().await.unwrap();

    assert_eq!(outcome, PollOutcome::Processed { run_id, state: RunState::Completed });
    let run = h.store.get_run(run_id).await.unwrap();
    assert_eq!(run.state, RunState::Completed);
    assert_eq!(run.result.get("n2"), Some(&NodeOutcome::slept(10)));
    assert_eq!(
        h.store.state_history(run_id).await,
        vec![RunState::Queued, RunState::Running, RunState::Completed]
    );
}

#[tokio::test]
async fn failing_node_persists_failed_state_and_partial_result() {
    let h = Harness::new();
    let http = Arc::new(MockHttpCaller::failing_status(503));
    let flow_id = h
        .flow(vec![
            NodeDefinition::log("n1", None),
            NodeDefinition::http_request("n2", Method::GET, "http://svc/down"),
            NodeDefinition::log("n3", None),
        ])
        .await;
    let run_id = h.dispatcher.submit(flow_id, json!({})).await.unwrap();

    let worker = Worker::new(
        h.store.clone(),
        h.store.clone(),
        h.queue.clone(),
        NodeExecutor::new(http),
        fast_config(),
    );
    worker.poll_once().await.unwrap();

    let run = h.store.get_run(run_id).await.unwrap();
    assert_eq!(run.state, RunState::Failed);
    assert_eq!(run.result.node_ids().collect::<Vec<_>>(), vec!["n1", "n2"]);
}

#[tokio::test]
async fn run_whose_flow_disappeared_fails_without_results() {
    let h = Harness::new();
    let flow_id = h.flow(vec![NodeDefinition::log("n1", None)]).await;
    let run_id = h.dispatcher.submit(flow_id, json!({})).await.unwrap();
    h.store.remove_flow(flow_id).await;

    let outcome = h.worker().poll_once().await.unwrap();

    assert_eq!(outcome, PollOutcome::Processed { run_id, state: RunState::Failed });
    let run = h.store.get_run(run_id).await.unwrap();
    assert_eq!(run.state, RunState::Failed);
    assert!(run.result.is_empty());
}

#[tokio::test]
async fn id_without_record_is_skipped() {
    let h = Harness::new();
    let ghost = Uuid::new_v4();
    h.queue.enqueue(ghost).await.unwrap();

    assert_eq!(h.worker().poll_once().await.unwrap(), PollOutcome::Skipped { run_id: ghost });
}

#[tokio::test]
async fn duplicate_delivery_does_not_rerun_a_finished_run() {
    let h = Harness::new();
    let flow_id = h
        .flow(vec![NodeDefinition::http_request("n1", Method::POST, "http://svc/charge")])
        .await;
    let run_id = h.dispatcher.submit(flow_id, json!({})).await.unwrap();
    h.queue.enqueue(run_id).await.unwrap();

    let worker = h.worker();
    worker.poll_once().await.unwrap();
    let second = worker.poll_once().await.unwrap();

    assert_eq!(second, PollOutcome::Skipped { run_id });
    assert_eq!(h.http.call_count(), 1);
    assert_eq!(h.store.get_run(run_id).await.unwrap().state, RunState::Completed);
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test]
async fn concurrent_runs_of_one_flow_do_not_interfere() {
    let h = Harness::new();
    let flow_id = h
        .flow(vec![
            NodeDefinition::http_request("call", Method::POST, "http://svc/echo"),
            NodeDefinition::delay("wait", 20),
            NodeDefinition::log("done", None),
        ])
        .await;
    let a = h.dispatcher.submit(flow_id, json!({ "who": "a" })).await.unwrap();
    let b = h.dispatcher.submit(flow_id, json!({ "who": "b" })).await.unwrap();

    let (wa, wb) = (h.worker(), h.worker());
    let (ra, rb) = tokio::join!(wa.poll_once(), wb.poll_once());
    let mut processed = vec![ra.unwrap(), rb.unwrap()];
    processed.sort_by_key(|p| match p {
        PollOutcome::Processed { run_id, .. } => Some(*run_id == b),
        _ => None,
    });

    assert_eq!(
        processed,
        vec![
            PollOutcome::Processed { run_id: a, state: RunState::Completed },
            PollOutcome::Processed { run_id: b, state: RunState::Completed },
        ]
    );

    let run_a = h.store.get_run(a).await.unwrap();
    let run_b = h.store.get_run(b).await.unwrap();
    assert_eq!(run_a.result.len(), 3);
    assert_eq!(run_b.result.len(), 3);
    assert_eq!(run_a.payload, json!({ "who": "a" }));
    assert_eq!(run_b.payload, json!({ "who": "b" }));

    let mut bodies: Vec<Value> = h.http.calls().into_iter().map(|c| c.body).collect();
    bodies.sort_by_key(|b| b["who"].as_str().map(str::to_owned));
    assert_eq!(bodies, vec![json!({ "who": "a" }), json!({ "who": "b" })]);
}

#[tokio::test]
async fn several_workers_drain_the_queue_once_each() {
    let h = Harness::new();
    let flow_id = h.flow(vec![NodeDefinition::log("n1", None)]).await;
    let mut ids = Vec::new();
    for i in 0..20 {
        ids.push(h.dispatcher.submit(flow_id, json!({ "i": i })).await.unwrap());
    }

    let shutdown = CancellationToken::new();
    let handles: Vec<_> = (0..3)
        .map(|_| {
            let worker = h.worker();
            let token = shutdown.clone();
            tokio::spawn(async move { worker.run(token).await })
        })
        .collect();

    for id in &ids {
        wait_for_state(&h.store, *id, RunState::Completed).await;
    }
    shutdown.cancel();
    for handle in handles {
        handle.await.unwrap();
    }

    for id in ids {
        assert_eq!(
            h.store.state_history(id).await,
            vec![RunState::Queued, RunState::Running, RunState::Completed]
        );
    }
    assert!(h.queue.is_empty().await);
}

// ---------------------------------------------------------------------------
// Loop resilience
// ---------------------------------------------------------------------------

/// Run store whose first `failures` reads report the database as down.
struct FlakyRuns {
    inner: Arc<MemoryStore>,
    failures: AtomicUsize,
}

#[async_trait]
impl RunStore for FlakyRuns {
    async fn create_run(&self, run: &Run) -> Result<(), EngineError> {
        self.inner.create_run(run).await
    }

    async fn get_run(&self, id: Uuid) -> Result<Run, EngineError> {
        let left = self.failures.load(Ordering::SeqCst);
        if left > 0 {
            self.failures.store(left - 1, Ordering::SeqCst);
            return Err(EngineError::Database(db::DbError::NotFound));
        }
        self.inner.get_run(id).await
    }

    async fn update_run_state(
        &self,
        id: Uuid,
        state: RunState,
        result: Option<&ResultMap>,
    ) -> Result<(), EngineError> {
        self.inner.update_run_state(id, state, result).await
    }
}

#[tokio::test]
async fn store_outage_is_logged_and_the_loop_keeps_polling() {
    let h = Harness::new();
    let flow_id = h.flow(vec![NodeDefinition::log("n1", None)]).await;
    let lost = h.dispatcher.submit(flow_id, json!({})).await.unwrap();
    let next = h.dispatcher.submit(flow_id, json!({})).await.unwrap();

    let runs = Arc::new(FlakyRuns { inner: h.store.clone(), failures: AtomicUsize::new(1) });
    let worker = h.worker_with_runs(runs);
    let shutdown = CancellationToken::new();
    let handle = tokio::spawn({
        let token = shutdown.clone();
        async move { worker.run(token).await }
    });

    wait_for_state(&h.store, next, RunState::Completed).await;
    shutdown.cancel();
    handle.await.unwrap();

    // The job that hit the outage was already off the queue.
    assert_eq!(h.store.get_run(lost).await.unwrap().state, RunState::Queued);
}

#[tokio::test]
async fn cancelled_worker_exits_while_idle() {
    let h = Harness::new();
    let worker = Worker::new(
        h.store.clone(),
        h.store.clone(),
        h.queue.clone(),
        NodeExecutor::new(h.http.clone()),
        WorkerConfig {
            idle_interval: Duration::from_secs(3600),
            error_backoff: Duration::from_secs(3600),
        },
    );
    let shutdown = CancellationToken::new();
    let handle = tokio::spawn({
        let token = shutdown.clone();
        async move { worker.run(token).await }
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("worker should stop promptly")
        .unwrap();
}

#[tokio::test]
async fn flow_store_is_read_only_to_the_worker() {
    let h = Harness::new();
    let flow_id = h.flow(vec![NodeDefinition::log("n1", None)]).await;
    let before = h.store.get_flow(flow_id).await.unwrap();
    h.dispatcher.submit(flow_id, json!({})).await.unwrap();

    h.worker().poll_once().await.unwrap();

    let after = h.store.get_flow(flow_id).await.unwrap();
    assert_eq!(after.version, before.version);
    assert_eq!(after.nodes, before.nodes);
}
