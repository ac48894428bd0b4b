use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use lg_domain::error::{Error, Result};
use lg_graph::{node_fn, CompiledGraph, GraphOptions, GraphState, StateGraph, END};
use lg_sessions::{Checkpoint, CheckpointStore, FileCheckpointStore, MemoryCheckpointStore};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Trail {
    visited: Vec<String>,
    laps: u32,
    input: Vec<String>,
    settled: u32,
}

#[derive(Default)]
struct TrailPatch {
    visit: Option<String>,
    lap: bool,
    input: Option<String>,
}

impl GraphState for Trail {
    type Patch = TrailPatch;

    fn merge(&mut self, patch: TrailPatch) {
        self.visited.extend(patch.visit);
        self.input.extend(patch.input);
        if patch.lap {
            self.laps += 1;
        }
    }

    fn settle(&mut self) {
        self.settled += 1;
    }
}

fn visit(name: &'static str) -> impl lg_graph::Node<Trail> {
    node_fn(move |_s: Trail| async move {
        Ok(TrailPatch {
            visit: Some(name.to_owned()),
            ..Default::default()
        })
    })
}

fn lap() -> impl lg_graph::Node<Trail> {
    node_fn(|_s: Trail| async {
        Ok(TrailPatch {
            visit: Some("loop".to_owned()),
            lap: true,
            ..Default::default()
        })
    })
}

fn say(text: &str) -> TrailPatch {
    TrailPatch {
        input: Some(text.to_owned()),
        ..Default::default()
    }
}

/// Records every checkpoint written through it.
#[derive(Default)]
struct Recording {
    inner: MemoryCheckpointStore,
    puts: Mutex<Vec<(usize, Option<String>)>>,
    fail_puts: AtomicBool,
}

#[async_trait::async_trait]
impl CheckpointStore for Recording {
    async fn setup(&self) -> Result<()> {
        self.inner.setup().await
    }

    async fn get(&self, session_id: &str) -> Result<Option<Checkpoint>> {
        self.inner.get(session_id).await
    }

    async fn put(&self, checkpoint: Checkpoint) -> Result<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(Error::Persistence("disk full".into()));
        }
        self.puts
            .lock()
            .push((checkpoint.step, checkpoint.next.clone()));
        self.inner.put(checkpoint).await
    }

    async fn list(&self) -> Result<Vec<Checkpoint>> {
        self.inner.list().await
    }

    async fn close(&self) -> Result<()> {
        self.inner.close().await
    }
}

fn linear(store: Arc<dyn CheckpointStore>) -> CompiledGraph<Trail> {
    let mut g = StateGraph::new();
    g.register("a", visit("a")).register("b", visit("b"));
    g.set_entry("a").connect("a", "b").connect("b", END);
    g.compile(store, GraphOptions::default()).unwrap()
}

#[tokio::test]
async fn linear_walk_checkpoints_every_step() {
    let store = Arc::new(Recording::default());
    let graph = linear(store.clone());

    let out = graph.run("s1", say("hello")).await.unwrap();
    assert_eq!(out.visited, vec!["a", "b"]);
    assert_eq!(out.input, vec!["hello"]);

    let puts = store.puts.lock().clone();
    assert_eq!(
        puts,
        vec![
            (0, Some("a".to_string())),
            (1, Some("b".to_string())),
            (2, None),
        ]
    );
}

#[tokio::test]
async fn conditional_cycle_stops_when_router_says_so() {
    let mut g = StateGraph::new();
    g.register("loop", lap()).register("done", visit("done"));
    g.set_entry("loop");
    g.connect_conditional(
        "loop",
        |s: &mut Trail| if s.laps < 3 { "again".into() } else { "finish".into() },
        [("again", "loop"), ("finish", "done")],
    );
    let graph = g
        .compile(Arc::new(MemoryCheckpointStore::new()), GraphOptions::default())
        .unwrap();

    let out = graph.run("s1", say("go")).await.unwrap();
    assert_eq!(out.laps, 3);
    assert_eq!(out.visited, vec!["loop", "loop", "loop", "done"]);
}

#[tokio::test]
async fn step_guard_reports_exhaustion_and_clears_next() {
    let store = Arc::new(MemoryCheckpointStore::new());
    let mut g = StateGraph::new();
    g.register("loop", lap()).set_entry("loop").connect("loop", "loop");
    let graph = g
        .compile(store.clone(), GraphOptions { max_steps: 5 })
        .unwrap();

    let err = graph.run("s1", say("spin")).await.unwrap_err();
    assert!(matches!(err, Error::GraphExhausted { steps: 5 }));

    let cp = store.get("s1").await.unwrap().unwrap();
    assert_eq!(cp.step, 5);
    assert!(!cp.is_pending());
    assert_eq!(cp.state["settled"], 1);

    // The next turn starts fresh rather than resuming the runaway loop.
    let err = graph.run("s1", say("again")).await.unwrap_err();
    assert!(matches!(err, Error::GraphExhausted { .. }));
    let state = graph.state("s1").await.unwrap().unwrap();
    assert_eq!(state.laps, 10);
}

#[tokio::test]
async fn unknown_label_is_a_graph_error() {
    let mut g = StateGraph::new();
    g.register("a", visit("a")).set_entry("a");
    g.connect_conditional("a", |_s: &mut Trail| "nowhere".into(), [("end", END)]);
    let graph = g
        .compile(Arc::new(MemoryCheckpointStore::new()), GraphOptions::default())
        .unwrap();

    let err = graph.run("s1", say("x")).await.unwrap_err();
    match err {
        Error::Graph(msg) => assert!(msg.contains("'nowhere'")),
        other => panic!("unexpected error: {other}"),
    }
}

fn flaky_graph(store: Arc<dyn CheckpointStore>, broken: Arc<AtomicBool>) -> CompiledGraph<Trail> {
    let mut g = StateGraph::new();
    g.register("a", visit("a"));
    g.register(
        "b",
        node_fn(move |_s: Trail| {
            let broken = broken.clone();
            async move {
                if broken.load(Ordering::SeqCst) {
                    return Err(Error::Other("upstream unavailable".into()));
                }
                Ok(TrailPatch {
                    visit: Some("b".into()),
                    ..Default::default()
                })
            }
        }),
    );
    g.set_entry("a").connect("a", "b").connect("b", END);
    g.compile(store, GraphOptions::default()).unwrap()
}

#[tokio::test]
async fn failed_node_is_not_merged_and_can_be_resumed() {
    let store = Arc::new(MemoryCheckpointStore::new());
    let broken = Arc::new(AtomicBool::new(true));
    let graph = flaky_graph(store.clone(), broken.clone());

    let err = graph.run("s1", say("hi")).await.unwrap_err();
    match err {
        Error::Node { node, message } => {
            assert_eq!(node, "b");
            assert!(message.contains("upstream unavailable"));
        }
        other => panic!("unexpected error: {other}"),
    }

    let cp = store.get("s1").await.unwrap().unwrap();
    assert_eq!(cp.next.as_deref(), Some("b"));
    assert_eq!(cp.step, 1);
    let state = graph.state("s1").await.unwrap().unwrap();
    assert_eq!(state.visited, vec!["a"]);

    broken.store(false, Ordering::SeqCst);
    let resumed = graph.resume("s1").await.unwrap();
    assert_eq!(resumed.visited, vec!["a", "b"]);
    assert!(!store.get("s1").await.unwrap().unwrap().is_pending());
}

#[tokio::test]
async fn run_finishes_a_pending_walk_before_new_input() {
    let store = Arc::new(MemoryCheckpointStore::new());
    let broken = Arc::new(AtomicBool::new(true));
    let graph = flaky_graph(store.clone(), broken.clone());

    assert!(graph.run("s1", say("first")).await.is_err());
    broken.store(false, Ordering::SeqCst);

    let out = graph.run("s1", say("second")).await.unwrap();
    assert_eq!(out.visited, vec!["a", "b", "a", "b"]);
    assert_eq!(out.input, vec!["first", "second"]);
}

#[tokio::test]
async fn pending_walk_that_fails_again_is_abandoned() {
    let store = Arc::new(MemoryCheckpointStore::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    // "b" fails on its first two executions, then recovers.
    let mut g = StateGraph::new();
    g.register("a", visit("a"));
    g.register(
        "b",
        node_fn(move |_s: Trail| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    return Err(Error::Other("boom".into()));
                }
                Ok(TrailPatch {
                    visit: Some("b".into()),
                    ..Default::default()
                })
            }
        }),
    );
    g.set_entry("a").connect("a", "b").connect("b", END);
    let graph = g.compile(store, GraphOptions::default()).unwrap();

    assert!(graph.run("s1", say("first")).await.is_err());
    let out = graph.run("s1", say("second")).await.unwrap();
    assert_eq!(out.visited, vec!["a", "a", "b"]);
    assert_eq!(out.settled, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn persistence_failure_stops_the_walk() {
    let store = Arc::new(Recording::default());
    store.fail_puts.store(true, Ordering::SeqCst);
    let graph = linear(store.clone());

    let err = graph.run("s1", say("x")).await.unwrap_err();
    assert!(err.is_fatal_persistence());
}

#[tokio::test]
async fn resume_without_checkpoint_is_invalid_input() {
    let graph = linear(Arc::new(MemoryCheckpointStore::new()));
    let err = graph.resume("ghost").await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[tokio::test]
async fn state_survives_a_new_graph_over_the_same_directory() {
    let dir = tempfile::tempdir().unwrap();

    let first = linear(Arc::new(FileCheckpointStore::new(dir.path())));
    first.run("s1", say("one")).await.unwrap();
    drop(first);

    let second = linear(Arc::new(FileCheckpointStore::new(dir.path())));
    let out = second.run("s1", say("two")).await.unwrap();
    assert_eq!(out.input, vec!["one", "two"]);
    assert_eq!(out.visited.len(), 4);
}
