//! Executable graph: node walk, routing and per-step checkpoints.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use lg_domain::error::{Error, Result};
use lg_domain::trace::TraceEvent;
use lg_sessions::{Checkpoint, CheckpointStore};

use crate::graph::{Edge, END};
use crate::node::{GraphState, Node};

#[derive(Debug, Clone)]
pub struct GraphOptions {
    /// Node executions allowed in one call to `run` or `resume`.
    pub max_steps: usize,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self { max_steps: 200 }
    }
}

pub struct CompiledGraph<S: GraphState> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    edges: HashMap<String, Edge<S>>,
    entry: String,
    store: Arc<dyn CheckpointStore>,
    options: GraphOptions,
}

impl<S: GraphState> CompiledGraph<S> {
    pub(crate) fn new(
        nodes: HashMap<String, Arc<dyn Node<S>>>,
        edges: HashMap<String, Edge<S>>,
        entry: String,
        store: Arc<dyn CheckpointStore>,
        options: GraphOptions,
    ) -> Self {
        Self {
            nodes,
            edges,
            entry,
            store,
            options,
        }
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn store(&self) -> &Arc<dyn CheckpointStore> {
        &self.store
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Public entry points
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Merge `input` into the session's state and walk from the entry node.
    ///
    /// A walk left pending by an earlier crash is finished first. If that
    /// walk fails again it is abandoned and the new input proceeds from the
    /// last durable state.
    pub async fn run(&self, session_id: &str, input: S::Patch) -> Result<S> {
        let (mut state, step) = match self.load(session_id).await? {
            None => (S::default(), 0),
            Some((state, step, None)) => (state, step),
            Some((state, step, Some(pending))) => {
                tracing::info!(session_id, node = %pending, "finishing interrupted run");
                match self.walk(session_id, state, step, pending).await {
                    Ok(done) => done,
                    Err(e) if e.is_fatal_persistence() => return Err(e),
                    Err(e) => {
                        tracing::warn!(session_id, error = %e, "abandoning interrupted run");
                        match self.load(session_id).await? {
                            Some((mut state, step, _)) => {
                                state.settle();
                                (state, step)
                            }
                            None => (S::default(), 0),
                        }
                    }
                }
            }
        };

        state.merge(input);
        self.persist(session_id, &state, Some(self.entry.clone()), step)
            .await?;
        let (state, _) = self.walk(session_id, state, step, self.entry.clone()).await?;
        Ok(state)
    }

    /// Continue a walk recorded as pending. A session that already reached
    /// the end is returned unchanged.
    pub async fn resume(&self, session_id: &str) -> Result<S> {
        match self.load(session_id).await? {
            None => Err(Error::InvalidInput(format!(
                "no checkpoint for session '{session_id}'"
            ))),
            Some((state, _, None)) => Ok(state),
            Some((state, step, Some(next))) => {
                let (state, _) = self.walk(session_id, state, step, next).await?;
                Ok(state)
            }
        }
    }

    /// Last persisted state of a session.
    pub async fn state(&self, session_id: &str) -> Result<Option<S>> {
        Ok(self.load(session_id).await?.map(|(state, _, _)| state))
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Walk
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    async fn walk(
        &self,
        session_id: &str,
        mut state: S,
        mut step: usize,
        start: String,
    ) -> Result<(S, usize)> {
        let mut current = start;
        let mut executed = 0usize;

        loop {
            if executed >= self.options.max_steps {
                tracing::warn!(session_id, node = %current, steps = executed, "step limit reached");
                state.settle();
                self.persist(session_id, &state, None, step).await?;
                return Err(Error::GraphExhausted { steps: executed });
            }

            let node = self
                .nodes
                .get(&current)
                .ok_or_else(|| Error::Graph(format!("unknown node '{current}'")))?;

            let started = Instant::now();
            let patch = match node.run(&state).await {
                Ok(patch) => patch,
                Err(e) => {
                    TraceEvent::NodeFailed {
                        session_id: session_id.to_owned(),
                        node: current.clone(),
                        step: step + 1,
                        error: e.to_string(),
                    }
                    .emit();
                    return Err(match e {
                        Error::Node { .. } | Error::Persistence(_) => e,
                        other => Error::node(current.as_str(), other),
                    });
                }
            };

            state.merge(patch);
            step += 1;
            executed += 1;

            let next = self.route(&current, &mut state)?;

            TraceEvent::NodeCompleted {
                session_id: session_id.to_owned(),
                node: current.clone(),
                step,
                next: next.clone(),
                duration_ms: started.elapsed().as_millis() as u64,
            }
            .emit();

            self.persist(session_id, &state, next.clone(), step).await?;

            match next {
                Some(n) => current = n,
                None => return Ok((state, step)),
            }
        }
    }

    /// Next node after `from`, or `None` at the end.
    fn route(&self, from: &str, state: &mut S) -> Result<Option<String>> {
        let target = match self.edges.get(from) {
            None => return Ok(None),
            Some(Edge::Static(to)) => to.clone(),
            Some(Edge::Conditional { router, table }) => {
                let label = router(state);
                table.get(&label).cloned().ok_or_else(|| {
                    Error::Graph(format!("node '{from}' routed to unknown label '{label}'"))
                })?
            }
        };
        Ok((target != END).then_some(target))
    }

    // ── persistence ──

    async fn persist(
        &self,
        session_id: &str,
        state: &S,
        next: Option<String>,
        step: usize,
    ) -> Result<()> {
        let value = serde_json::to_value(state)?;
        self.store
            .put(Checkpoint::new(session_id, value, next.clone(), step))
            .await
            .map_err(|e| match e {
                Error::Persistence(_) => e,
                other => Error::Persistence(other.to_string()),
            })?;
        TraceEvent::CheckpointWritten {
            session_id: session_id.to_owned(),
            step,
            next,
        }
        .emit();
        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<Option<(S, usize, Option<String>)>> {
        let Some(cp) = self.store.get(session_id).await? else {
            return Ok(None);
        };
        let state: S = serde_json::from_value(cp.state).map_err(|e| {
            Error::Persistence(format!("checkpoint for '{session_id}' is unreadable: {e}"))
        })?;
        Ok(Some((state, cp.step, cp.next)))
    }
}
