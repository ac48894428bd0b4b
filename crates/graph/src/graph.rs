//! Graph builder and compile-time validation.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use lg_domain::error::{Error, Result};
use lg_sessions::CheckpointStore;

use crate::compiled::{CompiledGraph, GraphOptions};
use crate::node::{GraphState, Node};

/// Terminal pseudo-node.
pub const END: &str = "__end__";

/// Routing function evaluated on the post-merge state. It may mutate the
/// state, e.g. to clear a one-shot routing hint.
pub type Router<S> = Arc<dyn Fn(&mut S) -> String + Send + Sync>;

pub(crate) enum Edge<S> {
    Static(String),
    Conditional {
        router: Router<S>,
        table: BTreeMap<String, String>,
    },
}

impl<S> Edge<S> {
    fn targets(&self) -> Vec<&str> {
        match self {
            Edge::Static(to) => vec![to.as_str()],
            Edge::Conditional { table, .. } => table.values().map(String::as_str).collect(),
        }
    }
}

pub struct StateGraph<S: GraphState> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    edges: HashMap<String, Edge<S>>,
    entry: Option<String>,
    // Builder misuse is collected and reported by `compile()`.
    problems: Vec<String>,
}

impl<S: GraphState> Default for StateGraph<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: GraphState> StateGraph<S> {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: HashMap::new(),
            entry: None,
            problems: Vec::new(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, node: impl Node<S> + 'static) -> &mut Self {
        self.register_arc(name, Arc::new(node))
    }

    pub fn register_arc(&mut self, name: impl Into<String>, node: Arc<dyn Node<S>>) -> &mut Self {
        let name = name.into();
        if name == END {
            self.problems.push(format!("'{END}' is reserved and cannot be a node"));
        } else if self.nodes.insert(name.clone(), node).is_some() {
            self.problems.push(format!("node '{name}' registered twice"));
        }
        self
    }

    pub fn set_entry(&mut self, name: impl Into<String>) -> &mut Self {
        self.entry = Some(name.into());
        self
    }

    pub fn connect(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.add_edge(from.into(), Edge::Static(to.into()))
    }

    /// Route from `from` by label: `router` returns a label that is looked
    /// up in `table` (label → node name or [`END`]).
    pub fn connect_conditional<I, L, T>(
        &mut self,
        from: impl Into<String>,
        router: impl Fn(&mut S) -> String + Send + Sync + 'static,
        table: I,
    ) -> &mut Self
    where
        I: IntoIterator<Item = (L, T)>,
        L: Into<String>,
        T: Into<String>,
    {
        let table = table
            .into_iter()
            .map(|(l, t)| (l.into(), t.into()))
            .collect();
        self.add_edge(
            from.into(),
            Edge::Conditional {
                router: Arc::new(router),
                table,
            },
        )
    }

    fn add_edge(&mut self, from: String, edge: Edge<S>) -> &mut Self {
        if self.edges.insert(from.clone(), edge).is_some() {
            self.problems
                .push(format!("node '{from}' has more than one outgoing edge"));
        }
        self
    }

    /// Labels of the conditional edge leaving `from`, if any.
    pub fn labels(&self, from: &str) -> Vec<&str> {
        match self.edges.get(from) {
            Some(Edge::Conditional { table, .. }) => table.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    fn validate(&self) -> Vec<String> {
        let mut problems = self.problems.clone();

        match self.entry {
            None => problems.push("entry node not set".into()),
            Some(ref e) if !self.nodes.contains_key(e) => {
                problems.push(format!("entry node '{e}' is not registered"))
            }
            Some(_) => {}
        }

        let mut sources: Vec<&String> = self.edges.keys().collect();
        sources.sort();
        for from in sources {
            if !self.nodes.contains_key(from) {
                problems.push(format!("edge source '{from}' is not registered"));
            }
            for to in self.edges[from].targets() {
                if to != END && !self.nodes.contains_key(to) {
                    problems.push(format!("edge '{from}' -> '{to}' targets an unregistered node"));
                }
            }
        }
        problems
    }

    pub fn compile(
        self,
        store: Arc<dyn CheckpointStore>,
        options: GraphOptions,
    ) -> Result<CompiledGraph<S>> {
        let problems = self.validate();
        if !problems.is_empty() {
            return Err(Error::Graph(format!(
                "invalid graph: {}",
                problems.join("; ")
            )));
        }
        let entry = self.entry.unwrap_or_default();
        Ok(CompiledGraph::new(self.nodes, self.edges, entry, store, options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::node_fn;
    use lg_sessions::MemoryCheckpointStore;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct Counter(u32);

    impl GraphState for Counter {
        type Patch = u32;
        fn merge(&mut self, patch: u32) {
            self.0 += patch;
        }
    }

    fn noop() -> impl Node<Counter> {
        node_fn(|_s: Counter| async { Ok(0u32) })
    }

    fn compile(g: StateGraph<Counter>) -> Result<CompiledGraph<Counter>> {
        g.compile(Arc::new(MemoryCheckpointStore::new()), GraphOptions::default())
    }

    fn err_text(r: Result<CompiledGraph<Counter>>) -> String {
        match r {
            Err(e) => e.to_string(),
            Ok(_) => panic!("expected compile error"),
        }
    }

    #[test]
    fn valid_graph_compiles() {
        let mut g = StateGraph::new();
        g.register("a", noop()).register("b", noop());
        g.set_entry("a").connect("a", "b").connect("b", END);
        assert!(compile(g).is_ok());
    }

    #[test]
    fn missing_entry_is_rejected() {
        let mut g = StateGraph::new();
        g.register("a", noop());
        assert!(err_text(compile(g)).contains("entry node not set"));
    }

    #[test]
    fn unregistered_table_target_is_rejected() {
        let mut g = StateGraph::new();
        g.register("a", noop()).set_entry("a");
        g.connect_conditional("a", |_s: &mut Counter| "x".into(), [("x", "ghost"), ("done", END)]);
        assert!(err_text(compile(g)).contains("'a' -> 'ghost'"));
    }

    #[test]
    fn duplicate_node_and_double_edge_are_rejected() {
        let mut g = StateGraph::new();
        g.register("a", noop()).register("a", noop()).set_entry("a");
        g.connect("a", END).connect("a", END);
        let text = err_text(compile(g));
        assert!(text.contains("registered twice"));
        assert!(text.contains("more than one outgoing edge"));
    }

    #[test]
    fn end_is_reserved() {
        let mut g = StateGraph::new();
        g.register(END, noop()).register("a", noop()).set_entry("a");
        assert!(err_text(compile(g)).contains("reserved"));
    }

    #[test]
    fn labels_lists_table_keys() {
        let mut g = StateGraph::new();
        g.register("a", noop());
        g.connect_conditional("a", |_s: &mut Counter| "end".into(), [("end", END), ("again", "a")]);
        assert_eq!(g.labels("a"), vec!["again", "end"]);
    }
}
