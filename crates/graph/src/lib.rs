//! Cyclic, conditionally routed state graph with per-step checkpoints.
//!
//! Nodes are values registered by name. Each node reads the current state
//! and returns a patch; the engine merges it, asks the node's outgoing edge
//! where to go next, persists `{state, next, step}` and moves on until it
//! reaches [`END`] or a node without an outgoing edge.

pub mod compiled;
pub mod graph;
pub mod node;

pub use compiled::{CompiledGraph, GraphOptions};
pub use graph::{Router, StateGraph, END};
pub use node::{node_fn, FnNode, GraphState, Node};
