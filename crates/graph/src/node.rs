use std::future::Future;

use lg_domain::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// State threaded through a graph walk.
///
/// Nodes never mutate state directly; they return a `Patch` which the
/// engine merges after the node succeeds.
pub trait GraphState: Clone + Default + Serialize + DeserializeOwned + Send + Sync + 'static {
    type Patch: Send + 'static;

    fn merge(&mut self, patch: Self::Patch);

    /// Close out work left half-done when a walk stops before reaching the
    /// end (step limit hit, interrupted walk abandoned). The settled state
    /// is what gets persisted.
    fn settle(&mut self) {}
}

#[async_trait::async_trait]
pub trait Node<S: GraphState>: Send + Sync {
    async fn run(&self, state: &S) -> Result<S::Patch>;
}

/// Adapts an async closure taking an owned state snapshot.
pub struct FnNode<F>(F);

/// Wrap `f` as a [`Node`].
pub fn node_fn<F>(f: F) -> FnNode<F> {
    FnNode(f)
}

#[async_trait::async_trait]
impl<S, F, Fut> Node<S> for FnNode<F>
where
    S: GraphState,
    F: Fn(S) -> Fut + Send + Sync,
    Fut: Future<Output = Result<S::Patch>> + Send,
{
    async fn run(&self, state: &S) -> Result<S::Patch> {
        (self.0)(state.clone()).await
    }
}
