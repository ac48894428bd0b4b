/// Shared error type used across all leadgraph crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("provider {provider}: {message}")]
    Provider { provider: String, message: String },

    /// The per-run step guard tripped before the graph reached a terminal node.
    #[error("graph exhausted after {steps} steps without reaching a terminal node")]
    GraphExhausted { steps: usize },

    /// Graph construction or routing error (unknown node, unknown label).
    #[error("graph: {0}")]
    Graph(String),

    /// A non-tool node failed; its patch was discarded.
    #[error("node {node} failed: {message}")]
    Node { node: String, message: String },

    #[error("tool {tool}: {message}")]
    ToolInvocation { tool: String, message: String },

    /// The checkpoint store is unreachable or returned corrupt data.
    #[error("persistence: {0}")]
    Persistence(String),

    #[error("vector store: {0}")]
    VectorStore(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("config: {0}")]
    Config(String),

    #[error("auth: {0}")]
    Auth(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap any displayable failure as a node error.
    pub fn node(node: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Error::Node {
            node: node.into(),
            message: message.to_string(),
        }
    }

    /// Whether the session must stop because its state cannot be saved.
    pub fn is_fatal_persistence(&self) -> bool {
        matches!(self, Error::Persistence(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
