//! Runtime construction shared by the `run` and `chat` commands.
//!
//! [`build_runtime`] turns a validated [`Config`] into concrete backends;
//! [`assemble`] wires those backends into tools, the pipeline graph and the
//! [`ChatService`]. Tests call `assemble` directly with in-memory parts.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use lg_domain::config::{CheckpointBackend, Config, ConfigSeverity, EmbedderKind, VectorBackend};
use lg_domain::Lead;
use lg_graph::GraphOptions;
use lg_mcp_client::{load_allowed, McpManager, ToolCatalog};
use lg_providers::{LlmProvider, OpenAiCompatProvider};
use lg_sessions::{CheckpointStore, FileCheckpointStore, MemoryCheckpointStore};
use lg_tools::{
    RetrieveIcpTool, SearchCompanyInfoTool, SearchLeadsTool, SearchMemoriesTool, ToolRegistry,
    UpdateMemoriesTool, WorkspaceTool,
};
use lg_vector::{
    Embedder, HashingEmbedder, InMemoryIndex, MemoryFact, MemoryStore, ProviderEmbedder,
    QdrantIndex, VectorIndex, VectorStore,
};

use crate::builder::{build_pipeline, PipelineParts};
use crate::nodes::Reasoner;
use crate::service::ChatService;

/// Concrete backends chosen from configuration.
pub struct Components {
    pub llm: Arc<dyn LlmProvider>,
    pub embedder: Arc<dyn Embedder>,
    pub index: Arc<dyn VectorIndex>,
    pub checkpoints: Arc<dyn CheckpointStore>,
    pub mcp: Arc<McpManager>,
}

/// A wired runtime.
pub struct Runtime {
    pub service: ChatService,
    pub leads: Arc<VectorStore<Lead>>,
    pub checkpoints: Arc<dyn CheckpointStore>,
    pub mcp: Arc<McpManager>,
}

impl Runtime {
    /// Stop MCP servers. The checkpoint store is opened and closed by the
    /// caller through [`lg_sessions::scoped`].
    pub async fn shutdown(&self) {
        self.mcp.shutdown().await;
    }
}

/// Log every config issue and fail if any is an error.
pub fn check_config(config: &Config) -> anyhow::Result<()> {
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    let errors = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    if errors > 0 {
        anyhow::bail!("config validation failed with {errors} error(s)");
    }
    Ok(())
}

/// The checkpoint backend named by the config, not yet set up.
pub fn checkpoint_store(config: &Config) -> Arc<dyn CheckpointStore> {
    match config.checkpoint.backend {
        CheckpointBackend::File => Arc::new(FileCheckpointStore::new(&config.checkpoint.state_path)),
        CheckpointBackend::Memory => Arc::new(MemoryCheckpointStore::new()),
    }
}

/// The vector index named by the config.
pub fn vector_index(config: &Config) -> anyhow::Result<Arc<dyn VectorIndex>> {
    Ok(match config.vector.backend {
        VectorBackend::Memory => Arc::new(InMemoryIndex::new()),
        VectorBackend::Qdrant => {
            Arc::new(QdrantIndex::new(&config.vector).context("initializing Qdrant client")?)
        }
    })
}

pub fn llm_provider(config: &Config) -> anyhow::Result<Arc<dyn LlmProvider>> {
    Ok(Arc::new(
        OpenAiCompatProvider::from_config(&config.llm).context("initializing LLM provider")?,
    ))
}

/// The embedder named by the config. `llm` is only used by the provider
/// embedder.
pub fn embedder(config: &Config, llm: &Arc<dyn LlmProvider>) -> Arc<dyn Embedder> {
    match config.vector.embedder {
        EmbedderKind::Provider => Arc::new(ProviderEmbedder::new(
            llm.clone(),
            Some(config.llm.embedding_model.clone()),
            config.vector.dimension,
        )),
        EmbedderKind::Hashing => Arc::new(HashingEmbedder::new(config.vector.dimension)),
    }
}

/// The lead repository alone, for commands that do not run the graph.
/// No LLM credentials are needed with the hashing embedder.
pub fn lead_store(config: &Config) -> anyhow::Result<Arc<VectorStore<Lead>>> {
    let embedder: Arc<dyn Embedder> = match config.vector.embedder {
        EmbedderKind::Hashing => Arc::new(HashingEmbedder::new(config.vector.dimension)),
        EmbedderKind::Provider => embedder(config, &llm_provider(config)?),
    };
    Ok(Arc::new(VectorStore::new(
        vector_index(config)?,
        embedder,
        config.vector.lead_collection.clone(),
        config.vector.distance,
    )))
}

/// Validate config, create every backend and assemble the runtime.
pub async fn build_runtime(config: &Config) -> anyhow::Result<Runtime> {
    check_config(config)?;

    let llm = llm_provider(config)?;
    tracing::info!(provider = %config.llm.id, model = %config.llm.model, "LLM provider ready");
    let embedder = embedder(config, &llm);

    // ── Vector index ─────────────────────────────────────────────────
    let index = vector_index(config)?;
    tracing::info!(backend = ?config.vector.backend, "vector index ready");

    let checkpoints = checkpoint_store(config);

    // ── MCP servers ──────────────────────────────────────────────────
    let mcp = Arc::new(McpManager::from_config(&config.mcp).await);
    if !mcp.is_empty() {
        tracing::info!(servers = mcp.server_count(), "MCP servers connected");
    }

    assemble(
        config,
        Components {
            llm,
            embedder,
            index,
            checkpoints,
            mcp,
        },
    )
    .await
}

/// Wire tools, the pipeline graph and the chat service from backends.
pub async fn assemble(config: &Config, parts: Components) -> anyhow::Result<Runtime> {
    let Components {
        llm,
        embedder,
        index,
        checkpoints,
        mcp,
    } = parts;

    // ── Stores ───────────────────────────────────────────────────────
    let leads = Arc::new(VectorStore::<Lead>::new(
        index.clone(),
        embedder.clone(),
        config.vector.lead_collection.clone(),
        config.vector.distance,
    ));
    let memory = Arc::new(MemoryStore::new(VectorStore::<MemoryFact>::new(
        index,
        embedder,
        config.vector.memory_collection.clone(),
        config.vector.distance,
    )));

    // Collections are created lazily on first use as well; an unreachable
    // store at boot is not fatal.
    if let Err(e) = leads.bootstrap().await {
        tracing::warn!(collection = %leads.collection(), error = %e, "lead collection not ready");
    }

    // ── Tools ────────────────────────────────────────────────────────
    let mut registry = ToolRegistry::new(Duration::from_secs(config.graph.tool_timeout_secs));
    registry.register(Arc::new(RetrieveIcpTool::new(config.profile.path.clone())));
    registry.register(Arc::new(
        SearchCompanyInfoTool::from_config(&config.search)
            .context("initializing company search")?,
    ));
    registry.register(Arc::new(SearchMemoriesTool::new(
        memory.clone(),
        config.memory.user_id.clone(),
        config.memory.search_limit,
    )));
    registry.register(Arc::new(UpdateMemoriesTool::new(memory.clone())));
    registry.register(Arc::new(SearchLeadsTool::new(
        leads.clone(),
        config.pipeline.lead_search_limit,
    )));

    let catalog: Arc<dyn ToolCatalog> = mcp.clone();
    let mut workspace_tools = Vec::new();
    for tool in load_allowed(catalog, &config.mcp.allowed_tools).await {
        if registry.contains(&tool.def.name) {
            tracing::warn!(tool = %tool.def.name, "workspace tool shadows a built-in, skipping");
            continue;
        }
        workspace_tools.push(tool.def.name.clone());
        registry.register(Arc::new(WorkspaceTool::new(tool)));
    }
    let tools = Arc::new(registry);
    tracing::info!(tools = ?tools.names(), "tool registry ready");

    // ── Graph ────────────────────────────────────────────────────────
    let graph = build_pipeline(
        PipelineParts {
            reasoner: Reasoner::new(llm, tools.clone(), workspace_tools),
            tools,
            leads: leads.clone(),
            blocked_industries: config.pipeline.blocked_industries.clone(),
            similar_limit: config.pipeline.similar_limit,
            max_enrichment_rounds: config.graph.max_enrichment_rounds,
        },
        checkpoints.clone(),
        GraphOptions {
            max_steps: config.graph.max_steps,
        },
    )
    .context("building pipeline graph")?;

    let service = ChatService::new(
        Arc::new(graph),
        config.memory.enabled.then(|| memory.clone()),
        config.memory.user_id.clone(),
        &config.chat,
    );

    Ok(Runtime {
        service,
        leads,
        checkpoints,
        mcp,
    })
}
