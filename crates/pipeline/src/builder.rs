//! Wiring of the lead pipeline graph.

use std::sync::Arc;

use lg_domain::error::Result;
use lg_domain::Lead;
use lg_graph::{CompiledGraph, GraphOptions, StateGraph, END};
use lg_sessions::CheckpointStore;
use lg_tools::ToolRegistry;
use lg_vector::VectorStore;

use crate::nodes::{
    ChatbotNode, EnricherNode, LeadFinderNode, Reasoner, ScreenerNode, StoreLeadsNode,
    SummaryNode, ToolsNode, UpdateLeadNode,
};
use crate::routing::{
    chatbot_route, enrichment_route, tool_condition, tools_route, CHATBOT, DONE, ENRICHER,
    LEAD_FINDER, SCREENER, STORE_LEADS, SUMMARY, TOOLS, UPDATE_LEAD,
};
use crate::state::State;

/// Everything the pipeline nodes depend on.
pub struct PipelineParts {
    pub reasoner: Reasoner,
    pub tools: Arc<ToolRegistry>,
    pub leads: Arc<VectorStore<Lead>>,
    pub blocked_industries: Vec<String>,
    pub similar_limit: usize,
    pub max_enrichment_rounds: u32,
}

/// The uncompiled pipeline graph.
pub fn pipeline_graph(parts: PipelineParts) -> StateGraph<State> {
    let mut g = StateGraph::new();

    g.register(CHATBOT, ChatbotNode::new(parts.reasoner.clone()))
        .register(TOOLS, ToolsNode::new(parts.tools))
        .register(LEAD_FINDER, LeadFinderNode::new(parts.reasoner.clone()))
        .register(SCREENER, ScreenerNode::new(parts.blocked_industries))
        .register(
            ENRICHER,
            EnricherNode::new(parts.reasoner.clone(), parts.max_enrichment_rounds),
        )
        .register(UPDATE_LEAD, UpdateLeadNode::new(parts.reasoner.clone()))
        .register(SUMMARY, SummaryNode::new(parts.reasoner))
        .register(STORE_LEADS, StoreLeadsNode::new(parts.leads, parts.similar_limit));

    g.set_entry(CHATBOT);

    g.connect_conditional(
        CHATBOT,
        chatbot_route,
        [
            (TOOLS, TOOLS),
            (LEAD_FINDER, LEAD_FINDER),
            (SUMMARY, SUMMARY),
            (DONE, END),
        ],
    );
    g.connect_conditional(
        TOOLS,
        tools_route,
        [
            (CHATBOT, CHATBOT),
            (LEAD_FINDER, LEAD_FINDER),
            (ENRICHER, ENRICHER),
        ],
    );
    g.connect_conditional(
        LEAD_FINDER,
        tool_condition(SCREENER),
        [(TOOLS, TOOLS), (SCREENER, SCREENER)],
    );
    g.connect(SCREENER, ENRICHER);
    g.connect_conditional(
        ENRICHER,
        tool_condition(UPDATE_LEAD),
        [(TOOLS, TOOLS), (UPDATE_LEAD, UPDATE_LEAD)],
    );
    g.connect_conditional(
        UPDATE_LEAD,
        enrichment_route(parts.max_enrichment_rounds),
        [(ENRICHER, ENRICHER), (STORE_LEADS, STORE_LEADS)],
    );
    g.connect(STORE_LEADS, SUMMARY);
    g.connect(SUMMARY, END);

    g
}

pub fn build_pipeline(
    parts: PipelineParts,
    store: Arc<dyn CheckpointStore>,
    options: GraphOptions,
) -> Result<CompiledGraph<State>> {
    pipeline_graph(parts).compile(store, options)
}
