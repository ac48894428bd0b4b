//! The conversational lead pipeline.
//!
//! A chatbot node talks to the user and hands off to a discovery pass
//! (lead finder, screener, enricher, update loop) that ends in a summary
//! and a write to the lead repository. [`bootstrap`] wires the graph from
//! configuration and [`service::ChatService`] runs one turn per message.

pub mod bootstrap;
pub mod builder;
pub mod cli;
pub mod nodes;
pub mod routing;
pub mod service;
pub mod state;
pub mod validator;

pub use builder::{build_pipeline, pipeline_graph, PipelineParts};
pub use service::{ChatReply, ChatService};
pub use state::{NextAction, State, StatePatch};
