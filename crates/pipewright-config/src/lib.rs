//! Pipewright Config
//!
//! This crate contains the serializable pipeline types for pipewright.
//! A pipeline is the graph an operator draws in the editor: host, script,
//! conditional and notification nodes joined by success/failure edges.
//!
//! Pipelines are loaded from:
//! - JSON files (via CLI, e.g. `pipewright compile pipeline.json`)
//! - The pipeline persistence API (as JSON documents)
//!
//! The graph store takes these types, enforces the graph invariants, and the
//! compiler turns them into per-host jobs.

mod edge;
mod node;
mod pipeline;
mod script;

pub use edge::{Branch, Edge};
pub use node::{HostRef, Node, NodeId, NodeKind, NodeSpec, NotifyChannel, Position};
pub use pipeline::{Pipeline, PipelineId};
pub use script::ScriptRef;
