//! Pipewright Graph
//!
//! This crate provides the editable pipeline graph. The [`GraphStore`] owns
//! the nodes and edges of the pipeline being edited and enforces the graph
//! invariants on every mutation:
//! - node ids are unique and never reused within a session
//! - host and script nodes carry their references
//! - no self-loops, one outgoing edge per branch, failure edges only from
//!   scripts and conditionals
//! - deleting a node removes every edge touching it
//!
//! [`Graph`] is the read-only adjacency view used by traversals.

mod error;
mod graph;
mod store;

pub use error::{EdgeRejection, GraphError};
pub use graph::Graph;
pub use store::GraphStore;
