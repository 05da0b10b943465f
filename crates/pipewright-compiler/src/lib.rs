//! Pipewright Compiler
//!
//! Turns the pipeline graph into a declarative per-host workflow.
//!
//! # Architecture
//!
//! ```text
//! GraphStore ──▶ Compiler::compile ──▶ CompiledWorkflow ──▶ WorkflowDocument
//!                     │                  (jobs + diagnostics)   (to_yaml / to_json)
//!                     ▼
//!                  Resolver (script content, cached per session)
//! ```
//!
//! Every host node yields one job whose steps are the nodes reachable from
//! it, depth-first in edge insertion order. Success and failure edges are
//! both followed and flattened into one step list; the document does not
//! model branching.
//!
//! # Usage
//!
//! ```ignore
//! let compiler = Compiler::new(CachingResolver::new(FsScriptCatalog::new(dir)));
//! let workflow = compiler.compile(&store).await;
//! println!("{}", workflow.document().to_yaml()?);
//! ```

mod compiler;
mod diagnostic;
mod document;
mod job;
mod slug;

pub use compiler::Compiler;
pub use diagnostic::Diagnostic;
pub use document::{
  DEFAULT_NAME, JobDocument, StepDocument, TRIGGER, WorkflowDocument, catalog_path, serialize,
};
pub use job::{CompiledJob, CompiledWorkflow, Step, StepKind, action_for};
pub use slug::{job_key, slugify};
