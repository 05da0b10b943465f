//! Pipewright Resolver
//!
//! Resolves script references on script nodes to script text. Content comes
//! from a [`ScriptSource`] and is cached for the editing session.

mod cache;
mod error;
mod resolver;
mod source;

pub use cache::ScriptCache;
pub use error::{ResolveError, SourceError};
pub use resolver::{CachingResolver, Resolver};
pub use source::{CATALOG_DIRECTORIES, LocalScript, RemoteScript, ScriptSource};
