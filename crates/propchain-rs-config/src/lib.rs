//! Inheritable properties files with placeholder resolution.
//!
//! A properties file may declare a parent through a reserved key. This crate
//! loads the ancestor chain depth-first, expands `${...}` placeholders in each
//! layer against its parent's resolved values (falling back to an ambient
//! scope such as the process environment) and merges child over parent.

mod error;
mod loader;
mod model;
mod source;

/// Public error type returned by resolution APIs.
pub use error::ResolveError;
/// Chain loading entry points and the placeholder expander.
pub use loader::{
    PropertiesResolver, ResolvedChain, ResolutionScope, expand_placeholders, resolve,
    resolve_chain,
};
/// Options and value objects.
pub use model::*;
/// Fetch and ambient collaborators.
pub use source::{
    AmbientLookup, FetchError, FileSystemFetcher, MemoryFetcher, NoAmbient, ProcessEnv,
    ResourceFetcher,
};
