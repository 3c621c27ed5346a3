//! Error types for property chain resolution.

use crate::source::FetchError;
use thiserror::Error;

/// Errors returned while resolving an inheritable properties chain.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The caller supplied an empty location or unusable options.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The fetch collaborator could not retrieve a location at any depth.
    #[error("source unavailable: {location}")]
    SourceUnavailable {
        location: String,
        #[source]
        source: FetchError,
    },
    /// Bytes were fetched but are not valid under the selected codec.
    ///
    /// This is the decode-error kind: a malformed text or XML layer.
    #[error("failed to decode {location}: {message}")]
    DecodeFailed { location: String, message: String },
    /// A placeholder had no ancestor/ambient value and no default.
    #[error("could not resolve placeholder '{name}' in value \"{value}\"")]
    UnresolvedPlaceholder { name: String, value: String },
    /// Same-layer placeholders refer to each other in a loop.
    #[error("circular placeholder reference '{name}'")]
    CircularPlaceholder { name: String },
    /// A location extends itself, directly or through its ancestors.
    #[error("cyclic extension: {}", chain.join(" -> "))]
    CyclicExtension { chain: Vec<String> },
    /// The ancestor chain is longer than the configured limit.
    #[error("extension chain exceeds max depth {max_depth} at {location}")]
    DepthExceeded { location: String, max_depth: usize },
    /// Reading an options file failed.
    #[error("failed to read options: {0}")]
    ReadFailed(#[from] std::io::Error),
    /// Parsing an options file failed.
    #[error("failed to parse options: {0}")]
    ParseFailed(#[from] json5::Error),
    /// Converting parsed options failed.
    #[error("failed to decode options: {0}")]
    OptionsInvalid(#[from] serde_json::Error),
}
