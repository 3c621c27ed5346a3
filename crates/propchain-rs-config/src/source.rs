//! Fetch and ambient-scope collaborators used by the chain loader.

use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CLASSPATH_SCHEME: &str = "classpath:";
const FILE_SCHEME: &str = "file:";

/// Failure reported by a [`ResourceFetcher`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("unsupported location scheme: {0}")]
    UnsupportedScheme(String),
    #[error("failed to read {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: io::Error,
    },
}

/// Retrieves the raw bytes behind a location string.
pub trait ResourceFetcher: Send + Sync {
    fn fetch(&self, location: &str) -> Result<Vec<u8>, FetchError>;

    /// Stable identity used to detect a chain revisiting a location.
    fn canonical_location(&self, location: &str) -> String {
        location.to_string()
    }
}

/// Read-only, process-wide fallback for placeholder names.
pub trait AmbientLookup: Send + Sync {
    fn lookup(&self, name: &str) -> Option<String>;
}

/// Fetches `classpath:`, `file:` and bare-path locations from disk.
#[derive(Debug, Clone)]
pub struct FileSystemFetcher {
    base_dir: PathBuf,
    classpath_roots: Vec<PathBuf>,
}

impl FileSystemFetcher {
    /// Resolve relative paths against `base_dir`.
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            classpath_roots: Vec::new(),
        }
    }

    /// Add a root searched (in insertion order) for `classpath:` locations.
    pub fn with_classpath_root(mut self, root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let root = if root.is_absolute() {
            root.to_path_buf()
        } else {
            self.base_dir.join(root)
        };
        self.classpath_roots.push(root);
        self
    }

    /// Map a location onto a path on disk.
    fn locate(&self, location: &str) -> Result<PathBuf, FetchError> {
        if let Some(rest) = location.strip_prefix(CLASSPATH_SCHEME) {
            let relative = rest.trim_start_matches('/');
            return self
                .classpath_roots
                .iter()
                .map(|root| root.join(relative))
                .find(|candidate| candidate.is_file())
                .ok_or_else(|| FetchError::NotFound(location.to_string()));
        }
        let raw = match location.strip_prefix(FILE_SCHEME) {
            Some(rest) => rest,
            None if location.contains("://") => {
                return Err(FetchError::UnsupportedScheme(location.to_string()));
            }
            None => location,
        };
        let path = Path::new(raw);
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            Ok(self.base_dir.join(path))
        }
    }
}

impl Default for FileSystemFetcher {
    fn default() -> Self {
        Self::new(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}

impl ResourceFetcher for FileSystemFetcher {
    fn fetch(&self, location: &str) -> Result<Vec<u8>, FetchError> {
        let path = self.locate(location)?;
        debug!("reading {} from {}", location, path.display());
        std::fs::read(&path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => FetchError::NotFound(location.to_string()),
            _ => FetchError::Io {
                location: location.to_string(),
                source: err,
            },
        })
    }

    fn canonical_location(&self, location: &str) -> String {
        match self.locate(location) {
            Ok(path) => path
                .canonicalize()
                .unwrap_or(path)
                .to_string_lossy()
                .into_owned(),
            Err(_) => location.to_string(),
        }
    }
}

/// In-memory location table.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    resources: HashMap<String, Vec<u8>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `contents` under `location`, replacing any previous entry.
    pub fn with_resource(mut self, location: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(location, contents);
        self
    }

    pub fn insert(&mut self, location: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.resources.insert(location.into(), contents.into());
    }
}

impl ResourceFetcher for MemoryFetcher {
    fn fetch(&self, location: &str) -> Result<Vec<u8>, FetchError> {
        self.resources
            .get(location)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(location.to_string()))
    }
}

/// Ambient scope backed by the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl AmbientLookup for ProcessEnv {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Ambient scope that never provides a value.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAmbient;

impl AmbientLookup for NoAmbient {
    fn lookup(&self, _name: &str) -> Option<String> {
        None
    }
}

impl AmbientLookup for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl AmbientLookup for BTreeMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}
