//! Inheritable properties chain loader.
//!
//! Fetches a layer, follows its reserved extends key to load the parent
//! first, expands the layer's placeholders against the parent's resolved
//! values and merges child over parent.

mod layer_io;
mod merge;
mod placeholder;


pub use placeholder::{ResolutionScope, expand_placeholders};

use crate::{
    AmbientLookup, FileSystemFetcher, MergedProperties, ProcessEnv, PropertyLayer,
    ResolutionOptions, ResolveError, ResourceFetcher,
};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::Arc;

/// Resolved properties plus the locations that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedChain {
    /// The merged, fully expanded properties.
    pub properties: MergedProperties,
    /// Loaded locations, root-most ancestor first.
    pub chain: Vec<String>,
}

/// Resolve `location` and its ancestors into one merged mapping.
pub fn resolve(
    location: &str,
    options: &ResolutionOptions,
    fetcher: &dyn ResourceFetcher,
    ambient: &dyn AmbientLookup,
) -> Result<MergedProperties, ResolveError> {
    resolve_chain(location, options, fetcher, ambient).map(|resolved| resolved.properties)
}

/// Like [`resolve`], also reporting the ancestor chain that was loaded.
pub fn resolve_chain(
    location: &str,
    options: &ResolutionOptions,
    fetcher: &dyn ResourceFetcher,
    ambient: &dyn AmbientLookup,
) -> Result<ResolvedChain, ResolveError> {
    if location.trim().is_empty() {
        return Err(ResolveError::InvalidArgument(
            "location must not be empty".to_string(),
        ));
    }
    options.validate()?;

    let mut run = ChainRun {
        options,
        fetcher,
        ambient,
        visited: HashSet::new(),
        path: Vec::new(),
        chain: Vec::new(),
    };
    let properties = run.load(location)?;
    info!(
        "resolved properties chain (location={}, layers={}, keys={})",
        location,
        run.chain.len(),
        properties.len()
    );
    Ok(ResolvedChain {
        properties,
        chain: run.chain,
    })
}

/// State private to one top-level resolution.
struct ChainRun<'a> {
    options: &'a ResolutionOptions,
    fetcher: &'a dyn ResourceFetcher,
    ambient: &'a dyn AmbientLookup,
    /// Canonical locations on the current recursion path.
    visited: HashSet<String>,
    /// Raw locations on the current recursion path, child first.
    path: Vec<String>,
    /// Completed layers, root-most first.
    chain: Vec<String>,
}

impl ChainRun<'_> {
    fn load(&mut self, location: &str) -> Result<MergedProperties, ResolveError> {
        let canonical = self.fetcher.canonical_location(location);
        if self.visited.contains(&canonical) {
            let mut chain = self.path.clone();
            chain.push(location.to_string());
            warn!("cyclic extension detected: {}", chain.join(" -> "));
            return Err(ResolveError::CyclicExtension { chain });
        }
        if self.path.len() >= self.options.max_depth {
            return Err(ResolveError::DepthExceeded {
                location: location.to_string(),
                max_depth: self.options.max_depth,
            });
        }
        self.visited.insert(canonical.clone());
        self.path.push(location.to_string());

        let merged = self.load_layer(location)?;

        self.path.pop();
        self.visited.remove(&canonical);
        self.chain.push(location.to_string());
        Ok(merged)
    }

    fn load_layer(&mut self, location: &str) -> Result<MergedProperties, ResolveError> {
        let mut layer = layer_io::load_layer(self.fetcher, location, self.options)?;
        let parent_location = layer.remove(&self.options.extends_key);

        let parent = match parent_location {
            Some(parent_location) => {
                debug!("layer extends parent (location={location}, parent={parent_location})");
                self.load(parent_location.trim())?
            }
            None => MergedProperties::new(),
        };

        let resolved = self.expand_layer(location, layer, &parent)?;
        debug!(
            "merging layer (location={}, own_keys={}, parent_keys={})",
            location,
            resolved.len(),
            parent.len()
        );
        Ok(merge::merge_layer(&parent, resolved))
    }

    fn expand_layer(
        &self,
        location: &str,
        layer: PropertyLayer,
        parent: &MergedProperties,
    ) -> Result<PropertyLayer, ResolveError> {
        let mut scope = ResolutionScope::new(parent, self.ambient);
        if self.options.sibling_fallback {
            scope = scope.with_siblings(&layer);
        }
        layer
            .iter()
            .map(|(key, raw)| {
                match expand_placeholders(raw, &scope.for_key(key), self.options) {
                    Ok(value) => Ok((key.clone(), value)),
                    Err(err) => {
                        warn!("failed to expand {key} in {location}: {err}");
                        Err(err)
                    }
                }
            })
            .collect()
    }
}

/// Owned resolver bundling options with shared collaborators.
///
/// Each call to [`PropertiesResolver::resolve`] is an independent run; the
/// handle can be shared across threads.
#[derive(Clone)]
pub struct PropertiesResolver {
    options: ResolutionOptions,
    fetcher: Arc<dyn ResourceFetcher>,
    ambient: Arc<dyn AmbientLookup>,
}

impl PropertiesResolver {
    /// Filesystem fetcher rooted at the working directory and the process environment.
    pub fn new(options: ResolutionOptions) -> Self {
        Self {
            options,
            fetcher: Arc::new(FileSystemFetcher::default()),
            ambient: Arc::new(ProcessEnv),
        }
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn ResourceFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_ambient(mut self, ambient: Arc<dyn AmbientLookup>) -> Self {
        self.ambient = ambient;
        self
    }

    pub fn options(&self) -> &ResolutionOptions {
        &self.options
    }

    pub fn resolve(&self, location: &str) -> Result<MergedProperties, ResolveError> {
        resolve(
            location,
            &self.options,
            self.fetcher.as_ref(),
            self.ambient.as_ref(),
        )
    }

    pub fn resolve_chain(&self, location: &str) -> Result<ResolvedChain, ResolveError> {
        resolve_chain(
            location,
            &self.options,
            self.fetcher.as_ref(),
            self.ambient.as_ref(),
        )
    }
}

impl Default for PropertiesResolver {
    fn default() -> Self {
        Self::new(ResolutionOptions::default())
    }
}
