//! Resolution options and property value objects.

use crate::ResolveError;
use directories::UserDirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fs;
use std::path::{Path, PathBuf};

/// Default placeholder prefix.
pub const DEFAULT_PLACEHOLDER_PREFIX: &str = "${";
/// Default placeholder suffix.
pub const DEFAULT_PLACEHOLDER_SUFFIX: &str = "}";
/// Default separator between a placeholder name and its default value.
pub const DEFAULT_VALUE_SEPARATOR: &str = ":";
/// Default reserved key naming the parent location.
pub const DEFAULT_EXTENDS_KEY: &str = "__extends__";
/// Default suffix selecting the XML codec.
pub const DEFAULT_STRUCTURED_SUFFIX: &str = ".xml";
/// Default bound on ancestor chain length.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default options directory under the user's home.
const DEFAULT_OPTIONS_DIR: &str = ".propchain";
/// Default options filename.
const DEFAULT_OPTIONS_FILE: &str = "propchain.json5";

/// One decoded file's key/value pairs before merging with its parent.
pub type PropertyLayer = BTreeMap<String, String>;

/// Options for a single resolution run, shared by every layer in the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolutionOptions {
    pub placeholder_prefix: String,
    pub placeholder_suffix: String,
    /// Splits `name` from `default`; an empty separator disables defaults.
    pub value_separator: String,
    pub extends_key: String,
    /// Leave unresolvable placeholders verbatim instead of failing.
    pub ignore_unresolvable: bool,
    /// Let names unknown to the parent and ambient scopes fall back to the
    /// layer's own keys.
    ///
    /// This departs from pure ancestor-only scoping, where a layer sees only
    /// its parent's resolved values and the ambient scope, so that a file may
    /// compose values from its own keys. Ancestor and ambient values still
    /// win, and a key never falls back to itself. Set to `false` for strict
    /// ancestor-only resolution.
    pub sibling_fallback: bool,
    /// Locations ending with this suffix (ASCII case-insensitive) are XML.
    pub structured_suffix: String,
    /// Maximum number of layers in one chain.
    pub max_depth: usize,
}

impl Default for ResolutionOptions {
    fn default() -> Self {
        Self {
            placeholder_prefix: DEFAULT_PLACEHOLDER_PREFIX.to_string(),
            placeholder_suffix: DEFAULT_PLACEHOLDER_SUFFIX.to_string(),
            value_separator: DEFAULT_VALUE_SEPARATOR.to_string(),
            extends_key: DEFAULT_EXTENDS_KEY.to_string(),
            ignore_unresolvable: false,
            sibling_fallback: true,
            structured_suffix: DEFAULT_STRUCTURED_SUFFIX.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ResolutionOptions {
    /// Override the placeholder prefix.
    pub fn with_placeholder_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.placeholder_prefix = prefix.into();
        self
    }

    /// Override the placeholder suffix.
    pub fn with_placeholder_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.placeholder_suffix = suffix.into();
        self
    }

    /// Override the name/default separator.
    pub fn with_value_separator(mut self, separator: impl Into<String>) -> Self {
        self.value_separator = separator.into();
        self
    }

    /// Override the reserved parent key.
    pub fn with_extends_key(mut self, key: impl Into<String>) -> Self {
        self.extends_key = key.into();
        self
    }

    /// Toggle lenient placeholder handling.
    pub fn with_ignore_unresolvable(mut self, ignore: bool) -> Self {
        self.ignore_unresolvable = ignore;
        self
    }

    /// Toggle the same-layer fallback for placeholder names.
    pub fn with_sibling_fallback(mut self, enabled: bool) -> Self {
        self.sibling_fallback = enabled;
        self
    }

    /// Override the suffix that selects the XML codec.
    pub fn with_structured_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.structured_suffix = suffix.into();
        self
    }

    /// Override the chain length limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Load options from a JSON5 file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ResolveError> {
        info!("loading resolution options from path: {}", path.as_ref().display());
        let contents = fs::read_to_string(path)?;
        Self::load_from_str(&contents)
    }

    /// Load options from JSON5 contents; missing fields keep their defaults.
    pub fn load_from_str(contents: &str) -> Result<Self, ResolveError> {
        debug!("loading resolution options from raw contents (len={})", contents.len());
        let value: Value = json5::from_str(contents)?;
        let options: ResolutionOptions = serde_json::from_value(value)?;
        options.validate()?;
        Ok(options)
    }

    /// Load `~/.propchain/propchain.json5` if it exists, defaults otherwise.
    pub fn load_user_default() -> Result<Self, ResolveError> {
        match Self::default_user_path() {
            Some(path) if path.exists() => Self::load_from_path(path),
            _ => Ok(Self::default()),
        }
    }

    /// Default per-user options path under the home directory.
    pub fn default_user_path() -> Option<PathBuf> {
        UserDirs::new().map(|dirs| {
            dirs.home_dir()
                .join(DEFAULT_OPTIONS_DIR)
                .join(DEFAULT_OPTIONS_FILE)
        })
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ResolveError> {
        let required = [
            ("placeholder_prefix", &self.placeholder_prefix),
            ("placeholder_suffix", &self.placeholder_suffix),
            ("extends_key", &self.extends_key),
        ];
        for (field, value) in required {
            if value.is_empty() {
                return Err(ResolveError::InvalidArgument(format!(
                    "{field} must not be empty"
                )));
            }
        }
        if self.max_depth == 0 {
            return Err(ResolveError::InvalidArgument(
                "max_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fully merged, fully resolved properties returned to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MergedProperties(BTreeMap<String, String>);

impl MergedProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries sorted by key.
    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.0.iter()
    }

    /// Insert or overwrite a key, returning the previous value.
    pub fn insert(&mut self, key: String, value: String) -> Option<String> {
        self.0.insert(key, value)
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl From<BTreeMap<String, String>> for MergedProperties {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl<'a> IntoIterator for &'a MergedProperties {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for MergedProperties {
    type Item = (String, String);
    type IntoIter = btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
