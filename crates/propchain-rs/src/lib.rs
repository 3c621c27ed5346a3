//! Public SDK surface for propchain.
//!
//! This crate re-exports the resolution engine and provides a small
//! initialization helper to keep consumer setup consistent.

/// Re-export for convenience.
pub use propchain_rs_config as config;
pub use propchain_rs_config::{
    MergedProperties, PropertiesResolver, ResolutionOptions, ResolveError, resolve,
};

mod render;

pub use render::{OutputFormat, render};

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled. Binaries are still expected
/// to call this early in startup to ensure log output is wired up.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::builder()
            .format_timestamp_millis()
            .parse_default_env()
            .try_init();
    }
}
