//! Test helpers shared across propchain crates.

pub mod fetch;
pub mod fixtures;

pub use fetch::{FailingFetcher, RecordingFetcher};
pub use fixtures::{FixtureTree, fixture_ambient};
