use parking_lot::Mutex;
use propchain_rs_config::{FetchError, ResourceFetcher};
use std::io;
use std::sync::Arc;

/// Wraps a fetcher and records every requested location in order.
pub struct RecordingFetcher<F> {
    inner: F,
    seen: Arc<Mutex<Vec<String>>>,
}

impl<F: ResourceFetcher> RecordingFetcher<F> {
    pub fn new(inner: F) -> (Self, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                inner,
                seen: seen.clone(),
            },
            seen,
        )
    }
}

impl<F: ResourceFetcher> ResourceFetcher for RecordingFetcher<F> {
    fn fetch(&self, location: &str) -> Result<Vec<u8>, FetchError> {
        self.seen.lock().push(location.to_string());
        self.inner.fetch(location)
    }

    fn canonical_location(&self, location: &str) -> String {
        self.inner.canonical_location(location)
    }
}

/// Fetcher whose reads always fail with an I/O error.
#[derive(Debug, Clone, Default)]
pub struct FailingFetcher;

impl ResourceFetcher for FailingFetcher {
    fn fetch(&self, location: &str) -> Result<Vec<u8>, FetchError> {
        Err(FetchError::Io {
            location: location.to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        })
    }
}
