use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::application::repos::SourceError;

/// Failures while wiring adapters at startup or touching the filesystem
/// outside the key-value store.
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("failed to open local store at `{}`: {source}", path.display())]
    StoreOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read `{}`: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("fixture source unusable: {0}")]
    Fixtures(#[source] SourceError),
    #[error("remote client unusable: {0}")]
    RemoteClient(#[source] SourceError),
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
}

impl InfraError {
    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }
}
