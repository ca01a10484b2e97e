//! Error types for the state engine and its platform seam.

use std::fmt;
use thiserror::Error;

/// Which store an operation targeted. Failures are isolated per store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
    Tabs,
    Bookmarks,
}

impl StoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::Tabs => "tabs",
            StoreKind::Bookmarks => "bookmarks",
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors reported by a [`PlatformService`](crate::platform::PlatformService).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// The platform refused the request (bad id, permission, closed window)
    #[error("platform rejected request: {0}")]
    Rejected(String),

    /// The platform API could not be reached
    #[error("platform unavailable: {0}")]
    Unavailable(String),

    /// The platform answered with data we could not decode
    #[error("failed to decode platform data: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for PlatformError {
    fn from(e: serde_json::Error) -> Self {
        PlatformError::Decode(e.to_string())
    }
}

/// Errors surfaced to callers of the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A refresh failed; the store still holds its last good snapshot.
    #[error("failed to fetch {store}: {source}")]
    Fetch {
        store: StoreKind,
        #[source]
        source: PlatformError,
    },

    /// A removal or activation request was rejected after local state was
    /// already updated. Local state is not rolled back.
    #[error("{operation} failed: {source}")]
    Mutation {
        operation: &'static str,
        #[source]
        source: PlatformError,
    },

    /// Invalid engine configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl EngineError {
    pub fn fetch(store: StoreKind, source: PlatformError) -> Self {
        EngineError::Fetch { store, source }
    }

    pub fn mutation(operation: &'static str, source: PlatformError) -> Self {
        EngineError::Mutation { operation, source }
    }

    /// Store the failure belongs to, when it came from a refresh.
    pub fn store(&self) -> Option<StoreKind> {
        match self {
            EngineError::Fetch { store, .. } => Some(*store),
            _ => None,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
