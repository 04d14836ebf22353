use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broad error category used for boundary handling.
///
/// Store transitions themselves are total functions and cannot fail; errors
/// only arise at the channel, persistence, and configuration boundary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StoreErrorCategory {
    /// Invalid input or unsupported configuration.
    Config,
    /// Local persistence (filesystem/quota) failure.
    Storage,
    /// Serialization/deserialization failure.
    Serialization,
    /// Internal invariant break.
    Internal,
}

/// Stable error payload emitted across the store boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[error("{category:?}:{code}: {message}")]
pub struct StoreError {
    /// High-level error category.
    pub category: StoreErrorCategory,
    /// Stable machine-readable error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl StoreError {
    /// Construct a new store error.
    pub fn new(
        category: StoreErrorCategory,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Build a storage error from an I/O failure.
    pub fn storage(err: &std::io::Error) -> Self {
        Self::new(StoreErrorCategory::Storage, "snapshot_io", err.to_string())
    }

    /// Build a serialization error from a JSON failure.
    pub fn serialization(err: &serde_json::Error) -> Self {
        Self::new(
            StoreErrorCategory::Serialization,
            "snapshot_encode",
            err.to_string(),
        )
    }
}
