//! Storage trait abstraction.

use async_trait::async_trait;
use pmo_core::{Config, InitiativeId, Snapshot};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Storage abstraction for initiative snapshots.
///
/// A save replaces the stored snapshot as a unit, so a failed engine call
/// that never reaches `save_snapshot` leaves nothing half written.
#[async_trait]
pub trait Storage: Send + Sync {
    // === Snapshot operations ===

    /// Save a snapshot (create or update). Returns the new version.
    async fn save_snapshot(&mut self, snapshot: &Snapshot) -> Result<u64>;

    /// Load a snapshot by initiative ID.
    async fn load_snapshot(&self, id: InitiativeId) -> Result<Option<Snapshot>>;

    /// List all stored snapshots.
    async fn list_snapshots(&self) -> Result<Vec<Snapshot>>;

    /// Delete a snapshot.
    async fn delete_snapshot(&mut self, id: InitiativeId) -> Result<()>;

    // === Configuration ===

    /// Load the configuration, falling back to defaults when none is stored.
    async fn load_config(&self) -> Result<Config>;

    /// Store the configuration.
    async fn save_config(&mut self, config: &Config) -> Result<()>;
}
