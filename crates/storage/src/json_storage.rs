//! JSON file storage implementation.
//!
//! Stores one `<initiative>.json` file per snapshot under `snapshots/` and a
//! small meta marker (version + updated_at) beside it. `config.json` sits at
//! the root of the data directory.

use std::path::{Path, PathBuf};
use pmo_core::{Config, InitiativeId, Snapshot};
use super::{Storage, Result};
use tokio::fs;
use tracing::debug;

/// File-based JSON storage backend.
pub struct JsonStorage {
    root: PathBuf,
}

impl JsonStorage {
    /// Create storage, creating the data directories if needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(root.join("snapshots")).await?;
        fs::create_dir_all(root.join("meta").join("snapshots")).await?;

        Ok(Self { root })
    }

    /// Data directory root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn snapshot_path(&self, id: InitiativeId) -> PathBuf {
        self.root.join("snapshots").join(format!("{}.json", id))
    }

    fn meta_path(&self, id: InitiativeId) -> PathBuf {
        self.root.join("meta").join("snapshots").join(format!("{}.meta.json", id))
    }

    fn config_path(&self) -> PathBuf {
        self.root.join("config.json")
    }

    /// Current stored version of a snapshot, 0 if never saved.
    pub async fn version(&self, id: InitiativeId) -> Result<u64> {
        let meta: Option<serde_json::Value> = read_json(&self.meta_path(id)).await?;
        Ok(meta
            .and_then(|json| json.get("version").and_then(|v| v.as_u64()))
            .unwrap_or(0))
    }

    /// Read and increment the snapshot version, return the new version.
    async fn bump_version(&self, id: InitiativeId) -> Result<u64> {
        let version = self.version(id).await? + 1;
        let meta = serde_json::json!({"version": version, "updated_at": chrono::Utc::now()});
        write_atomic(&self.meta_path(id), &serde_json::to_string_pretty(&meta)?).await?;
        Ok(version)
    }
}

#[async_trait::async_trait]
impl Storage for JsonStorage {
    async fn save_snapshot(&mut self, snapshot: &Snapshot) -> Result<u64> {
        let id = snapshot.initiative.id;
        let json = serde_json::to_string_pretty(snapshot)?;
        write_atomic(&self.snapshot_path(id), &json).await?;

        let version = self.bump_version(id).await?;
        debug!(initiative = %id, version, "saved snapshot");
        Ok(version)
    }

    async fn load_snapshot(&self, id: InitiativeId) -> Result<Option<Snapshot>> {
        read_json(&self.snapshot_path(id)).await
    }

    async fn list_snapshots(&self) -> Result<Vec<Snapshot>> {
        let mut snapshots: Vec<Snapshot> = list_dir(&self.root.join("snapshots")).await?;
        snapshots.sort_by(|a, b| a.initiative.created_at.cmp(&b.initiative.created_at));
        Ok(snapshots)
    }

    async fn delete_snapshot(&mut self, id: InitiativeId) -> Result<()> {
        for path in [self.snapshot_path(id), self.meta_path(id)] {
            fs::remove_file(path).await.or_else(|e| {
                if e.kind() == std::io::ErrorKind::NotFound { Ok(()) } else { Err(e) }
            })?;
        }
        Ok(())
    }

    async fn load_config(&self) -> Result<Config> {
        Ok(read_json(&self.config_path()).await?.unwrap_or_default())
    }

    async fn save_config(&mut self, config: &Config) -> Result<()> {
        write_atomic(&self.config_path(), &serde_json::to_string_pretty(config)?).await
    }
}

/// Write through a temporary file and rename over the target.
async fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents.as_bytes()).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path).await {
        Ok(json) => {
            let value = serde_json::from_str(&json)?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn list_dir<T: serde::de::DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut rd = fs::read_dir(dir).await?;
    while let Some(entry) = rd.next_entry().await? {
        if entry.path().extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        if let Some(item) = read_json(&entry.path()).await? {
            items.push(item);
        }
    }
    Ok(items)
}
