//! Loading and saving the snapshot file a `tk` invocation works on.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use thicket_core::{Hierarchy, Snapshot, SnapshotLock, StoreConfig};
use tracing::debug;

/// Default snapshot file name, relative to the working directory.
pub const DEFAULT_FILE: &str = "thicket.json";

/// A store bound to the file it was loaded from. The file stays locked
/// until the workspace is dropped.
pub struct Workspace {
    pub path: PathBuf,
    pub store: Hierarchy,
    _lock: SnapshotLock,
}

impl Workspace {
    /// Create a new, empty snapshot file.
    pub fn create(path: &Path, config: StoreConfig, force: bool) -> Result<Self> {
        let lock = SnapshotLock::acquire_default(path)?;
        if path.exists() && !force {
            bail!(
                "snapshot already exists at {}.\n  Pass --force to overwrite it.",
                path.display()
            );
        }
        let workspace = Self {
            path: path.to_path_buf(),
            store: Hierarchy::with_config(config),
            _lock: lock,
        };
        workspace.save()?;
        Ok(workspace)
    }

    /// Load an existing snapshot file.
    ///
    /// `config` replaces the snapshot's own store settings when given.
    pub fn open(path: &Path, config: Option<StoreConfig>) -> Result<Self> {
        ensure_exists(path)?;
        let lock = SnapshotLock::acquire_default(path)?;
        let snapshot = Self::read_snapshot(path)?;
        let store = Hierarchy::from_snapshot(snapshot, config)
            .with_context(|| format!("Failed to load {}", path.display()))?;

        debug!(path = %path.display(), records = store.len(), "snapshot opened");
        Ok(Self {
            path: path.to_path_buf(),
            store,
            _lock: lock,
        })
    }

    /// Read and parse a snapshot file without validating relationships.
    /// Callers that need a consistent view hold a [`SnapshotLock`].
    pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
        ensure_exists(path)?;
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Snapshot::from_json(&json).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Write the store back, replacing the file atomically.
    pub fn save(&self) -> Result<()> {
        let json = self.store.snapshot().to_json()?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, format!("{json}\n"))
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        debug!(path = %self.path.display(), records = self.store.len(), "snapshot saved");
        Ok(())
    }

    /// Directory holding the snapshot, where `thicket.toml` is looked up.
    pub fn project_root(path: &Path) -> PathBuf {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

/// Fail with an `init` hint when `path` does not exist.
pub fn ensure_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!(
            "snapshot not found at {}.\n  Run `tk init` to create it.",
            path.display()
        );
    }
    Ok(())
}
