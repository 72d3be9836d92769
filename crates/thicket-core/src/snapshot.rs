//! Plain-data export and reload of a [`Hierarchy`].
//!
//! Because relationships are identifier lists, a snapshot is just the
//! records plus the root's children. Reload indexes every record by
//! identifier before any relationship is looked at, then verifies the
//! result with [`Hierarchy::check`].
//!
//! ```json
//! {
//!   "version": 1,
//!   "disambiguate": ["type"],
//!   "root": ["docs"],
//!   "records": [
//!     { "name": "docs", "uid": "docs", "children": [], "parents": ["root"] }
//!   ]
//! }
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::model::{IdSet, Record};
use crate::store::Hierarchy;
use crate::uid::ROOT_UID;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable image of a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    /// Disambiguation fields in effect when the snapshot was taken.
    #[serde(default)]
    pub disambiguate: Vec<String>,
    /// Children of the root.
    #[serde(default)]
    pub root: IdSet,
    /// Every indexed record, ordered by identifier.
    #[serde(default)]
    pub records: Vec<Record>,
}

impl Snapshot {
    /// Serialize as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Json`] if a payload value cannot be serialized.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a snapshot from JSON. Does not validate relationships; that
    /// happens in [`Hierarchy::from_snapshot`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Json`] on malformed input.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Hierarchy {
    /// Export the store.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let mut records: Vec<Record> = self.records().cloned().collect();
        records.sort_by(|a, b| a.uid().cmp(b.uid()));
        Snapshot {
            version: SNAPSHOT_VERSION,
            disambiguate: self.config().disambiguate.clone(),
            root: self.root().children().clone(),
            records,
        }
    }

    /// Rebuild a store from a snapshot.
    ///
    /// The snapshot's own disambiguation list is used unless `config`
    /// is given.
    ///
    /// # Errors
    ///
    /// - [`StoreError::UnsupportedVersion`] for an unknown format version.
    /// - [`StoreError::ReservedUid`] if a record uses the root sentinel.
    /// - [`StoreError::DuplicateUid`] if two records share an identifier.
    /// - [`StoreError::Inconsistent`] if the relationships break the store
    ///   invariants.
    pub fn from_snapshot(snapshot: Snapshot, config: Option<StoreConfig>) -> Result<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StoreError::UnsupportedVersion {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }

        let mut index = HashMap::with_capacity(snapshot.records.len());
        for record in snapshot.records {
            let uid = record.uid().to_string();
            if uid == ROOT_UID {
                return Err(StoreError::ReservedUid(uid));
            }
            if index.contains_key(&uid) {
                return Err(StoreError::DuplicateUid(uid));
            }
            index.insert(uid, record);
        }

        let mut root = Record::root();
        root.children_mut().merge(&snapshot.root);

        let config = config.unwrap_or(StoreConfig {
            disambiguate: snapshot.disambiguate,
        });
        let store = Self::from_parts(index, root, config);

        let violations = store.check();
        if !violations.is_empty() {
            return Err(StoreError::Inconsistent(violations));
        }

        tracing::debug!(records = store.len(), "snapshot loaded");
        Ok(store)
    }
}
