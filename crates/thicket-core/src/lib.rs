//! thicket-core: an in-memory, indexed, multi-parent hierarchy of records.
//!
//! Every record is reachable in O(1) by identifier through the store's
//! index, and navigable through its `children` and `parents` identifier
//! lists. A record may have several parents without being duplicated.
//!
//! ```
//! use thicket_core::{Draft, Hierarchy, StoreConfig};
//!
//! let mut store = Hierarchy::with_config(StoreConfig::with_disambiguation(["type"]));
//! store.add(Draft::named("log").with_field("type", "object"), None)?;
//! let ids = store.add(Draft::named("log").with_field("type", "function"), None)?;
//! assert_eq!(ids, vec!["log_function"]);
//! # Ok::<(), thicket_core::StoreError>(())
//! ```
//!
//! # Conventions
//!
//! - **Errors**: store operations return [`StoreError`]; config loading uses
//!   `anyhow::Result`.
//! - **Logging**: `tracing` macros; the library never installs a subscriber.

pub mod config;
pub mod error;
pub mod lock;
pub mod model;
pub mod snapshot;
pub mod store;
pub mod uid;

pub use config::StoreConfig;
pub use error::{ErrorCode, StoreError};
pub use lock::{LockError, SnapshotLock};
pub use model::{AddInput, Draft, IdSet, RESERVED_FIELDS, Record, Resolved, Target};
pub use snapshot::Snapshot;
pub use store::{Hierarchy, Violation};
pub use uid::ROOT_UID;
