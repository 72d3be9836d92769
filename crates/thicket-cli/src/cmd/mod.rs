pub mod add;
pub mod check;
pub mod completions;
pub mod find;
pub mod init;
pub mod link;
pub mod rm;
pub mod show;
pub mod tree;

use anyhow::{Result, bail};
use serde_json::Value;
use std::path::PathBuf;
use thicket_core::{ErrorCode, Hierarchy, Record, StoreConfig};

use crate::output::{CliError, OutputMode, render_error};
use crate::workspace::Workspace;

/// Per-invocation settings shared by every command handler.
pub struct Session {
    pub file: PathBuf,
    pub output: OutputMode,
    /// Store settings from flags or config files. `None` keeps the
    /// snapshot's own settings.
    pub store_config: Option<StoreConfig>,
}

impl Session {
    pub fn open(&self) -> Result<Workspace> {
        Workspace::open(&self.file, self.store_config.clone())
    }
}

/// Look up a record or report a coded "not found" error.
pub fn require<'a>(store: &'a Hierarchy, uid: &str, output: OutputMode) -> Result<&'a Record> {
    if let Some(record) = store.get(uid) {
        return Ok(record);
    }
    render_error(
        output,
        &CliError::with_code(format!("record not found: {uid}"), ErrorCode::RecordNotFound)
            .suggest("Run `tk tree` to list records."),
    )?;
    bail!("record not found: {uid}")
}

/// Parse `KEY=VALUE`. The value is read as JSON when it parses, otherwise
/// taken as a plain string.
pub fn parse_assignment(raw: &str) -> Result<(String, Value)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("expected KEY=VALUE, got '{raw}'");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("empty key in '{raw}'");
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}
