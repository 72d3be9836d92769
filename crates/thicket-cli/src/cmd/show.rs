//! `tk show`, `tk children`, `tk parents`: read records and their neighbours.

use crate::cmd::{Session, require};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use clap::Args;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::{self, Write};
use thicket_core::Record;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Record identifier (`root` shows the top level).
    pub uid: String,
}

#[derive(Args, Debug)]
pub struct NeighbourArgs {
    /// Record identifier (`root` for top-level records).
    pub uid: String,
}

/// Serializable view of a record, shared by commands that print records.
#[derive(Debug, Serialize)]
pub struct RecordView {
    pub uid: String,
    pub name: String,
    pub parents: Vec<String>,
    pub children: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, Value>,
}

impl From<&Record> for RecordView {
    fn from(record: &Record) -> Self {
        Self {
            uid: record.uid().to_string(),
            name: record.name.clone(),
            parents: record.parents().to_vec(),
            children: record.children().to_vec(),
            fields: record.fields().clone(),
        }
    }
}

/// One record per line: `uid<TAB>name`.
pub fn write_rows(w: &mut dyn Write, records: &[RecordView]) -> io::Result<()> {
    for record in records {
        writeln!(w, "{}\t{}", record.uid, record.name)?;
    }
    Ok(())
}

/// Aligned `uid  name` table with a heading.
pub fn write_table(w: &mut dyn Write, heading: &str, records: &[RecordView]) -> io::Result<()> {
    pretty_section(w, heading)?;
    if records.is_empty() {
        writeln!(w, "(none)")?;
        return Ok(());
    }
    let width = records.iter().map(|r| r.uid.len()).max().unwrap_or(0);
    for record in records {
        writeln!(w, "{:<width$}  {}", record.uid, record.name)?;
    }
    Ok(())
}

fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn write_record(w: &mut dyn Write, record: &RecordView) -> io::Result<()> {
    pretty_section(w, &format!("{} ({})", record.uid, record.name))?;
    pretty_kv(w, "parents", join_or_dash(&record.parents))?;
    pretty_kv(w, "children", join_or_dash(&record.children))?;
    for (key, value) in &record.fields {
        pretty_kv(w, key, field_text(value))?;
    }
    Ok(())
}

fn write_record_text(w: &mut dyn Write, record: &RecordView) -> io::Result<()> {
    writeln!(w, "uid\t{}", record.uid)?;
    writeln!(w, "name\t{}", record.name)?;
    writeln!(w, "parents\t{}", record.parents.join(","))?;
    writeln!(w, "children\t{}", record.children.join(","))?;
    for (key, value) in &record.fields {
        writeln!(w, "{key}\t{}", field_text(value))?;
    }
    Ok(())
}

fn join_or_dash(ids: &[String]) -> String {
    if ids.is_empty() {
        "-".to_string()
    } else {
        ids.join(", ")
    }
}

pub fn run_show(args: &ShowArgs, session: &Session) -> anyhow::Result<()> {
    let workspace = session.open()?;
    let record = RecordView::from(require(&workspace.store, &args.uid, session.output)?);
    render_mode(
        session.output,
        &record,
        |r, w| write_record_text(w, r),
        |r, w| write_record(w, r),
    )
}

pub fn run_children(args: &NeighbourArgs, session: &Session) -> anyhow::Result<()> {
    let workspace = session.open()?;
    require(&workspace.store, &args.uid, session.output)?;
    let children: Vec<RecordView> = workspace
        .store
        .children_of(&args.uid)
        .into_iter()
        .map(RecordView::from)
        .collect();
    list(session.output, &format!("Children of {}", args.uid), &children)
}

pub fn run_parents(args: &NeighbourArgs, session: &Session) -> anyhow::Result<()> {
    let workspace = session.open()?;
    require(&workspace.store, &args.uid, session.output)?;
    let parents: Vec<RecordView> = workspace
        .store
        .parents_of(&args.uid)
        .into_iter()
        .map(RecordView::from)
        .collect();
    list(session.output, &format!("Parents of {}", args.uid), &parents)
}

pub fn list(output: OutputMode, heading: &str, records: &[RecordView]) -> anyhow::Result<()> {
    render_mode(
        output,
        &records,
        |r, w| write_rows(w, r),
        |r, w| write_table(w, heading, r),
    )
}
