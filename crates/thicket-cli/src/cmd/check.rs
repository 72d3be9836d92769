//! `tk check`: verify relationship invariants of a snapshot.

use crate::cmd::Session;
use crate::output::{CliError, pretty_section, render_error, render_mode};
use crate::workspace::{Workspace, ensure_exists};
use clap::Args;
use serde::Serialize;
use thicket_core::{ErrorCode, Hierarchy, SnapshotLock, StoreError, Violation};

#[derive(Args, Debug)]
pub struct CheckArgs {}

#[derive(Debug, Serialize)]
struct CheckOutput {
    records: usize,
    ok: bool,
    violations: Vec<Violation>,
}

pub fn run_check(_args: &CheckArgs, session: &Session) -> anyhow::Result<()> {
    ensure_exists(&session.file)?;
    let _lock = SnapshotLock::acquire_default(&session.file)?;
    let snapshot = Workspace::read_snapshot(&session.file)?;
    let records = snapshot.records.len();

    let violations = match Hierarchy::from_snapshot(snapshot, session.store_config.clone()) {
        Ok(store) => store.check(),
        Err(StoreError::Inconsistent(violations)) => violations,
        Err(e) => {
            render_error(session.output, &CliError::with_code(e.to_string(), e.code()))?;
            return Err(e.into());
        }
    };

    let out = CheckOutput {
        records,
        ok: violations.is_empty(),
        violations,
    };

    render_mode(
        session.output,
        &out,
        |o, w| {
            for v in &o.violations {
                writeln!(w, "{v}")?;
            }
            writeln!(w, "{}\t{}", if o.ok { "ok" } else { "fail" }, o.records)
        },
        |o, w| {
            pretty_section(w, "Check")?;
            for v in &o.violations {
                writeln!(w, "  ✗ {v}")?;
            }
            if o.ok {
                writeln!(w, "  ✓ {} records, no violations", o.records)
            } else {
                writeln!(w, "  {} violation(s)", o.violations.len())
            }
        },
    )?;

    if !out.ok {
        let message = format!("{} violation(s) found", out.violations.len());
        render_error(
            session.output,
            &CliError::with_code(message.as_str(), ErrorCode::InconsistentSnapshot),
        )?;
        anyhow::bail!(message);
    }
    Ok(())
}
