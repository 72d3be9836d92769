//! `tk link` / `tk unlink`: add or drop a parent relationship.

use crate::cmd::Session;
use crate::output::render_mode;
use crate::workspace::Workspace;
use clap::Args;
use serde::Serialize;
use tracing::info;

#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Record that gains the parent.
    pub child: String,

    /// New parent (`root` for the top level).
    pub parent: String,

    /// Detach the child from all current parents first.
    #[arg(long)]
    pub clear: bool,
}

#[derive(Args, Debug)]
pub struct UnlinkArgs {
    /// Record that loses the parent.
    pub child: String,

    /// Parent to drop (`root` for the top level).
    pub parent: String,
}

#[derive(Debug, Serialize)]
struct LinkOutput {
    child: String,
    parent: String,
    /// Both ends named live records.
    resolved: bool,
    /// The child's parent list differs from before; only then is the file
    /// rewritten.
    changed: bool,
    parents: Vec<String>,
}

impl LinkOutput {
    fn new(
        child: &str,
        parent: &str,
        resolved: bool,
        before: &[String],
        after: Vec<String>,
    ) -> Self {
        Self {
            child: child.to_string(),
            parent: parent.to_string(),
            resolved,
            changed: before != after.as_slice(),
            parents: after,
        }
    }
}

pub fn run_link(args: &LinkArgs, session: &Session) -> anyhow::Result<()> {
    let mut workspace = session.open()?;
    let before = current_parents(&workspace.store, &args.child);
    let resolved = workspace
        .store
        .add_parent(&args.child, &args.parent, args.clear);
    let after = current_parents(&workspace.store, &args.child);

    let out = LinkOutput::new(&args.child, &args.parent, resolved, &before, after);
    persist(&workspace, &out, "link")?;
    report(session, &out, "linked", "under")
}

pub fn run_unlink(args: &UnlinkArgs, session: &Session) -> anyhow::Result<()> {
    let mut workspace = session.open()?;
    let before = current_parents(&workspace.store, &args.child);
    let resolved = workspace.store.remove_parent(&args.child, &args.parent);
    let after = current_parents(&workspace.store, &args.child);

    let out = LinkOutput::new(&args.child, &args.parent, resolved, &before, after);
    persist(&workspace, &out, "unlink")?;
    report(session, &out, "unlinked", "from")
}

fn persist(workspace: &Workspace, out: &LinkOutput, action: &str) -> anyhow::Result<()> {
    if out.changed {
        workspace.save()?;
    } else if out.resolved {
        info!(
            child = %out.child,
            parent = %out.parent,
            action,
            "relationship already in place; nothing changed"
        );
    } else {
        info!(
            child = %out.child,
            parent = %out.parent,
            action,
            "did not resolve; nothing changed"
        );
    }
    Ok(())
}

fn current_parents(store: &thicket_core::Hierarchy, uid: &str) -> Vec<String> {
    store
        .get(uid)
        .map(|record| record.parents().to_vec())
        .unwrap_or_default()
}

fn report(session: &Session, out: &LinkOutput, verb: &str, preposition: &str) -> anyhow::Result<()> {
    render_mode(
        session.output,
        out,
        |o, w| writeln!(w, "{}\t{}", o.child, o.parents.join(",")),
        |o, w| {
            if o.changed {
                writeln!(w, "{verb} {} {preposition} {}", o.child, o.parent)?;
                writeln!(w, "parents: {}", o.parents.join(", "))
            } else if o.resolved {
                writeln!(
                    w,
                    "nothing changed: {} already {verb} {preposition} {}",
                    o.child, o.parent
                )
            } else {
                writeln!(w, "nothing changed: {} -> {} did not resolve", o.child, o.parent)
            }
        },
    )
}
