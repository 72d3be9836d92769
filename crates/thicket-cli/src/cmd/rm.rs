//! `tk rm`: remove records, cascading or promoting their children.

use crate::cmd::Session;
use crate::output::{pretty_kv, render_mode};
use clap::Args;
use serde::Serialize;
use thicket_core::Target;

#[derive(Args, Debug)]
pub struct RmArgs {
    /// Identifiers of the records to remove.
    #[arg(required = true)]
    pub uids: Vec<String>,

    /// Re-link children under the removed record's parents instead of
    /// removing them too.
    #[arg(long)]
    pub promote: bool,
}

#[derive(Debug, Serialize)]
struct RmOutput {
    removed: Vec<String>,
    promoted: bool,
}

pub fn run_rm(args: &RmArgs, session: &Session) -> anyhow::Result<()> {
    let mut workspace = session.open()?;
    let target = Target::from(args.uids.clone());
    let removed = workspace.store.remove(target, args.promote);

    if !removed.is_empty() {
        workspace.save()?;
    }

    let out = RmOutput {
        removed,
        promoted: args.promote,
    };
    render_mode(
        session.output,
        &out,
        |o, w| {
            for uid in &o.removed {
                writeln!(w, "{uid}")?;
            }
            Ok(())
        },
        |o, w| {
            if o.removed.is_empty() {
                return writeln!(w, "nothing removed");
            }
            pretty_kv(w, "removed", o.removed.join(", "))?;
            if o.promoted {
                writeln!(w, "children promoted to former parents")?;
            }
            Ok(())
        },
    )
}
