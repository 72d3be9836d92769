//! `tk add`: add a record under a parent.

use crate::cmd::show::{RecordView, write_record};
use crate::cmd::{Session, parse_assignment, require};
use crate::output::{CliError, render_error, render_mode};
use anyhow::Context;
use clap::Args;
use thicket_core::{Draft, StoreError};

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Display name of the new record.
    pub name: String,

    /// Parent identifier. Defaults to the top level.
    #[arg(short, long)]
    pub parent: Option<String>,

    /// Requested identifier. Ignored when empty or already taken.
    #[arg(long)]
    pub uid: Option<String>,

    /// Payload field as KEY=VALUE; repeatable. VALUE is read as JSON when it
    /// parses, otherwise as a string.
    #[arg(short, long = "field", value_name = "KEY=VALUE")]
    pub fields: Vec<String>,
}

fn draft_from_args(args: &AddArgs) -> anyhow::Result<Draft> {
    let mut draft = Draft::named(args.name.as_str());
    if let Some(uid) = &args.uid {
        draft = draft.with_uid(uid.as_str());
    }
    for raw in &args.fields {
        let (key, value) = parse_assignment(raw).with_context(|| format!("invalid --field '{raw}'"))?;
        draft = draft.with_field(key, value);
    }
    Ok(draft)
}

pub fn run_add(args: &AddArgs, session: &Session) -> anyhow::Result<()> {
    let draft = match draft_from_args(args) {
        Ok(draft) => draft,
        Err(e) => {
            render_error(session.output, &CliError::new(format!("{e:#}")))?;
            return Err(e);
        }
    };
    let mut workspace = session.open()?;

    if let Some(parent) = args.parent.as_deref() {
        require(&workspace.store, parent, session.output)?;
    }

    let uids = match workspace.store.add(draft, args.parent.as_deref()) {
        Ok(uids) => uids,
        Err(e) => {
            render_error(session.output, &coded(&e))?;
            return Err(e.into());
        }
    };
    workspace.save()?;

    let Some(record) = uids.first().and_then(|uid| workspace.store.get(uid)) else {
        anyhow::bail!("added record is missing from the store");
    };
    let view = RecordView::from(record);
    render_mode(
        session.output,
        &view,
        |v, w| writeln!(w, "{}", v.uid),
        |v, w| {
            writeln!(w, "added {}", v.uid)?;
            write_record(w, v)
        },
    )
}

fn coded(err: &StoreError) -> CliError {
    CliError::with_code(err.to_string(), err.code())
}
