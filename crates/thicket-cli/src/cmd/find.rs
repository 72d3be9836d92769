//! `tk find`: list records whose field equals a value.

use crate::cmd::show::{RecordView, list};
use crate::cmd::{Session, parse_assignment};
use clap::Args;

#[derive(Args, Debug)]
pub struct FindArgs {
    /// Match as KEY=VALUE. `name=...` matches record names; VALUE is read
    /// as JSON when it parses, otherwise as a string.
    #[arg(value_name = "KEY=VALUE")]
    pub query: String,
}

pub fn run_find(args: &FindArgs, session: &Session) -> anyhow::Result<()> {
    let (key, value) = parse_assignment(&args.query)?;
    let workspace = session.open()?;
    let found: Vec<RecordView> = workspace
        .store
        .find_by_field(&key, &value)
        .into_iter()
        .map(RecordView::from)
        .collect();
    list(session.output, &format!("Records with {}", args.query), &found)
}
