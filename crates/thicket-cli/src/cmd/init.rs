//! `tk init`: create an empty snapshot file.
//!
//! The disambiguation list comes from `--disambiguate` or the config files
//! and is stored in the snapshot.

use crate::cmd::Session;
use crate::output::{pretty_kv, render};
use crate::workspace::Workspace;
use clap::Args;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing snapshot.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct InitOutput {
    file: String,
    disambiguate: Vec<String>,
}

pub fn run_init(args: &InitArgs, session: &Session) -> anyhow::Result<()> {
    let config = session.store_config.clone().unwrap_or_default();
    let workspace = Workspace::create(&session.file, config, args.force)?;

    let out = InitOutput {
        file: workspace.path.display().to_string(),
        disambiguate: workspace.store.config().disambiguate.clone(),
    };
    render(session.output, &out, |o, w| {
        writeln!(w, "initialized {}", o.file)?;
        if !o.disambiguate.is_empty() {
            pretty_kv(w, "disambiguate", o.disambiguate.join(", "))?;
        }
        Ok(())
    })
}
