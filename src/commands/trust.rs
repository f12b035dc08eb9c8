//! `jrun trust`: manage the persisted trusted-prefix store.

use anyhow::Result;

use crate::cli::{TrustArgs, TrustCommands};
use crate::resolver::trust::TrustStore;
use crate::xdg;

pub fn run(args: TrustArgs) -> Result<()> {
    let mut store = TrustStore::load(xdg::trust_store_path())?;

    match args.command {
        TrustCommands::Add { prefix } => {
            store.add(&prefix)?;
            println!("trusted: {prefix}");
        }
        TrustCommands::Remove { prefix } => {
            store.remove(&prefix)?;
            println!("removed: {prefix}");
        }
        TrustCommands::List => {
            for prefix in store.prefixes() {
                println!("{prefix}");
            }
        }
    }
    Ok(())
}
