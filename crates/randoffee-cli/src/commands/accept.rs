use clap::Args;

use super::Workspace;

#[derive(Args)]
pub struct AcceptArgs {
    /// Replace a round already stored for the same date
    #[arg(long)]
    force: bool,
}

pub fn run(args: AcceptArgs, workspace: &Workspace) -> Result<(), Box<dyn std::error::Error>> {
    let store = workspace.history();
    let accepted = store.promote_latest(args.force)?;
    println!("{accepted}");
    println!("Saved to {}", store.path_for(accepted.date).display());
    Ok(())
}
