use std::path::Path;

use chrono::NaiveDate;
use clap::Args;
use randoffee_core::storage::read_permutation_file;
use randoffee_core::{pairing_overlap, repeat_report, Permutation, Weighting};
use serde_json::json;

use super::Workspace;

#[derive(Args)]
pub struct CompareArgs {
    /// First round: a date in the history (YYYY-MM-DD) or a JSON file
    first: String,
    /// Second round: a date in the history (YYYY-MM-DD) or a JSON file
    second: String,
    /// How repeats are combined per person (linear, quadratic)
    #[arg(long, default_value_t = Weighting::Linear)]
    weighting: Weighting,
    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: CompareArgs, workspace: &Workspace) -> Result<(), Box<dyn std::error::Error>> {
    let first = load_round(&args.first, workspace)?;
    let second = load_round(&args.second, workspace)?;

    let overlap = pairing_overlap(&first, &second);
    let report = repeat_report(&first, &second, args.weighting)?;

    if args.json {
        let output = json!({
            "first": first.date,
            "second": second.date,
            "overlap": overlap,
            "repeats": report,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Comparing {} with {}", first.date, second.date);
    println!("similarity");
    println!("    {:.4}", overlap.score);
    println!(
        "common participants: {}, distinct pairings: {}, shared pairings: {}",
        overlap.common_participants,
        overlap.union_size,
        overlap.shared.len()
    );
    for pairing in &overlap.shared {
        println!("    {pairing}");
    }
    println!("{report}");
    Ok(())
}

/// A round named by its date in the history, or by a file path.
fn load_round(arg: &str, workspace: &Workspace) -> Result<Permutation, Box<dyn std::error::Error>> {
    match arg.parse::<NaiveDate>() {
        Ok(date) => Ok(workspace.history().load(date)?),
        Err(_) => Ok(read_permutation_file(Path::new(arg))?),
    }
}
