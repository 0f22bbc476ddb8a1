use std::io::{BufRead, Write};
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Args;
use randoffee_core::storage::split_exclusions;
use randoffee_core::{GroupGenerator, GroupSizing, HistoryStore, RosterSource};
use serde_json::json;

use super::Workspace;
use crate::email;

#[derive(Args)]
pub struct GenerateArgs {
    /// Date of the round (YYYY-MM-DD, default: today)
    #[arg(long)]
    date: Option<NaiveDate>,
    /// Emails to leave out of this round (space or semicolon separated)
    #[arg(short, long, num_args = 1..)]
    exclude: Vec<String>,
    /// Random seed for a reproducible grouping
    #[arg(long)]
    seed: Option<u64>,
    /// Highest tolerated similarity to a recent round (0.0-1.0)
    #[arg(long)]
    threshold: Option<f64>,
    /// Number of recent rounds to compare against (0 = all)
    #[arg(long)]
    window: Option<usize>,
    /// Candidates to draw before giving up
    #[arg(long)]
    max_attempts: Option<usize>,
    /// Target group size
    #[arg(long)]
    group_size: Option<usize>,
    /// Largest allowed group (default: one more than the target size)
    #[arg(long)]
    max_group_size: Option<usize>,
    /// Print the result as JSON
    #[arg(long)]
    json: bool,
    /// Accept the grouping without asking
    #[arg(short, long)]
    yes: bool,
    /// Also write the email body to this file
    #[arg(long)]
    email_out: Option<PathBuf>,
}

pub fn run(args: GenerateArgs, workspace: &Workspace) -> Result<(), Box<dyn std::error::Error>> {
    let selection = workspace.roster(split_exclusions(&args.exclude)).selection()?;
    let store = workspace.history();
    let history = store.load_all()?;

    let mut config = workspace.config.generator_config();
    config.seed = args.seed;
    if let Some(threshold) = args.threshold {
        config.similarity_threshold = threshold;
    }
    if let Some(window) = args.window {
        config.history_window = (window > 0).then_some(window);
    }
    if let Some(max_attempts) = args.max_attempts {
        config.max_attempts = max_attempts;
    }
    match (args.group_size, args.max_group_size) {
        (Some(target), Some(max)) => config.sizing = GroupSizing::new(target, max),
        (Some(target), None) => config.sizing = GroupSizing::around(target),
        (None, Some(max)) => config.sizing.max = max,
        (None, None) => {}
    }

    let date = args
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let candidate =
        GroupGenerator::with_config(config).generate(&selection.participant_ids(), &history, date)?;
    let perm = &candidate.permutation;
    store.save_latest(perm)?;

    let body = email::body(perm);
    let recipients = email::recipients(&selection.included);
    if let Some(path) = &args.email_out {
        std::fs::write(path, &body)?;
    }

    if args.json {
        let compared: Vec<_> = candidate
            .compared
            .iter()
            .map(|(date, similarity)| json!({ "date": date, "similarity": similarity }))
            .collect();
        let output = json!({
            "permutation": perm,
            "attempts": candidate.attempts,
            "compared": compared,
            "excluded": selection.excluded,
            "email": body,
            "recipients": recipients,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for person in &selection.excluded {
            println!("Excluding {person} from this round");
        }
        println!("--------- GROUPS FOR {date} ---------");
        println!("{perm}");
        println!();
        if candidate.compared.is_empty() {
            println!("No previous rounds to compare against.");
        }
        for (past, similarity) in &candidate.compared {
            println!("Similarity to {past}: {similarity:.4}");
        }
        println!("Found after {} attempt(s).", candidate.attempts);
        println!();
        println!("--------- EMAIL ---------");
        println!("{body}");
        println!();
        println!("Send the email to the following people:");
        println!("{recipients}");
        println!();
    }

    if args.yes || (!args.json && confirm("Accept this grouping? [y/N] ")?) {
        let accepted = store.promote_latest(false)?;
        if !args.json {
            println!("Saved to {}", store.path_for(accepted.date).display());
        }
    } else if !args.json {
        println!("Not accepted. Run `randoffee accept` to keep this grouping later.");
    }
    Ok(())
}

/// Ask on stdout and read the answer from stdin. End of input means no.
fn confirm(prompt: &str) -> std::io::Result<bool> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}
