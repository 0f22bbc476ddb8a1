use randoffee_core::{lead_counts, HistoryStore};

use super::Workspace;

pub fn run(workspace: &Workspace) -> Result<(), Box<dyn std::error::Error>> {
    let history = workspace.history().load_all()?;
    let mut counts: Vec<_> = lead_counts(&history).into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    if counts.is_empty() {
        println!("Nobody has led a group yet.");
    }
    for (person, count) in counts {
        println!("{count:>4}  {person}");
    }
    Ok(())
}
