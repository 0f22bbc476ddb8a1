use randoffee_core::{similarity, HistoryStore};

use super::Workspace;

pub fn run(workspace: &Workspace) -> Result<(), Box<dyn std::error::Error>> {
    let rounds = workspace.history().load_all()?;
    if rounds.is_empty() {
        println!("No rounds stored yet.");
        return Ok(());
    }

    println!("{:<12} {:>6} {:>12} {:>10}", "date", "groups", "participants", "similarity");
    for (i, round) in rounds.iter().enumerate() {
        // rounds are newest first, so the previous round is the next one
        let to_previous = rounds
            .get(i + 1)
            .map(|previous| format!("{:.4}", similarity(round, previous)))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<12} {:>6} {:>12} {:>10}",
            round.date.to_string(),
            round.groups.len(),
            round.participants().len(),
            to_previous
        );
    }
    Ok(())
}
