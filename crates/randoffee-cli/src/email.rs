//! Announcement email for a round.
//!
//! The body is HTML so it can be pasted into a desktop mail client with the
//! leader of every group in bold.

use indoc::indoc;
use randoffee_core::{Permutation, Person};

const LINE_BREAK: &str = "<br />";

const HEADER: &str = indoc! {"
    Hello everyone,
    Here are the groups for our next randomised coffee chats.
"};

const FOOTER: &str = indoc! {"
    The first person in each group is responsible for making sure the meeting
    gets scheduled, but anyone in the group is free to take the initiative.
    Please schedule a 30 minute call and feel free to chat about absolutely
    anything: what you're working on, what you're reading, or nothing at all.

    If you'd like to take a break from the coffee chats, just let us know.
"};

fn to_html(text: &str) -> String {
    text.lines().collect::<Vec<_>>().join(LINE_BREAK)
}

/// One `Group i: <b>leader</b> | other | ...` line per group.
pub fn group_lines(perm: &Permutation) -> Vec<String> {
    perm.groups
        .iter()
        .enumerate()
        .map(|(i, group)| {
            let mut line = format!("Group {}: <b>{}</b>", i + 1, group.leader);
            for other in &group.others {
                line.push_str(" | ");
                line.push_str(other);
            }
            line
        })
        .collect()
}

/// Full HTML body: header, group lines, footer.
pub fn body(perm: &Permutation) -> String {
    let mut html = to_html(HEADER);
    html.push_str(LINE_BREAK);
    for line in group_lines(perm) {
        html.push_str(&line);
        html.push_str(LINE_BREAK);
    }
    html.push_str(LINE_BREAK);
    html.push_str(&to_html(FOOTER));
    html
}

/// Addresses to send the email to, sorted and `; `-separated.
pub fn recipients(people: &[Person]) -> String {
    let mut emails: Vec<&str> = people.iter().map(|p| p.email.as_str()).collect();
    emails.sort_unstable();
    emails.join("; ")
}
