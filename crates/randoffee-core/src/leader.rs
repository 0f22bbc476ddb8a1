//! Spreading the job of organising a group fairly.
//!
//! Whoever leads a group has to get the meeting into everyone's calendar.
//! Leaders are picked among the members who have led least often so far.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::permutation::{Group, ParticipantId, Permutation};

/// How many groups each person has led across `history`.
pub fn lead_counts(history: &[Permutation]) -> BTreeMap<ParticipantId, usize> {
    let mut counts = BTreeMap::new();
    for perm in history {
        for group in &perm.groups {
            *counts.entry(group.leader.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// Re-pick every group's leader among its least-experienced members.
///
/// Membership is untouched; only the leader changes. Ties are broken
/// uniformly at random with `rng`.
pub fn balance_leaders<R: Rng + ?Sized>(
    perm: &Permutation,
    history: &[Permutation],
    rng: &mut R,
) -> Permutation {
    let counts = lead_counts(history);
    let led = |id: &str| counts.get(id).copied().unwrap_or(0);

    let groups = perm
        .groups
        .iter()
        .map(|group| {
            let members: Vec<&str> = group.member_set().into_iter().collect();
            let fewest = members.iter().map(|m| led(*m)).min().unwrap_or(0);
            let candidates: Vec<&str> = members.into_iter().filter(|m| led(*m) == fewest).collect();

            candidates
                .choose(rng)
                .and_then(|leader| group.with_leader(leader))
                .unwrap_or_else(|| group.clone())
        })
        .collect::<Vec<Group>>();

    Permutation::new(perm.date, groups)
}
