//! How alike two rounds are.
//!
//! Two measures are provided:
//!
//! - [`similarity`] / [`pairing_overlap`]: Jaccard overlap of the pairings
//!   two rounds imply, restricted to the people present in both rounds. This
//!   is what the generator uses to reject groupings that repeat history.
//! - [`repeat_report`]: for every person in both rounds, how many of the
//!   people they met in one round they met again in the other. Used for
//!   looking back over the history.
//!
//! Both are pure functions of their inputs and are symmetric.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::permutation::{Group, Pairing, ParticipantId, Permutation};

/// Pairing overlap between two rounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairingOverlap {
    /// People present in both rounds.
    pub common_participants: usize,
    /// Pairings that occur in both rounds, sorted.
    pub shared: Vec<Pairing>,
    /// Size of the union of both (restricted) pairing sets.
    pub union_size: usize,
    /// `shared.len() / union_size`, or 0 when the union is empty.
    pub score: f64,
}

/// Jaccard similarity of the two rounds' pairings, in `[0, 1]`.
pub fn similarity(a: &Permutation, b: &Permutation) -> f64 {
    pairing_overlap(a, b).score
}

/// Structured form of [`similarity`].
///
/// Only pairs whose members took part in both rounds are counted, so people
/// joining or leaving between rounds don't dilute the score.
pub fn pairing_overlap(a: &Permutation, b: &Permutation) -> PairingOverlap {
    let left_people = a.participants();
    let right_people = b.participants();
    let common: BTreeSet<&str> = left_people.intersection(&right_people).copied().collect();

    let restrict = |perm: &Permutation| -> BTreeSet<Pairing> {
        perm.pairings()
            .into_iter()
            .filter(|p| p.both(|id| common.contains(id)))
            .collect()
    };
    let left = restrict(a);
    let right = restrict(b);

    let shared: Vec<Pairing> = left.intersection(&right).cloned().collect();
    let union_size = left.union(&right).count();
    let score = if union_size == 0 {
        0.0
    } else {
        shared.len() as f64 / union_size as f64
    };

    PairingOverlap {
        common_participants: common.len(),
        shared,
        union_size,
        score,
    }
}

/// How per-person repeat counts are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weighting {
    /// Counts are summed.
    #[default]
    Linear,
    /// Counts are squared before summing, which punishes a group that
    /// meets again almost unchanged much harder than scattered repeats.
    Quadratic,
}

impl Weighting {
    fn apply(self, count: usize) -> usize {
        match self {
            Weighting::Linear => count,
            Weighting::Quadratic => count * count,
        }
    }
}

impl FromStr for Weighting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(Weighting::Linear),
            "quadratic" => Ok(Weighting::Quadratic),
            other => Err(format!("unknown weighting '{other}' (expected linear or quadratic)")),
        }
    }
}

impl fmt::Display for Weighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Weighting::Linear => f.write_str("linear"),
            Weighting::Quadratic => f.write_str("quadratic"),
        }
    }
}

/// Per-person repeat statistics between two rounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepeatReport {
    pub weighting: Weighting,
    /// Weighted repeat total divided by everybody present in either round.
    pub per_person_score: f64,
    /// People who met at least one person again, with how many.
    pub persons_with_repeats: BTreeMap<ParticipantId, usize>,
}

/// Count, for everybody in both rounds, the people they met in both.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidPermutation`] if somebody appears in
/// more than one group of the same round.
pub fn repeat_report(
    a: &Permutation,
    b: &Permutation,
    weighting: Weighting,
) -> Result<RepeatReport, ValidationError> {
    let everyone: BTreeSet<&str> = a.participants().union(&b.participants()).copied().collect();

    let mut total = 0usize;
    let mut persons_with_repeats = BTreeMap::new();

    for person in &everyone {
        let (Some(left), Some(right)) = (only_group(a, person)?, only_group(b, person)?) else {
            // missed one of the rounds
            continue;
        };

        let left_others: BTreeSet<&str> =
            left.member_set().into_iter().filter(|m| m != person).collect();
        let repeats = right
            .member_set()
            .into_iter()
            .filter(|m| m != person && left_others.contains(m))
            .count();

        if repeats > 0 {
            persons_with_repeats.insert(person.to_string(), repeats);
        }
        total += weighting.apply(repeats);
    }

    let per_person_score = if everyone.is_empty() {
        0.0
    } else {
        total as f64 / everyone.len() as f64
    };

    Ok(RepeatReport {
        weighting,
        per_person_score,
        persons_with_repeats,
    })
}

fn only_group<'a>(
    perm: &'a Permutation,
    person: &str,
) -> Result<Option<&'a Group>, ValidationError> {
    let mut groups = perm.groups.iter().filter(|g| g.contains(person));
    let first = groups.next();
    if groups.next().is_some() {
        return Err(ValidationError::InvalidPermutation {
            date: perm.date,
            reason: format!("'{person}' appears in more than one group"),
        });
    }
    Ok(first)
}

impl fmt::Display for RepeatReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "per_person_score ({})", self.weighting)?;
        writeln!(f, "    {:.4}", self.per_person_score)?;
        write!(f, "persons_with_repeats")?;
        if self.persons_with_repeats.is_empty() {
            return write!(f, "\n    none");
        }
        let mut sorted: Vec<(&ParticipantId, &usize)> = self.persons_with_repeats.iter().collect();
        sorted.sort_by(|x, y| x.1.cmp(y.1).then_with(|| x.0.cmp(y.0)));
        for (person, count) in sorted {
            write!(f, "\n    {count} for {person}")?;
        }
        Ok(())
    }
}
