//! Random group generation with a novelty check against recent rounds.
//!
//! The generator draws a uniformly random permutation of the roster, slices
//! it into groups, and compares the result with the most recent rounds of
//! history. A candidate whose pairing similarity to every compared round is
//! at most the configured threshold is accepted; otherwise it is thrown away
//! and a new one drawn, up to a fixed number of attempts.
//!
//! Group sizes are planned up front from the roster size so that leftovers
//! are absorbed into existing groups instead of forming a trailing group of
//! one.

use std::collections::HashSet;

use chrono::NaiveDate;
use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};

use crate::error::{GenerateError, ValidationError};
use crate::leader;
use crate::permutation::{Group, ParticipantId, Permutation, MIN_GROUP_SIZE};
use crate::similarity::similarity;

/// Target group size and the largest size a group may grow to when
/// absorbing leftovers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSizing {
    pub target: usize,
    pub max: usize,
}

impl GroupSizing {
    pub fn new(target: usize, max: usize) -> Self {
        Self { target, max }
    }

    /// Groups of `target`, allowed to grow by one.
    pub fn around(target: usize) -> Self {
        Self::new(target, target + 1)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.target < MIN_GROUP_SIZE {
            return Err(ValidationError::InvalidGroupSize(format!(
                "target size {} is below the minimum of {}",
                self.target, MIN_GROUP_SIZE
            )));
        }
        if self.max < self.target {
            return Err(ValidationError::InvalidGroupSize(format!(
                "maximum size {} is smaller than target size {}",
                self.max, self.target
            )));
        }
        Ok(())
    }
}

impl Default for GroupSizing {
    fn default() -> Self {
        Self::around(4)
    }
}

/// Generator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub sizing: GroupSizing,
    /// Highest tolerated similarity to any single compared round (0.0-1.0)
    pub similarity_threshold: f64,
    /// How many of the most recent rounds to compare against (None = all)
    pub history_window: Option<usize>,
    /// Candidates to draw before giving up
    pub max_attempts: usize,
    /// Random seed for reproducibility (None = random)
    pub seed: Option<u64>,
    /// Pick leaders among the members who have led least often
    pub balance_leaders: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            sizing: GroupSizing::default(),
            similarity_threshold: 0.1,
            history_window: Some(3),
            max_attempts: 10_000,
            seed: None,
            balance_leaders: true,
        }
    }
}

impl GeneratorConfig {
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for a bad group size, a threshold
    /// outside `[0, 1]` or a zero attempt budget.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.sizing.validate()?;
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ValidationError::InvalidThreshold(self.similarity_threshold));
        }
        if self.max_attempts == 0 {
            return Err(ValidationError::ZeroAttempts);
        }
        Ok(())
    }
}

/// An accepted grouping together with how it was found.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub permutation: Permutation,
    /// Attempts drawn, including the accepted one.
    pub attempts: usize,
    /// Similarity to each compared round, newest first.
    pub compared: Vec<(NaiveDate, f64)>,
}

impl Candidate {
    /// Highest similarity to any compared round (0 without history).
    pub fn worst_similarity(&self) -> f64 {
        self.compared.iter().map(|(_, s)| *s).fold(0.0, f64::max)
    }
}

/// Sizes of the groups `n` participants are split into.
///
/// `n / target` groups are formed and the remainder spread over them so
/// sizes differ by at most one. If that would push a group past
/// `sizing.max`, one more group is formed instead and every group ends up
/// at or just below the target. Groups of one are never planned.
///
/// # Errors
///
/// Returns a [`ValidationError`] if the roster is too small, the sizing is
/// malformed, the target exceeds the roster, or no plan avoids a group
/// smaller than [`MIN_GROUP_SIZE`].
pub fn plan_group_sizes(n: usize, sizing: GroupSizing) -> Result<Vec<usize>, ValidationError> {
    sizing.validate()?;
    if n < MIN_GROUP_SIZE {
        return Err(ValidationError::RosterTooSmall {
            len: n,
            min: MIN_GROUP_SIZE,
        });
    }
    if sizing.target > n {
        return Err(ValidationError::InvalidGroupSize(format!(
            "target size {} exceeds the roster of {}",
            sizing.target, n
        )));
    }

    let count = n / sizing.target;
    let sizes = balanced_sizes(n, count);
    if sizes[0] <= sizing.max {
        return Ok(sizes);
    }

    let sizes = balanced_sizes(n, count + 1);
    match sizes.last() {
        Some(&smallest) if smallest >= MIN_GROUP_SIZE => Ok(sizes),
        _ => Err(ValidationError::InvalidGroupSize(format!(
            "{} participants cannot be split into groups of {} to {}",
            n, sizing.target, sizing.max
        ))),
    }
}

/// `count` sizes summing to `n`, largest first, differing by at most one.
fn balanced_sizes(n: usize, count: usize) -> Vec<usize> {
    let base = n / count;
    let extra = n % count;
    (0..count).map(|i| if i < extra { base + 1 } else { base }).collect()
}

/// Rejection-sampling group generator.
pub struct GroupGenerator {
    config: GeneratorConfig,
}

impl GroupGenerator {
    /// Create a new generator with default config.
    pub fn new() -> Self {
        Self {
            config: GeneratorConfig::default(),
        }
    }

    /// Create a generator with custom config.
    pub fn with_config(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Produce a grouping of `roster` dated `date` that is sufficiently
    /// different from the most recent rounds of `history`.
    ///
    /// History may be given in any order; the window is taken by date.
    /// With a fixed seed the result depends only on the roster's contents,
    /// not on its order.
    ///
    /// # Errors
    ///
    /// - [`GenerateError::Validation`] for a bad roster, configuration or
    ///   history round. Nothing is sampled in that case.
    /// - [`GenerateError::NoveltyExhausted`] if every attempt was too
    ///   similar to some compared round.
    pub fn generate(
        &self,
        roster: &[ParticipantId],
        history: &[Permutation],
        date: NaiveDate,
    ) -> Result<Candidate, GenerateError> {
        self.config.validate()?;
        let mut people = canonical_roster(roster)?;
        let sizes = plan_group_sizes(people.len(), self.config.sizing)?;
        for perm in history {
            perm.validate()?;
        }

        let mut recent: Vec<&Permutation> = history.iter().collect();
        recent.sort_by(|a, b| b.date.cmp(&a.date));
        if let Some(window) = self.config.history_window {
            recent.truncate(window);
        }

        let mut rng = match self.config.seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };

        let threshold = self.config.similarity_threshold;
        let mut best_similarity = f64::INFINITY;

        for attempt in 1..=self.config.max_attempts {
            people.shuffle(&mut rng);
            let candidate = slice_into_groups(&people, &sizes, date);

            let compared: Vec<(NaiveDate, f64)> = recent
                .iter()
                .map(|past| (past.date, similarity(&candidate, past)))
                .collect();
            let worst = compared.iter().map(|(_, s)| *s).fold(0.0, f64::max);

            if worst > threshold {
                tracing::debug!(attempt, worst, threshold, "candidate too similar to history");
                best_similarity = best_similarity.min(worst);
                continue;
            }

            let permutation = if self.config.balance_leaders {
                leader::balance_leaders(&candidate, history, &mut rng)
            } else {
                candidate
            };

            tracing::info!(
                attempt,
                worst,
                groups = permutation.groups.len(),
                participants = people.len(),
                "accepted grouping for {date}"
            );
            return Ok(Candidate {
                permutation,
                attempts: attempt,
                compared,
            });
        }

        tracing::info!(
            attempts = self.config.max_attempts,
            best_similarity,
            threshold,
            "no sufficiently novel grouping found"
        );
        Err(GenerateError::NoveltyExhausted {
            attempts: self.config.max_attempts,
            threshold,
            best_similarity,
        })
    }
}

impl Default for GroupGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Sorted copy of the roster after checking identifiers.
fn canonical_roster(roster: &[ParticipantId]) -> Result<Vec<ParticipantId>, ValidationError> {
    if roster.len() < MIN_GROUP_SIZE {
        return Err(ValidationError::RosterTooSmall {
            len: roster.len(),
            min: MIN_GROUP_SIZE,
        });
    }

    let mut seen = HashSet::new();
    for id in roster {
        if id.trim().is_empty() {
            return Err(ValidationError::EmptyParticipant);
        }
        if !seen.insert(id.as_str()) {
            return Err(ValidationError::DuplicateParticipant(id.clone()));
        }
    }

    let mut people = roster.to_vec();
    people.sort();
    Ok(people)
}

fn slice_into_groups(people: &[ParticipantId], sizes: &[usize], date: NaiveDate) -> Permutation {
    let mut groups = Vec::with_capacity(sizes.len());
    let mut start = 0;
    for &size in sizes {
        let members = people[start..start + size].to_vec();
        groups.extend(Group::from_members(members));
        start += size;
    }
    Permutation::new(date, groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn roster(names: &[&str]) -> Vec<ParticipantId> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn numbered(n: usize) -> Vec<ParticipantId> {
        (0..n).map(|i| format!("p{i:02}@example.org")).collect()
    }

    fn perm(day: &str, groups: &[&[&str]]) -> Permutation {
        Permutation::new(
            date(day),
            groups
                .iter()
                .map(|g| Group::from_members(roster(g)).unwrap())
                .collect(),
        )
    }

    fn seeded(target: usize, max: usize, seed: u64) -> GeneratorConfig {
        GeneratorConfig {
            sizing: GroupSizing::new(target, max),
            seed: Some(seed),
            ..Default::default()
        }
    }

    fn sorted_sizes(perm: &Permutation) -> Vec<usize> {
        let mut sizes: Vec<usize> = perm.groups.iter().map(Group::len).collect();
        sizes.sort();
        sizes
    }

    #[test]
    fn plan_divides_evenly() {
        assert_eq!(plan_group_sizes(6, GroupSizing::new(3, 4)).unwrap(), vec![3, 3]);
        assert_eq!(plan_group_sizes(12, GroupSizing::new(4, 5)).unwrap(), vec![4, 4, 4]);
    }

    #[test]
    fn plan_absorbs_remainder() {
        assert_eq!(plan_group_sizes(7, GroupSizing::new(3, 4)).unwrap(), vec![4, 3]);
        assert_eq!(plan_group_sizes(14, GroupSizing::new(4, 5)).unwrap(), vec![5, 5, 4]);
        assert_eq!(plan_group_sizes(5, GroupSizing::new(2, 3)).unwrap(), vec![3, 2]);
    }

    #[test]
    fn plan_adds_a_group_when_cap_is_hit() {
        assert_eq!(plan_group_sizes(11, GroupSizing::new(4, 5)).unwrap(), vec![4, 4, 3]);
        assert_eq!(plan_group_sizes(7, GroupSizing::new(3, 3)).unwrap(), vec![3, 2, 2]);
        assert_eq!(plan_group_sizes(5, GroupSizing::new(4, 4)).unwrap(), vec![3, 2]);
    }

    #[test]
    fn plan_never_leaves_a_singleton() {
        let err = plan_group_sizes(3, GroupSizing::new(2, 2)).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidGroupSize(_)));
    }

    #[test]
    fn plan_rejects_bad_sizing() {
        assert!(plan_group_sizes(10, GroupSizing::new(1, 3)).is_err());
        assert!(plan_group_sizes(10, GroupSizing::new(4, 3)).is_err());
        assert!(plan_group_sizes(3, GroupSizing::new(4, 5)).is_err());
        assert_eq!(
            plan_group_sizes(1, GroupSizing::new(2, 3)),
            Err(ValidationError::RosterTooSmall { len: 1, min: 2 })
        );
    }

    #[test]
    fn six_people_in_triples() {
        let people = roster(&["A", "B", "C", "D", "E", "F"]);
        let generator = GroupGenerator::with_config(seeded(3, 4, 42));
        let candidate = generator.generate(&people, &[], date("2024-02-01")).unwrap();

        assert_eq!(sorted_sizes(&candidate.permutation), vec![3, 3]);
        assert!(candidate.permutation.validate_against(&people).is_ok());
        assert_eq!(candidate.attempts, 1);
        assert!(candidate.compared.is_empty());
        assert_eq!(candidate.permutation.date, date("2024-02-01"));
    }

    #[test]
    fn seven_people_never_leave_one_alone() {
        let people = roster(&["A", "B", "C", "D", "E", "F", "G"]);
        for seed in 0..20 {
            let generator = GroupGenerator::with_config(seeded(3, 4, seed));
            let candidate = generator.generate(&people, &[], date("2024-02-01")).unwrap();
            assert_eq!(sorted_sizes(&candidate.permutation), vec![3, 4]);
            assert!(candidate.permutation.validate_against(&people).is_ok());
        }
    }

    #[test]
    fn single_participant_is_rejected() {
        let generator = GroupGenerator::with_config(seeded(2, 3, 1));
        let err = generator.generate(&roster(&["A"]), &[], date("2024-02-01")).unwrap_err();
        assert_eq!(
            err,
            GenerateError::Validation(ValidationError::RosterTooSmall { len: 1, min: 2 })
        );
    }

    #[test]
    fn duplicate_and_blank_participants_are_rejected() {
        let generator = GroupGenerator::with_config(seeded(2, 3, 1));
        let err = generator
            .generate(&roster(&["A", "B", "A"]), &[], date("2024-02-01"))
            .unwrap_err();
        assert_eq!(
            err,
            GenerateError::Validation(ValidationError::DuplicateParticipant("A".into()))
        );

        let err = generator
            .generate(&roster(&["A", " "]), &[], date("2024-02-01"))
            .unwrap_err();
        assert_eq!(err, GenerateError::Validation(ValidationError::EmptyParticipant));
    }

    #[test]
    fn invalid_config_is_rejected_before_sampling() {
        let people = numbered(8);
        let mut config = seeded(4, 5, 1);
        config.similarity_threshold = 1.5;
        let err = GroupGenerator::with_config(config.clone())
            .generate(&people, &[], date("2024-02-01"))
            .unwrap_err();
        assert_eq!(err, GenerateError::Validation(ValidationError::InvalidThreshold(1.5)));

        config.similarity_threshold = 0.5;
        config.max_attempts = 0;
        let err = GroupGenerator::with_config(config)
            .generate(&people, &[], date("2024-02-01"))
            .unwrap_err();
        assert_eq!(err, GenerateError::Validation(ValidationError::ZeroAttempts));
    }

    #[test]
    fn invalid_history_is_rejected() {
        let people = roster(&["A", "B", "C", "D"]);
        let broken = perm("2024-01-01", &[&["A", "B"], &["B", "C"]]);
        let err = GroupGenerator::with_config(seeded(2, 3, 1))
            .generate(&people, &[broken], date("2024-02-01"))
            .unwrap_err();
        assert!(matches!(
            err,
            GenerateError::Validation(ValidationError::InvalidPermutation { .. })
        ));
    }

    #[test]
    fn same_seed_same_grouping() {
        let people = numbered(23);
        let history = vec![perm("2024-01-01", &[&["p00@example.org", "p01@example.org"]])];
        let generator = GroupGenerator::with_config(seeded(4, 5, 99));

        let first = generator.generate(&people, &history, date("2024-02-01")).unwrap();
        let second = generator.generate(&people, &history, date("2024-02-01")).unwrap();
        assert_eq!(first.permutation, second.permutation);
        let leaders = |c: &Candidate| {
            c.permutation
                .groups
                .iter()
                .map(|g| g.leader.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(leaders(&first), leaders(&second));

        let mut reversed = people.clone();
        reversed.reverse();
        let third = generator.generate(&reversed, &history, date("2024-02-01")).unwrap();
        assert_eq!(first.permutation, third.permutation);
    }

    #[test]
    fn different_seeds_explore_different_groupings() {
        let people = numbered(20);
        let partitions: BTreeSet<String> = (0..10)
            .map(|seed| {
                GroupGenerator::with_config(seeded(4, 5, seed))
                    .generate(&people, &[], date("2024-02-01"))
                    .unwrap()
                    .permutation
                    .to_string()
            })
            .collect();
        assert!(partitions.len() > 1);
    }

    #[test]
    fn loose_threshold_only_rejects_exact_repeat() {
        let people = roster(&["A", "B", "C", "D", "E", "F"]);
        let history = vec![perm("2024-01-01", &[&["A", "B", "C"], &["D", "E", "F"]])];

        for seed in 0..50 {
            let mut config = seeded(3, 4, seed);
            config.similarity_threshold = 0.99;
            let candidate = GroupGenerator::with_config(config)
                .generate(&people, &history, date("2024-01-15"))
                .unwrap();
            assert!(!candidate.permutation.same_partition(&history[0]));
            assert!(candidate.worst_similarity() <= 0.99);
        }
    }

    #[test]
    fn zero_threshold_exhausts_for_six_people() {
        // Any split of six into two triples shares a pair with any other
        // such split, so nothing can score 0.
        let people = roster(&["A", "B", "C", "D", "E", "F"]);
        let history = vec![perm("2024-01-01", &[&["A", "B", "C"], &["D", "E", "F"]])];
        let mut config = seeded(3, 4, 7);
        config.similarity_threshold = 0.0;
        config.max_attempts = 5;

        let err = GroupGenerator::with_config(config)
            .generate(&people, &history, date("2024-01-15"))
            .unwrap_err();
        match err {
            GenerateError::NoveltyExhausted {
                attempts,
                threshold,
                best_similarity,
            } => {
                assert_eq!(attempts, 5);
                assert_eq!(threshold, 0.0);
                assert!(best_similarity > 0.0);
            }
            other => panic!("expected novelty exhaustion, got {other:?}"),
        }
    }

    #[test]
    fn window_limits_history_by_date() {
        let people = roster(&["A", "B", "C", "D", "E", "F"]);
        // newest round involves nobody on today's roster, so it never blocks
        let history = vec![
            perm("2024-01-01", &[&["A", "B", "C"], &["D", "E", "F"]]),
            perm("2024-01-15", &[&["X", "Y"], &["Z", "W"]]),
        ];

        let mut config = seeded(3, 4, 3);
        config.similarity_threshold = 0.0;
        config.max_attempts = 20;
        config.history_window = Some(1);
        let candidate = GroupGenerator::with_config(config.clone())
            .generate(&people, &history, date("2024-02-01"))
            .unwrap();
        assert_eq!(candidate.compared, vec![(date("2024-01-15"), 0.0)]);

        config.history_window = None;
        let err = GroupGenerator::with_config(config)
            .generate(&people, &history, date("2024-02-01"))
            .unwrap_err();
        assert!(matches!(err, GenerateError::NoveltyExhausted { .. }));
    }

    #[test]
    fn balanced_leaders_prefer_newcomers_to_leading() {
        let people = roster(&["A", "B", "C", "D"]);
        let history = vec![perm("2024-01-01", &[&["A", "C"], &["B", "D"]])];
        let mut config = seeded(4, 4, 11);
        config.similarity_threshold = 1.0;
        let candidate = GroupGenerator::with_config(config)
            .generate(&people, &history, date("2024-01-15"))
            .unwrap();
        let leader = &candidate.permutation.groups[0].leader;
        assert!(leader == "C" || leader == "D");
    }

    proptest! {
        #[test]
        fn every_grouping_is_a_partition_of_the_roster(
            n in 2usize..40,
            target in 2usize..6,
            extra in 0usize..3,
            seed in any::<u64>(),
        ) {
            let people = numbered(n);
            let sizing = GroupSizing::new(target, target + extra);
            prop_assume!(plan_group_sizes(n, sizing).is_ok());

            let config = GeneratorConfig { sizing, seed: Some(seed), ..Default::default() };
            let candidate = GroupGenerator::with_config(config)
                .generate(&people, &[], date("2024-02-01"))
                .unwrap();

            prop_assert!(candidate.permutation.validate_against(&people).is_ok());
            for group in &candidate.permutation.groups {
                prop_assert!(group.len() >= MIN_GROUP_SIZE);
                prop_assert!(group.len() <= sizing.max);
            }
        }
    }
}
