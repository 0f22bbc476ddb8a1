//! Rounds, groups and the pairings they imply.
//!
//! A [`Permutation`] is the outcome of one coffee round: a date and the
//! groups everybody was split into. Each [`Group`] names a leader, the person
//! responsible for getting the meeting scheduled, but the leader is
//! presentation metadata only. Equality, pairings and similarity all look at
//! group *membership*, never at list order or at who leads.
//!
//! The JSON form is kept compatible with existing history files:
//!
//! ```json
//! {
//!     "date": "2024-01-01",
//!     "groups": [
//!         { "leader": "a@example.org", "others": ["b@example.org", "c@example.org"] }
//!     ]
//! }
//! ```

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Identifier of a participant (an email address in practice).
///
/// The core compares identifiers exactly. Anything read from disk goes
/// through [`normalize_id`] first so that casing never splits one person
/// into two.
pub type ParticipantId = String;

/// Canonical form of an identifier: trimmed and lowercased.
pub fn normalize_id(id: &str) -> ParticipantId {
    id.trim().to_lowercase()
}

/// Smallest group that makes sense for a conversation.
pub const MIN_GROUP_SIZE: usize = 2;

/// Unordered pair of two distinct participants who shared a group.
///
/// The constructor stores the two identifiers in sorted order, so
/// `Pairing::new("b", "a") == Pairing::new("a", "b")`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Pairing {
    first: ParticipantId,
    second: ParticipantId,
}

impl Pairing {
    /// Returns `None` when both identifiers are the same person.
    pub fn new(a: &str, b: &str) -> Option<Self> {
        match a.cmp(b) {
            std::cmp::Ordering::Less => Some(Self {
                first: a.to_string(),
                second: b.to_string(),
            }),
            std::cmp::Ordering::Greater => Some(Self {
                first: b.to_string(),
                second: a.to_string(),
            }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }

    /// Whether both members satisfy `pred`.
    pub fn both(&self, mut pred: impl FnMut(&str) -> bool) -> bool {
        pred(&self.first) && pred(&self.second)
    }
}

impl fmt::Display for Pairing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} & {}", self.first, self.second)
    }
}

/// One group within a round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    /// Person responsible for scheduling the meeting.
    pub leader: ParticipantId,
    /// Everybody else in the group.
    pub others: Vec<ParticipantId>,
}

impl Group {
    /// The others are kept in sorted order.
    pub fn new(
        leader: impl Into<ParticipantId>,
        others: impl IntoIterator<Item = ParticipantId>,
    ) -> Self {
        let mut others: Vec<ParticipantId> = others.into_iter().collect();
        others.sort();
        Self {
            leader: leader.into(),
            others,
        }
    }

    /// Build a group from a member list; the first member leads.
    pub fn from_members(members: Vec<ParticipantId>) -> Option<Self> {
        let mut members = members.into_iter();
        let leader = members.next()?;
        Some(Self::new(leader, members))
    }

    /// Leader first, then the others as listed.
    pub fn members(&self) -> impl Iterator<Item = &ParticipantId> {
        std::iter::once(&self.leader)
            .chain(self.others.iter().filter(move |o| **o != self.leader))
    }

    /// Sorted member set, independent of who leads.
    pub fn member_set(&self) -> BTreeSet<&str> {
        self.members().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.member_set().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        self.leader == id || self.others.iter().any(|o| o == id)
    }

    /// Hand the leader role to another member of the same group.
    ///
    /// Returns `None` if `id` is not a member.
    pub fn with_leader(&self, id: &str) -> Option<Self> {
        if !self.contains(id) {
            return None;
        }
        let others = self
            .members()
            .filter(|m| m.as_str() != id)
            .cloned()
            .collect();
        Some(Self {
            leader: id.to_string(),
            others,
        })
    }

    /// Every pair of distinct members.
    pub fn pairings(&self) -> impl Iterator<Item = Pairing> + '_ {
        let members: Vec<&str> = self.member_set().into_iter().collect();
        let n = members.len();
        (0..n).flat_map(move |i| {
            let members = members.clone();
            (i + 1..n).filter_map(move |j| Pairing::new(members[i], members[j]))
        })
    }
}

impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        self.member_set() == other.member_set()
    }
}

impl Eq for Group {}

/// All groups of one round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permutation {
    pub date: NaiveDate,
    pub groups: Vec<Group>,
}

impl Permutation {
    pub fn new(date: NaiveDate, groups: Vec<Group>) -> Self {
        Self { date, groups }
    }

    /// Everybody who took part in this round.
    pub fn participants(&self) -> BTreeSet<&str> {
        self.groups
            .iter()
            .flat_map(|g| g.members().map(String::as_str))
            .collect()
    }

    /// Every co-membership pair across all groups.
    pub fn pairings(&self) -> BTreeSet<Pairing> {
        self.groups.iter().flat_map(Group::pairings).collect()
    }

    /// Canonical form of the grouping: a set of member sets.
    pub fn partition(&self) -> BTreeSet<BTreeSet<&str>> {
        self.groups.iter().map(Group::member_set).collect()
    }

    /// Same groups, ignoring group order, member order, leaders and date.
    pub fn same_partition(&self, other: &Permutation) -> bool {
        self.partition() == other.partition()
    }

    /// Check that the groups form a set partition of sensible size.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidPermutation`] for an empty round,
    /// blank identifiers, groups smaller than [`MIN_GROUP_SIZE`], a leader
    /// repeated among the others, a member listed twice in one group, or
    /// somebody in more than one group.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let invalid = |reason: String| ValidationError::InvalidPermutation {
            date: self.date,
            reason,
        };

        if self.groups.is_empty() {
            return Err(invalid("no groups".into()));
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for (i, group) in self.groups.iter().enumerate() {
            if group.others.contains(&group.leader) {
                return Err(invalid(format!(
                    "group {} lists leader '{}' among the others",
                    i + 1,
                    group.leader
                )));
            }
            let mut in_group: HashSet<&str> = HashSet::new();
            if let Some(twice) = group.others.iter().find(|o| !in_group.insert(o.as_str())) {
                return Err(invalid(format!("'{twice}' is listed twice in group {}", i + 1)));
            }
            if group.len() < MIN_GROUP_SIZE {
                return Err(invalid(format!(
                    "group {} has {} member(s), at least {} required",
                    i + 1,
                    group.len(),
                    MIN_GROUP_SIZE
                )));
            }
            for member in group.members() {
                if member.trim().is_empty() {
                    return Err(invalid(format!("group {} has a blank member", i + 1)));
                }
                if !seen.insert(member.as_str()) {
                    return Err(invalid(format!("'{member}' appears in more than one group")));
                }
            }
        }
        Ok(())
    }

    /// [`validate`](Self::validate), plus the members must be exactly `roster`.
    pub fn validate_against(&self, roster: &[ParticipantId]) -> Result<(), ValidationError> {
        self.validate()?;

        let expected: BTreeSet<&str> = roster.iter().map(String::as_str).collect();
        let actual = self.participants();

        if let Some(missing) = expected.difference(&actual).next() {
            return Err(ValidationError::InvalidPermutation {
                date: self.date,
                reason: format!("'{missing}' is missing from every group"),
            });
        }
        if let Some(extra) = actual.difference(&expected).next() {
            return Err(ValidationError::InvalidPermutation {
                date: self.date,
                reason: format!("'{extra}' is not on the roster"),
            });
        }
        Ok(())
    }

    /// Pretty JSON with four-space indentation.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        String::from_utf8(buf).map_err(serde::ser::Error::custom)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The same round with every identifier passed through [`normalize_id`].
    pub fn normalized(self) -> Self {
        let groups = self
            .groups
            .into_iter()
            .map(|g| Group {
                leader: normalize_id(&g.leader),
                others: g.others.iter().map(|o| normalize_id(o)).collect(),
            })
            .collect();
        Self::new(self.date, groups)
    }
}

impl PartialEq for Permutation {
    fn eq(&self, other: &Self) -> bool {
        self.date == other.date && self.same_partition(other)
    }
}

impl Eq for Permutation {}

impl fmt::Display for Permutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, group) in self.groups.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let members: Vec<&str> = group.members().map(String::as_str).collect();
            write!(f, "Group {}: {}", i + 1, members.join(" | "))?;
        }
        Ok(())
    }
}
