//! # Randoffee Core Library
//!
//! This library provides the core logic for randomised coffee chats: the
//! participants of a round are split into small groups that should not look
//! like the groups of the last few rounds. All operations are exposed by the
//! `randoffee` CLI binary, which is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Permutation model**: groups with a leader, pairings and set partitions
//! - **Similarity**: Jaccard overlap of pairings restricted to the people
//!   present in both rounds, plus a per-person repeat report
//! - **Generator**: rejection sampling of shuffled rosters against a
//!   similarity threshold, with a bounded attempt budget
//! - **Storage**: CSV roster files, one JSON file per accepted round and
//!   TOML-based configuration
//!
//! ## Key Components
//!
//! - [`GroupGenerator`]: Produces a sufficiently novel [`Permutation`]
//! - [`similarity()`]: Pairing similarity between two rounds
//! - [`JsonHistoryStore`]: Accepted rounds on disk
//! - [`FileRoster`]: Include/exclude lists
//! - [`Config`]: Application configuration management

pub mod error;
pub mod generator;
pub mod leader;
pub mod permutation;
pub mod similarity;
pub mod storage;

pub use error::{ConfigError, CoreError, GenerateError, StorageError, ValidationError};
pub use generator::{plan_group_sizes, Candidate, GeneratorConfig, GroupGenerator, GroupSizing};
pub use leader::{balance_leaders, lead_counts};
pub use permutation::{normalize_id, Group, Pairing, ParticipantId, Permutation, MIN_GROUP_SIZE};
pub use similarity::{
    pairing_overlap, repeat_report, similarity, PairingOverlap, RepeatReport, Weighting,
};
pub use storage::{
    Config, FileRoster, HistoryStore, JsonHistoryStore, Person, RosterSelection, RosterSource,
};
