mod config;
pub mod history;
pub mod roster;

pub use config::{Config, GeneratorSection, PathsConfig, CONFIG_FILE};
pub use history::{read_permutation_file, HistoryStore, JsonHistoryStore, LATEST_FILE};
pub use roster::{split_exclusions, FileRoster, Person, RosterSelection, RosterSource};
