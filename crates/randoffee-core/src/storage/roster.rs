//! Who takes part in a round.
//!
//! The roster is two plain CSV files without a header, one `name,email` per
//! line: `include` lists everyone signed up and `exclude` lists people who
//! opted out. Exclusion always wins. Temporary exclusions (people on leave)
//! can be added on top without touching either file.
//!
//! Emails are normalized to lowercase on the way in, the same way stored
//! rounds are, so the rest of the crate can compare identifiers exactly.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{CoreError, Result, StorageError, ValidationError};
use crate::permutation::{normalize_id, ParticipantId};

/// One roster entry. The email doubles as the participant identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Person {
    pub name: String,
    pub email: String,
}

impl Person {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

impl std::fmt::Display for Person {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// Outcome of applying exclusions to the include list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RosterSelection {
    pub included: Vec<Person>,
    pub excluded: Vec<Person>,
}

impl RosterSelection {
    /// Identifiers of everyone taking part.
    pub fn participant_ids(&self) -> Vec<ParticipantId> {
        self.included.iter().map(|p| p.email.clone()).collect()
    }
}

/// Source of the participants for a round.
pub trait RosterSource {
    fn selection(&self) -> Result<RosterSelection>;

    fn participants(&self) -> Result<Vec<Person>> {
        Ok(self.selection()?.included)
    }
}

/// Roster backed by `include` and `exclude` files.
#[derive(Debug, Clone)]
pub struct FileRoster {
    include: PathBuf,
    exclude: Option<PathBuf>,
    extra_excludes: Vec<String>,
}

impl FileRoster {
    pub fn new(include: impl Into<PathBuf>) -> Self {
        Self {
            include: include.into(),
            exclude: None,
            extra_excludes: Vec::new(),
        }
    }

    /// Also drop everyone listed in `path`. A missing file excludes nobody.
    pub fn with_exclude_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.exclude = Some(path.into());
        self
    }

    /// Also drop these emails for this round only.
    pub fn with_extra_excludes<I, S>(mut self, emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_excludes.extend(emails.into_iter().map(Into::into));
        self
    }
}

impl RosterSource for FileRoster {
    fn selection(&self) -> Result<RosterSelection> {
        if !self.include.exists() {
            return Err(StorageError::NotFound(self.include.clone()).into());
        }
        let people = read_people(&self.include)?;

        let mut seen = BTreeSet::new();
        for (line, person) in &people {
            if !seen.insert(person.email.as_str()) {
                return Err(ValidationError::InvalidRosterEntry {
                    path: self.include.clone(),
                    line: *line,
                    reason: format!("duplicate email '{}'", person.email),
                }
                .into());
            }
        }

        let mut excluded_emails: BTreeSet<String> = self
            .extra_excludes
            .iter()
            .map(|e| normalize_id(e))
            .filter(|e| !e.is_empty())
            .collect();
        match &self.exclude {
            Some(path) if path.exists() => {
                excluded_emails.extend(
                    read_people(path)?
                        .into_iter()
                        .map(|(_, p)| p.email),
                );
            }
            Some(path) => {
                tracing::debug!("no exclude file at {}", path.display());
            }
            None => {}
        }

        let mut selection = RosterSelection::default();
        for (_, person) in people {
            if excluded_emails.contains(&person.email) {
                tracing::info!("excluding {person} from this round");
                selection.excluded.push(person);
            } else {
                selection.included.push(person);
            }
        }
        Ok(selection)
    }
}

/// Split command-line exclusions that may be space or semicolon separated.
pub fn split_exclusions<I, S>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter()
        .flat_map(|arg| {
            arg.as_ref()
                .split(|c: char| c == ';' || c.is_whitespace())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Read `name,email` lines, keeping the line number of each for error reports.
///
/// A line holding a single field is taken to be an email with no name.
/// Emails come back normalized.
fn read_people(path: &Path) -> Result<Vec<(usize, Person)>> {
    let parse_error = |e: csv::Error| {
        CoreError::from(StorageError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(parse_error)?;

    let mut people = Vec::new();
    for record in reader.records() {
        let record = record.map_err(parse_error)?;
        let line = record.position().map_or(0, |p| p.line() as usize);
        if record.iter().all(str::is_empty) {
            continue;
        }

        let (name, email) = match (record.get(0), record.get(1)) {
            (Some(name), Some(email)) => (name, email),
            (Some(email), None) => ("", email),
            _ => ("", ""),
        };
        if email.is_empty() || !email.contains('@') {
            return Err(ValidationError::InvalidRosterEntry {
                path: path.to_path_buf(),
                line,
                reason: "expected 'name,email'".to_string(),
            }
            .into());
        }
        people.push((line, Person::new(name, normalize_id(email))));
    }
    Ok(people)
}
