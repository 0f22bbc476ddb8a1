//! Accepted rounds on disk.
//!
//! Every accepted round is one pretty-printed JSON document named after its
//! date (`2024-01-15.json`) inside the history directory. The most recent
//! candidate that was generated but not (yet) accepted is kept alongside as
//! `.latest.json` so it can be promoted later without regenerating.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::{CoreError, Result, StorageError};
use crate::permutation::Permutation;

/// File holding the last generated but unaccepted round.
pub const LATEST_FILE: &str = ".latest.json";

/// Where accepted rounds come from and go to.
pub trait HistoryStore {
    /// All accepted rounds, newest first.
    fn load_all(&self) -> Result<Vec<Permutation>>;

    /// Store an accepted round. Refuses to replace a round with the same
    /// date unless `force` is set.
    fn save(&self, perm: &Permutation, force: bool) -> Result<()>;

    /// Remember a candidate that has not been accepted.
    fn save_latest(&self, perm: &Permutation) -> Result<()>;

    /// The remembered candidate, if any.
    fn load_latest(&self) -> Result<Option<Permutation>>;
}

/// Directory of `YYYY-MM-DD.json` files.
#[derive(Debug, Clone)]
pub struct JsonHistoryStore {
    dir: PathBuf,
}

impl JsonHistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File an accepted round dated `date` is stored in.
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.json", date.format("%Y-%m-%d")))
    }

    pub fn latest_path(&self) -> PathBuf {
        self.dir.join(LATEST_FILE)
    }

    /// The accepted round for `date`.
    pub fn load(&self, date: NaiveDate) -> Result<Permutation> {
        read_permutation_file(&self.path_for(date))
    }

    /// Move the remembered candidate to its dated file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if there is no remembered candidate
    /// and [`StorageError::AlreadyExists`] if its date is already taken and
    /// `force` is not set.
    pub fn promote_latest(&self, force: bool) -> Result<Permutation> {
        let latest = self
            .load_latest()?
            .ok_or_else(|| StorageError::NotFound(self.latest_path()))?;
        self.save(&latest, force)?;
        std::fs::remove_file(self.latest_path())?;
        tracing::info!(
            "promoted latest candidate to {}",
            self.path_for(latest.date).display()
        );
        Ok(latest)
    }

    fn write(&self, path: &Path, perm: &Permutation) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(path, perm.to_json()?)?;
        Ok(())
    }
}

impl HistoryStore for JsonHistoryStore {
    fn load_all(&self) -> Result<Vec<Permutation>> {
        if !self.dir.exists() {
            tracing::warn!("history directory {} does not exist", self.dir.display());
            return Ok(Vec::new());
        }

        let mut rounds = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file() || path.file_name().is_some_and(|n| n == LATEST_FILE) {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                tracing::warn!("ignoring {} in history directory", path.display());
                continue;
            }
            rounds.push(read_permutation_file(&path)?);
        }

        rounds.sort_by(|a, b| b.date.cmp(&a.date));
        tracing::debug!("loaded {} round(s) from {}", rounds.len(), self.dir.display());
        Ok(rounds)
    }

    fn save(&self, perm: &Permutation, force: bool) -> Result<()> {
        perm.validate()?;
        let path = self.path_for(perm.date);
        if path.exists() && !force {
            return Err(StorageError::AlreadyExists(path).into());
        }
        self.write(&path, perm)?;
        tracing::info!("saved round to {}", path.display());
        Ok(())
    }

    fn save_latest(&self, perm: &Permutation) -> Result<()> {
        self.write(&self.latest_path(), perm)
    }

    fn load_latest(&self) -> Result<Option<Permutation>> {
        let path = self.latest_path();
        if !path.exists() {
            return Ok(None);
        }
        read_permutation_file(&path).map(Some)
    }
}

/// Read and validate one round from a JSON file.
///
/// Identifiers are normalized before validation, so two spellings of the
/// same email in one round are reported as a duplicate.
pub fn read_permutation_file(path: &Path) -> Result<Permutation> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            CoreError::from(StorageError::NotFound(path.to_path_buf()))
        }
        _ => CoreError::from(e),
    })?;
    let perm = Permutation::from_json(&content)
        .map_err(|e| StorageError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .normalized();
    perm.validate()?;
    Ok(perm)
}
