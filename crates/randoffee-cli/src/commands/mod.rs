pub mod accept;
pub mod compare;
pub mod config;
pub mod generate;
pub mod history;
pub mod leaders;

use std::path::{Path, PathBuf};

use randoffee_core::{Config, ConfigError, FileRoster, JsonHistoryStore};

/// The folder a coffee scheme lives in: roster files, history and config.
pub struct Workspace {
    pub dir: PathBuf,
    pub config: Config,
}

impl Workspace {
    pub fn open(dir: &Path) -> Result<Self, ConfigError> {
        tracing::debug!("working in {}", dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
            config: Config::load(dir)?,
        })
    }

    pub fn history(&self) -> JsonHistoryStore {
        JsonHistoryStore::new(Config::resolve(&self.dir, &self.config.paths.previous))
    }

    pub fn roster(&self, extra_excludes: Vec<String>) -> FileRoster {
        let paths = &self.config.paths;
        FileRoster::new(Config::resolve(&self.dir, &paths.include))
            .with_exclude_file(Config::resolve(&self.dir, &paths.exclude))
            .with_extra_excludes(extra_excludes)
    }
}
