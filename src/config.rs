//! Data location resolution.
//!
//! The blob path comes from `--db`, then `TASKFLOW_DB` (clap folds both into
//! the same argument), then `$HOME/.taskflow/tasks.json`. The directory
//! holding the blob doubles as the data directory for the UI log file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, TaskFlowError};

pub const DATA_DIR_NAME: &str = ".taskflow";
pub const BLOB_FILE_NAME: &str = "tasks.json";
pub const LOG_FILE_NAME: &str = "taskflow.log";

/// Where this session reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub data_dir: PathBuf,
    pub blob: PathBuf,
}

impl Paths {
    /// Resolve from an explicit path and the home directory, without touching disk.
    pub fn resolve(db: Option<&Path>, home: Option<&Path>) -> Self {
        match db {
            Some(db) => {
                let data_dir = match db.parent() {
                    Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                    _ => PathBuf::from("."),
                };
                Paths {
                    data_dir,
                    blob: db.to_path_buf(),
                }
            }
            None => {
                let data_dir = home.unwrap_or_else(|| Path::new(".")).join(DATA_DIR_NAME);
                Paths {
                    blob: data_dir.join(BLOB_FILE_NAME),
                    data_dir,
                }
            }
        }
    }

    /// Resolve against the process environment.
    pub fn from_env(db: Option<&Path>) -> Self {
        let home = std::env::var_os("HOME").map(PathBuf::from);
        Self::resolve(db, home.as_deref())
    }

    /// Create the data directory if it is missing.
    pub fn ensure_data_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir).map_err(|e| {
            TaskFlowError::Config(format!(
                "Failed to create data directory {}: {e}",
                self.data_dir.display()
            ))
        })
    }

    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_db_wins() {
        let paths = Paths::resolve(Some(Path::new("/tmp/work/mine.json")), Some(Path::new("/home/u")));
        assert_eq!(paths.blob, PathBuf::from("/tmp/work/mine.json"));
        assert_eq!(paths.data_dir, PathBuf::from("/tmp/work"));
        assert_eq!(paths.log_file(), PathBuf::from("/tmp/work/taskflow.log"));
    }

    #[test]
    fn test_bare_file_name_uses_cwd() {
        let paths = Paths::resolve(Some(Path::new("tasks.json")), None);
        assert_eq!(paths.data_dir, PathBuf::from("."));
    }

    #[test]
    fn test_home_default() {
        let paths = Paths::resolve(None, Some(Path::new("/home/u")));
        assert_eq!(paths.blob, PathBuf::from("/home/u/.taskflow/tasks.json"));

        let paths = Paths::resolve(None, None);
        assert_eq!(paths.blob, PathBuf::from("./.taskflow/tasks.json"));
    }

    #[test]
    fn test_ensure_data_dir_creates_nested() {
        let dir = TempDir::new().unwrap();
        let paths = Paths::resolve(None, Some(dir.path()));
        paths.ensure_data_dir().unwrap();
        assert!(dir.path().join(DATA_DIR_NAME).is_dir());
    }
}
