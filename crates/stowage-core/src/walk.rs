//! Directory traversal
//!
//! [`DirWalk`] is a restartable description of a walk: every call to
//! [`DirWalk::entries`] starts a fresh lazy traversal. Which entries are
//! descended into and yielded is decided by a predicate, so traversal and
//! filtering policy stay separate.

use std::path::PathBuf;

use walkdir::{DirEntry, WalkDir};

use crate::error::{Error, Result};

/// Folder name hardhat-deploy uses for cached compiler inputs
pub const SOLC_INPUTS_DIR: &str = "solcInputs";

/// A file or directory found during a walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub path: PathBuf,
    /// Path relative to the walk root
    pub relative_path: PathBuf,
    pub is_dir: bool,
}

/// A predicate deciding whether an entry is visited (and, for directories,
/// descended into). It receives the entry's file name.
pub type EntryPredicate = fn(&str) -> bool;

/// Skip hidden entries and `solcInputs` folders
pub fn visible_deployment_entry(name: &str) -> bool {
    !name.starts_with('.') && name != SOLC_INPUTS_DIR
}

/// Restartable walk over a directory tree
#[derive(Debug, Clone)]
pub struct DirWalk {
    root: PathBuf,
    predicate: EntryPredicate,
}

impl DirWalk {
    /// Walk everything below `root` that passes `predicate`
    pub fn new(root: impl Into<PathBuf>, predicate: EntryPredicate) -> Self {
        Self {
            root: root.into(),
            predicate,
        }
    }

    /// Start a new lazy traversal. Entries come out depth-first with siblings
    /// sorted by file name.
    pub fn entries(&self) -> impl Iterator<Item = Result<WalkEntry>> + '_ {
        let predicate = self.predicate;
        WalkDir::new(&self.root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| entry.depth() == 0 || predicate(&file_name(entry)))
            .map(move |entry| {
                let entry = entry.map_err(|e| {
                    let path = e.path().unwrap_or(&self.root).to_path_buf();
                    Error::io(path, e.into())
                })?;
                let relative_path = entry
                    .path()
                    .strip_prefix(&self.root)
                    .unwrap_or(entry.path())
                    .to_path_buf();
                Ok(WalkEntry {
                    is_dir: entry.file_type().is_dir(),
                    path: entry.into_path(),
                    relative_path,
                })
            })
    }

    /// Collect every file with a `.json` extension, sorted by relative path
    pub fn json_files(&self) -> Result<Vec<WalkEntry>> {
        let mut files = Vec::new();
        for entry in self.entries() {
            let entry = entry?;
            if !entry.is_dir && entry.path.extension().is_some_and(|e| e == "json") {
                files.push(entry);
            }
        }
        // plain string order, so `a.json` sorts before `a/b.json`
        files.sort_by(|a, b| {
            a.relative_path
                .to_string_lossy()
                .cmp(&b.relative_path.to_string_lossy())
        });
        Ok(files)
    }
}

fn file_name(entry: &DirEntry) -> String {
    entry.file_name().to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "{}").unwrap();
    }

    #[test]
    fn test_json_files_skip_hidden_and_solc_inputs() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "Greeter.json");
        touch(tmp.path(), "Token.json");
        touch(tmp.path(), ".migrations.json");
        touch(tmp.path(), "solcInputs/abc123.json");
        touch(tmp.path(), ".hidden/Secret.json");
        touch(tmp.path(), "notes.txt");
        touch(tmp.path(), "nested/Proxy.json");

        let walk = DirWalk::new(tmp.path(), visible_deployment_entry);
        let names: Vec<PathBuf> = walk
            .json_files()
            .unwrap()
            .into_iter()
            .map(|e| e.relative_path)
            .collect();

        assert_eq!(
            names,
            vec![
                PathBuf::from("Greeter.json"),
                PathBuf::from("Token.json"),
                PathBuf::from("nested/Proxy.json"),
            ]
        );
    }

    #[test]
    fn test_walk_is_restartable() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "A.json");
        touch(tmp.path(), "b/B.json");

        let walk = DirWalk::new(tmp.path(), visible_deployment_entry);
        let first: Vec<_> = walk.entries().collect::<Result<_>>().unwrap();
        let second: Vec<_> = walk.entries().collect::<Result<_>>().unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let walk = DirWalk::new("/definitely/not/a/dir", visible_deployment_entry);
        assert!(walk.json_files().is_err());
    }
}
