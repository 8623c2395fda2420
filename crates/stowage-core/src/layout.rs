//! Build directory layout
//!
//! The [`BuildLayout`] struct manages the build directory the pipeline writes
//! into. It holds two sibling trees plus the address table:
//!
//! ```text
//! package-build/
//!   extend-artifacts/     compiler artifacts with docs and solcInputHash
//!   deployed-artifacts/   deployment records not already exported
//!   deployed.json         network -> contract -> address
//! ```

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Manages the build directory for one packaging run.
#[derive(Debug, Clone)]
pub struct BuildLayout {
    path: PathBuf,
}

impl BuildLayout {
    /// Default build directory name
    pub const NAME: &str = "package-build";

    /// Folder holding extended compiler artifacts
    pub const EXTENDED_ARTIFACTS: &str = "extend-artifacts";

    /// Folder holding reconciled deployment artifacts
    pub const DEPLOYED_ARTIFACTS: &str = "deployed-artifacts";

    /// File holding the address table
    pub const ADDRESS_TABLE: &str = "deployed.json";

    /// Create a `BuildLayout` at a custom location.
    pub fn at<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Get the path to the build directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Join a relative path to the build directory.
    pub fn join<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.path.join(path)
    }

    pub fn extended_artifacts(&self) -> PathBuf {
        self.join(Self::EXTENDED_ARTIFACTS)
    }

    pub fn deployed_artifacts(&self) -> PathBuf {
        self.join(Self::DEPLOYED_ARTIFACTS)
    }

    pub fn address_table(&self) -> PathBuf {
        self.join(Self::ADDRESS_TABLE)
    }

    /// Check if the build directory exists.
    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// Create the build directory if it doesn't exist.
    pub fn create(&self) -> Result<()> {
        crate::files::create_dir_all(&self.path)
    }

    /// Remove the build directory with everything in it, then recreate it
    /// empty.
    pub fn reset(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_dir_all(&self.path).map_err(|e| Error::io(&self.path, e))?;
        }
        self.create()
    }
}
