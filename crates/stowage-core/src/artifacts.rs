//! Build artifact sources
//!
//! The exporter reads compiler output through two traits so the host build
//! tool's layout stays swappable (and testable):
//!
//! - [`ArtifactSource`] - lists the per-contract artifact files
//! - [`BuildInfoSource`] - resolves the build-info document an artifact was
//!   compiled under
//!
//! [`FileSystemArtifactSource`] implements both for a Hardhat-style tree:
//!
//! ```text
//! artifacts/
//!   build-info/<id>.json
//!   contracts/Greeter.sol/Greeter.json
//!   contracts/Greeter.sol/Greeter.dbg.json   -> { "buildInfo": "../../build-info/<id>.json" }
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::files;
use crate::types::{BuildInfo, DebugInfo};
use crate::walk::DirWalk;

/// Folder holding build-info documents inside the artifacts root
pub const BUILD_INFO_DIR: &str = "build-info";

/// Suffix of an artifact's companion debug file
pub const DEBUG_SUFFIX: &str = ".dbg.json";

// =============================================================================
// Trait Definitions
// =============================================================================

/// Lists the compiled artifact files of a project
pub trait ArtifactSource {
    /// Root directory all artifact paths live under
    fn root(&self) -> &Path;

    /// Every artifact file, sorted by path
    fn artifact_paths(&self) -> Result<Vec<PathBuf>>;
}

/// Resolves the build-info document an artifact was compiled under
pub trait BuildInfoSource {
    /// Path of the build-info document for `artifact_path`
    fn build_info_path(&self, artifact_path: &Path) -> Result<PathBuf>;

    /// Load the build-info document at `build_info_path`, as returned by
    /// [`BuildInfoSource::build_info_path`]
    fn load(&self, build_info_path: &Path) -> Result<Rc<BuildInfo>>;
}

// =============================================================================
// Filesystem Implementation
// =============================================================================

/// Artifact source reading a Hardhat artifacts directory.
///
/// Build-info documents are parsed once per path and shared between the
/// contracts of a compilation.
#[derive(Debug)]
pub struct FileSystemArtifactSource {
    artifacts_dir: PathBuf,
    build_infos: RefCell<HashMap<PathBuf, Rc<BuildInfo>>>,
}

impl FileSystemArtifactSource {
    /// Create a source over an explicit artifacts directory
    pub fn new(artifacts_dir: impl Into<PathBuf>) -> Self {
        Self {
            artifacts_dir: artifacts_dir.into(),
            build_infos: RefCell::new(HashMap::new()),
        }
    }

    /// Create a source for `<project_root>/artifacts`
    pub fn with_paths(project_root: &Path) -> Self {
        Self::new(project_root.join("artifacts"))
    }
}

impl ArtifactSource for FileSystemArtifactSource {
    fn root(&self) -> &Path {
        &self.artifacts_dir
    }

    fn artifact_paths(&self) -> Result<Vec<PathBuf>> {
        if !self.artifacts_dir.is_dir() {
            return Ok(Vec::new());
        }

        let walk = DirWalk::new(&self.artifacts_dir, |name| {
            !name.starts_with('.') && name != BUILD_INFO_DIR
        });
        Ok(walk
            .json_files()?
            .into_iter()
            .filter(|entry| {
                let name = entry.path.file_name().and_then(|n| n.to_str());
                // Artifacts always live in a `<Source>.sol/` folder
                entry.relative_path.components().count() >= 2
                    && name.is_some_and(|n| !n.ends_with(DEBUG_SUFFIX))
            })
            .map(|entry| entry.path)
            .collect())
    }
}

impl BuildInfoSource for FileSystemArtifactSource {
    fn build_info_path(&self, artifact_path: &Path) -> Result<PathBuf> {
        let debug_path = debug_file_for(artifact_path);
        let debug: DebugInfo = files::read_json(&debug_path)?;
        let dir = debug_path.parent().unwrap_or(Path::new(""));
        Ok(normalize(&dir.join(debug.build_info)))
    }

    fn load(&self, build_info_path: &Path) -> Result<Rc<BuildInfo>> {
        if let Some(cached) = self.build_infos.borrow().get(build_info_path) {
            return Ok(Rc::clone(cached));
        }

        if !build_info_path.is_file() {
            return Err(Error::NotFound(format!(
                "build-info {} does not exist",
                build_info_path.display()
            )));
        }
        let build_info: Rc<BuildInfo> = Rc::new(files::read_json(build_info_path)?);
        self.build_infos
            .borrow_mut()
            .insert(build_info_path.to_path_buf(), Rc::clone(&build_info));
        Ok(build_info)
    }
}

/// `<dir>/<Name>.json` -> `<dir>/<Name>.dbg.json`
pub fn debug_file_for(artifact_path: &Path) -> PathBuf {
    let stem = artifact_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    artifact_path.with_file_name(format!("{}{}", stem, DEBUG_SUFFIX))
}

/// Resolve `.` and `..` lexically so equal build-info paths share a cache slot
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
