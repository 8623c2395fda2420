//! Compiler artifact export
//!
//! Rewrites every selected artifact into the extended-artifact tree with its
//! compiler documentation (`userdoc`/`devdoc`) and the fingerprint of the
//! compiler input it was built from (`solcInputHash`). The fingerprints are
//! returned as a [`FingerprintMap`] for deduplicating deployment artifacts.
//!
//! `artifacts/contracts/Greeter.sol/Greeter.json` is written to
//! `<destination>/contracts/Greeter.json`: the per-source folder is dropped,
//! everything above it is kept.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::artifacts::{ArtifactSource, BuildInfoSource};
use crate::error::{Error, Result};
use crate::files;
use crate::filter::Filter;
use crate::hash::fingerprint;
use crate::types::{
    ArtifactRecord, ExtendedArtifact, Fingerprint, FingerprintMap, FullyQualifiedName,
};

/// Result of an export pass
#[derive(Debug, Clone, Default)]
pub struct ExportOutput {
    pub fingerprints: FingerprintMap,
    /// Files written, in processing order
    pub written: Vec<PathBuf>,
}

/// Writes extended artifacts for a project's compiler output
pub struct ArtifactExporter<'a, S> {
    source: &'a S,
    destination: PathBuf,
    filter: Filter,
    strip_bytecode: bool,
}

impl<'a, S: ArtifactSource + BuildInfoSource> ArtifactExporter<'a, S> {
    pub fn new(source: &'a S, destination: impl Into<PathBuf>) -> Self {
        Self {
            source,
            destination: destination.into(),
            filter: Filter::all(),
            strip_bytecode: false,
        }
    }

    /// Only export artifacts whose path passes `filter`
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Omit `bytecode` and `deployedBytecode` from written artifacts
    pub fn strip_bytecode(mut self, strip: bool) -> Self {
        self.strip_bytecode = strip;
        self
    }

    /// Export every artifact the source lists
    pub fn export(&self) -> Result<ExportOutput> {
        let paths = self.source.artifact_paths()?;
        self.export_paths(&paths)
    }

    /// Export the given artifact paths (after filtering).
    ///
    /// Aborts on the first artifact whose compiler output cannot be found, or
    /// whose destination another contract already took; files written before
    /// that stay on disk.
    pub fn export_paths(&self, artifact_paths: &[PathBuf]) -> Result<ExportOutput> {
        let selected = self.filter.apply(artifact_paths);
        debug!(
            total = artifact_paths.len(),
            selected = selected.len(),
            "filtered compiler artifacts"
        );

        let mut output = ExportOutput::default();
        // one fingerprint per build-info document
        let mut input_fingerprints: HashMap<PathBuf, Fingerprint> = HashMap::new();
        // destination -> contract written there
        let mut targets: HashMap<PathBuf, FullyQualifiedName> = HashMap::new();

        for artifact_path in &selected {
            let mut artifact: ArtifactRecord = files::read_json(artifact_path)?;
            if self.strip_bytecode {
                artifact.strip_bytecode();
            }

            let build_info_path = self.source.build_info_path(artifact_path)?;
            let build_info = self.source.load(&build_info_path).map_err(|e| match e {
                Error::NotFound(msg) => {
                    Error::NotFound(format!("{} (referenced by {})", msg, artifact_path.display()))
                }
                other => other,
            })?;

            let name = artifact.fully_qualified_name();
            let contract = build_info
                .contract(&artifact.source_name, &artifact.contract_name)
                .ok_or_else(|| {
                    Error::NotFound(format!(
                        "no compiler output for {} in {} (stale build? recompile and retry)",
                        name,
                        build_info_path.display()
                    ))
                })?;

            let solc_input_hash = input_fingerprints
                .entry(build_info_path)
                .or_insert_with(|| fingerprint(&build_info.input))
                .clone();

            let target = self.target_path(artifact_path)?;
            if let Some(previous) = targets.get(&target) {
                return Err(Error::Consistency(format!(
                    "{} and {} both export to {}",
                    previous,
                    name,
                    target.display()
                )));
            }
            targets.insert(target.clone(), name.clone());
            let extended = ExtendedArtifact {
                artifact,
                solc_input_hash: solc_input_hash.clone(),
                userdoc: contract.userdoc.clone(),
                devdoc: contract.devdoc.clone(),
            };
            files::write_json(&target, &extended)?;
            debug!(artifact = %name, path = %target.display(), "exported artifact");

            output.fingerprints.insert(name, solc_input_hash);
            output.written.push(target);
        }

        info!(
            exported = output.written.len(),
            destination = %self.destination.display(),
            "exported compiler artifacts"
        );
        Ok(output)
    }

    /// Map `<root>/<dirs..>/<Source>.sol/<Name>.json` to
    /// `<destination>/<dirs..>/<Name>.json`
    fn target_path(&self, artifact_path: &Path) -> Result<PathBuf> {
        let root = self.source.root();
        let relative = artifact_path
            .strip_prefix(root)
            .map_err(|_| Error::OutsideRoot {
                path: artifact_path.to_path_buf(),
                root: root.to_path_buf(),
            })?;

        let parent = relative
            .parent()
            .and_then(Path::parent)
            .unwrap_or(Path::new(""));
        let file_name = relative.file_name().unwrap_or(relative.as_os_str());

        Ok(self.destination.join(parent).join(file_name))
    }
}
