//! Deployment artifact reconciliation
//!
//! Copies deployment records into their own output tree, skipping every
//! record that is an exact duplicate of an already exported compiler
//! artifact: same fully qualified name (from `metadata.compilationTarget`)
//! and same `solcInputHash`. Records whose metadata names no target are
//! always copied.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::files;
use crate::filter::Filter;
use crate::types::{compilation_target, FingerprintMap};

/// Outcome of a reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciled {
    /// Destination paths of copied records, in processing order
    pub written: Vec<PathBuf>,
    /// Source paths of records skipped as duplicates
    pub skipped: Vec<PathBuf>,
}

impl Reconciled {
    pub fn any_written(&self) -> bool {
        !self.written.is_empty()
    }
}

/// Copies non-duplicate deployment artifacts into an output tree
#[derive(Debug, Clone)]
pub struct Reconciler {
    deployments_root: PathBuf,
    output_dir: PathBuf,
    filter: Filter,
    enabled: bool,
}

impl Reconciler {
    pub fn new(deployments_root: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            deployments_root: deployments_root.into(),
            output_dir: output_dir.into(),
            filter: Filter::all(),
            enabled: true,
        }
    }

    /// Only consider deployment artifacts whose path passes `filter`
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// A disabled reconciler does nothing, not even create its output folder
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn reconcile(
        &self,
        artifact_paths: &[PathBuf],
        fingerprints: &FingerprintMap,
    ) -> Result<Reconciled> {
        let mut result = Reconciled::default();
        if !self.enabled {
            debug!("exporting artifacts from deployments is disabled");
            return Ok(result);
        }

        let selected = self.filter.apply(artifact_paths);
        debug!(
            total = artifact_paths.len(),
            selected = selected.len(),
            "filtered deployment artifacts"
        );

        files::create_dir_all(&self.output_dir)?;

        for path in &selected {
            let raw = files::read_bytes(path)?;
            let value: Value = serde_json::from_slice(&raw).map_err(|e| Error::json(path, e))?;

            // only two fields matter here; anything unreadable means "copy"
            let name = compilation_target(value.get("metadata")).map_err(|e| match e {
                Error::Consistency(msg) => Error::Consistency(format!("{}: {}", path.display(), msg)),
                other => other,
            })?;
            let recorded = value.get("solcInputHash").and_then(Value::as_str);

            if let Some(name) = &name {
                if fingerprints.is_duplicate(name, recorded) {
                    debug!(artifact = %name, path = %path.display(), "skipping duplicate deployment artifact");
                    result.skipped.push(path.clone());
                    continue;
                }
            }

            let target = self.target_path(path)?;
            files::write_bytes(&target, &raw)?;
            debug!(path = %target.display(), "copied deployment artifact");
            result.written.push(target);
        }

        info!(
            written = result.written.len(),
            skipped = result.skipped.len(),
            "reconciled deployment artifacts"
        );
        Ok(result)
    }

    fn target_path(&self, path: &Path) -> Result<PathBuf> {
        let relative = path
            .strip_prefix(&self.deployments_root)
            .map_err(|_| Error::OutsideRoot {
                path: path.to_path_buf(),
                root: self.deployments_root.clone(),
            })?;
        Ok(self.output_dir.join(relative))
    }
}
