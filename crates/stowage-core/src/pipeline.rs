//! End-to-end packaging pass
//!
//! 1. load deployments (essential fields only)
//! 2. resolve [`PackageConfig`] into [`PackageOptions`]
//! 3. export compiler artifacts -> fingerprint map
//! 4. reconcile deployment artifacts against the fingerprint map
//! 5. aggregate deployed addresses and write `deployed.json`
//!
//! Any failure aborts the pass; files already written stay in place.
//! Clearing the build directory beforehand is the caller's job
//! ([`BuildLayout::reset`](crate::layout::BuildLayout::reset)).

use std::path::PathBuf;

use tracing::info;

use crate::address::{aggregate, AddressTable};
use crate::artifacts::{ArtifactSource, BuildInfoSource};
use crate::deployments::{discover_deployment_artifacts, DeploymentLoader};
use crate::error::Result;
use crate::export::ArtifactExporter;
use crate::files;
use crate::options::{PackageConfig, PackageOptions, ProjectPaths};
use crate::reconcile::{Reconciled, Reconciler};
use crate::types::{FingerprintMap, MultiExport};

/// Everything a packaging pass produced
#[derive(Debug, Clone)]
pub struct PackageReport {
    pub options: PackageOptions,
    pub deployments: MultiExport,
    pub fingerprints: FingerprintMap,
    /// Extended artifact files written
    pub exported: Vec<PathBuf>,
    pub reconciled: Reconciled,
    /// Present when deployed addresses are part of the package
    pub addresses: Option<AddressTable>,
}

/// One packaging pass over a project
pub struct Pipeline<'a, S> {
    config: &'a PackageConfig,
    paths: &'a ProjectPaths,
    source: &'a S,
    loader: DeploymentLoader,
}

impl<'a, S: ArtifactSource + BuildInfoSource> Pipeline<'a, S> {
    pub fn new(config: &'a PackageConfig, paths: &'a ProjectPaths, source: &'a S) -> Self {
        Self {
            config,
            paths,
            source,
            loader: DeploymentLoader::new(&paths.deployments).essential_only(true),
        }
    }

    /// Replace the deployment loader, e.g. to add external deployments.
    /// Records are always trimmed to their essential fields.
    pub fn with_loader(mut self, loader: DeploymentLoader) -> Self {
        self.loader = loader.essential_only(true);
        self
    }

    pub fn run(&self) -> Result<PackageReport> {
        let deployments = self.loader.load_all()?;
        let options = self.config.resolve(self.paths, &deployments)?;
        let layout = options.layout();
        info!(
            build_dir = %layout.path().display(),
            include_deployed = options.include_deployed,
            artifact_from_deployment = options.artifact_from_deployment,
            "packaging"
        );

        let exported = ArtifactExporter::new(self.source, layout.extended_artifacts())
            .with_filter(options.artifact_filter()?)
            .strip_bytecode(options.exclude_bytecode)
            .export()?;

        let candidates = if options.artifact_from_deployment {
            discover_deployment_artifacts(self.loader.root())?
        } else {
            Vec::new()
        };
        let reconciled = Reconciler::new(self.loader.root(), layout.deployed_artifacts())
            .with_filter(options.deployment_filter()?)
            .enabled(options.artifact_from_deployment)
            .reconcile(&candidates, &exported.fingerprints)?;

        let addresses = if options.writes_addresses() {
            let table = aggregate(&deployments, &options.deployed_name_filter()?);
            files::write_json(&layout.address_table(), &table)?;
            Some(table)
        } else {
            None
        };

        Ok(PackageReport {
            options,
            deployments,
            fingerprints: exported.fingerprints,
            exported: exported.written,
            reconciled,
            addresses,
        })
    }
}
