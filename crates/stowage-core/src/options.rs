//! Packaging configuration
//!
//! [`PackageConfig`] is what the user writes; most fields are optional.
//! [`PackageConfig::resolve`] turns it into an immutable [`PackageOptions`]
//! once the deployments are known, filling in the defaults that depend on
//! them. Pipeline stages only ever see the resolved value.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::address::{deployed_contract_names, has_deployed_address};
use crate::error::Result;
use crate::filter::Filter;
use crate::layout::BuildLayout;
use crate::types::MultiExport;

/// What the packaging layer generates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputTarget {
    /// Typed bindings plus deployed addresses
    #[default]
    Typechain,
    /// Deployed addresses only
    Address,
}

impl OutputTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputTarget::Typechain => "typechain",
            OutputTarget::Address => "address",
        }
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Locations of the project's inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub artifacts: PathBuf,
    pub deployments: PathBuf,
}

impl ProjectPaths {
    /// Standard Hardhat layout below `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            artifacts: root.join("artifacts"),
            deployments: root.join("deployments"),
            root,
        }
    }
}

/// User-facing packaging settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackageConfig {
    /// Build directory, relative to the project root
    pub build_dir: Option<PathBuf>,
    pub output_target: OutputTarget,
    /// Name-prefix patterns selecting compiler artifacts
    pub includes: Option<Vec<String>>,
    pub excludes: Option<Vec<String>>,
    /// Patterns selecting deployment artifacts and deployed contract names
    pub includes_from_deployed: Option<Vec<String>>,
    pub excludes_from_deployed: Option<Vec<String>>,
    pub exclude_bytecode: bool,
    /// Defaults to whether any deployed address exists
    pub include_deployed: Option<bool>,
    /// Defaults to the resolved `include_deployed`
    pub artifact_from_deployment: Option<bool>,
}

/// Fully resolved packaging settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOptions {
    pub build_dir: PathBuf,
    pub output_target: OutputTarget,
    pub includes: Option<Vec<String>>,
    pub excludes: Option<Vec<String>>,
    pub includes_from_deployed: Option<Vec<String>>,
    pub excludes_from_deployed: Option<Vec<String>>,
    pub exclude_bytecode: bool,
    pub include_deployed: bool,
    pub artifact_from_deployment: bool,
}

impl PackageConfig {
    /// Build directory below the project root
    pub fn build_dir(&self, paths: &ProjectPaths) -> PathBuf {
        paths.root.join(
            self.build_dir
                .as_deref()
                .unwrap_or(Path::new(BuildLayout::NAME)),
        )
    }

    /// Resolve defaults against the loaded deployments
    pub fn resolve(&self, paths: &ProjectPaths, deployments: &MultiExport) -> Result<PackageOptions> {
        let name_filter = Filter::for_names(
            self.includes_from_deployed.as_deref(),
            self.excludes_from_deployed.as_deref(),
        )?;
        let include_deployed = self
            .include_deployed
            .unwrap_or_else(|| has_deployed_address(deployments, &name_filter));
        let artifact_from_deployment = self.artifact_from_deployment.unwrap_or(include_deployed);

        // ship what was deployed unless told otherwise
        let includes = self.includes.clone().or_else(|| {
            let names = deployed_contract_names(deployments);
            (!names.is_empty()).then(|| names.into_iter().collect())
        });

        Ok(PackageOptions {
            build_dir: self.build_dir(paths),
            output_target: self.output_target,
            includes,
            excludes: self.excludes.clone(),
            includes_from_deployed: self.includes_from_deployed.clone(),
            excludes_from_deployed: self.excludes_from_deployed.clone(),
            exclude_bytecode: self.exclude_bytecode,
            include_deployed,
            artifact_from_deployment,
        })
    }
}

impl PackageOptions {
    /// Path filter for compiler artifacts
    pub fn artifact_filter(&self) -> Result<Filter> {
        Filter::for_paths(self.includes.as_deref(), self.excludes.as_deref())
    }

    /// Path filter for deployment artifacts
    pub fn deployment_filter(&self) -> Result<Filter> {
        Filter::for_paths(
            self.includes_from_deployed.as_deref(),
            self.excludes_from_deployed.as_deref(),
        )
    }

    /// Name filter for deployed contracts
    pub fn deployed_name_filter(&self) -> Result<Filter> {
        Filter::for_names(
            self.includes_from_deployed.as_deref(),
            self.excludes_from_deployed.as_deref(),
        )
    }

    /// Whether the address table is produced
    pub fn writes_addresses(&self) -> bool {
        self.include_deployed || self.output_target == OutputTarget::Address
    }

    pub fn layout(&self) -> BuildLayout {
        BuildLayout::at(&self.build_dir)
    }
}
