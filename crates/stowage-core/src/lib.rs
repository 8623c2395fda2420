pub mod address;
pub mod artifacts;
pub mod deployments;
pub mod error;
pub mod export;
pub mod files;
pub mod filter;
pub mod hash;
pub mod layout;
pub mod options;
pub mod pipeline;
pub mod reconcile;
pub mod types;
pub mod walk;

pub use address::{aggregate, deployed_contract_names, has_deployed_address, AddressTable};
pub use artifacts::{ArtifactSource, BuildInfoSource, FileSystemArtifactSource};
pub use deployments::{discover_deployment_artifacts, load_all, DeploymentLoader};
pub use error::{Error, Result};
pub use export::{ArtifactExporter, ExportOutput};
pub use filter::{filter_paths, Filter};
pub use hash::fingerprint;
pub use layout::BuildLayout;
pub use options::{OutputTarget, PackageConfig, PackageOptions, ProjectPaths};
pub use pipeline::{PackageReport, Pipeline};
pub use reconcile::{Reconciled, Reconciler};
pub use types::*;
