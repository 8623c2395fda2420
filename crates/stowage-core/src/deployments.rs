//! Deployment record discovery
//!
//! Reads a hardhat-deploy style `deployments/` tree:
//!
//! ```text
//! deployments/
//!   <network alias>/
//!     .chainId            <- authoritative chain identity
//!     Greeter.json        <- one record per contract
//!     solcInputs/         <- ignored
//! ```
//!
//! Network folders are grouped by the chain id read from `.chainId`, never by
//! folder name. Extra folders from other sources can be merged into a network
//! alias with [`DeploymentLoader::with_external`].

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::files;
use crate::types::{ChainId, DeploymentRecord, MultiExport, NetworkDeployments};
use crate::walk::{visible_deployment_entry, DirWalk, SOLC_INPUTS_DIR};

/// File holding a network folder's chain id
pub const CHAIN_ID_FILE: &str = ".chainId";

/// Deployment folders supplied from outside the deployments root
#[derive(Debug, Clone)]
pub struct ExternalDeployments {
    pub network: String,
    /// Chain id configured for the network; sources without one are skipped
    pub chain_id: Option<ChainId>,
    pub folders: Vec<PathBuf>,
}

/// Loads every deployment record below a deployments root
#[derive(Debug, Clone)]
pub struct DeploymentLoader {
    root: PathBuf,
    essential_only: bool,
    external: Vec<ExternalDeployments>,
}

impl DeploymentLoader {
    /// Create a loader for the given deployments root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            essential_only: false,
            external: Vec::new(),
        }
    }

    /// Keep only `address`, `abi` and `linkedData` of each record
    pub fn essential_only(mut self, essential_only: bool) -> Self {
        self.essential_only = essential_only;
        self
    }

    /// Register external deployment folders for a network alias
    pub fn with_external(
        mut self,
        network: impl Into<String>,
        chain_id: Option<ChainId>,
        folders: Vec<PathBuf>,
    ) -> Self {
        self.external.push(ExternalDeployments {
            network: network.into(),
            chain_id,
            folders,
        });
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load all networks, grouped by chain id.
    ///
    /// A missing deployments root yields an empty result. A network folder
    /// without a `.chainId` marker is a configuration error.
    pub fn load_all(&self) -> Result<MultiExport> {
        let mut all = MultiExport::new();
        // network alias -> (chain id, index within all[chain id])
        let mut found: HashMap<String, (ChainId, usize)> = HashMap::new();

        if self.root.is_dir() {
            for (name, folder) in self.network_folders()? {
                let chain_id = read_chain_id(&folder)?;
                let contracts = self.load_folder(&folder, chain_id)?;
                debug!(
                    network = %name,
                    chain_id = %chain_id,
                    contracts = contracts.len(),
                    "loaded deployments"
                );

                let networks = all.entry(chain_id).or_default();
                found.insert(name.clone(), (chain_id, networks.len()));
                networks.push(NetworkDeployments {
                    name,
                    chain_id,
                    contracts,
                });
            }
        } else {
            debug!(root = %self.root.display(), "no deployments folder");
        }

        for external in &self.external {
            let Some(chain_id) = external.chain_id else {
                warn!(
                    network = %external.network,
                    "skipping external deployments: no chain id configured for this network"
                );
                continue;
            };

            for folder in &external.folders {
                if !folder.is_dir() {
                    warn!(
                        network = %external.network,
                        folder = %folder.display(),
                        "skipping unreadable external deployments folder"
                    );
                    continue;
                }
                let contracts = self.load_folder(folder, chain_id)?;

                match found.get(&external.network) {
                    Some(&(known_chain_id, index)) => {
                        if known_chain_id != chain_id {
                            return Err(Error::Consistency(format!(
                                "external deployments for network '{}' at {} have chain id {}, but the network is known with chain id {}",
                                external.network,
                                folder.display(),
                                chain_id,
                                known_chain_id
                            )));
                        }
                        if let Some(network) = all
                            .get_mut(&known_chain_id)
                            .and_then(|networks| networks.get_mut(index))
                        {
                            // records already known for the alias take precedence
                            for (name, record) in contracts {
                                network.contracts.entry(name).or_insert(record);
                            }
                        }
                    }
                    None => {
                        let networks = all.entry(chain_id).or_default();
                        found.insert(external.network.clone(), (chain_id, networks.len()));
                        networks.push(NetworkDeployments {
                            name: external.network.clone(),
                            chain_id,
                            contracts,
                        });
                    }
                }
            }
        }

        Ok(all)
    }

    /// Visible sub-folders of the root, sorted by name
    fn network_folders(&self) -> Result<Vec<(String, PathBuf)>> {
        let entries = std::fs::read_dir(&self.root).map_err(|e| Error::io(&self.root, e))?;

        let mut folders = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&self.root, e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            folders.push((name, path));
        }
        folders.sort();
        Ok(folders)
    }

    /// Load every record in one folder, keyed by its relative path without
    /// the `.json` extension
    fn load_folder(
        &self,
        folder: &Path,
        chain_id: ChainId,
    ) -> Result<BTreeMap<String, DeploymentRecord>> {
        let mut contracts = BTreeMap::new();

        for entry in DirWalk::new(folder, visible_deployment_entry).json_files()? {
            let value: Value = files::read_json(&entry.path)?;
            let mut record: DeploymentRecord = match serde_json::from_value(value) {
                Ok(record) => record,
                Err(e) => {
                    warn!(
                        path = %entry.path.display(),
                        error = %e,
                        "skipping file that is not a deployment record"
                    );
                    continue;
                }
            };
            record.backfill_from_networks(chain_id);
            if self.essential_only {
                record = record.into_essential();
            }

            let relative = entry.relative_path.to_string_lossy().replace('\\', "/");
            let name = relative
                .strip_suffix(".json")
                .unwrap_or(&relative)
                .to_string();
            contracts.insert(name, record);
        }

        Ok(contracts)
    }
}

/// Load all deployments below `root` with full records
pub fn load_all(root: &Path) -> Result<MultiExport> {
    DeploymentLoader::new(root).load_all()
}

fn read_chain_id(folder: &Path) -> Result<ChainId> {
    let marker = folder.join(CHAIN_ID_FILE);
    if !marker.is_file() {
        return Err(Error::Config(format!(
            "network folder {} has no {} file; create one containing the chain id",
            folder.display(),
            CHAIN_ID_FILE
        )));
    }

    let content = std::fs::read_to_string(&marker).map_err(|e| Error::io(&marker, e))?;
    content.parse().map_err(|_| {
        Error::Config(format!(
            "{} does not contain a valid chain id: '{}'",
            marker.display(),
            content.trim()
        ))
    })
}

/// Find the deployment artifact files the reconciler considers: JSON files
/// at least one folder deep whose stem is `[A-Za-z0-9_]+`, outside hidden
/// and `solcInputs` folders. Sorted by relative path.
pub fn discover_deployment_artifacts(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let files = DirWalk::new(root, visible_deployment_entry).json_files()?;
    Ok(files
        .into_iter()
        .filter(|entry| {
            let depth = entry.relative_path.components().count();
            let stem_ok = entry
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(is_artifact_stem);
            depth >= 2
                && stem_ok
                && !entry
                    .relative_path
                    .components()
                    .any(|c| c.as_os_str() == SOLC_INPUTS_DIR)
        })
        .map(|entry| entry.path)
        .collect())
}

fn is_artifact_stem(stem: &str) -> bool {
    !stem.is_empty() && stem.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_missing_chain_id_is_config_error() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "localhost/Greeter.json", r#"{"address":"0xabc"}"#);

        let err = load_all(tmp.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("localhost"));
    }

    #[test]
    fn test_invalid_chain_id_is_config_error() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "localhost/.chainId", "not-a-number");

        assert!(matches!(load_all(tmp.path()), Err(Error::Config(_))));
    }

    #[test]
    fn test_single_network() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "mainnet/.chainId", "1\n");
        write(tmp.path(), "mainnet/Greeter.json", r#"{"address":"0xabc"}"#);

        let all = load_all(tmp.path()).unwrap();

        assert_eq!(all.len(), 1);
        let networks = &all[&ChainId(1)];
        assert_eq!(networks.len(), 1);
        assert_eq!(networks[0].name, "mainnet");
        assert_eq!(networks[0].chain_id, ChainId(1));
        assert_eq!(
            networks[0].contracts["Greeter"].address.as_deref(),
            Some("0xabc")
        );
    }

    #[test]
    fn test_non_record_files_are_skipped() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "mainnet/.chainId", "1");
        write(tmp.path(), "mainnet/Greeter.json", r#"{"address":"0xabc"}"#);
        write(tmp.path(), "mainnet/Notes.json", r#"["not","a","record"]"#);
        write(tmp.path(), "mainnet/Odd.json", r#"{"address":42}"#);

        let all = load_all(tmp.path()).unwrap();

        let contracts = &all[&ChainId(1)][0].contracts;
        assert_eq!(contracts.keys().collect::<Vec<_>>(), vec!["Greeter"]);
    }

    #[test]
    fn test_missing_root_is_empty() {
        let tmp = TempDir::new().unwrap();
        let all = load_all(&tmp.path().join("deployments")).unwrap();
        assert!(all.is_empty());
    }

    #[test]
    fn test_aliases_share_chain_id() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "localhost/.chainId", "31337");
        write(tmp.path(), "localhost/Greeter.json", r#"{"address":"0x1"}"#);
        write(tmp.path(), "hardhat/.chainId", "31337");
        write(tmp.path(), "hardhat/Token.json", r#"{"address":"0x2"}"#);

        let all = load_all(tmp.path()).unwrap();
        let names: Vec<&str> = all[&ChainId(31337)]
            .iter()
            .map(|n| n.name.as_str())
            .collect();

        assert_eq!(names, vec!["hardhat", "localhost"]);
    }

    #[test]
    fn test_skips_solc_inputs_hidden_and_files_at_root() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "README.md", "not a network");
        write(tmp.path(), ".cache/whatever.json", "{}");
        write(tmp.path(), "goerli/.chainId", "5");
        write(tmp.path(), "goerli/.pendingTransactions", "{}");
        write(tmp.path(), "goerli/solcInputs/abcdef.json", r#"{"language":"Solidity"}"#);
        write(tmp.path(), "goerli/Greeter.json", r#"{"address":"0x5"}"#);

        let all = load_all(tmp.path()).unwrap();
        let contracts = &all[&ChainId(5)][0].contracts;

        assert_eq!(contracts.keys().collect::<Vec<_>>(), vec!["Greeter"]);
    }

    #[test]
    fn test_essential_only_drops_metadata() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "mainnet/.chainId", "1");
        write(
            tmp.path(),
            "mainnet/Greeter.json",
            &json!({
                "address": "0xabc",
                "abi": [],
                "metadata": "{}",
                "receipt": { "status": 1 }
            })
            .to_string(),
        );

        let all = DeploymentLoader::new(tmp.path())
            .essential_only(true)
            .load_all()
            .unwrap();
        let record = &all[&ChainId(1)][0].contracts["Greeter"];

        assert_eq!(record.address.as_deref(), Some("0xabc"));
        assert!(record.metadata.is_none());
        assert!(record.rest.is_empty());
    }

    #[test]
    fn test_external_deployments_merge_without_overwriting() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "deployments/mainnet/.chainId", "1");
        write(
            tmp.path(),
            "deployments/mainnet/Greeter.json",
            r#"{"address":"0xlocal"}"#,
        );
        write(
            tmp.path(),
            "vendor/mainnet/Greeter.json",
            r#"{"address":"0xexternal"}"#,
        );
        write(
            tmp.path(),
            "vendor/mainnet/Registry.json",
            r#"{"abi":[],"networks":{"1":{"address":"0xtruffle","transactionHash":"0xt"}}}"#,
        );

        let all = DeploymentLoader::new(tmp.path().join("deployments"))
            .with_external(
                "mainnet",
                Some(ChainId(1)),
                vec![tmp.path().join("vendor/mainnet")],
            )
            .load_all()
            .unwrap();

        let networks = &all[&ChainId(1)];
        assert_eq!(networks.len(), 1);
        let contracts = &networks[0].contracts;
        assert_eq!(contracts["Greeter"].address.as_deref(), Some("0xlocal"));
        assert_eq!(contracts["Registry"].address.as_deref(), Some("0xtruffle"));
        assert_eq!(
            contracts["Registry"].transaction_hash.as_deref(),
            Some("0xt")
        );
    }

    #[test]
    fn test_external_deployments_new_network() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "vendor/Token.json", r#"{"address":"0x89"}"#);

        let all = DeploymentLoader::new(tmp.path().join("deployments"))
            .with_external("polygon", Some(ChainId(137)), vec![tmp.path().join("vendor")])
            .load_all()
            .unwrap();

        let network = &all[&ChainId(137)][0];
        assert_eq!(network.name, "polygon");
        assert_eq!(network.contracts["Token"].address.as_deref(), Some("0x89"));
    }

    #[test]
    fn test_external_chain_id_mismatch_is_fatal() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "deployments/mainnet/.chainId", "1");
        write(tmp.path(), "vendor/Token.json", r#"{"address":"0x1"}"#);

        let err = DeploymentLoader::new(tmp.path().join("deployments"))
            .with_external("mainnet", Some(ChainId(5)), vec![tmp.path().join("vendor")])
            .load_all()
            .unwrap_err();

        assert!(matches!(err, Error::Consistency(_)));
    }

    #[test]
    fn test_unreadable_external_source_is_skipped() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "deployments/mainnet/.chainId", "1");
        write(tmp.path(), "deployments/mainnet/Greeter.json", r#"{"address":"0x1"}"#);

        let all = DeploymentLoader::new(tmp.path().join("deployments"))
            .with_external("mainnet", Some(ChainId(1)), vec![tmp.path().join("missing")])
            .with_external("sepolia", None, vec![tmp.path().join("deployments/mainnet")])
            .load_all()
            .unwrap();

        assert_eq!(all.len(), 1);
        assert_eq!(all[&ChainId(1)][0].contracts.len(), 1);
    }

    #[test]
    fn test_discover_deployment_artifacts() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "Loose.json", "{}");
        write(tmp.path(), "mainnet/.chainId", "1");
        write(tmp.path(), "mainnet/Greeter.json", "{}");
        write(tmp.path(), "mainnet/Greeter_Proxy.json", "{}");
        write(tmp.path(), "mainnet/Greeter-Impl.json", "{}");
        write(tmp.path(), "mainnet/solcInputs/abc.json", "{}");
        write(tmp.path(), "localhost/.chainId", "31337");
        write(tmp.path(), "localhost/Token.json", "{}");

        let found: Vec<PathBuf> = discover_deployment_artifacts(tmp.path())
            .unwrap()
            .into_iter()
            .map(|p| p.strip_prefix(tmp.path()).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            found,
            vec![
                PathBuf::from("localhost/Token.json"),
                PathBuf::from("mainnet/Greeter.json"),
                PathBuf::from("mainnet/Greeter_Proxy.json"),
            ]
        );
    }
}
