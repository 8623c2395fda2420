use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{eyre, Result, WrapErr};
use serde::Deserialize;
use stowage_core::{ChainId, DeploymentLoader, PackageConfig, ProjectPaths};

pub const PROJECT_CONFIG: &str = "stowage.toml";

/// Project configuration file structure (stowage.toml)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub package: PackageConfig,
    /// Extra deployment folders per network
    #[serde(default)]
    pub external_deployments: BTreeMap<String, ExternalConfig>,
}

/// Project locations, relative to the directory holding stowage.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    pub root: Option<PathBuf>,
    pub artifacts: Option<PathBuf>,
    pub deployments: Option<PathBuf>,
}

/// Chain id can be a number or a `${VAR}` reference
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ChainIdValue {
    Number(u64),
    Text(String),
}

impl ChainIdValue {
    pub fn resolve(&self) -> Result<ChainId> {
        match self {
            ChainIdValue::Number(id) => Ok(ChainId(*id)),
            ChainIdValue::Text(text) => {
                let value = resolve_env_var(text)?;
                value
                    .parse()
                    .map_err(|_| eyre!("Invalid chain id '{}'", value))
            }
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExternalConfig {
    pub chain_id: Option<ChainIdValue>,
    #[serde(default)]
    pub paths: Vec<PathBuf>,
}

impl ProjectConfig {
    /// Load stowage.toml from the current directory, falling back to
    /// defaults when there is none
    pub fn load() -> Result<(Self, PathBuf)> {
        let path = Path::new(PROJECT_CONFIG);
        if path.exists() {
            let config = Self::load_from(path)?;
            Ok((config, PathBuf::from(".")))
        } else {
            Ok((Self::default(), PathBuf::from(".")))
        }
    }

    /// Load configuration from a specific path. Relative paths inside the
    /// file are taken from the file's directory.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Could not read {}", path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .wrap_err_with(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Load from `--config` when given, otherwise from the current directory.
    /// Returns the configuration and the directory it is relative to.
    pub fn locate(explicit: Option<&Path>) -> Result<(Self, PathBuf)> {
        match explicit {
            Some(path) => {
                let config = Self::load_from(path)?;
                let base = path
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                Ok((config, base))
            }
            None => Self::load(),
        }
    }

    pub fn project_paths(&self, base: &Path) -> ProjectPaths {
        let root = match &self.paths.root {
            Some(root) => base.join(root),
            None => base.to_path_buf(),
        };
        let mut paths = ProjectPaths::new(&root);
        if let Some(artifacts) = &self.paths.artifacts {
            paths.artifacts = root.join(artifacts);
        }
        if let Some(deployments) = &self.paths.deployments {
            paths.deployments = root.join(deployments);
        }
        paths
    }

    /// Deployment loader for the project, with external folders attached
    pub fn deployment_loader(&self, paths: &ProjectPaths) -> Result<DeploymentLoader> {
        let mut loader = DeploymentLoader::new(&paths.deployments);
        for (network, external) in &self.external_deployments {
            let chain_id = external
                .chain_id
                .as_ref()
                .map(ChainIdValue::resolve)
                .transpose()?;
            let folders = external
                .paths
                .iter()
                .map(|folder| paths.root.join(folder))
                .collect();
            loader = loader.with_external(network.clone(), chain_id, folders);
        }
        Ok(loader)
    }
}

/// Resolve environment variable references in a string
/// Supports ${VAR_NAME} syntax
fn resolve_env_var(value: &str) -> Result<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).map_err(|_| eyre!("Environment variable '{}' not set", var_name))
    } else {
        Ok(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_core::OutputTarget;

    #[test]
    fn test_parse_project_config() {
        let toml_content = r#"
[paths]
artifacts = "out/artifacts"

[package]
build_dir = "dist"
output_target = "address"
includes = ["Token", "Vault"]
excludes_from_deployed = ["Mock"]
exclude_bytecode = true

[external_deployments.mainnet]
chain_id = 1
paths = ["vendor/mainnet"]
"#;

        let config: ProjectConfig = toml::from_str(toml_content).unwrap();

        assert_eq!(config.package.build_dir, Some(PathBuf::from("dist")));
        assert_eq!(config.package.output_target, OutputTarget::Address);
        assert_eq!(
            config.package.includes,
            Some(vec!["Token".to_string(), "Vault".to_string()])
        );
        assert!(config.package.exclude_bytecode);
        assert_eq!(config.package.include_deployed, None);

        let mainnet = config.external_deployments.get("mainnet").unwrap();
        assert_eq!(mainnet.chain_id.as_ref().unwrap().resolve().unwrap(), ChainId(1));
        assert_eq!(mainnet.paths, vec![PathBuf::from("vendor/mainnet")]);
    }

    #[test]
    fn test_parse_empty_config() {
        let config: ProjectConfig = toml::from_str("").unwrap();

        assert_eq!(config.package, PackageConfig::default());
        assert!(config.external_deployments.is_empty());
    }

    #[test]
    fn test_unknown_package_key_rejected() {
        let toml_content = r#"
[package]
include = ["Token"]
"#;

        assert!(toml::from_str::<ProjectConfig>(toml_content).is_err());
    }

    #[test]
    fn test_project_paths() {
        let toml_content = r#"
[paths]
root = "contracts"
deployments = "deploy-out"
"#;

        let config: ProjectConfig = toml::from_str(toml_content).unwrap();
        let paths = config.project_paths(Path::new("/work"));

        assert_eq!(paths.root, PathBuf::from("/work/contracts"));
        assert_eq!(paths.artifacts, PathBuf::from("/work/contracts/artifacts"));
        assert_eq!(paths.deployments, PathBuf::from("/work/contracts/deploy-out"));
    }

    #[test]
    fn test_chain_id_from_env() {
        std::env::set_var("STOWAGE_TEST_CHAIN_ID", "10");

        let value = ChainIdValue::Text("${STOWAGE_TEST_CHAIN_ID}".to_string());
        assert_eq!(value.resolve().unwrap(), ChainId(10));

        std::env::remove_var("STOWAGE_TEST_CHAIN_ID");
    }

    #[test]
    fn test_chain_id_invalid_text() {
        let value = ChainIdValue::Text("mainnet".to_string());
        assert!(value.resolve().is_err());
    }

    #[test]
    fn test_deployment_loader_resolves_externals() {
        let toml_content = r#"
[external_deployments.optimism]
chain_id = "${NONEXISTENT_CHAIN_VAR_99999}"
paths = ["vendor/optimism"]
"#;

        let config: ProjectConfig = toml::from_str(toml_content).unwrap();
        let paths = config.project_paths(Path::new("/work"));

        assert!(config.deployment_loader(&paths).is_err());
    }

    #[test]
    fn test_locate_explicit_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join(PROJECT_CONFIG);
        std::fs::write(&path, "[package]\nexclude_bytecode = true\n").unwrap();

        let (config, base) = ProjectConfig::locate(Some(path.as_path())).unwrap();

        assert!(config.package.exclude_bytecode);
        assert_eq!(base, tmp.path());
    }

    #[test]
    fn test_locate_missing_file() {
        let result = ProjectConfig::locate(Some(Path::new("/nonexistent/stowage.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_env_var() {
        std::env::set_var("TEST_VAR_123", "resolved_value");

        let result = resolve_env_var("${TEST_VAR_123}").unwrap();
        assert_eq!(result, "resolved_value");

        std::env::remove_var("TEST_VAR_123");
    }

    #[test]
    fn test_resolve_env_var_literal() {
        let result = resolve_env_var("31337").unwrap();
        assert_eq!(result, "31337");
    }
}
