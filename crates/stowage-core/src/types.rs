use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

// =============================================================================
// ID Newtypes
// =============================================================================

/// Chain ID wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ChainId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<ChainId> for u64 {
    fn from(value: ChainId) -> Self {
        value.0
    }
}

impl FromStr for ChainId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// `sourceName:contractName`, unique within one compiler build
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FullyQualifiedName {
    pub source_name: String,
    pub contract_name: String,
}

impl FullyQualifiedName {
    pub fn new(source_name: impl Into<String>, contract_name: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            contract_name: contract_name.into(),
        }
    }
}

impl fmt::Display for FullyQualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source_name, self.contract_name)
    }
}

impl Serialize for FullyQualifiedName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Hex-encoded compiler input fingerprint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Fingerprint Map
// =============================================================================

/// Fingerprints of every exported artifact, keyed by fully qualified name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FingerprintMap(BTreeMap<FullyQualifiedName, Fingerprint>);

impl FingerprintMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: FullyQualifiedName, fingerprint: Fingerprint) {
        self.0.insert(name, fingerprint);
    }

    pub fn get(&self, name: &FullyQualifiedName) -> Option<&Fingerprint> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FullyQualifiedName, &Fingerprint)> {
        self.0.iter()
    }

    /// True iff `name` was exported and its fingerprint equals `recorded`.
    /// Name equality alone is never enough.
    pub fn is_duplicate(&self, name: &FullyQualifiedName, recorded: Option<&str>) -> bool {
        match (self.0.get(name), recorded) {
            (Some(exported), Some(recorded)) => exported.as_str() == recorded,
            _ => false,
        }
    }
}

impl FromIterator<(FullyQualifiedName, Fingerprint)> for FingerprintMap {
    fn from_iter<I: IntoIterator<Item = (FullyQualifiedName, Fingerprint)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// =============================================================================
// Artifacts
// =============================================================================

/// A compiled contract artifact as written by the build tool.
///
/// Fields the exporter does not touch are kept in `rest` and written back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRecord {
    pub contract_name: String,
    pub source_name: String,
    pub abi: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytecode: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployed_bytecode: Option<Value>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl ArtifactRecord {
    pub fn fully_qualified_name(&self) -> FullyQualifiedName {
        FullyQualifiedName::new(&self.source_name, &self.contract_name)
    }

    /// Drop the creation and runtime bytecode
    pub fn strip_bytecode(&mut self) {
        self.bytecode = None;
        self.deployed_bytecode = None;
    }
}

/// An artifact extended with its compiler documentation and input fingerprint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedArtifact {
    #[serde(flatten)]
    pub artifact: ArtifactRecord,
    pub solc_input_hash: Fingerprint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userdoc: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub devdoc: Option<Value>,
}

/// The `<Name>.dbg.json` companion of an artifact
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    /// Path to the build-info document, relative to the debug file
    pub build_info: String,
}

/// A compiler input/output record shared by every contract of one compilation
#[derive(Debug, Clone, Deserialize)]
pub struct BuildInfo {
    /// Raw compiler input (sources + settings)
    pub input: Value,
    pub output: BuildOutput,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildOutput {
    /// source name -> contract name -> compiler output
    #[serde(default)]
    pub contracts: BTreeMap<String, BTreeMap<String, ContractOutput>>,
}

/// The slice of per-contract compiler output that gets packaged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractOutput {
    #[serde(default)]
    pub userdoc: Option<Value>,
    #[serde(default)]
    pub devdoc: Option<Value>,
}

impl BuildInfo {
    /// Look up the compiler output of one contract
    pub fn contract(&self, source_name: &str, contract_name: &str) -> Option<&ContractOutput> {
        self.output.contracts.get(source_name)?.get(contract_name)
    }
}

// =============================================================================
// Deployments
// =============================================================================

/// One deployed contract on one network
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abi: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_data: Option<Value>,
    /// Raw compiler metadata, usually a JSON document embedded as a string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solc_input_hash: Option<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl DeploymentRecord {
    /// Keep only what address lookups need: address, ABI and linked data
    pub fn into_essential(self) -> Self {
        Self {
            address: self.address,
            abi: self.abi,
            linked_data: self.linked_data,
            ..Self::default()
        }
    }

    /// Fill `address` and `transactionHash` from a Truffle-style
    /// `networks[<chainId>]` entry when no address is recorded
    pub fn backfill_from_networks(&mut self, chain_id: ChainId) {
        if self.address.is_some() {
            return;
        }
        let Some(entry) = self
            .rest
            .get("networks")
            .and_then(|networks| networks.get(chain_id.to_string()))
        else {
            return;
        };
        self.address = entry
            .get("address")
            .and_then(Value::as_str)
            .map(str::to_string);
        self.transaction_hash = entry
            .get("transactionHash")
            .and_then(Value::as_str)
            .map(str::to_string);
    }

    /// Derive the fully qualified name from `metadata.compilationTarget`.
    ///
    /// Returns `Ok(None)` when metadata is missing, unparsable or has no
    /// target. A target with more than one entry is a consistency error.
    pub fn fully_qualified_name(&self) -> Result<Option<FullyQualifiedName>> {
        compilation_target(self.metadata.as_ref())
    }
}

/// Read the compilation target from a deployment's `metadata` field, which is
/// either a JSON document embedded as a string or an object.
///
/// Anything that does not name exactly one target yields `Ok(None)`, except a
/// target with several entries, which is a consistency error.
pub fn compilation_target(metadata: Option<&Value>) -> Result<Option<FullyQualifiedName>> {
    let metadata = match metadata {
        Some(Value::String(raw)) => match serde_json::from_str::<Value>(raw) {
            Ok(parsed) => parsed,
            Err(_) => return Ok(None),
        },
        Some(value @ Value::Object(_)) => value.clone(),
        _ => return Ok(None),
    };

    let Some(target) = metadata
        .get("settings")
        .and_then(|s| s.get("compilationTarget"))
        .or_else(|| metadata.get("compilationTarget"))
        .and_then(Value::as_object)
    else {
        return Ok(None);
    };

    let mut entries = target.iter();
    match (entries.next(), entries.next()) {
        (None, _) => Ok(None),
        (Some((source, contract)), None) => Ok(contract
            .as_str()
            .map(|contract| FullyQualifiedName::new(source, contract))),
        (Some(_), Some(_)) => Err(Error::Consistency(format!(
            "compilationTarget has {} entries, expected exactly one",
            target.len()
        ))),
    }
}

/// One network alias and the contracts deployed on it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDeployments {
    pub name: String,
    pub chain_id: ChainId,
    pub contracts: BTreeMap<String, DeploymentRecord>,
}

/// Every known network, grouped by chain id. Several aliases may share one
/// chain id; their order follows discovery order.
pub type MultiExport = BTreeMap<ChainId, Vec<NetworkDeployments>>;
