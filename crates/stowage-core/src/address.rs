//! Deployed address aggregation
//!
//! Flattens a [`MultiExport`] into `network alias -> contract -> address`.
//! Aliases that share a chain id stay separate entries.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::filter::Filter;
use crate::types::MultiExport;

/// Deployed addresses keyed by network alias, then contract name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AddressTable(BTreeMap<String, BTreeMap<String, String>>);

impl AddressTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Address of `contract` on `network`
    pub fn get(&self, network: &str, contract: &str) -> Option<&str> {
        self.0.get(network)?.get(contract).map(String::as_str)
    }

    /// Network alias names, sorted
    pub fn networks(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `(contract, address)` pairs on one network, sorted by contract name
    pub fn contracts<'a>(&'a self, network: &str) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.0
            .get(network)
            .into_iter()
            .flatten()
            .map(|(name, address)| (name.as_str(), address.as_str()))
    }

    /// Number of addresses across all networks
    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn insert(&mut self, network: &str, contract: &str, address: &str) {
        self.0
            .entry(network.to_string())
            .or_default()
            .insert(contract.to_string(), address.to_string());
    }

    fn ensure_network(&mut self, network: &str) {
        self.0.entry(network.to_string()).or_default();
    }
}

/// Flatten `deployments` into an address table, keeping contract names that
/// pass `filter`. Records without an address are left out; every network
/// alias gets an entry even if it ends up empty.
pub fn aggregate(deployments: &MultiExport, filter: &Filter) -> AddressTable {
    let mut table = AddressTable::new();
    for network in deployments.values().flatten() {
        table.ensure_network(&network.name);
        for (name, record) in &network.contracts {
            if !filter.matches(name) {
                continue;
            }
            if let Some(address) = &record.address {
                table.insert(&network.name, name, address);
            }
        }
    }
    table
}

/// Every contract name deployed on any network
pub fn deployed_contract_names(deployments: &MultiExport) -> BTreeSet<String> {
    deployments
        .values()
        .flatten()
        .flat_map(|network| network.contracts.keys().cloned())
        .collect()
}

/// True if at least one contract passing `filter` has a recorded address
pub fn has_deployed_address(deployments: &MultiExport, filter: &Filter) -> bool {
    deployments.values().flatten().any(|network| {
        network
            .contracts
            .iter()
            .any(|(name, record)| record.address.is_some() && filter.matches(name))
    })
}
