//! Show deployed addresses

use std::path::PathBuf;

use clap::Args;
use color_eyre::eyre::Result;
use console::style;
use stowage_core::{aggregate, Filter};

use crate::config::ProjectConfig;

/// Show deployed addresses per network
#[derive(Args)]
pub struct AddressesCommand {
    /// Path to stowage.toml
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the address table as JSON
    #[arg(long)]
    pub json: bool,
}

impl AddressesCommand {
    pub fn run(self) -> Result<()> {
        let (config, base) = ProjectConfig::locate(self.config.as_deref())?;
        let paths = config.project_paths(&base);

        let deployments = config
            .deployment_loader(&paths)?
            .essential_only(true)
            .load_all()?;
        let filter = Filter::for_names(
            config.package.includes_from_deployed.as_deref(),
            config.package.excludes_from_deployed.as_deref(),
        )?;
        let table = aggregate(&deployments, &filter);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&table)?);
            return Ok(());
        }

        if table.is_empty() {
            println!("No deployed addresses found.");
            return Ok(());
        }

        println!("{:<15} {:<30} {:<44}", "Network", "Contract", "Address");
        println!("{}", "-".repeat(90));

        let mut total = 0;
        for network in table.networks() {
            for (contract, address) in table.contracts(network) {
                println!("{:<15} {:<30} {:<44}", network, contract, address);
                total += 1;
            }
        }

        println!();
        println!("Total: {} address(es)", style(total).cyan());

        Ok(())
    }
}
