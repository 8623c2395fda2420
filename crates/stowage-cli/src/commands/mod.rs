//! CLI commands for stowage

use clap::Subcommand;
use color_eyre::eyre::Result;

pub mod addresses;
pub mod fingerprint;
pub mod package;

/// All available CLI commands
#[derive(Subcommand)]
pub enum Command {
    /// Export artifacts and deployments into the build directory
    Package(package::PackageCommand),

    /// Show deployed addresses per network
    Addresses(addresses::AddressesCommand),

    /// Print the fingerprint of a compiler input
    Fingerprint(fingerprint::FingerprintCommand),
}

impl Command {
    /// Execute the command
    pub fn run(self) -> Result<()> {
        match self {
            Command::Package(cmd) => cmd.run(),
            Command::Addresses(cmd) => cmd.run(),
            Command::Fingerprint(cmd) => cmd.run(),
        }
    }
}
