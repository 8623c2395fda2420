//! Package compiler artifacts and deployments

use std::path::{Path, PathBuf};

use clap::Args;
use color_eyre::eyre::Result;
use console::style;
use stowage_core::{BuildLayout, FileSystemArtifactSource, PackageReport, Pipeline};
use tracing::debug;

use crate::config::ProjectConfig;

/// Export artifacts and deployments into the build directory
#[derive(Args)]
pub struct PackageCommand {
    /// Path to stowage.toml
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Drop bytecode from exported artifacts
    #[arg(long)]
    pub exclude_bytecode: bool,

    /// Do not clear the build directory first
    #[arg(long)]
    pub keep_build: bool,
}

impl PackageCommand {
    pub fn run(self) -> Result<()> {
        let (mut config, base) = ProjectConfig::locate(self.config.as_deref())?;
        if self.exclude_bytecode {
            config.package.exclude_bytecode = true;
        }

        let paths = config.project_paths(&base);
        debug!(?paths, "resolved project paths");
        let layout = BuildLayout::at(config.package.build_dir(&paths));
        if !self.keep_build {
            println!(
                "{} Clearing {}",
                style("->").blue(),
                style(layout.path().display()).dim()
            );
            layout.reset()?;
        } else if layout.exists() {
            println!(
                "{} Keeping existing files in {}",
                style("!").yellow(),
                style(layout.path().display()).dim()
            );
        }

        println!(
            "{} Reading artifacts from {}",
            style("->").blue(),
            style(paths.artifacts.display()).cyan()
        );
        let source = FileSystemArtifactSource::new(&paths.artifacts);
        let loader = config.deployment_loader(&paths)?;
        let report = Pipeline::new(&config.package, &paths, &source)
            .with_loader(loader)
            .run()?;

        print_summary(&report, &paths.root);
        Ok(())
    }
}

fn print_summary(report: &PackageReport, root: &Path) {
    let networks: usize = report.deployments.values().map(Vec::len).sum();
    println!(
        "   Found {} deployment network(s)",
        style(networks).cyan()
    );

    println!(
        "{} Exported {} artifact(s)",
        style("+").green(),
        style(report.exported.len()).cyan()
    );

    if report.options.artifact_from_deployment {
        println!(
            "{} Copied {} deployment artifact(s), skipped {} already exported",
            style("+").green(),
            style(report.reconciled.written.len()).cyan(),
            style(report.reconciled.skipped.len()).cyan()
        );
        for skipped in &report.reconciled.skipped {
            let shown = skipped.strip_prefix(root).unwrap_or(skipped);
            println!("   {} {}", style("*").dim(), shown.display());
        }
    }

    match &report.addresses {
        Some(addresses) => println!(
            "{} Wrote {} address(es) to {}",
            style("+").green(),
            style(addresses.len()).cyan(),
            report.options.layout().address_table().display()
        ),
        None => println!("{} No deployed addresses to write", style("!").yellow()),
    }

    println!();
    println!(
        "{} Package ready in {}",
        style("✓").green(),
        style(report.options.build_dir.display()).cyan()
    );
}
