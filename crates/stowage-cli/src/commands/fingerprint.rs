//! Fingerprint compiler inputs

use std::path::PathBuf;

use clap::Args;
use color_eyre::eyre::Result;
use serde_json::Value;
use stowage_core::{files, fingerprint, Fingerprint};

/// Print the fingerprint of a compiler input
#[derive(Args)]
pub struct FingerprintCommand {
    /// Build-info files, or bare compiler input documents
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

impl FingerprintCommand {
    pub fn run(self) -> Result<()> {
        for path in &self.files {
            let document: Value = files::read_json(path)?;
            // print one hash per line for scripting
            println!("{}  {}", fingerprint_document(&document), path.display());
        }
        Ok(())
    }
}

/// Hash the `input` of a build-info file, or the whole document when it is
/// a compiler input already
fn fingerprint_document(document: &Value) -> Fingerprint {
    match document.get("input") {
        Some(input) => fingerprint(input),
        None => fingerprint(document),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_info_uses_input() {
        let input = json!({ "language": "Solidity", "sources": {} });
        let build_info = json!({ "input": input.clone(), "output": { "contracts": {} } });

        assert_eq!(fingerprint_document(&build_info), fingerprint(&input));
    }

    #[test]
    fn test_bare_input() {
        let input = json!({ "language": "Solidity", "sources": {} });
        assert_eq!(fingerprint_document(&input), fingerprint(&input));
    }
}
