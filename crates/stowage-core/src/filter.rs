//! Include/exclude pattern matching
//!
//! Two flavours share one matcher:
//!
//! - [`Filter::for_paths`] expands every user pattern `X` to `**/X*`, so a bare
//!   contract name prefix selects every artifact path whose file name starts
//!   with `X`, wherever it sits in the tree.
//! - [`Filter::for_names`] uses the patterns verbatim against plain contract
//!   names (default include `*`).
//!
//! An unset include list matches everything and an unset exclude list matches
//! nothing. An explicitly empty include list matches nothing.

use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::error::Result;

/// Compiled include/exclude matcher
#[derive(Debug, Clone, Default)]
pub struct Filter {
    includes: Option<GlobSet>,
    excludes: Option<GlobSet>,
}

impl Filter {
    /// A filter that keeps everything
    pub fn all() -> Self {
        Self::default()
    }

    /// Build a path filter, wrapping each pattern as `**/<pattern>*`
    pub fn for_paths(includes: Option<&[String]>, excludes: Option<&[String]>) -> Result<Self> {
        let expand = |p: &String| format!("**/{}*", p);
        Ok(Self {
            includes: includes
                .map(|patterns| build_set(patterns.iter().map(expand)))
                .transpose()?,
            excludes: excludes
                .map(|patterns| build_set(patterns.iter().map(expand)))
                .transpose()?,
        })
    }

    /// Build a contract-name filter from verbatim glob patterns
    pub fn for_names(includes: Option<&[String]>, excludes: Option<&[String]>) -> Result<Self> {
        Ok(Self {
            includes: includes
                .map(|patterns| build_set(patterns.iter().cloned()))
                .transpose()?,
            excludes: excludes
                .map(|patterns| build_set(patterns.iter().cloned()))
                .transpose()?,
        })
    }

    /// Check a single candidate against the include and exclude sets
    pub fn matches(&self, candidate: &str) -> bool {
        let included = self
            .includes
            .as_ref()
            .map_or(true, |set| set.is_match(candidate));
        let excluded = self
            .excludes
            .as_ref()
            .is_some_and(|set| set.is_match(candidate));
        included && !excluded
    }

    /// Check a path, normalising platform separators to `/`
    pub fn matches_path(&self, path: &Path) -> bool {
        self.matches(&normalize_separators(path))
    }

    /// Keep the paths that pass the filter, preserving their order
    pub fn apply(&self, paths: &[PathBuf]) -> Vec<PathBuf> {
        paths
            .iter()
            .filter(|p| self.matches_path(p))
            .cloned()
            .collect()
    }
}

/// Filter `paths` by contract-name prefix patterns
pub fn filter_paths(
    paths: &[PathBuf],
    includes: Option<&[String]>,
    excludes: Option<&[String]>,
) -> Result<Vec<PathBuf>> {
    Ok(Filter::for_paths(includes, excludes)?.apply(paths))
}

fn build_set(patterns: impl Iterator<Item = String>) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        // `*` must stay within one path segment, like shell globs
        let glob = GlobBuilder::new(&pattern).literal_separator(true).build()?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

fn normalize_separators(path: &Path) -> String {
    let s = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        s.into_owned()
    } else {
        s.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(list: &[&str]) -> Vec<PathBuf> {
        list.iter().map(PathBuf::from).collect()
    }

    fn strings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults_keep_everything_in_order() {
        let input = paths(&[
            "artifacts/contracts/Zeta.sol/Zeta.json",
            "artifacts/contracts/Alpha.sol/Alpha.json",
            "artifacts/@openzeppelin/contracts/token/ERC20/ERC20.sol/ERC20.json",
        ]);

        let output = filter_paths(&input, None, None).unwrap();

        assert_eq!(output, input);
    }

    #[test]
    fn test_empty_input() {
        let output = filter_paths(&[], Some(strings(&["Greeter"]).as_slice()), None).unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn test_include_is_name_prefix_match() {
        let input = paths(&[
            "artifacts/contracts/Greeter.sol/Greeter.json",
            "artifacts/contracts/GreeterV2.sol/GreeterV2.json",
            "artifacts/contracts/Token.sol/Token.json",
        ]);

        let output = filter_paths(&input, Some(strings(&["Greeter"]).as_slice()), None).unwrap();

        assert_eq!(
            output,
            paths(&[
                "artifacts/contracts/Greeter.sol/Greeter.json",
                "artifacts/contracts/GreeterV2.sol/GreeterV2.json",
            ])
        );
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let input = paths(&[
            "artifacts/contracts/Greeter.sol/Greeter.json",
            "artifacts/contracts/GreeterV2.sol/GreeterV2.json",
        ]);

        let output = filter_paths(
            &input,
            Some(strings(&["Greeter"]).as_slice()),
            Some(strings(&["GreeterV2"]).as_slice()),
        )
        .unwrap();

        assert_eq!(
            output,
            paths(&["artifacts/contracts/Greeter.sol/Greeter.json"])
        );
    }

    #[test]
    fn test_pattern_applies_to_final_segment() {
        let input = paths(&[
            "artifacts/@openzeppelin/contracts/access/Ownable.sol/Ownable.json",
            "artifacts/contracts/Greeter.sol/Greeter.json",
        ]);

        let output = filter_paths(&input, None, Some(strings(&["Ownable"]).as_slice())).unwrap();
        assert_eq!(
            output,
            paths(&["artifacts/contracts/Greeter.sol/Greeter.json"])
        );

        // a directory name alone does not select the files below it
        let output = filter_paths(&input, Some(strings(&["@openzeppelin"]).as_slice()), None).unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn test_bare_file_name_matches() {
        let input = paths(&["Greeter.json"]);
        let output = filter_paths(&input, Some(strings(&["Greet"]).as_slice()), None).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_explicit_empty_includes_match_nothing() {
        let input = paths(&["artifacts/contracts/Greeter.sol/Greeter.json"]);
        let output = filter_paths(&input, Some(&[][..]), None).unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn test_name_filter_uses_patterns_verbatim() {
        let filter = Filter::for_names(Some(strings(&["Greet*"]).as_slice()), Some(strings(&["*V2"]).as_slice())).unwrap();

        assert!(filter.matches("Greeter"));
        assert!(!filter.matches("GreeterV2"));
        assert!(!filter.matches("Token"));
        // verbatim: no implicit prefix expansion
        let exact = Filter::for_names(Some(strings(&["Greet"]).as_slice()), None).unwrap();
        assert!(!exact.matches("Greeter"));
    }

    #[test]
    fn test_name_filter_default_matches_all() {
        let filter = Filter::for_names(None, None).unwrap();
        assert!(filter.matches("Anything"));
    }

    #[test]
    fn test_invalid_pattern() {
        let result = Filter::for_names(Some(strings(&["[unclosed"]).as_slice()), None);
        assert!(result.is_err());
    }
}
