//! Application runtime detection.

use super::{DeploymentDomainError, ParseAppRuntimeError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Manifest file that marks a Node.js application.
pub const NODE_MANIFEST: &str = "package.json";

/// Dependency list that marks a Python application.
pub const PYTHON_MANIFEST: &str = "requirements.txt";

/// Runtime of a backend application, detected from its repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppRuntime {
    /// Node.js application with a `package.json`.
    #[serde(rename = "nodejs")]
    Node,
    /// Python application with a `requirements.txt`.
    #[serde(rename = "python")]
    Python,
}

impl AppRuntime {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Node => "nodejs",
            Self::Python => "python",
        }
    }

    /// Detects the runtime of a checked-out repository.
    ///
    /// Manifests are checked in a fixed priority order: a Node manifest wins
    /// over a Python dependency list when both exist.
    ///
    /// # Errors
    ///
    /// Returns [`DeploymentDomainError::UnsupportedAppType`] when neither
    /// manifest is present.
    pub fn detect(repository_root: &Path) -> Result<Self, DeploymentDomainError> {
        if repository_root.join(NODE_MANIFEST).is_file() {
            return Ok(Self::Node);
        }
        if repository_root.join(PYTHON_MANIFEST).is_file() {
            return Ok(Self::Python);
        }

        let found = if repository_root.join("go.mod").is_file() {
            "go"
        } else if repository_root.join("Gemfile").is_file() {
            "ruby"
        } else {
            "unknown"
        };
        Err(DeploymentDomainError::UnsupportedAppType {
            found: found.to_owned(),
        })
    }
}

impl fmt::Display for AppRuntime {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for AppRuntime {
    type Error = ParseAppRuntimeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "nodejs" | "node" => Ok(Self::Node),
            "python" => Ok(Self::Python),
            _ => Err(ParseAppRuntimeError(value.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    fn repository_with(files: &[&str]) -> TempDir {
        let dir = TempDir::new().expect("temp dir should be created");
        for file in files {
            fs::write(dir.path().join(file), "{}").expect("fixture file should be written");
        }
        dir
    }

    #[rstest]
    #[case(&["package.json"], AppRuntime::Node)]
    #[case(&["requirements.txt"], AppRuntime::Python)]
    #[case(&["package.json", "requirements.txt"], AppRuntime::Node)]
    #[case(&["requirements.txt", "README.md"], AppRuntime::Python)]
    fn detects_runtime_by_manifest(#[case] files: &[&str], #[case] expected: AppRuntime) {
        let repository = repository_with(files);
        assert_eq!(AppRuntime::detect(repository.path()), Ok(expected));
    }

    #[rstest]
    #[case(&[], "unknown")]
    #[case(&["go.mod"], "go")]
    #[case(&["Gemfile"], "ruby")]
    fn rejects_repositories_without_supported_manifest(
        #[case] files: &[&str],
        #[case] found: &str,
    ) {
        let repository = repository_with(files);
        assert_eq!(
            AppRuntime::detect(repository.path()),
            Err(DeploymentDomainError::UnsupportedAppType {
                found: found.to_owned()
            })
        );
    }

    #[test]
    fn manifest_directory_does_not_count() {
        let repository = repository_with(&[]);
        fs::create_dir(repository.path().join(NODE_MANIFEST)).expect("dir should be created");
        assert!(AppRuntime::detect(repository.path()).is_err());
    }

    #[test]
    fn parses_storage_representation() {
        assert_eq!(AppRuntime::try_from("nodejs"), Ok(AppRuntime::Node));
        assert_eq!(AppRuntime::try_from(" Python "), Ok(AppRuntime::Python));
        assert!(AppRuntime::try_from("java").is_err());
    }
}
