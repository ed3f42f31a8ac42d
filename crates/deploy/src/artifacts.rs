//! Read access to Hardhat compilation artifacts.

use std::path::{Path, PathBuf};

use alloy_core::primitives::Bytes;
use anyhow::{Context, Result};
use serde::Deserialize;

/// Directory Hardhat writes build info files to, skipped when searching for artifacts.
const BUILD_INFO_DIR: &str = "build-info";

/// A compiled contract artifact (`<Name>.sol/<Name>.json`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub contract_name: String,
    pub source_name: String,
    /// Creation bytecode, without constructor arguments.
    pub bytecode: Bytes,
}

impl Artifact {
    /// `<source path>:<contract name>`, as expected by verification services.
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }
}

/// The `.dbg.json` file next to an artifact, pointing at its build info.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugFile {
    build_info: PathBuf,
}

/// Compiler input and version for a compilation job.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    /// Full compiler version, e.g. `0.8.24+commit.e11b9ed9`.
    pub solc_long_version: String,
    /// Standard JSON input given to solc.
    pub input: serde_json::Value,
}

/// Hardhat artifacts directory.
#[derive(Debug, Clone)]
pub struct HardhatArtifacts {
    root: PathBuf,
}

impl HardhatArtifacts {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load the artifact of a contract by name.
    pub fn artifact(&self, contract: &str) -> Result<Artifact> {
        let path = self.artifact_path(contract)?;
        read_json(&path).with_context(|| format!("Failed to load artifact for {}", contract))
    }

    /// Load the build info a contract was compiled with.
    pub fn build_info(&self, contract: &str) -> Result<BuildInfo> {
        let artifact_path = self.artifact_path(contract)?;
        let dbg_path = artifact_path.with_extension("dbg.json");
        let dbg: DebugFile = read_json(&dbg_path)?;

        // The build info path is relative to the artifact's directory.
        let build_info_path = artifact_path
            .parent()
            .context("Artifact path must have a parent directory")?
            .join(dbg.build_info);

        read_json(&build_info_path)
            .with_context(|| format!("Failed to load build info for {}", contract))
    }

    /// Find `<Name>.sol/<Name>.json` anywhere under the artifacts directory.
    fn artifact_path(&self, contract: &str) -> Result<PathBuf> {
        let file_name = format!("{}.json", contract);
        let mut matches = Vec::new();
        find_artifacts(&self.root, &file_name, &mut matches).with_context(|| {
            format!("Failed to search artifacts in {}", self.root.display())
        })?;

        match matches.len() {
            0 => anyhow::bail!(
                "Artifact for {} not found in {}. Compile the contracts first",
                contract,
                self.root.display()
            ),
            1 => Ok(matches.remove(0)),
            _ => anyhow::bail!(
                "Multiple artifacts named {} found, candidates: {}",
                contract,
                matches
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

fn find_artifacts(dir: &Path, file_name: &str, matches: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if path.is_dir() {
            if path.file_name().is_some_and(|name| name == BUILD_INFO_DIR) {
                continue;
            }
            find_artifacts(&path, file_name, matches)?;
            continue;
        }

        let in_source_dir = path
            .parent()
            .and_then(|parent| parent.extension())
            .is_some_and(|ext| ext == "sol");

        if in_source_dir && path.file_name().is_some_and(|name| name == file_name) {
            matches.push(path);
        }
    }

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new("artifacts").unwrap();
        let root = dir.path();

        write(
            &root.join("contracts/AstarToken.sol/AstarToken.json"),
            r#"{
                "contractName": "AstarToken",
                "sourceName": "contracts/AstarToken.sol",
                "abi": [],
                "bytecode": "0x6080604052"
            }"#,
        );
        write(
            &root.join("contracts/AstarToken.sol/AstarToken.dbg.json"),
            r#"{ "_format": "hh-sol-dbg-1", "buildInfo": "../../build-info/abc123.json" }"#,
        );
        write(
            &root.join("build-info/abc123.json"),
            r#"{
                "solcLongVersion": "0.8.24+commit.e11b9ed9",
                "input": { "language": "Solidity", "sources": {} }
            }"#,
        );

        dir
    }

    #[test]
    fn test_load_artifact() {
        let dir = fixture();
        let artifacts = HardhatArtifacts::new(dir.path());

        let artifact = artifacts.artifact("AstarToken").unwrap();
        assert_eq!(artifact.contract_name, "AstarToken");
        assert_eq!(artifact.bytecode.as_ref(), &[0x60, 0x80, 0x60, 0x40, 0x52]);
        assert_eq!(
            artifact.fully_qualified_name(),
            "contracts/AstarToken.sol:AstarToken"
        );
    }

    #[test]
    fn test_load_build_info() {
        let dir = fixture();
        let artifacts = HardhatArtifacts::new(dir.path());

        let build_info = artifacts.build_info("AstarToken").unwrap();
        assert_eq!(build_info.solc_long_version, "0.8.24+commit.e11b9ed9");
        assert_eq!(build_info.input["language"], "Solidity");
    }

    #[test]
    fn test_missing_artifact() {
        let dir = fixture();
        let artifacts = HardhatArtifacts::new(dir.path());

        let err = artifacts.artifact("ShibuyaToken").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_ambiguous_artifact() {
        let dir = fixture();
        write(
            &dir.path().join("contracts/legacy/AstarToken.sol/AstarToken.json"),
            r#"{ "contractName": "AstarToken", "sourceName": "x", "bytecode": "0x" }"#,
        );

        let err = HardhatArtifacts::new(dir.path())
            .artifact("AstarToken")
            .unwrap_err();
        assert!(err.to_string().contains("Multiple artifacts"));
    }
}
