//! Compiled contract artifact lookup
//!
//! Finds `<Name>.json` under the artifacts directory and reads its ABI so a
//! read can be refused before it reaches the node when the contract does not
//! declare the function.

use metabaker_core::{MetabakerError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// One ABI entry; only functions matter here
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AbiEntry {
    /// `function`, `event`, `constructor`, ...
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Entry name
    #[serde(default)]
    pub name: String,
}

/// ABI of a compiled contract
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContractAbi {
    /// Artifact's contract name
    #[serde(rename = "contractName", default)]
    pub contract_name: String,
    /// ABI entries
    pub abi: Vec<AbiEntry>,
}

impl ContractAbi {
    /// Check the ABI declares a function
    #[must_use]
    pub fn has_function(&self, name: &str) -> bool {
        self.abi.iter().any(|e| e.kind == "function" && e.name == name)
    }

    /// Fail unless the ABI declares a function
    ///
    /// # Errors
    /// - `MetabakerError::InvalidArgument` if the function is missing
    pub fn require_function(&self, name: &str) -> Result<()> {
        if self.has_function(name) {
            Ok(())
        } else {
            Err(MetabakerError::invalid_argument(format!(
                "contract {} does not declare {name}()",
                self.contract_name
            )))
        }
    }

    /// Locate and parse the artifact of `contract`
    ///
    /// # Errors
    /// - `MetabakerError::InvalidArgument` if no artifact matches
    /// - `MetabakerError::Io` / `Json` on unreadable artifacts
    pub fn load(artifacts_dir: &Path, contract: &str) -> Result<Self> {
        let file_name = format!("{contract}.json");
        let path = find_file(artifacts_dir, &file_name)?.ok_or_else(|| {
            MetabakerError::invalid_argument(format!(
                "artifact for contract {contract} not found under {}",
                artifacts_dir.display()
            ))
        })?;
        tracing::debug!("Using artifact {}", path.display());

        let text = std::fs::read_to_string(&path).map_err(|e| MetabakerError::io(&path, e))?;
        let mut abi: Self =
            serde_json::from_str(&text).map_err(|e| MetabakerError::json(&path, e))?;
        if abi.contract_name.is_empty() {
            abi.contract_name = contract.to_string();
        }
        Ok(abi)
    }
}

fn find_file(dir: &Path, file_name: &str) -> Result<Option<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(MetabakerError::io(dir, e)),
    };

    let mut subdirs = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| MetabakerError::io(dir, e))?.path();
        if path.is_dir() {
            subdirs.push(path);
        } else if path.file_name().is_some_and(|n| n == file_name) {
            return Ok(Some(path));
        }
    }

    subdirs.sort();
    for subdir in subdirs {
        if let Some(found) = find_file(&subdir, file_name)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}
