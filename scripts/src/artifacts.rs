//! Resolution of compiled contract artifacts.
//!
//! Artifacts are the JSON files a Hardhat compilation writes under its artifacts root, one per
//! contract, at `<root>/<source name>/<contract name>.json`.

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy::{
    dyn_abi::{DynSolValue, JsonAbiExt},
    json_abi::JsonAbi,
    primitives::Bytes,
};
use serde::Deserialize;
use tracing::debug;

use crate::{
    constants::{
        ARTIFACT_EXTENSION, BUILD_INFO_DIR, BUNDLED_PROXY_ARTIFACT, PROXY_CONTRACT_NAME,
        UNLINKED_LIBRARY_MARKER,
    },
    errors::ScriptError,
};

/// A compiled contract
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// The name of the contract
    pub contract_name: String,
    /// The path of the source file, relative to the project root
    pub source_name: String,
    /// The contract ABI
    pub abi: JsonAbi,
    /// The creation bytecode in hex, possibly containing unlinked library placeholders
    pub bytecode: String,
}

impl Artifact {
    /// The fully qualified name of the contract, e.g. `contracts/Rfa.sol:Rfa`
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }

    /// Parse the creation bytecode of the contract
    pub fn creation_bytecode(&self) -> Result<Bytes, ScriptError> {
        if self.bytecode.contains(UNLINKED_LIBRARY_MARKER) {
            return Err(ScriptError::ArtifactParsing(format!(
                "{} has unlinked library references",
                self.fully_qualified_name()
            )));
        }

        let bytecode = Bytes::from_str(&self.bytecode)
            .map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;

        if bytecode.is_empty() {
            return Err(ScriptError::ArtifactParsing(format!(
                "{} has no bytecode, it may be abstract or an interface",
                self.fully_qualified_name()
            )));
        }

        Ok(bytecode)
    }

    /// The creation bytecode followed by the ABI encoded constructor arguments
    pub fn creation_code(&self, args: &[DynSolValue]) -> Result<Bytes, ScriptError> {
        let mut code = self.creation_bytecode()?.to_vec();

        match self.abi.constructor() {
            Some(constructor) => {
                let encoded_args = constructor
                    .abi_encode_input(args)
                    .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?;
                code.extend_from_slice(&encoded_args);
            }
            None if args.is_empty() => {}
            None => {
                return Err(ScriptError::CalldataConstruction(format!(
                    "{} has no constructor, but {} arguments were given",
                    self.contract_name,
                    args.len()
                )))
            }
        }

        Ok(code.into())
    }
}

/// The artifacts produced by a compilation
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    /// The artifacts root
    root: PathBuf,
}

impl ArtifactStore {
    /// Create a store reading artifacts from under `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Load the artifact of a contract.
    ///
    /// `name` is either a bare contract name, which must be unique across all sources, or a
    /// fully qualified name of the form `<source name>:<contract name>`.
    pub fn artifact(&self, name: &str) -> Result<Artifact, ScriptError> {
        self.optional_artifact(name)?.ok_or_else(|| {
            ScriptError::ArtifactParsing(format!(
                "artifact for contract {name} not found under {}",
                self.root.display()
            ))
        })
    }

    /// Load the artifact of a contract, if the compilation produced one
    pub fn optional_artifact(&self, name: &str) -> Result<Option<Artifact>, ScriptError> {
        let path = match name.split_once(':') {
            Some((source_name, contract_name)) => {
                let path = self
                    .root
                    .join(source_name)
                    .join(format!("{contract_name}.{ARTIFACT_EXTENSION}"));
                path.is_file().then_some(path)
            }
            None => self.find_artifact(name)?,
        };

        path.as_deref().map(read_artifact).transpose()
    }

    /// Find the artifact file of a contract given its bare name
    fn find_artifact(&self, contract_name: &str) -> Result<Option<PathBuf>, ScriptError> {
        if !self.root.is_dir() {
            return Err(ScriptError::ArtifactParsing(format!(
                "artifacts directory {} not found, have the contracts been compiled?",
                self.root.display()
            )));
        }

        let file_name = format!("{contract_name}.{ARTIFACT_EXTENSION}");
        let mut matches = Vec::new();
        collect_artifact_paths(&self.root, &file_name, &mut matches)?;
        matches.sort();

        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.pop()),
            _ => {
                let candidates = matches
                    .iter()
                    .map(|path| self.qualified_name_of(path, contract_name))
                    .collect::<Vec<_>>()
                    .join(", ");

                Err(ScriptError::ArtifactParsing(format!(
                    "contract name {contract_name} is ambiguous, use one of: {candidates}"
                )))
            }
        }
    }

    /// Derive the fully qualified name of a contract from the location of its artifact
    fn qualified_name_of(&self, path: &Path, contract_name: &str) -> String {
        let source_name = path
            .parent()
            .and_then(|dir| dir.strip_prefix(&self.root).ok())
            .unwrap_or(path);

        format!("{}:{contract_name}", source_name.display())
    }
}

/// Loads the code of the proxy that contracts are deployed behind.
///
/// A proxy compiled by the project itself takes precedence over the one bundled with the
/// Hardhat upgrades plugin.
#[derive(Clone, Debug)]
pub struct ProxyArtifactSource {
    /// The project's own compilation artifacts
    store: ArtifactStore,
    /// The project's installed packages
    node_modules: PathBuf,
}

impl ProxyArtifactSource {
    /// Constructor
    pub fn new(store: ArtifactStore, node_modules: impl Into<PathBuf>) -> Self {
        Self {
            store,
            node_modules: node_modules.into(),
        }
    }

    /// Load the proxy artifact
    pub fn load(&self) -> Result<Artifact, ScriptError> {
        if let Some(artifact) = self.store.optional_artifact(PROXY_CONTRACT_NAME)? {
            debug!("using proxy compiled at {}", artifact.fully_qualified_name());
            return Ok(artifact);
        }

        let bundled = self.node_modules.join(BUNDLED_PROXY_ARTIFACT);
        if !bundled.is_file() {
            return Err(ScriptError::ArtifactParsing(format!(
                "{PROXY_CONTRACT_NAME} found neither under {} nor in {}, \
                 is @openzeppelin/hardhat-upgrades installed?",
                self.store.root.display(),
                self.node_modules.display()
            )));
        }

        debug!("using proxy bundled at {}", bundled.display());
        read_artifact(&bundled)
    }
}

/// Read and parse an artifact file
fn read_artifact(path: &Path) -> Result<Artifact, ScriptError> {
    let contents = fs::read_to_string(path).map_err(|e| {
        ScriptError::ArtifactParsing(format!("could not read {}: {e}", path.display()))
    })?;

    serde_json::from_str(&contents).map_err(|e| {
        ScriptError::ArtifactParsing(format!("could not parse {}: {e}", path.display()))
    })
}

/// Recursively collect the paths of all files named `file_name` under `dir`,
/// skipping the compiler's build info
fn collect_artifact_paths(
    dir: &Path,
    file_name: &str,
    matches: &mut Vec<PathBuf>,
) -> Result<(), ScriptError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        ScriptError::ArtifactParsing(format!("could not read {}: {e}", dir.display()))
    })?;

    for entry in entries {
        let path = entry
            .map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?
            .path();

        if path.is_dir() {
            if path.file_name().is_some_and(|name| name == BUILD_INFO_DIR) {
                continue;
            }
            collect_artifact_paths(&path, file_name, matches)?;
        } else if path.file_name().is_some_and(|name| name == file_name) {
            matches.push(path);
        }
    }

    Ok(())
}
