//! Definitions of errors that can occur during the execution of the deploy scripts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Errors that can occur during the execution of the deploy scripts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// No account is configured for the target network
    NoSignerAvailable,
    /// Error submitting or confirming a contract deployment
    DeploymentFailed(String),
    /// Error encoding or executing the initializer of a proxied contract
    InitializationFailed(String),
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// Error locating or parsing a compilation artifact
    ArtifactParsing(String),
    /// Error constructing calldata for a contract method
    CalldataConstruction(String),
    /// Error reading state from a deployed contract
    ContractInteraction(String),
    /// Error reading the deployments file
    ReadDeployments(String),
    /// Error writing the deployments file
    WriteDeployments(String),
    /// Error writing to the console
    Output(String),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::NoSignerAvailable => {
                write!(f, "no signer available for the target network")
            }
            ScriptError::DeploymentFailed(s) => write!(f, "error deploying contract: {}", s),
            ScriptError::InitializationFailed(s) => {
                write!(f, "error initializing proxied contract: {}", s)
            }
            ScriptError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            ScriptError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            ScriptError::CalldataConstruction(s) => write!(f, "error constructing calldata: {}", s),
            ScriptError::ContractInteraction(s) => {
                write!(f, "error interacting with contract: {}", s)
            }
            ScriptError::ReadDeployments(s) => write!(f, "error reading deployments: {}", s),
            ScriptError::WriteDeployments(s) => write!(f, "error writing deployments: {}", s),
            ScriptError::Output(s) => write!(f, "error writing output: {}", s),
        }
    }
}

impl Error for ScriptError {}
