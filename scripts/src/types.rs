//! Type definitions used throughout the scripts

use alloy::primitives::{Address, TxHash};

use crate::constants::DEFAULT_INITIALIZER;

/// A contract whose creation transaction has been confirmed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeployedContract {
    /// The address at which the contract was created
    pub address: Address,
    /// The hash of the creation transaction
    pub transaction_hash: TxHash,
}

/// An upgradeable proxy whose construction, initializer call included,
/// has been confirmed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeployedProxy {
    /// The address of the proxy, i.e. the externally visible contract address
    pub address: Address,
    /// The address of the logic contract the proxy delegates to
    pub implementation: Address,
    /// The address of the proxy admin, if it could be read from the proxy
    pub admin: Option<Address>,
    /// The hash of the proxy creation transaction
    pub transaction_hash: TxHash,
}

/// Options controlling how a contract is deployed behind a proxy
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxyOptions {
    /// The name of the initializer invoked during proxy construction
    pub initializer: String,
    /// The initial owner of the proxy admin. Defaults to the deployer
    pub initial_owner: Option<Address>,
}

impl Default for ProxyOptions {
    fn default() -> Self {
        Self {
            initializer: DEFAULT_INITIALIZER.to_string(),
            initial_owner: None,
        }
    }
}

/// The outcome of a full deployment run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeploymentReport {
    /// The account that authorized both deployments
    pub deployer: Address,
    /// The deployed token contract
    pub token: DeployedContract,
    /// The deployed staking proxy
    pub staking: DeployedProxy,
}
