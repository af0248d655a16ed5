//! The collaborators a deployment run is composed of.
//!
//! Each of these is injected into the deploy command, so that the same command runs
//! against a live network or against in-memory doubles.

use alloy::{dyn_abi::DynSolValue, primitives::Address};
use async_trait::async_trait;

use crate::{
    errors::ScriptError,
    types::{DeployedContract, DeployedProxy, ProxyOptions},
};

/// A source of accounts able to authorize transactions on the target network
#[async_trait]
pub trait SignerProvider: Send + Sync {
    /// Returns the available accounts, in order of preference.
    ///
    /// An empty list means no account is configured for the target network.
    async fn get_signers(&self) -> Result<Vec<Address>, ScriptError>;
}

/// A source of contract factories, one per named compilation artifact
#[async_trait]
pub trait ContractFactoryProvider: Send + Sync {
    /// The factory type handed out by this provider
    type Factory: ContractFactory;

    /// Returns a factory for the named contract whose deployments are authorized by `signer`
    async fn get_contract_factory(
        &self,
        name: &str,
        signer: Address,
    ) -> Result<Self::Factory, ScriptError>;
}

/// A handle able to deploy one compiled contract
#[async_trait]
pub trait ContractFactory: Send + Sync {
    /// The name of the contract this factory deploys
    fn contract_name(&self) -> &str;

    /// The account authorizing deployments made through this factory
    fn signer(&self) -> Address;

    /// Deploys the contract with the given constructor arguments.
    ///
    /// Resolves once the creation transaction is confirmed.
    async fn deploy(&self, args: &[DynSolValue]) -> Result<DeployedContract, ScriptError>;
}

/// A mechanism for deploying a contract behind an upgradeable proxy
#[async_trait]
pub trait ProxyDeployer<F: ContractFactory>: Send + Sync {
    /// Deploys the factory's contract as the logic contract of a new proxy, invoking the
    /// configured initializer with `args` as part of the proxy construction.
    ///
    /// Resolves once the proxy creation transaction is confirmed.
    async fn deploy_proxy(
        &self,
        factory: &F,
        args: &[DynSolValue],
        options: &ProxyOptions,
    ) -> Result<DeployedProxy, ScriptError>;
}
