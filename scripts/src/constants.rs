//! Constants used in the deploy scripts

use alloy::primitives::{b256, B256};

/// The name of the token contract artifact
pub const TOKEN_CONTRACT_NAME: &str = "Rfa";

/// The name of the staking contract artifact
pub const STAKING_CONTRACT_NAME: &str = "Staking";

/// The name of the proxy contract artifact.
///
/// Compiled from https://github.com/OpenZeppelin/openzeppelin-contracts/blob/v5.0.0/contracts/proxy/transparent/TransparentUpgradeableProxy.sol
pub const PROXY_CONTRACT_NAME: &str = "TransparentUpgradeableProxy";

/// The artifact of the proxy bundled with the Hardhat upgrades plugin, relative to the
/// project's `node_modules`
pub const BUNDLED_PROXY_ARTIFACT: &str = "@openzeppelin/upgrades-core/artifacts/@openzeppelin/contracts-v5/proxy/transparent/TransparentUpgradeableProxy.sol/TransparentUpgradeableProxy.json";

/// The default name of the initializer invoked through the proxy
pub const DEFAULT_INITIALIZER: &str = "initialize";

/// The default RPC URL, a local development node
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// The default root directory of the compilation artifacts
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// The default directory of the project's installed packages
pub const DEFAULT_NODE_MODULES_DIR: &str = "node_modules";

/// The default number of confirmations to wait for each deployment transaction
pub const DEFAULT_DEPLOY_CONFIRMATIONS: u64 = 1;

/// The directory holding compiler build info, never holding contract artifacts
pub const BUILD_INFO_DIR: &str = "build-info";

/// The extension of an artifact file
pub const ARTIFACT_EXTENSION: &str = "json";

/// The marker a compiler leaves in bytecode for an unlinked library
pub const UNLINKED_LIBRARY_MARKER: &str = "__$";

/// The storage slot containing the proxy admin contract address in the upgradeable proxy.
///
/// This is specified in EIP1967: https://eips.ethereum.org/EIPS/eip-1967#admin-address
pub const PROXY_ADMIN_STORAGE_SLOT: B256 =
    b256!("b53127684a568b3173ae13b9f8a6016e243e63b6e8ee1178d6a717850b5d6103");

/// The storage slot containing the implementation contract address in the upgradeable proxy.
///
/// This is specified in EIP1967: https://eips.ethereum.org/EIPS/eip-1967#logic-contract-address
pub const PROXY_IMPLEMENTATION_STORAGE_SLOT: B256 =
    b256!("360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc");

/// The number of bytes stored in a single storage slot
pub const NUM_BYTES_STORAGE_SLOT: usize = 32;

/// The number of bytes in an Ethereum address
pub const NUM_BYTES_ADDRESS: usize = 20;

/// The token contract key in the deployments file
pub const TOKEN_DEPLOYMENT_KEY: &str = "Rfa";

/// The staking proxy contract key in the deployments file
pub const STAKING_PROXY_DEPLOYMENT_KEY: &str = "StakingProxy";

/// The staking implementation contract key in the deployments file
pub const STAKING_IMPLEMENTATION_DEPLOYMENT_KEY: &str = "StakingImplementation";

/// The staking proxy admin contract key in the deployments file
pub const STAKING_PROXY_ADMIN_DEPLOYMENT_KEY: &str = "StakingProxyAdmin";
