//! Collaborators backed by a live network, reached over JSON-RPC

use alloy::{
    dyn_abi::{DynSolValue, JsonAbiExt},
    json_abi::JsonAbi,
    network::TransactionBuilder,
    primitives::{Address, Bytes},
    providers::{DynProvider, Provider},
    rpc::types::{TransactionReceipt, TransactionRequest},
    transports::TransportError,
};
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::{
    artifacts::{Artifact, ArtifactStore, ProxyArtifactSource},
    constants::{PROXY_ADMIN_STORAGE_SLOT, PROXY_IMPLEMENTATION_STORAGE_SLOT},
    errors::ScriptError,
    interfaces::{ContractFactory, ContractFactoryProvider, ProxyDeployer, SignerProvider},
    types::{DeployedContract, DeployedProxy, ProxyOptions},
    utils::read_address_slot,
};

// -----------
// | Signers |
// -----------

/// The accounts available on the network the client is connected to
#[derive(Clone)]
pub struct RpcSigners {
    /// The addresses of the locally held signers, registered with the client's wallet
    local: Vec<Address>,
    /// The client, used to query the node's own accounts
    provider: DynProvider,
}

impl RpcSigners {
    /// Create a signer provider preferring the given local signers over the node's accounts
    pub fn new(local: Vec<Address>, provider: DynProvider) -> Self {
        Self { local, provider }
    }
}

#[async_trait]
impl SignerProvider for RpcSigners {
    async fn get_signers(&self) -> Result<Vec<Address>, ScriptError> {
        if !self.local.is_empty() {
            return Ok(self.local.clone());
        }

        debug!("no local signer configured, falling back to the node's accounts");
        self.provider
            .get_accounts()
            .await
            .map_err(|e| ScriptError::ClientInitialization(e.to_string()))
    }
}

// -------------
// | Factories |
// -------------

/// Hands out factories for the artifacts of a compilation
#[derive(Clone)]
pub struct RpcContractFactories {
    /// Where the artifacts are read from
    store: ArtifactStore,
    /// The client through which deployments are sent
    provider: DynProvider,
    /// The number of confirmations awaited for each deployment
    confirmations: u64,
}

impl RpcContractFactories {
    /// Constructor
    pub fn new(store: ArtifactStore, provider: DynProvider, confirmations: u64) -> Self {
        Self {
            store,
            provider,
            confirmations,
        }
    }
}

#[async_trait]
impl ContractFactoryProvider for RpcContractFactories {
    type Factory = RpcContractFactory;

    async fn get_contract_factory(
        &self,
        name: &str,
        signer: Address,
    ) -> Result<RpcContractFactory, ScriptError> {
        let artifact = self.store.artifact(name)?;
        // Surface unlinked or abstract contracts before anything is sent
        artifact.creation_bytecode()?;
        debug!("loaded artifact {}", artifact.fully_qualified_name());

        Ok(RpcContractFactory {
            name: name.to_string(),
            artifact,
            signer,
            provider: self.provider.clone(),
            confirmations: self.confirmations,
        })
    }
}

/// Deploys one compiled contract from one account
#[derive(Clone)]
pub struct RpcContractFactory {
    /// The name the factory was requested under
    name: String,
    /// The compiled contract
    artifact: Artifact,
    /// The account sending the creation transactions
    signer: Address,
    /// The client through which deployments are sent
    provider: DynProvider,
    /// The number of confirmations awaited for each deployment
    confirmations: u64,
}

#[async_trait]
impl ContractFactory for RpcContractFactory {
    fn contract_name(&self) -> &str {
        &self.name
    }

    fn signer(&self) -> Address {
        self.signer
    }

    async fn deploy(&self, args: &[DynSolValue]) -> Result<DeployedContract, ScriptError> {
        let code = self.artifact.creation_code(args)?;

        let receipt = send_creation(&self.provider, self.signer, code, self.confirmations)
            .await
            .map_err(|e| ScriptError::DeploymentFailed(e.to_string()))?;

        self.check_receipt(&receipt)
    }
}

impl RpcContractFactory {
    /// Check the receipt of a creation sent through this factory
    fn check_receipt(
        &self,
        receipt: &TransactionReceipt,
    ) -> Result<DeployedContract, ScriptError> {
        if !receipt.status() {
            return Err(ScriptError::DeploymentFailed(format!(
                "creation of {} reverted in tx {}",
                self.name, receipt.transaction_hash
            )));
        }

        deployed_contract(receipt)
    }
}

// -----------
// | Proxies |
// -----------

/// Deploys contracts behind an OpenZeppelin v5 `TransparentUpgradeableProxy`.
///
/// The proxy constructor creates its own `ProxyAdmin`, owned by the configured initial owner,
/// and calls the initializer on the logic contract in the same transaction.
#[derive(Clone)]
pub struct TransparentProxyDeployer {
    /// Where the proxy artifact is read from
    proxy: ProxyArtifactSource,
    /// The client through which deployments are sent
    provider: DynProvider,
    /// The number of confirmations awaited for each deployment
    confirmations: u64,
}

impl TransparentProxyDeployer {
    /// Constructor
    pub fn new(proxy: ProxyArtifactSource, provider: DynProvider, confirmations: u64) -> Self {
        Self {
            proxy,
            provider,
            confirmations,
        }
    }
}

#[async_trait]
impl ProxyDeployer<RpcContractFactory> for TransparentProxyDeployer {
    async fn deploy_proxy(
        &self,
        factory: &RpcContractFactory,
        args: &[DynSolValue],
        options: &ProxyOptions,
    ) -> Result<DeployedProxy, ScriptError> {
        // Resolve everything that can fail locally before sending any transaction
        let init_calldata =
            initializer_calldata(&factory.artifact.abi, &options.initializer, args)?;
        let proxy_artifact = self.proxy.load()?;

        // Deploy the logic contract
        let implementation = factory.deploy(&[]).await?;
        info!(
            "{} implementation deployed at {}",
            factory.contract_name(),
            implementation.address
        );

        // Deploy the proxy, which invokes the initializer during construction
        let owner = options.initial_owner.unwrap_or(factory.signer());
        let code = proxy_artifact.creation_code(&[
            DynSolValue::Address(implementation.address),
            DynSolValue::Address(owner),
            DynSolValue::Bytes(init_calldata.to_vec()),
        ])?;

        let receipt = send_creation(&self.provider, factory.signer(), code, self.confirmations)
            .await
            .map_err(|e| proxy_creation_error(e, &options.initializer))?;

        let proxy = check_proxy_receipt(&receipt, factory.contract_name(), &options.initializer)?;
        let admin = self.read_admin(proxy.address).await;
        self.check_implementation(proxy.address, implementation.address)
            .await;

        Ok(DeployedProxy {
            address: proxy.address,
            implementation: implementation.address,
            admin,
            transaction_hash: proxy.transaction_hash,
        })
    }
}

impl TransparentProxyDeployer {
    /// Get the proxy admin contract address.
    ///
    /// This is the recommended way to get the proxy admin address:
    /// https://github.com/OpenZeppelin/openzeppelin-contracts/blob/v5.0.0/contracts/proxy/ERC1967/ERC1967Utils.sol#L104-L106
    async fn read_admin(&self, proxy: Address) -> Option<Address> {
        match read_address_slot(&self.provider, proxy, PROXY_ADMIN_STORAGE_SLOT).await {
            Ok(admin) => {
                info!("proxy admin deployed at {admin}");
                Some(admin)
            }
            Err(e) => {
                warn!("could not read proxy admin of {proxy}: {e}");
                None
            }
        }
    }

    /// Check that the proxy points at the implementation that was just deployed
    async fn check_implementation(&self, proxy: Address, expected: Address) -> bool {
        match read_address_slot(&self.provider, proxy, PROXY_IMPLEMENTATION_STORAGE_SLOT).await {
            Ok(implementation) if implementation == expected => true,
            Ok(implementation) => {
                warn!("proxy {proxy} points at {implementation}, expected {expected}");
                false
            }
            Err(e) => {
                warn!("could not read implementation of {proxy}: {e}");
                false
            }
        }
    }
}

// -----------
// | Helpers |
// -----------

/// Prepare calldata for the initializer of a proxied contract.
///
/// Picks the overload of `name` taking as many arguments as were given.
pub fn initializer_calldata(
    abi: &JsonAbi,
    name: &str,
    args: &[DynSolValue],
) -> Result<Bytes, ScriptError> {
    let function = abi
        .function(name)
        .and_then(|overloads| overloads.iter().find(|f| f.inputs.len() == args.len()))
        .ok_or_else(|| {
            ScriptError::InitializationFailed(format!(
                "no initializer `{name}` taking {} arguments",
                args.len()
            ))
        })?;

    function
        .abi_encode_input(args)
        .map(Bytes::from)
        .map_err(|e| ScriptError::InitializationFailed(e.to_string()))
}

/// Send a contract creation transaction and wait for its receipt
async fn send_creation(
    provider: &DynProvider,
    from: Address,
    code: Bytes,
    confirmations: u64,
) -> Result<TransactionReceipt, CreationError> {
    let tx = TransactionRequest::default()
        .with_from(from)
        .with_deploy_code(code);

    let pending_tx = provider
        .send_transaction(tx)
        .await
        .map_err(CreationError::Rpc)?;
    debug!("creation tx {} sent", pending_tx.tx_hash());

    pending_tx
        .with_required_confirmations(confirmations)
        .get_receipt()
        .await
        .map_err(|e| CreationError::Confirmation(e.to_string()))
}

/// Check the receipt of a proxy creation, which ran the initializer of `contract_name`
fn check_proxy_receipt(
    receipt: &TransactionReceipt,
    contract_name: &str,
    initializer: &str,
) -> Result<DeployedContract, ScriptError> {
    if !receipt.status() {
        return Err(ScriptError::InitializationFailed(format!(
            "proxy construction reverted in tx {}, `{initializer}` of {contract_name} failed",
            receipt.transaction_hash
        )));
    }

    deployed_contract(receipt)
}

/// Classify a failure to send the proxy creation.
///
/// The initializer runs inside the proxy constructor, so a revert is attributed to it.
fn proxy_creation_error(e: CreationError, initializer: &str) -> ScriptError {
    if is_revert(&e) {
        ScriptError::InitializationFailed(format!(
            "`{initializer}` reverted during proxy construction: {e}"
        ))
    } else {
        ScriptError::DeploymentFailed(e.to_string())
    }
}

/// Extract the created contract from a successful creation receipt
fn deployed_contract(receipt: &TransactionReceipt) -> Result<DeployedContract, ScriptError> {
    let address = receipt.contract_address.ok_or_else(|| {
        ScriptError::DeploymentFailed(format!(
            "no contract address in receipt of tx {}",
            receipt.transaction_hash
        ))
    })?;

    Ok(DeployedContract {
        address,
        transaction_hash: receipt.transaction_hash,
    })
}

/// Whether a creation was rejected because its execution reverted
fn is_revert(e: &CreationError) -> bool {
    match e {
        CreationError::Rpc(rpc_err) => rpc_err.as_error_resp().is_some_and(|payload| {
            payload.as_revert_data().is_some() || payload.message.contains("revert")
        }),
        CreationError::Confirmation(_) => false,
    }
}

/// The ways sending a creation transaction can fail
#[derive(Debug)]
enum CreationError {
    /// The node rejected the transaction, possibly while estimating its gas
    Rpc(TransportError),
    /// The transaction was sent but its receipt never came
    Confirmation(String),
}

impl std::fmt::Display for CreationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreationError::Rpc(e) => write!(f, "{e}"),
            CreationError::Confirmation(s) => write!(f, "awaiting receipt: {s}"),
        }
    }
}
