//! Utilities for the deploy scripts.

use std::{fs, path::Path, str::FromStr};

use alloy::{
    network::EthereumWallet,
    primitives::{Address, B256, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use serde_json::{Map, Value};

use crate::{
    constants::{
        NUM_BYTES_ADDRESS, NUM_BYTES_STORAGE_SLOT, STAKING_IMPLEMENTATION_DEPLOYMENT_KEY,
        STAKING_PROXY_ADMIN_DEPLOYMENT_KEY, STAKING_PROXY_DEPLOYMENT_KEY, TOKEN_DEPLOYMENT_KEY,
    },
    errors::ScriptError,
    types::DeploymentReport,
};

/// Parse the given private keys into local signers
pub fn parse_signers(priv_keys: &[String]) -> Result<Vec<PrivateKeySigner>, ScriptError> {
    priv_keys
        .iter()
        .map(|key| {
            PrivateKeySigner::from_str(key.trim())
                .map_err(|e| ScriptError::ClientInitialization(e.to_string()))
        })
        .collect()
}

/// Sets up the RPC client through which all transactions are sent.
///
/// Transactions from one of the given signers are signed locally. Without any signer, the
/// client leaves signing to the node, which then only accepts transactions from its own
/// unlocked accounts.
pub fn setup_client(
    rpc_url: &str,
    signers: &[PrivateKeySigner],
) -> Result<DynProvider, ScriptError> {
    let url = Url::parse(rpc_url).map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;

    let provider = match signers.split_first() {
        Some((default_signer, other_signers)) => {
            let mut wallet = EthereumWallet::new(default_signer.clone());
            for signer in other_signers {
                wallet.register_signer(signer.clone());
            }

            let provider = ProviderBuilder::new()
                .wallet(wallet)
                .with_simple_nonce_management()
                .connect_http(url);
            DynProvider::new(provider)
        }
        None => DynProvider::new(ProviderBuilder::new().connect_http(url)),
    };

    Ok(provider)
}

/// Read an address out of an EIP1967 storage slot of a proxy contract
pub async fn read_address_slot(
    provider: &DynProvider,
    proxy: Address,
    slot: B256,
) -> Result<Address, ScriptError> {
    let word = provider
        .get_storage_at(proxy, U256::from_be_bytes(slot.0))
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

    Ok(address_from_storage_word(word))
}

/// Extract an address from a storage word, in which it is right-aligned
pub fn address_from_storage_word(word: U256) -> Address {
    let bytes = word.to_be_bytes::<NUM_BYTES_STORAGE_SLOT>();
    Address::from_slice(&bytes[NUM_BYTES_STORAGE_SLOT - NUM_BYTES_ADDRESS..NUM_BYTES_STORAGE_SLOT])
}

/// Write the addresses of a deployment run to the deployments file
pub fn write_deployments(file_path: &Path, report: &DeploymentReport) -> Result<(), ScriptError> {
    let mut entries = vec![
        (TOKEN_DEPLOYMENT_KEY, report.token.address),
        (STAKING_PROXY_DEPLOYMENT_KEY, report.staking.address),
        (
            STAKING_IMPLEMENTATION_DEPLOYMENT_KEY,
            report.staking.implementation,
        ),
    ];
    if let Some(admin) = report.staking.admin {
        entries.push((STAKING_PROXY_ADMIN_DEPLOYMENT_KEY, admin));
    }

    write_deployed_addresses(file_path, &entries)
}

/// Write the given addresses to the deployments file, keeping any other entries.
///
/// The file is created if it does not exist.
pub fn write_deployed_addresses(
    file_path: &Path,
    entries: &[(&str, Address)],
) -> Result<(), ScriptError> {
    let mut deployments = if file_path.exists() {
        let contents = fs::read_to_string(file_path)
            .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
        match serde_json::from_str::<Value>(&contents)
            .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?
        {
            Value::Object(map) => map,
            _ => {
                return Err(ScriptError::WriteDeployments(format!(
                    "{} does not hold a JSON object",
                    file_path.display()
                )))
            }
        }
    } else {
        Map::new()
    };

    for (key, address) in entries {
        deployments.insert(key.to_string(), Value::String(address.to_string()));
    }

    let contents = serde_json::to_string_pretty(&Value::Object(deployments))
        .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
    fs::write(file_path, contents).map_err(|e| ScriptError::WriteDeployments(e.to_string()))
}

/// Read an address from the deployments file
pub fn read_deployment(key: &str, file_path: &Path) -> Result<Address, ScriptError> {
    let contents = fs::read_to_string(file_path).map_err(|e| {
        ScriptError::ReadDeployments(format!("could not read {}: {e}", file_path.display()))
    })?;
    let json: Value =
        serde_json::from_str(&contents).map_err(|e| ScriptError::ReadDeployments(e.to_string()))?;

    let addr_str = json
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ScriptError::ReadDeployments(format!("key {key} not found")))?;

    Address::from_str(addr_str).map_err(|e| ScriptError::ReadDeployments(e.to_string()))
}
