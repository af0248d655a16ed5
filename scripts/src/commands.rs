//! Implementations of the deploy scripts

use std::io::Write;

use alloy::dyn_abi::DynSolValue;
use tracing::info;

use crate::{
    constants::{STAKING_CONTRACT_NAME, TOKEN_CONTRACT_NAME},
    errors::ScriptError,
    interfaces::{ContractFactory, ContractFactoryProvider, ProxyDeployer, SignerProvider},
    types::{DeploymentReport, ProxyOptions},
};

/// Deploys the `Rfa` token, then the `Staking` contract behind an upgradeable proxy,
/// initialized with the token's address.
///
/// The two deployments are strictly sequential: the staking initializer only runs once the
/// token's creation has been confirmed. Addresses are written to `out` as soon as each
/// deployment is confirmed. Any failure aborts the remaining steps; nothing already
/// deployed is rolled back.
pub async fn deploy_token_and_staking<S, P, D, W>(
    signers: &S,
    factories: &P,
    proxy_deployer: &D,
    options: &ProxyOptions,
    out: &mut W,
) -> Result<DeploymentReport, ScriptError>
where
    S: SignerProvider,
    P: ContractFactoryProvider,
    D: ProxyDeployer<P::Factory>,
    W: Write,
{
    let deployer = signers
        .get_signers()
        .await?
        .into_iter()
        .next()
        .ok_or(ScriptError::NoSignerAvailable)?;

    writeln!(out, "Deploying contract with account:").map_err(output_err)?;
    info!("deploying with account {deployer}");

    // Deploy the token
    let token_factory = factories
        .get_contract_factory(TOKEN_CONTRACT_NAME, deployer)
        .await?;
    let token = token_factory.deploy(&[]).await?;
    info!(
        "{} deployed at {} in tx {}",
        token_factory.contract_name(),
        token.address,
        token.transaction_hash
    );
    writeln!(out, "Token address: {}", token.address).map_err(output_err)?;

    // Deploy the staking contract behind a proxy, initialized with the token address
    let staking_factory = factories
        .get_contract_factory(STAKING_CONTRACT_NAME, deployer)
        .await?;
    let staking = proxy_deployer
        .deploy_proxy(
            &staking_factory,
            &[DynSolValue::Address(token.address)],
            options,
        )
        .await?;
    info!(
        "{} proxy deployed at {} (implementation {}) in tx {}",
        staking_factory.contract_name(),
        staking.address,
        staking.implementation,
        staking.transaction_hash
    );
    writeln!(out, "\nproxy address: {}\n", staking.address).map_err(output_err)?;

    Ok(DeploymentReport {
        deployer,
        token,
        staking,
    })
}

/// Writes the outcome of a run to `err_out` when it failed, returning the process exit status
pub fn exit_status<T, W: Write>(result: &Result<T, ScriptError>, err_out: &mut W) -> u8 {
    match result {
        Ok(_) => 0,
        Err(e) => {
            // Nothing sensible is left to do if stderr itself is gone
            let _ = writeln!(err_out, "{e}");
            1
        }
    }
}

/// Map a console write failure into a script error
fn output_err(e: std::io::Error) -> ScriptError {
    ScriptError::Output(e.to_string())
}
