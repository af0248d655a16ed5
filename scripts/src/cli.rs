//! Definitions of CLI arguments for the deploy script

use std::{io::Write, path::PathBuf, str::FromStr};

use alloy::primitives::Address;
use clap::Parser;
use tracing::info;

use crate::{
    artifacts::{ArtifactStore, ProxyArtifactSource},
    commands::deploy_token_and_staking,
    constants::{
        DEFAULT_ARTIFACTS_DIR, DEFAULT_DEPLOY_CONFIRMATIONS, DEFAULT_INITIALIZER,
        DEFAULT_NODE_MODULES_DIR, DEFAULT_RPC_URL,
    },
    errors::ScriptError,
    rpc::{RpcContractFactories, RpcSigners, TransparentProxyDeployer},
    types::{DeploymentReport, ProxyOptions},
    utils::{parse_signers, setup_client, write_deployments},
};

/// Deploy the Rfa token and the upgradeable Staking contract
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Network RPC URL
    #[arg(short, long, env = "RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    /// Private keys of the deployer accounts, the first of which deploys.
    /// Without any, the node's own accounts are used
    #[arg(long = "pkey", env = "PKEY", value_delimiter = ',', hide_env_values = true)]
    pub priv_keys: Vec<String>,

    /// Root directory of the compiled contract artifacts
    #[arg(short, long, env = "ARTIFACTS_DIR", default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts: PathBuf,

    /// Directory of the project's installed packages, holding the proxy bundled with the
    /// upgrades plugin. A proxy compiled into the artifacts directory takes precedence
    #[arg(long, env = "NODE_MODULES_DIR", default_value = DEFAULT_NODE_MODULES_DIR)]
    pub node_modules: PathBuf,

    /// Path of a JSON file to record the deployed addresses in
    #[arg(long)]
    pub deployments: Option<PathBuf>,

    /// Number of confirmations to wait for on each deployment
    #[arg(
        long,
        default_value_t = DEFAULT_DEPLOY_CONFIRMATIONS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub confirmations: u64,

    /// Name of the Staking initializer invoked through the proxy
    #[arg(long, default_value = DEFAULT_INITIALIZER)]
    pub initializer: String,

    /// Initial owner of the proxy admin, defaults to the deployer
    #[arg(long)]
    pub proxy_admin_owner: Option<String>,
}

impl Cli {
    /// The proxy options configured on the command line
    pub fn proxy_options(&self) -> Result<ProxyOptions, ScriptError> {
        let initial_owner = self
            .proxy_admin_owner
            .as_deref()
            .map(Address::from_str)
            .transpose()
            .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?;

        Ok(ProxyOptions {
            initializer: self.initializer.clone(),
            initial_owner,
        })
    }

    /// Deploy both contracts against the configured network, writing progress to `out`
    pub async fn run<W: Write>(self, out: &mut W) -> Result<DeploymentReport, ScriptError> {
        let options = self.proxy_options()?;
        let signers = parse_signers(&self.priv_keys)?;
        let client = setup_client(&self.rpc_url, &signers)?;
        info!("connecting to {}", self.rpc_url);

        let store = ArtifactStore::new(self.artifacts);
        let signer_provider = RpcSigners::new(
            signers.iter().map(|signer| signer.address()).collect(),
            client.clone(),
        );
        let factories =
            RpcContractFactories::new(store.clone(), client.clone(), self.confirmations);
        let proxy_source = ProxyArtifactSource::new(store, self.node_modules);
        let proxy_deployer =
            TransparentProxyDeployer::new(proxy_source, client, self.confirmations);

        let report = deploy_token_and_staking(
            &signer_provider,
            &factories,
            &proxy_deployer,
            &options,
            out,
        )
        .await?;

        if let Some(path) = &self.deployments {
            write_deployments(path, &report)?;
            info!("deployments written to {}", path.display());
        }

        Ok(report)
    }
}
