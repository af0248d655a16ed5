//! Tests of the deploy command against in-memory collaborators

use std::sync::{Arc, Mutex};

use alloy::{
    dyn_abi::DynSolValue,
    primitives::{address, Address, TxHash},
};
use async_trait::async_trait;
use eyre::Result;
use scripts::{
    commands::{deploy_token_and_staking, exit_status},
    constants::{STAKING_CONTRACT_NAME, TOKEN_CONTRACT_NAME},
    errors::ScriptError,
    interfaces::{ContractFactory, ContractFactoryProvider, ProxyDeployer, SignerProvider},
    types::{DeployedContract, DeployedProxy, DeploymentReport, ProxyOptions},
};

const DEPLOYER: Address = address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
const OTHER_ACCOUNT: Address = address!("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");
const TOKEN_ADDRESS: Address = address!("1111111111111111111111111111111111111111");
const PROXY_ADDRESS: Address = address!("2222222222222222222222222222222222222222");
const IMPLEMENTATION_ADDRESS: Address = address!("3333333333333333333333333333333333333333");

// -----------
// | Doubles |
// -----------

/// A call made to one of the collaborators
#[derive(Clone, Debug, PartialEq)]
enum Call {
    GetSigners,
    GetFactory(String, Address),
    Deploy(String, Vec<DynSolValue>),
    DeployProxy(String, Vec<DynSolValue>, ProxyOptions),
}

/// Shared log of the calls made during a run
#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<Call>>>);

impl Recorder {
    fn record(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }
}

struct MockSigners {
    recorder: Recorder,
    signers: Vec<Address>,
}

#[async_trait]
impl SignerProvider for MockSigners {
    async fn get_signers(&self) -> Result<Vec<Address>, ScriptError> {
        self.recorder.record(Call::GetSigners);
        Ok(self.signers.clone())
    }
}

struct MockFactories {
    recorder: Recorder,
    token_result: Result<Address, ScriptError>,
}

#[async_trait]
impl ContractFactoryProvider for MockFactories {
    type Factory = MockFactory;

    async fn get_contract_factory(
        &self,
        name: &str,
        signer: Address,
    ) -> Result<MockFactory, ScriptError> {
        self.recorder.record(Call::GetFactory(name.to_string(), signer));

        Ok(MockFactory {
            recorder: self.recorder.clone(),
            name: name.to_string(),
            signer,
            result: self.token_result.clone(),
        })
    }
}

struct MockFactory {
    recorder: Recorder,
    name: String,
    signer: Address,
    result: Result<Address, ScriptError>,
}

#[async_trait]
impl ContractFactory for MockFactory {
    fn contract_name(&self) -> &str {
        &self.name
    }

    fn signer(&self) -> Address {
        self.signer
    }

    async fn deploy(&self, args: &[DynSolValue]) -> Result<DeployedContract, ScriptError> {
        self.recorder.record(Call::Deploy(self.name.clone(), args.to_vec()));

        self.result.clone().map(|address| DeployedContract {
            address,
            transaction_hash: TxHash::ZERO,
        })
    }
}

struct MockProxyDeployer {
    recorder: Recorder,
    result: Result<Address, ScriptError>,
}

#[async_trait]
impl ProxyDeployer<MockFactory> for MockProxyDeployer {
    async fn deploy_proxy(
        &self,
        factory: &MockFactory,
        args: &[DynSolValue],
        options: &ProxyOptions,
    ) -> Result<DeployedProxy, ScriptError> {
        self.recorder.record(Call::DeployProxy(
            factory.contract_name().to_string(),
            args.to_vec(),
            options.clone(),
        ));

        self.result.clone().map(|address| DeployedProxy {
            address,
            implementation: IMPLEMENTATION_ADDRESS,
            admin: None,
            transaction_hash: TxHash::ZERO,
        })
    }
}

// -----------
// | Helpers |
// -----------

/// The outcome of a run against the doubles
struct Run {
    result: Result<DeploymentReport, ScriptError>,
    stdout: String,
    stderr: String,
    exit_status: u8,
    calls: Vec<Call>,
}

/// Run the deploy command against doubles configured with the given outcomes
async fn run(
    signers: Vec<Address>,
    token_result: Result<Address, ScriptError>,
    proxy_result: Result<Address, ScriptError>,
) -> Result<Run> {
    let recorder = Recorder::default();
    let signers = MockSigners {
        recorder: recorder.clone(),
        signers,
    };
    let factories = MockFactories {
        recorder: recorder.clone(),
        token_result,
    };
    let proxy_deployer = MockProxyDeployer {
        recorder: recorder.clone(),
        result: proxy_result,
    };

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let result = deploy_token_and_staking(
        &signers,
        &factories,
        &proxy_deployer,
        &ProxyOptions::default(),
        &mut stdout,
    )
    .await;
    let exit_status = exit_status(&result, &mut stderr);

    Ok(Run {
        result,
        stdout: String::from_utf8(stdout)?,
        stderr: String::from_utf8(stderr)?,
        exit_status,
        calls: recorder.calls(),
    })
}

// ---------
// | Tests |
// ---------

#[tokio::test]
async fn test_successful_deployment() -> Result<()> {
    let run = run(vec![DEPLOYER], Ok(TOKEN_ADDRESS), Ok(PROXY_ADDRESS)).await?;

    assert_eq!(
        run.stdout,
        "Deploying contract with account:\n\
         Token address: 0x1111111111111111111111111111111111111111\n\
         \n\
         proxy address: 0x2222222222222222222222222222222222222222\n\
         \n"
    );
    assert_eq!(run.exit_status, 0);
    assert!(run.stderr.is_empty());

    let report = run.result?;
    assert_eq!(report.deployer, DEPLOYER);
    assert_eq!(report.token.address, TOKEN_ADDRESS);
    assert_eq!(report.staking.address, PROXY_ADDRESS);
    assert_eq!(report.staking.implementation, IMPLEMENTATION_ADDRESS);

    Ok(())
}

#[tokio::test]
async fn test_steps_are_sequential() -> Result<()> {
    let run = run(vec![DEPLOYER], Ok(TOKEN_ADDRESS), Ok(PROXY_ADDRESS)).await?;

    assert_eq!(
        run.calls,
        vec![
            Call::GetSigners,
            Call::GetFactory(TOKEN_CONTRACT_NAME.to_string(), DEPLOYER),
            Call::Deploy(TOKEN_CONTRACT_NAME.to_string(), vec![]),
            Call::GetFactory(STAKING_CONTRACT_NAME.to_string(), DEPLOYER),
            Call::DeployProxy(
                STAKING_CONTRACT_NAME.to_string(),
                vec![DynSolValue::Address(TOKEN_ADDRESS)],
                ProxyOptions::default(),
            ),
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_initializer_receives_token_address_once() -> Result<()> {
    let run = run(vec![DEPLOYER], Ok(TOKEN_ADDRESS), Ok(PROXY_ADDRESS)).await?;

    let proxy_calls = run
        .calls
        .iter()
        .filter_map(|call| match call {
            Call::DeployProxy(_, args, _) => Some(args.clone()),
            _ => None,
        })
        .collect::<Vec<_>>();

    assert_eq!(proxy_calls, vec![vec![DynSolValue::Address(TOKEN_ADDRESS)]]);

    Ok(())
}

#[tokio::test]
async fn test_first_signer_deploys() -> Result<()> {
    let run = run(
        vec![DEPLOYER, OTHER_ACCOUNT],
        Ok(TOKEN_ADDRESS),
        Ok(PROXY_ADDRESS),
    )
    .await?;

    assert!(run.calls.iter().all(|call| match call {
        Call::GetFactory(_, signer) => *signer == DEPLOYER,
        _ => true,
    }));
    assert_eq!(run.result?.deployer, DEPLOYER);

    Ok(())
}

#[tokio::test]
async fn test_token_failure_skips_proxy() -> Result<()> {
    let err = ScriptError::DeploymentFailed("insufficient funds for gas * price + value".into());
    let run = run(vec![DEPLOYER], Err(err.clone()), Ok(PROXY_ADDRESS)).await?;

    assert_eq!(run.result, Err(err));
    assert_eq!(run.exit_status, 1);
    assert!(run.stderr.contains("insufficient funds"));
    assert!(!run.stdout.contains("Token address"));
    assert!(!run.stdout.contains("proxy address"));
    assert!(!run
        .calls
        .iter()
        .any(|call| matches!(call, Call::DeployProxy(..))));
    assert!(!run
        .calls
        .contains(&Call::GetFactory(STAKING_CONTRACT_NAME.to_string(), DEPLOYER)));

    Ok(())
}

#[tokio::test]
async fn test_proxy_failure_keeps_token_output() -> Result<()> {
    let err = ScriptError::InitializationFailed("`initialize` reverted".into());
    let run = run(vec![DEPLOYER], Ok(TOKEN_ADDRESS), Err(err.clone())).await?;

    assert_eq!(run.result, Err(err));
    assert_eq!(run.exit_status, 1);
    assert!(run
        .stdout
        .contains("Token address: 0x1111111111111111111111111111111111111111"));
    assert!(!run.stdout.contains("proxy address"));
    assert!(run.stderr.contains("`initialize` reverted"));

    Ok(())
}

#[tokio::test]
async fn test_no_signer_available() -> Result<()> {
    let run = run(vec![], Ok(TOKEN_ADDRESS), Ok(PROXY_ADDRESS)).await?;

    assert_eq!(run.result, Err(ScriptError::NoSignerAvailable));
    assert_eq!(run.exit_status, 1);
    assert_eq!(run.calls, vec![Call::GetSigners]);
    assert!(run.stdout.is_empty());
    assert!(!run.stderr.is_empty());

    Ok(())
}
