use {
    crate::{
        AlloyDeployer,
        Artifact,
        BuildInfo,
        DeploymentRecord,
        Error,
        Runner,
        arguments::{Arguments, Command, DeployArguments, VerifyArguments},
        verify::{self, Etherscan, Outcome, VerificationRequest, Verifier},
    },
    alloy::{primitives::Address, providers::Provider},
    clap::Parser,
    configs::{NetworkProfile, ProcessEnv, Registry},
    std::time::Duration,
};

/// Entry point of the `deployer` binary. Loads `.env`, parses `args`,
/// initializes logging and runs the requested command.
pub async fn start(args: impl Iterator<Item = String>) -> Result<(), Error> {
    // A missing `.env` file is fine, variables may come from the process.
    dotenv::dotenv().ok();
    let args = Arguments::parse_from(args);
    let obs_config = observe::Config::new(
        args.logging.log_filter.as_str(),
        args.logging.log_stderr_threshold.into_level(),
        args.logging.use_json_logs,
    );
    observe::tracing::initialize(&obs_config);
    observe::panic_hook::install();
    tracing::info!("running deployer with validated arguments:\n{}", args);

    let result = run(args).await;
    if let Err(err) = &result {
        tracing::error!("{err}");
    }
    result
}

/// Assumes tracing has already been set up.
pub async fn run(args: Arguments) -> Result<(), Error> {
    let registry = match &args.config {
        Some(path) => Registry::load(path).await?,
        None => Registry::builtin(),
    };

    match &args.command {
        Command::Deploy(deploy) => run_deploy(&args, deploy, &registry).await,
        Command::Verify(verify) => run_verify(&args, verify, &registry).await,
        Command::Networks => {
            list_networks(&registry);
            Ok(())
        }
    }
}

async fn run_deploy(
    args: &Arguments,
    deploy: &DeployArguments,
    registry: &Registry,
) -> Result<(), Error> {
    let profile = registry.profile(&deploy.network, &ProcessEnv)?;
    let artifact = Artifact::load(&args.artifacts, &args.contract).await?;

    let wallet = ethrpc::alloy::wallet::wallet(&profile.credentials)?;
    let provider = ethrpc::alloy::provider_with_wallet(
        &profile.rpc_url,
        &profile.name,
        args.http_timeout,
        wallet,
    )
    .map_err(|err| Error::Configuration(format!("cannot build http client: {err}")))?;
    let mut deployer =
        AlloyDeployer::new(provider, deploy.confirmations, deploy.confirmation_timeout)
            .with_expected_chain_id(profile.chain_id);
    if deploy.reset_fork {
        let fork_url = profile.fork_url.clone().ok_or_else(|| {
            Error::Configuration(format!(
                "network {} has no fork url to reset the node to",
                profile.name
            ))
        })?;
        deployer = deployer.with_fork_reset(fork_url);
    }

    let result = Runner::new(registry, deployer).run(&profile, &artifact).await?;
    let path = DeploymentRecord::new(&artifact, &result)
        .write(&args.deployments, &profile.name, &args.contract)
        .await?;
    tracing::info!(?path, "recorded deployment");
    Ok(())
}

async fn run_verify(
    args: &Arguments,
    verify: &VerifyArguments,
    registry: &Registry,
) -> Result<(), Error> {
    let profile = registry.profile(&verify.network, &ProcessEnv)?;
    let record = DeploymentRecord::read(&args.deployments, &profile.name, &args.contract).await?;
    let (address, chain_id) =
        verification_target(&args.contract, &profile, verify.address, record.as_ref())?;
    let chain_id = match chain_id {
        Some(chain_id) => chain_id,
        None => node_chain_id(&profile, args.http_timeout).await?,
    };
    let verification = registry.verification(&profile.name, chain_id, &ProcessEnv)?;

    let artifact = Artifact::load(&args.artifacts, &args.contract).await?;
    let build_info = match &args.build_info {
        Some(path) => BuildInfo::load(path).await?,
        None => artifact.build_info().await?,
    };
    let request = VerificationRequest::new(address, &artifact, &build_info);

    let chain = verification.explorer.chain().clone();
    let client = reqwest::Client::builder()
        .timeout(args.http_timeout)
        .build()
        .map_err(|err| Error::Configuration(format!("cannot build http client: {err}")))?;
    let api = Etherscan::new(client, &chain, verification.api_key);
    let verifier = Verifier::new(
        api,
        verify.verification_poll_interval,
        verify.verification_timeout,
    );
    match verifier.verify(&request).await? {
        Outcome::Verified => {
            tracing::info!("Successfully verified contract {}", args.contract)
        }
        Outcome::AlreadyVerified => {
            tracing::info!("Contract {} is already verified", args.contract)
        }
    }
    tracing::info!("{}", verify::explorer_link(&chain, address));
    Ok(())
}

/// Address to verify and, if known without asking the node, the chain it
/// lives on. An explicit address wins over the recorded deployment.
fn verification_target(
    contract: &str,
    profile: &NetworkProfile,
    address: Option<Address>,
    record: Option<&DeploymentRecord>,
) -> Result<(Address, Option<u64>), Error> {
    let address = match (address, record) {
        (Some(address), _) => address,
        (None, Some(record)) => record.address,
        (None, None) => {
            return Err(Error::Configuration(format!(
                "no deployment of {contract} recorded for network {}, pass --address",
                profile.name
            )));
        }
    };
    let chain_id = profile.chain_id.or(record.map(|record| record.chain_id));
    Ok((address, chain_id))
}

async fn node_chain_id(profile: &NetworkProfile, timeout: Duration) -> Result<u64, Error> {
    ethrpc::alloy::provider(&profile.rpc_url, &profile.name, timeout)
        .map_err(|err| Error::Configuration(format!("cannot build http client: {err}")))?
        .get_chain_id()
        .await
        .map_err(|err| Error::rpc("fetching chain id", err))
}

fn list_networks(registry: &Registry) {
    for name in registry.network_names() {
        // Names come from the registry itself, so the lookup cannot fail.
        let Ok(network) = registry.network(name) else {
            continue;
        };
        let chain_id = network
            .chain_id
            .map_or_else(|| "unknown".to_string(), |id| id.to_string());
        // `Setting` only displays the origin of literal URLs.
        tracing::info!("{name}: chain id {chain_id}, rpc url {}", network.rpc_url);
    }
}
