use {
    alloy::primitives::Address,
    clap::{Parser, Subcommand},
    std::{
        fmt::{self, Display, Formatter},
        path::PathBuf,
        time::Duration,
    },
    tracing::level_filters::LevelFilter,
};

#[derive(Parser)]
#[clap(name = "deployer", about = "Deploys and verifies the CRWCP contract")]
pub struct Arguments {
    #[clap(flatten)]
    pub logging: LoggingArguments,

    /// TOML file describing networks, named accounts and block explorers.
    /// The built-in network table is used when omitted.
    #[clap(long, env)]
    pub config: Option<PathBuf>,

    /// Directory with the compiler's output.
    #[clap(long, env, default_value = "artifacts")]
    pub artifacts: PathBuf,

    /// Build info to verify sources with. By default the one referenced by
    /// the contract's artifact.
    #[clap(long, env)]
    pub build_info: Option<PathBuf>,

    /// Directory deployment records are written to and read from.
    #[clap(long, env, default_value = "deployments")]
    pub deployments: PathBuf,

    /// Name of the contract to deploy or verify.
    #[clap(long, env, default_value = "CRWCP")]
    pub contract: String,

    /// Timeout of a single HTTP request to a node or block explorer.
    #[clap(
        long,
        env,
        default_value = "10s",
        value_parser = humantime::parse_duration,
    )]
    pub http_timeout: Duration,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Parser)]
pub struct LoggingArguments {
    #[clap(long, env, default_value = "warn,deployer=info,ethrpc=info,configs=info")]
    pub log_filter: String,

    #[clap(long, env, default_value = "error")]
    pub log_stderr_threshold: LevelFilter,

    #[clap(long, env)]
    pub use_json_logs: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Deploy a new instance of the contract.
    Deploy(DeployArguments),
    /// Submit the contract's sources to the network's block explorer.
    Verify(VerifyArguments),
    /// List the configured networks.
    Networks,
}

#[derive(Parser)]
pub struct DeployArguments {
    /// Network to deploy to.
    #[clap(long, env)]
    pub network: String,

    /// How long to wait for the contract creation to be confirmed.
    #[clap(long, env, default_value = "5m", value_parser = humantime::parse_duration)]
    pub confirmation_timeout: Duration,

    /// Number of blocks that have to include the contract creation, counting
    /// the one it was mined in.
    #[clap(long, env, default_value = "1")]
    pub confirmations: u64,

    /// Restart the local node from a fresh fork of the network's fork URL
    /// before deploying. Only supported by development nodes.
    #[clap(long, env)]
    pub reset_fork: bool,
}

#[derive(Parser)]
pub struct VerifyArguments {
    /// Network the contract is deployed on.
    #[clap(long, env)]
    pub network: String,

    /// Address of the contract. Defaults to the last deployment recorded for
    /// the network.
    #[clap(long, env)]
    pub address: Option<Address>,

    /// How often to ask the explorer whether verification finished.
    #[clap(long, env, default_value = "5s", value_parser = humantime::parse_duration)]
    pub verification_poll_interval: Duration,

    /// How long to wait for the explorer to finish verification.
    #[clap(long, env, default_value = "2m", value_parser = humantime::parse_duration)]
    pub verification_timeout: Duration,
}

impl Display for LoggingArguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            log_filter,
            log_stderr_threshold,
            use_json_logs,
        } = self;

        writeln!(f, "log_filter: {log_filter}")?;
        writeln!(f, "log_stderr_threshold: {log_stderr_threshold}")?;
        writeln!(f, "use_json_logs: {use_json_logs}")?;
        Ok(())
    }
}

impl Display for Arguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            logging,
            config,
            artifacts,
            build_info,
            deployments,
            contract,
            http_timeout,
            command,
        } = self;

        write!(f, "{logging}")?;
        display_option(f, "config", &config.as_ref().map(|p| p.display()))?;
        writeln!(f, "artifacts: {}", artifacts.display())?;
        display_option(f, "build_info", &build_info.as_ref().map(|p| p.display()))?;
        writeln!(f, "deployments: {}", deployments.display())?;
        writeln!(f, "contract: {contract}")?;
        writeln!(f, "http_timeout: {http_timeout:?}")?;
        match command {
            Command::Deploy(args) => {
                writeln!(f, "command: deploy")?;
                writeln!(f, "network: {}", args.network)?;
                writeln!(f, "confirmation_timeout: {:?}", args.confirmation_timeout)?;
                writeln!(f, "confirmations: {}", args.confirmations)?;
                writeln!(f, "reset_fork: {}", args.reset_fork)?;
            }
            Command::Verify(args) => {
                writeln!(f, "command: verify")?;
                writeln!(f, "network: {}", args.network)?;
                display_option(f, "address", &args.address)?;
                writeln!(
                    f,
                    "verification_poll_interval: {:?}",
                    args.verification_poll_interval
                )?;
                writeln!(f, "verification_timeout: {:?}", args.verification_timeout)?;
            }
            Command::Networks => writeln!(f, "command: networks")?,
        }
        Ok(())
    }
}

fn display_option(f: &mut Formatter<'_>, name: &str, option: &Option<impl Display>) -> fmt::Result {
    write!(f, "{name}: ")?;
    match option {
        Some(display) => writeln!(f, "{display}"),
        None => writeln!(f, "None"),
    }
}
