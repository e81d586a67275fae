//! `cvqkd-pp` – post-processing service for one end of the link.
//!
//! `alice` listens on the control address and answers Bob's protocol runs;
//! `bob` connects to Alice for every local request. Both take their local
//! requests as JSON lines on the local endpoint.
//!
//! The service runs until the failure limit is reached or the process is
//! terminated.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use cvqkd_pp::adapters::{JsonLineSource, TcpConnector, TracingObserver};
use cvqkd_pp::application::{
    AliceSession, BobSession, SessionError, Supervisor, SupervisorExit, SupervisorReport,
};
use cvqkd_pp::config::{ConfigError, ServiceConfig};
use cvqkd_pp::ports::{AliceRequest, BobRequest};

#[derive(Parser, Debug)]
#[command(name = "cvqkd-pp", version, about = "CV-QKD reconciliation and privacy amplification")]
struct Cli {
    /// TOML service configuration
    #[arg(short, long, global = true, env = "CVQKD_PP_CONFIG")]
    config: Option<PathBuf>,

    /// Control channel address (overrides `control.address`)
    #[arg(long, global = true, env = "CVQKD_PP_CONTROL")]
    control: Option<String>,

    /// Local JSON-line endpoint (overrides `local.endpoint`)
    #[arg(long, global = true, env = "CVQKD_PP_ENDPOINT")]
    endpoint: Option<String>,

    /// Raise log verbosity (-v debug, -vv trace); `RUST_LOG` wins if set
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    role: RoleCommand,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum RoleCommand {
    /// Responder: accept Bob's control connections
    Alice,
    /// Initiator: connect to Alice for every request
    Bob,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot open {what} {addr}: {source}")]
    Bind {
        what: &'static str,
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Session(#[from] SessionError),
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "cvqkd_pp=info",
        1 => "cvqkd_pp=debug",
        _ => "cvqkd_pp=trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .init();
}

fn load_config(cli: &Cli) -> Result<ServiceConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(control) = &cli.control {
        config.control.address.clone_from(control);
    }
    if let Some(endpoint) = &cli.endpoint {
        config.local.endpoint.clone_from(endpoint);
    }
    Ok(config)
}

fn bind_error(what: &'static str, addr: &str) -> impl FnOnce(std::io::Error) -> CliError {
    let addr = addr.to_owned();
    move |source| CliError::Bind { what, addr, source }
}

fn run(cli: &Cli) -> Result<SupervisorReport, CliError> {
    let config = load_config(cli)?;
    // Engine and extractor are resolved before any socket is opened.
    let engine = config.build_engine()?;
    let extractor = config.build_extractor()?;
    let policy = config.restart_policy();
    let observer = TracingObserver;

    tracing::info!(
        role = ?cli.role,
        control = %config.control.address,
        endpoint = %config.local.endpoint,
        engine = engine.name(),
        extractor = extractor.name(),
        "starting"
    );

    let report = match cli.role {
        RoleCommand::Alice => {
            let connector = TcpConnector::listen(&config.control.address)
                .map_err(bind_error("control address", &config.control.address))?
                .with_read_timeout(config.read_timeout());
            let source = JsonLineSource::<AliceRequest>::bind(&config.local.endpoint)
                .map_err(bind_error("local endpoint", &config.local.endpoint))?;
            Supervisor::new(AliceSession::new(engine, extractor), source, connector, policy)
                .run(&observer)?
        }
        RoleCommand::Bob => {
            let connector = TcpConnector::connect(&config.control.address, config.connect_timeout())
                .map_err(bind_error("control address", &config.control.address))?
                .with_read_timeout(config.read_timeout());
            let source = JsonLineSource::<BobRequest>::bind(&config.local.endpoint)
                .map_err(bind_error("local endpoint", &config.local.endpoint))?;
            Supervisor::new(BobSession::new(engine, extractor), source, connector, policy)
                .run(&observer)?
        }
    };
    Ok(report)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(report) if report.exit == SupervisorExit::FailureLimit => {
            tracing::error!(failed = report.failed, "giving up after repeated failures");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "fatal");
            ExitCode::FAILURE
        }
    }
}
