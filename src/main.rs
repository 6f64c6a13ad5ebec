use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncReadExt;

use buildrelay::app::{handle_fatal_error, init_logging, initialize_app, AppConfig};
use buildrelay::build::BuildOrchestrator;
use buildrelay::config::RelayConfig;
use buildrelay::diagnostics::parse_diagnostics;
use buildrelay::error::RelayError;
use buildrelay::server::{self, AppState};
use buildrelay::session::{ChannelError, ChannelSink, DeliveryChannel, SessionContext, SessionId};
use buildrelay::subprocess::TokioProcessRunner;
use buildrelay::workspace::{Toolchain, WorkspaceLayout};

/// Build and test Go code for remote editor sessions
#[derive(Parser)]
#[command(name = "buildrelay", version)]
#[command(about = "Relay Go build and test output to editor sessions", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP and websocket server
    Serve {
        /// Address to bind (overrides server.bind)
        #[arg(long)]
        bind: Option<String>,

        /// Port to listen on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Build one file's package locally, printing output frames as JSON lines
    Build {
        /// Go source file to build
        file: PathBuf,

        /// User whose toolchain settings apply
        #[arg(short, long, default_value = "local")]
        user: String,
    },
    /// Parse captured `go build` standard error into diagnostics
    Parse {
        /// Directory the build ran in; relative paths are resolved against it
        workdir: PathBuf,

        /// File holding the captured output (reads stdin when omitted)
        input: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let verbose = cli.verbose;

    if let Err(e) = run(cli).await {
        handle_fatal_error(e, verbose);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let app_config = AppConfig::new(cli.verbose).with_config_path(cli.config);

    match cli.command {
        Commands::Serve { bind, port } => {
            let mut config = initialize_app(&app_config).await?;
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            let state = AppState::from_config(&config, Arc::new(TokioProcessRunner));
            server::serve(state, &config.bind_address()).await
        }
        Commands::Build { file, user } => {
            let config = initialize_app(&app_config).await?;
            run_build(&config, &file, &user).await
        }
        Commands::Parse { workdir, input } => {
            init_logging(&app_config);
            run_parse(&workdir, input.as_deref()).await
        }
    }
}

/// Prints each frame on its own line.
struct StdoutSink;

#[async_trait]
impl ChannelSink for StdoutSink {
    async fn send_text(&mut self, text: String) -> Result<(), ChannelError> {
        println!("{text}");
        Ok(())
    }
}

async fn run_build(config: &RelayConfig, file: &Path, user: &str) -> Result<()> {
    let target = std::path::absolute(file)
        .with_context(|| format!("Failed to resolve {}", file.display()))?;
    let source_text = tokio::fs::read_to_string(&target)
        .await
        .with_context(|| format!("Failed to read {}", target.display()))?;

    let toolchain = Toolchain::from_config(config, Arc::new(TokioProcessRunner));
    let builds = BuildOrchestrator::new(toolchain, Arc::new(WorkspaceLayout::from_config(config)));

    let session = SessionId::new("cli");
    let (channel, writer) = DeliveryChannel::open(session.clone(), StdoutSink);
    let ctx = SessionContext::new(session, user, Some(channel));

    let outcome = builds.build_file(&ctx, &target, &source_text, None).await;
    drop(ctx);
    writer.await.ok();

    let outcome = outcome.map_err(RelayError::from)?;
    if !outcome.succeeded() {
        bail!("go build exited with {:?}", outcome.status);
    }
    Ok(())
}

async fn run_parse(workdir: &Path, input: Option<&Path>) -> Result<()> {
    let text = match input {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("Failed to read standard input")?;
            text
        }
    };

    let lines: Vec<&str> = text.lines().collect();
    let diagnostics = parse_diagnostics(&lines, workdir);
    println!("{}", serde_json::to_string_pretty(&diagnostics)?);
    Ok(())
}
