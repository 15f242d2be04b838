//! Study Timer CLI - focused study sessions with credited minutes
//!
//! A countdown timer for study sessions:
//! - Whole minutes are credited when a session finishes
//! - Pauses never count toward studied time
//! - Credited time lands in a local or remote study log

use anyhow::Result;
use clap::{CommandFactory, Parser};

use studytimer::cli::{Cli, Commands, Display, IpcClient};
use studytimer::config::AppConfig;
use studytimer::sink::LocalTotalSink;

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = execute(cli).await {
        Display::show_error(&e.to_string());
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    match cli.command {
        Some(Commands::Start(args)) => {
            let client = IpcClient::new()?;
            let response = client.start(&args).await?;
            Display::show_ack(&response);
        }
        Some(Commands::Pause) => {
            let client = IpcClient::new()?;
            let response = client.pause().await?;
            Display::show_ack(&response);
        }
        Some(Commands::Resume) => {
            let client = IpcClient::new()?;
            let response = client.resume().await?;
            Display::show_ack(&response);
        }
        Some(Commands::Reset) => {
            let client = IpcClient::new()?;
            let response = client.reset().await?;
            Display::show_ack(&response);
        }
        Some(Commands::Finish) => {
            let client = IpcClient::new()?;
            let response = client.finish().await?;
            Display::show_finish(&response);
        }
        Some(Commands::Status) => {
            let client = IpcClient::new()?;
            let response = client.status().await?;
            Display::show_status(&response);
        }
        Some(Commands::Log) => {
            let sink = LocalTotalSink::open_default()?;
            Display::show_log(sink.total_minutes(), sink.records());
        }
        Some(Commands::Daemon) => {
            let config = AppConfig::load_default()?;
            studytimer::daemon::run(config).await?;
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
