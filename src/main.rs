use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use guild_export::{Config, DiscordClient, Exporter, ProgressReporter, RunOutcome};

/// Export the message history of every text channel in a Discord guild
#[derive(Parser, Debug)]
#[command(name = "guild-export")]
#[command(version, about)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short = 'c', long = "config", default_value = "config.json")]
    config: PathBuf,
}

/// Exit status after a termination signal (128 + SIGINT)
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Diagnostics go to stderr; stdout carries the progress display
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let client = match DiscordClient::new(&config.token, &config.api) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let output = config.output_path.clone();
    let reporter = Arc::new(ProgressReporter::stdout(config.concurrent_channels));
    let exporter = Exporter::with_client(config, client);

    let outcome = guild_export::run_with_shutdown(&exporter, Arc::clone(&reporter)).await;
    let code = match outcome {
        Ok(RunOutcome::Completed(summary)) => {
            reporter.log(format!(
                "Exported {} messages from {} channels to {} in {:.1}s ({} failed page fetches)",
                summary.totals.exported,
                summary.channels,
                output.display(),
                summary.elapsed.as_secs_f64(),
                summary.totals.fetch_errors,
            ));
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::Interrupted) => {
            reporter.log(format!(
                "Interrupted; partial export left in {}",
                output.display()
            ));
            ExitCode::from(EXIT_INTERRUPTED)
        }
        Err(e) => {
            tracing::error!(error = %e, "Export failed");
            reporter.log(format!("Error: {e}"));
            ExitCode::FAILURE
        }
    };

    reporter.finish();
    code
}
