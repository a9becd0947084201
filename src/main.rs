use anyhow::Context;
use clap::Parser;
use ssl_sync::ssh::SshConnector;
use ssl_sync::{RunReport, SyncConfig};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "ssl-sync")]
#[command(version, about = "Copy a TLS key/certificate pair from an SFTP server to its destinations")]
struct Cli {
    /// Path to options.json (defaults to /data/options.json, then data/options.json)
    #[arg(long, short = 'c', env = "SSL_SYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(long, short = 'v')]
    verbose: bool,
}

const EXIT_DESTINATION_FAILED: u8 = 1;
const EXIT_FATAL: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match sync(cli.config.as_deref()) {
        Ok(report) if report.all_succeeded() => {
            log::info!("Done: {} destination(s) updated", report.destinations.len());
            ExitCode::SUCCESS
        }
        Ok(report) => {
            log::warn!(
                "Done: {} of {} destination(s) failed",
                report.failed(),
                report.destinations.len()
            );
            for outcome in &report.destinations {
                if let Err(e) = &outcome.result {
                    log::warn!("  {} ({}): {}", outcome.name, outcome.target, e);
                }
            }
            ExitCode::from(EXIT_DESTINATION_FAILED)
        }
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

/// Load the options file and run the pipeline once on a single-threaded runtime.
fn sync(config_path: Option<&Path>) -> anyhow::Result<RunReport> {
    let config = SyncConfig::load(config_path)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    let connector = SshConnector::new(config.host_key_check());
    let report = runtime.block_on(ssl_sync::run(&config, &connector))?;
    Ok(report)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
