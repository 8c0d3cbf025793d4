//! Entry point for the `mqtt-remote` service.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::Parser;

use mqtt_remote::{
    FileConfigLoader, StructuredHealthReporter, SystemShutdownSignal, bootstrap_with, run_remote,
};
use mqtt_remote_config::{CONFIG_PATH_ENV, TerminalPasswordPrompt, resolve_config_path};

/// Runs handlers for commands received over MQTT.
#[derive(Debug, Parser)]
#[command(name = "mqtt-remote", version)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long, env = CONFIG_PATH_ENV)]
    config: Option<Utf8PathBuf>,
    /// Log filter overriding the configured one, e.g. `mqtt_remote=debug`.
    #[arg(long)]
    log_filter: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let loader =
        FileConfigLoader::new(resolve_config_path(cli.config)).with_log_filter(cli.log_filter);
    let reporter = Arc::new(StructuredHealthReporter::new());

    let remote = match bootstrap_with(&loader, &TerminalPasswordPrompt, reporter) {
        Ok(remote) => remote,
        Err(error) => {
            let _ = writeln!(io::stderr().lock(), "mqtt-remote: {error}");
            return ExitCode::FAILURE;
        }
    };

    match run_remote(&remote, Arc::new(SystemShutdownSignal::new())) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(io::stderr().lock(), "mqtt-remote: {error}");
            ExitCode::FAILURE
        }
    }
}
