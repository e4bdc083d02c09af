use anyhow::{Context, Result};
use clap::Parser;
use sheetprobe_core::config::DEFAULT_CONFIG_FILE;
use sheetprobe_core::{AnalysisObserver, Probe, ProbeConfig, TracingObserver};
use std::path::{Path, PathBuf};

mod console;
mod logging;

use console::ConsoleObserver;

#[derive(Parser)]
#[command(name = "sheetprobe")]
#[command(about = "Extract the layout of the RPMES form templates into JSON reports", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Send progress to the log at debug level instead of printing it
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging()?;

    let config = load_config(cli.config.as_deref())?;
    let probe = Probe::with_config(config);

    let mut console = ConsoleObserver;
    let mut tracing_observer = TracingObserver;
    let observer: &mut dyn AnalysisObserver = if cli.quiet {
        &mut tracing_observer
    } else {
        console.print_banner();
        &mut console
    };

    // Per-file failures are already reported; the run itself always succeeds
    probe.run(".", observer);
    Ok(())
}

/// An explicit config must load and validate; the implicit one falls back to defaults
fn load_config(explicit: Option<&Path>) -> Result<ProbeConfig> {
    if let Some(config_path) = explicit {
        let config = ProbeConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
        config.validate().context("Invalid configuration")?;
        return Ok(config);
    }

    let default_config_path = Path::new(DEFAULT_CONFIG_FILE);
    if !default_config_path.exists() {
        return Ok(ProbeConfig::default());
    }

    match ProbeConfig::from_file(default_config_path).and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => Ok(config),
        Err(err) => {
            tracing::warn!(
                file = %default_config_path.display(),
                error = %err,
                "ignoring unusable configuration, using defaults"
            );
            Ok(ProbeConfig::default())
        }
    }
}
