mod platform;

use std::path::PathBuf;

use clap::Parser;

/// Operator console for the row-range automation backend.
#[derive(Debug, Parser)]
#[command(name = "job-monitor", version)]
struct Args {
    /// RON configuration file; defaults apply when it does not exist.
    #[arg(long, default_value = "job-monitor.ron")]
    config: PathBuf,

    /// Overrides `api_base` from the configuration file.
    #[arg(long)]
    api_base: Option<String>,

    /// Mirror diagnostic logs to the terminal.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = platform::config::load(&args.config)?;
    if let Some(api_base) = args.api_base {
        config.api_base = api_base;
    }

    let destination = if args.verbose {
        platform::logging::LogDestination::Both
    } else {
        platform::logging::LogDestination::File
    };
    platform::logging::initialize(destination, &config.log_file);

    platform::run_app(config)
}
