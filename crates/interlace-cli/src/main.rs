use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use interlace_rt::{RunConfig, ScanMode};

mod commands;
mod error;
mod io;

use commands::map::Transform;
use error::CliError;

#[derive(Parser, Debug)]
#[command(name = "interlace")]
#[command(about = "Parallel interaction-net reducer", long_about = None)]
struct Args {
    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,

    /// TOML file with a `[run]` table
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Number of worker threads
    #[arg(long, value_name = "N", global = true)]
    workers: Option<usize>,

    /// Deadline for the whole run, in seconds
    #[arg(long, value_name = "SECS", global = true)]
    timeout: Option<f64>,

    /// Maximum number of interactions
    #[arg(long, value_name = "N", global = true)]
    max_steps: Option<u64>,

    /// Rescan strategy after each rewrite (full or touched)
    #[arg(long, value_name = "MODE", global = true)]
    scan: Option<ScanMode>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Reduce the four-node square and print the surviving wire
    Square,

    /// Map a transform over the list [1..=N] and print the result
    Map {
        /// Number of list cells
        #[arg(short = 'n', long, default_value_t = 10)]
        length: u32,
        #[arg(short, long, value_enum, default_value_t = Transform::Double)]
        transform: Transform,
    },

    /// Eliminate a tensor/par cut and print the linked names
    Cut,
}

impl Args {
    /// The config file's values with any command-line overrides applied.
    fn run_config(&self) -> Result<RunConfig, CliError> {
        let mut config = io::load_config(self.config.as_deref())?;
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        if let Some(secs) = self.timeout {
            let timeout = Duration::try_from_secs_f64(secs).map_err(|e| {
                interlace_rt::RuntimeError::InvalidConfig(format!("timeout {secs}: {e}"))
            })?;
            config = config.with_timeout(timeout);
        }
        if let Some(max_steps) = self.max_steps {
            config = config.with_max_steps(max_steps);
        }
        if let Some(scan) = self.scan {
            config = config.with_scan(scan);
        }
        Ok(config)
    }
}

fn main() -> miette::Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .parse_default_env()
        .init();

    let config = args.run_config()?;
    log::debug!("Effective run config: {config:?}");

    match args.command {
        Command::Square => commands::square::handle_square(config)?,
        Command::Map { length, transform } => commands::map::handle_map(length, transform, config)?,
        Command::Cut => commands::cut::handle_cut(config)?,
    }
    Ok(())
}
