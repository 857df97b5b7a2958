//! qmap command-line interface.
//!
//! Loads circuit descriptions from JSON, routes them for a device described
//! by a target file or a named preset, and prints or saves the compiled
//! OpenQASM 2.0 programs.
//!
//! ```text
//! qmap compile -i circuits.json -t device.yaml -o out/ --config
//! qmap compile -i bell.json -d star:5 --seed 7 -v
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{compile, version};

/// qmap - route quantum circuits onto restricted hardware
#[derive(Parser)]
#[command(name = "qmap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile circuits for a target device
    Compile {
        /// Input file with one circuit description or a list of them (JSON)
        #[arg(short, long)]
        input: String,

        /// Target configuration file (YAML or JSON)
        #[arg(short, long)]
        target: Option<String>,

        /// Device preset (linear:N, star:N, full:N), used when the target
        /// file has no coupling map
        #[arg(short, long)]
        device: Option<String>,

        /// Output directory; programs are printed to stdout when omitted
        #[arg(short, long)]
        output: Option<String>,

        /// Swap search seed, overriding the target file
        #[arg(long)]
        seed: Option<u64>,

        /// Swap search trials per layer, overriding the target file
        #[arg(long)]
        trials: Option<usize>,

        /// Swaps one routing trial may insert, overriding the target file
        #[arg(long)]
        swap_cap: Option<usize>,

        /// Also emit each circuit's configuration as JSON
        #[arg(long)]
        config: bool,
    },

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Compile {
            input,
            target,
            device,
            output,
            seed,
            trials,
            swap_cap,
            config,
        } => compile::execute(&compile::CompileArgs {
            input,
            target,
            device,
            output,
            seed,
            trials,
            swap_cap,
            config,
            diagnostics: cli.verbose > 0,
        }),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
