//! `cqc`: an illustrative CLI front end for the library crate. Parses two
//! positional arguments, installs a `tracing-subscriber` controlled by
//! `RUST_LOG`/`--verbose`, and maps `cqc_drv::run`'s result to an exit code
//! (spec.md §12).

use std::path::PathBuf;

use clap::Parser;
use cqc_drv::Config;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cqc", version, about = "A single-pass C-subset compiler front end emitting QBE IR")]
struct Args {
    /// Path to the preprocessed C-subset source file.
    input: PathBuf,

    /// Path to write the generated QBE IR text to.
    output: PathBuf,

    /// Enable verbose phase-boundary logging (same effect as RUST_LOG=info).
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let config = Config {
        input: args.input,
        output: args.output,
        verbose: args.verbose,
    };

    if let Err(err) = cqc_drv::run(&config) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
