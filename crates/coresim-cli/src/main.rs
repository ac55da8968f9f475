//! Command-line front end for the MESI coherence simulator: parses flags,
//! loads four trace files, runs the simulation, and writes the report.

mod cli;
mod error;

use clap::Parser;
use coresim_cache::CacheGeometry;
use coresim_core::report::Report;

use cli::Cli;
use error::CliError;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // clap exits with code 2 on a usage error by default; a missing
            // or unknown flag should exit 1 here, so only -h/--version keep
            // clap's own (0, already-printed) exit.
            use clap::error::ErrorKind;
            match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
                _ => {
                    eprint!("{err}");
                    std::process::exit(1);
                }
            }
        }
    };

    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    if let Err(err) = run(&cli) {
        eprintln!("coresim: {err}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let geometry = CacheGeometry::from_bits(cli.set_index_bits, cli.block_bits, cli.assoc)?;

    let mut loaded = Vec::with_capacity(coresim_core::NUM_CORES);
    for core in 0..coresim_core::NUM_CORES {
        let path = std::path::PathBuf::from(format!("{}_proc{core}.trace", cli.trace_prefix));
        loaded.push(coresim_core::parse_trace_file(&path)?);
    }
    let traces: [coresim_core::Trace; coresim_core::NUM_CORES] = loaded
        .try_into()
        .expect("exactly NUM_CORES trace files were loaded above");

    let result = coresim_core::run(geometry, traces);

    let report = Report::new(&cli.trace_prefix, &result);
    std::fs::write(&cli.output, report.render()).map_err(|source| CliError::Output {
        path: cli.output.clone(),
        source,
    })?;

    log::info!("wrote report to {}", cli.output);
    Ok(())
}
