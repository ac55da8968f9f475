//! Command-line argument definitions, parsed with `clap`'s derive API.

use clap::Parser;

/// Trace-driven MESI coherence simulator for a four-core shared-memory
/// multiprocessor over a single snooping bus.
#[derive(Debug, Parser)]
#[command(name = "coresim", version, about)]
pub struct Cli {
    /// Prefix shared by the four trace files: `<prefix>_proc0.trace` ..
    /// `<prefix>_proc3.trace`.
    #[arg(short = 't', long = "trace-prefix")]
    pub trace_prefix: String,

    /// Number of set-index bits (`num_sets = 2^s`).
    #[arg(short = 's', long = "set-bits")]
    pub set_index_bits: u32,

    /// Associativity (ways per set).
    #[arg(short = 'E', long = "assoc")]
    pub assoc: u32,

    /// Number of block-offset bits (`block_size_bytes = 2^b`).
    #[arg(short = 'b', long = "block-bits")]
    pub block_bits: u32,

    /// Output file path for the rendered report.
    #[arg(short = 'o', long = "output")]
    pub output: String,

    /// Raise log verbosity. Repeatable: `-v` for info, `-vv` for debug.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}
