//! Top-level CLI error type: wraps every fallible boundary operation behind
//! one `Display` impl so `main` can print a single diagnostic line and
//! exit 1.

use coresim_cache::GeometryError;
use coresim_core::TraceError;

/// Everything that can go wrong between parsing flags and writing the
/// output file.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The requested cache geometry was invalid.
    #[error("invalid cache geometry: {0}")]
    Geometry(#[from] GeometryError),

    /// A trace file could not be read or parsed.
    #[error("trace error: {0}")]
    Trace(#[from] TraceError),

    /// The output file could not be created or written.
    #[error("cannot write output file {path}: {source}")]
    Output {
        /// Output path that failed.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
