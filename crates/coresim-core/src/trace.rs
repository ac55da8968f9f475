//! Per-core memory reference traces: representation and parsing. Parsing
//! is pure and unit-testable here; file I/O wraps it in `coresim-cli`.

use std::path::Path;

/// A single memory reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceOp {
    /// A read.
    Read,
    /// A write.
    Write,
}

/// One `(op, byte_address)` entry in a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceEntry {
    /// Read or write.
    pub op: TraceOp,
    /// 32-bit byte address referenced.
    pub address: u32,
}

/// An ordered sequence of references for one core, consumed strictly in
/// order.
pub type Trace = Vec<TraceEntry>;

/// Errors raised while reading or parsing a trace file.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    /// The trace file could not be opened or read.
    #[error("cannot open trace file {path}: {source}")]
    Io {
        /// Path that failed to open.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A line did not parse as `<R|W> <hex_addr>`.
    #[error("malformed trace entry in {path}:{line_no}: {text:?}")]
    MalformedLine {
        /// Path of the offending file.
        path: String,
        /// 1-based line number.
        line_no: usize,
        /// The offending line text, verbatim.
        text: String,
    },
}

/// Parse trace file contents already read into memory.
///
/// `path` is used only to label diagnostics. Lines that are empty once
/// trimmed are skipped (tolerating a trailing blank line at end-of-file);
/// any other malformed line is a [`TraceError::MalformedLine`].
///
/// # Errors
///
/// Returns [`TraceError::MalformedLine`] on the first line that isn't
/// `<R|W> <hex_addr>` (hex accepted with or without a `0x`/`0X` prefix).
pub fn parse_trace_str(path: &str, contents: &str) -> Result<Trace, TraceError> {
    let mut trace = Trace::new();
    for (idx, line) in contents.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        trace.push(parse_line(path, line_no, line)?);
    }
    Ok(trace)
}

fn parse_line(path: &str, line_no: usize, line: &str) -> Result<TraceEntry, TraceError> {
    let malformed = || TraceError::MalformedLine {
        path: path.to_string(),
        line_no,
        text: line.to_string(),
    };

    let mut fields = line.split_whitespace();
    let op_str = fields.next().ok_or_else(malformed)?;
    let addr_str = fields.next().ok_or_else(malformed)?;
    if fields.next().is_some() {
        return Err(malformed());
    }

    let op = match op_str {
        "R" => TraceOp::Read,
        "W" => TraceOp::Write,
        _ => return Err(malformed()),
    };

    let digits = addr_str
        .strip_prefix("0x")
        .or_else(|| addr_str.strip_prefix("0X"))
        .unwrap_or(addr_str);
    let address = u32::from_str_radix(digits, 16).map_err(|_| malformed())?;

    Ok(TraceEntry { op, address })
}

/// Read and parse a trace file from disk.
///
/// # Errors
///
/// Returns [`TraceError::Io`] if the file cannot be read, or
/// [`TraceError::MalformedLine`] on the first malformed line.
pub fn parse_trace_file(path: &Path) -> Result<Trace, TraceError> {
    let label = path.display().to_string();
    let contents = std::fs::read_to_string(path).map_err(|source| TraceError::Io {
        path: label.clone(),
        source,
    })?;
    parse_trace_str(&label, &contents)
}
