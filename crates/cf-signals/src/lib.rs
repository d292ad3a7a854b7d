//! cf-signals: named-signal extraction from tool output files.
//!
//! The orchestration engine only depends on the [`SignalReader`] trait;
//! [`FileSignalReader`] is the default implementation covering the
//! text formats the supported tools emit. The on-disk format is inferred
//! from the file extension.

pub mod reader;
pub mod types;

pub use reader::FileSignalReader;
pub use types::{ShapeHint, SignalData, SignalRequest};

use std::collections::HashMap;
use std::path::Path;

pub type SignalsResult<T> = Result<T, SignalsError>;

#[derive(thiserror::Error, Debug)]
pub enum SignalsError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown output format '{extension}' for {path}")]
    UnknownFormat { path: String, extension: String },

    #[error("Signal '{signal}' not found in {path}")]
    MissingSignal { path: String, signal: String },

    #[error("Parse error in {path} line {line}: {what}")]
    Parse {
        path: String,
        line: usize,
        what: String,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Extraction boundary: read named signals out of one output file.
pub trait SignalReader {
    fn read_signals(
        &self,
        path: &Path,
        requests: &[SignalRequest],
    ) -> SignalsResult<HashMap<String, SignalData>>;
}
