use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Every failure is terminal for the run; `{:#}` renders the whole chain on
/// one line.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read {}", path.display())]
    InputAccess {
        path: PathBuf,
        source: io::Error,
    },

    #[error("invalid YAML at line {line}, column {column}: {reason}")]
    Parse {
        line: usize,
        column: usize,
        reason: String,
    },

    #[error("cannot serialize document: {0}")]
    Serialization(String),

    #[error("cannot write output")]
    Output(#[from] io::Error),
}

impl From<yaml_rust2::ScanError> for Error {
    fn from(err: yaml_rust2::ScanError) -> Self {
        let mark = err.marker();
        Error::Parse {
            line: mark.line(),
            column: mark.col(),
            reason: err.info().to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
