//! Pipeline error taxonomy: input validation, configuration, numerical.
//! Every error is surfaced to the caller immediately; the pipeline is a pure
//! batch transform, so nothing is retried and there is no partial success.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A record or table is missing a field the pipeline requires.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// Records handed to the windower must already be sorted by timestamp.
    /// Re-sorting here would change tie-break semantics for equal timestamps,
    /// so out-of-order input is rejected instead.
    #[error("input records are not sorted by timestamp (record {index} precedes its predecessor)")]
    UnsortedRecords { index: usize },

    /// The event count matrix has no rows or no columns.
    #[error("event count matrix is empty")]
    EmptyMatrix,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("numerical failure: {0}")]
    Numerical(String),

    #[error("malformed matrix file: {0}")]
    Parse(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
