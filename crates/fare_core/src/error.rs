use thiserror::Error;

/// Errors surfaced by a pipeline run.
#[derive(Debug, Error)]
pub enum FareError {
    /// A record field could not be parsed. `position` is the 1-based record
    /// number in the source.
    #[error("record {position}: invalid {field} value {value:?}")]
    Parse {
        position: u64,
        field: &'static str,
        value: String,
    },

    /// A record did not carry the expected number of fields.
    #[error("record {position}: expected {expected} fields, found {found}")]
    FieldCount {
        position: u64,
        expected: usize,
        found: usize,
    },

    #[error("failed to read path records: {0}")]
    Source(#[source] csv::Error),

    #[error("failed to write fares: {0}")]
    Sink(#[source] csv::Error),

    #[error("failed to flush fares: {0}")]
    Flush(#[source] std::io::Error),

    #[error("invalid pipeline configuration: {0}")]
    Config(String),

    /// A pipeline stage hung up before the run finished.
    #[error("{0} channel disconnected before end of stream")]
    Disconnected(&'static str),

    #[error("{0} thread panicked")]
    Panicked(&'static str),
}

impl FareError {
    pub fn config(message: impl Into<String>) -> Self {
        FareError::Config(message.into())
    }

    /// True for errors caused by a single bad record rather than by I/O or
    /// pipeline failure.
    pub fn is_record_error(&self) -> bool {
        matches!(
            self,
            FareError::Parse { .. } | FareError::FieldCount { .. }
        )
    }
}
